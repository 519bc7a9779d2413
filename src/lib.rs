pub mod config;
pub mod error;
pub mod gate;
pub mod instance;
pub mod pipeline;
pub mod pool;
pub mod signal;

pub use error::GateError;
pub use gate::{Gate, Phase};
pub use pool::{Acquire, Pool, Token};
pub use signal::Signal;
