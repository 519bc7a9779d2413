use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("gate already opened")]
    AlreadyOpened,

    #[error("gate is closed and cannot be reopened")]
    Closed,

    #[error("closing a gate requires a tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),
}
