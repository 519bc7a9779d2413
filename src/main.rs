use color_eyre::Result;
use libopengate::{config::Config, instance::Instance};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::formatted_builder()
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .try_init()?;

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    log::debug!("{:?}", config);

    let instance = Instance::new(config)?;
    let report = instance.start().await?;

    for msg in &report.delivered {
        log::debug!("delivered {msg:?}");
    }
    log::info!(
        "done: {} delivered, {} rejected",
        report.delivered.len(),
        report.rejected
    );

    Ok(())
}
