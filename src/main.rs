use clap::Parser;
use color_eyre::Result;
use space_engineers_exporter::{
    collector_from_config,
    init_errors,
    init_logging,
    server,
    Args,
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_errors()?;
    let config = Config::new(&Args::parse())?;
    init_logging(&config)?;

    let collector = collector_from_config(&config)?;
    let app = server::create_router(collector, config.metric_prefix.as_str());
    server::serve(config.listen_address(), app).await
}
