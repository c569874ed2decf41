use clap::Parser;
use deploy_scripts::{
    cli::Cli,
    constants::DEFAULT_LOG_FILTER,
    errors::DeployError,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DeployError> {
    let Cli { global, command } = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    command.run(&global).await
}
