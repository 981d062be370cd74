use clap::Parser;
use snapstyle::config::{AppConfig, setup_logging};
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = snapstyle::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let listen_address = cli.listen_address.clone();
    let port = cli.port;
    let config = AppConfig::from(cli);

    if let Err(err) = snapstyle::web::setup_server(&listen_address, port, config).await {
        error!("Application error: {}", err);
    }
}
