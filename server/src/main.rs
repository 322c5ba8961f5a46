use clap::Parser;
use log::{error, info};
use server::config::{Args, ServerConfig};
use server::network::Server;

/// Parses command-line arguments, binds the server and serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    let mut server = Server::new(config).await?;
    let arcade = server.arcade();

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped with error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    arcade.shutdown().await;
    Ok(())
}
