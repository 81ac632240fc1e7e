use clap::Parser;
use log::{error, info};
use server::dictionary::Dictionary;
use server::network::{Server, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3050")]
    port: u16,

    /// Maximum number of games running at once
    #[arg(short, long, default_value = "4")]
    max_games: usize,

    /// Word list to load instead of the built-in one (one word per line)
    #[arg(short, long)]
    wordlist: Option<PathBuf>,

    /// Seconds between liveness pings
    #[arg(long, default_value = "5")]
    heartbeat_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let dictionary = match &args.wordlist {
        Some(path) => Dictionary::from_file(path)?,
        None => Dictionary::embedded(),
    };

    let config = ServerConfig {
        address: format!("{}:{}", args.host, args.port),
        max_games: args.max_games,
        heartbeat: Duration::from_secs(args.heartbeat_secs.max(1)),
    };

    info!("Starting server with room for {} games", config.max_games);
    let server = Server::new(config, Arc::new(dictionary)).await?;

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

    Ok(())
}
