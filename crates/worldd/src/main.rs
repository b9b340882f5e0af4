// worldd - AshEmu world server
//
// Picks up clients handed off by authd on port 8085, verifies the
// session-key digest, and walks them through character selection into
// the world.

mod game_time;
mod opcodes;
mod player;
mod positions;
mod session;
mod socket;
mod update;
mod update_fields;

use clap::Parser;
use tokio::net::TcpListener;

use ashemu_shared::config::Config;
use ashemu_shared::log::initialize_logging;
use ashemu_shared::store::Store;
use ashemu_shared::{Expansion, WORLD_SERVER_PORT};

const DEFAULT_CONFIG: &str = "worldd.conf";

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "worldd")]
#[command(about = "AshEmu World Server")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config, "Worldd_").unwrap_or_else(|| {
        eprintln!("Config file {} not found, using defaults", args.config);
        Config::empty("Worldd_")
    });

    let log_dir = {
        let dir = config.get_string("LogsDir");
        if dir.is_empty() { None } else { Some(dir) }
    };
    initialize_logging(log_dir.as_deref(), "worldd.log", "info");

    tracing::info!("AshEmu World Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("<Ctrl-C> to stop.");

    let expansion = {
        let value = config.get_string_default("Expansion", "vanilla");
        match Expansion::from_config(&value) {
            Some(expansion) => expansion,
            None => {
                tracing::error!("Unknown Expansion value '{}'", value);
                return Err(anyhow::anyhow!("invalid Expansion config"));
            }
        }
    };
    tracing::info!("Serving client build {}", expansion.build());

    let store_path = config.get_string_default("StorePath", "ashemu.db");
    let store = match Store::open(&store_path).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("Cannot open store at {}: {}", store_path, err);
            return Err(err.into());
        }
    };

    let bind_ip = config.get_string_default("BindIP", "0.0.0.0");
    let port = config.get_int_default("WorldServerPort", WORLD_SERVER_PORT);
    let bind_addr = format!("{}:{}", bind_ip, port);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        let store = store.clone();
                        tokio::spawn(async move {
                            socket::handle_client(stream, addr, store, expansion).await;
                        });
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = shutdown_signal() => {
                tracing::info!("Shutting down...");
                break;
            }
        }
    }

    tracing::info!("Halting process...");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).expect("failed to install TERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}
