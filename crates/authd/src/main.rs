// authd - AshEmu login server
//
// Accepts retail clients on port 3724, runs the SRP6 handshake against
// the shared store and hands out the realm list.

mod auth_codes;
mod auth_session;
mod protocol;
mod realm_list;

use clap::Parser;
use tokio::net::TcpListener;

use ashemu_shared::config::Config;
use ashemu_shared::log::initialize_logging;
use ashemu_shared::store::Store;
use ashemu_shared::AUTH_SERVER_PORT;

use auth_session::AuthSettings;
use realm_list::RealmInfo;

const DEFAULT_CONFIG: &str = "authd.conf";

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "authd")]
#[command(about = "AshEmu Login Server")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config, "Authd_").unwrap_or_else(|| {
        eprintln!("Config file {} not found, using defaults", args.config);
        Config::empty("Authd_")
    });

    let log_dir = {
        let dir = config.get_string("LogsDir");
        if dir.is_empty() { None } else { Some(dir) }
    };
    initialize_logging(log_dir.as_deref(), "authd.log", "info");

    tracing::info!("AshEmu Login Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("<Ctrl-C> to stop.");

    let store_path = config.get_string_default("StorePath", "ashemu.db");
    let store = match Store::open(&store_path).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("Cannot open store at {}: {}", store_path, err);
            return Err(err.into());
        }
    };

    let realm = RealmInfo::from_config(&config);
    let settings = AuthSettings {
        auto_create_accounts: config.get_bool_default("AutoCreateAccounts", true),
    };

    let bind_ip = config.get_string_default("BindIP", "0.0.0.0");
    let port = config.get_int_default("AuthServerPort", AUTH_SERVER_PORT);
    let bind_addr = format!("{}:{}", bind_ip, port);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        let store = store.clone();
                        let realm = realm.clone();
                        let settings = settings.clone();
                        tokio::spawn(async move {
                            auth_session::handle_client(stream, addr, store, realm, settings).await;
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
