use clap::Parser;
use loopback_bridge::framework::core::{DEFAULT_CALLBACK, DEFAULT_HOST, DEFAULT_PORT};
use loopback_bridge::server::{read_responses, write_scripts};
use loopback_bridge::{BridgeConfig, ChannelRuntime, Listener};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

/// Bridge local HTTP requests to a UI runtime speaking over stdio.
///
/// Each request is written to stdout as one `callback(request, sequence)`
/// line. Responses are read from stdin as JSON lines of the form
/// `{"id": 0, "status": 200, "headers": {}, "body": ""}`.
#[derive(Parser, Debug)]
#[command(name = "loopback-bridge", version)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds to wait for the UI runtime before answering 502
    #[arg(short, long, default_value_t = 10)]
    timeout_secs: u64,

    /// Name of the function the UI runtime exposes for incoming requests
    #[arg(short, long, default_value = DEFAULT_CALLBACK)]
    callback: String,

    /// Log every request and its outcome
    #[arg(short, long)]
    verbose: bool,
}

impl From<Args> for BridgeConfig {
    fn from(args: Args) -> Self {
        BridgeConfig::new()
            .with_host(args.host)
            .with_port(args.port)
            .with_timeout(Duration::from_secs(args.timeout_secs))
            .with_callback(args.callback)
            .with_verbose(args.verbose)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the scripts.
    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let (runtime, scripts) = ChannelRuntime::new();
    let listener = Listener::new(args.into(), Arc::new(runtime))?;
    let addr = listener.create().await?;
    eprintln!("Listening on http://{}", addr);

    let writer = tokio::spawn(write_scripts(scripts, tokio::io::stdout()));
    let responder = listener.responder();

    tokio::select! {
        result = read_responses(BufReader::new(tokio::io::stdin()), responder) => {
            match result {
                Ok(delivered) => log::info!("📭 stdin closed after {} responses", delivered),
                Err(e) => log::error!("❌ Failed to read responses: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("🛑 Interrupted, shutting down");
        }
    }

    listener.destroy().await;
    writer.abort();
    Ok(())
}
