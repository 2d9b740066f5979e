//! Interactive chat client with room commands and reconnection support.
//!
//! Commands are `#<digit>` lines; `#5` enters chat mode, where every line
//! is sent to the current room until `#exit`. Automatically reconnects on
//! disconnection.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client
//! cargo run --bin hiroba-client -- --host 127.0.0.1 --port 8080 --retry 3
//! ```

use std::time::Duration;

use clap::Parser;

use hiroba_client::{ClientConfig, run_client};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "TCP chat client with named rooms", long_about = None)]
struct Args {
    /// Server host to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to connect to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Maximum number of reconnect attempts
    #[arg(short = 'r', long, default_value = "5")]
    retry: u32,

    /// Delay between reconnect attempts in milliseconds
    #[arg(long, default_value = "2000")]
    retry_interval_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ClientConfig {
        host: args.host,
        port: args.port,
        max_reconnect_attempts: args.retry,
        reconnect_interval: Duration::from_millis(args.retry_interval_ms),
    };

    // Run the client
    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
