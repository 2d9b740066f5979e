//! TCP chat room server.
//!
//! Clients list, create, join and leave named rooms; chat messages are
//! broadcast to every member of the sender's room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use hiroba_server::ui::{Server, ServerContext};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "TCP chat server with named rooms", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let context = Arc::new(ServerContext::in_memory());

    let server = match Server::bind((args.host.as_str(), args.port), context).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind {}:{}: {}", args.host, args.port, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
