//! Random-chat signaling server
//!
//! Run with: cargo run --example chat_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example chat_server                  # binds to 0.0.0.0:3001
//!   cargo run --example chat_server localhost        # binds to 127.0.0.1:3001
//!   cargo run --example chat_server 127.0.0.1:4000   # binds to 127.0.0.1:4000
//!
//! Environment:
//!   PORT          listening port when no BIND_ADDR is given (default 3001)
//!   FRONTEND_URL  allowed origin (default http://localhost:5173)
//!
//! Clients connect over WebSocket, send `find_match` with a session type
//! ("video" or "text"), and negotiate a peer connection through the relayed
//! `offer`/`answer`/`ice_candidate` events once paired.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rendezvous_rs::{ServerConfig, SignalingServer};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:3001
/// - "localhost:4000" -> 127.0.0.1:4000
/// - "127.0.0.1" -> 127.0.0.1:3001
/// - "0.0.0.0:3001" -> 0.0.0.0:3001
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 3001;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: chat_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:$PORT)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORT          Listening port (default: 3001)");
    eprintln!("  FRONTEND_URL  Allowed origin (default: http://localhost:5173)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rendezvous_rs=debug".parse()?)
                .add_directive("chat_server=debug".parse()?),
        )
        .init();

    let mut config = ServerConfig::from_env();
    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    println!("Starting signaling server on {}", config.bind_addr);
    println!(
        "Allowed origin: {}",
        config.allowed_origin.as_deref().unwrap_or("any")
    );
    println!("Health check: http://{}/api/health", config.bind_addr);
    println!();

    let server = Arc::new(SignalingServer::new(config));

    // Periodic stats log
    let registry = Arc::clone(server.registry());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            let stats = registry.stats().await;
            tracing::info!(
                connections = stats.connections,
                open_rooms = stats.open_rooms,
                matches_made = stats.matches_made,
                "Server stats"
            );
        }
    });

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
