//! Live connection to a running API server.
//!
//! Demonstrates:
//! - Building a client with the production connector
//! - Reading the bearer token from the environment
//! - Logging inbound messages and status changes
//!
//! Usage:
//!   SOCIAL_REALTIME_TOKEN=... cargo run --example 002_live_connect -- --url http://localhost:8000
//!   cargo run --example 002_live_connect -- --no-wait
//!   cargo run --example 002_live_connect -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use social_realtime::{ClientOptions, RealtimeClient, Result, StaticCredential, UserStatus};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        if e.is_usage_error() {
            eprintln!("        check --url and the client options");
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 002: Live Connect ===\n");

    // ========================================================================
    // Create Client
    // ========================================================================

    println!("[1] Creating client...");
    println!("    API: {}", args.api_url);

    let credentials = match args.token {
        Some(token) => StaticCredential::new(token),
        None => {
            println!("    ! {} not set, connecting anonymously", common::TOKEN_ENV);
            StaticCredential::anonymous()
        }
    };

    let client = RealtimeClient::builder()
        .api_base_url(&args.api_url)
        .credentials(credentials)
        .options(ClientOptions::new().with_pong_timeout(Duration::from_secs(10)))
        .on_message(|message| println!("    ← {}", message.kind()))
        .on_connection_status_change(|connected| println!("    ● connected = {connected}"))
        .build()?;

    println!("    ✓ Client ready\n");

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[2] Connecting...");

    client.connect()?;
    let mut state = client.subscribe();
    let connected = tokio::time::timeout(Duration::from_secs(15), state.wait_for(|s| s.is_connected))
        .await
        .is_ok();

    if connected {
        client.update_user_status(UserStatus::Online);
        println!("    ✓ Online\n");
    } else {
        println!("    ✗ Not connected yet, retries continue in the background\n");
    }

    common::wait_for_exit(args.no_wait).await;

    client.disconnect();
    println!("\n=== Done ===");
    Ok(())
}
