//! Offline session against the in-memory connector.
//!
//! Demonstrates:
//! - Mounting a provider and consuming the shared client
//! - Built-in notifications delivered to a UI channel
//! - Automatic presence driven by page visibility
//! - Reconnection after an abnormal close
//!
//! Usage:
//!   cargo run --example 001_memory_session
//!   cargo run --example 001_memory_session -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use social_realtime::transport::Frame;
use social_realtime::{
    ChatId, ClientOptions, MemoryConnector, Notification, PageState, RealtimeClient,
    RealtimeProvider, Result, Scope, StaticCredential, Visibility, use_realtime,
};
use tokio::sync::mpsc;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== 001: Memory Session ===\n");

    // ========================================================================
    // Mount Provider
    // ========================================================================

    println!("[1] Mounting provider...");

    let (connector, mut listener) = MemoryConnector::new();
    let (notifications, mut toasts) = mpsc::unbounded_channel::<Notification>();
    let page = PageState::new();

    let app = Scope::root();
    let _provider = RealtimeProvider::mount(
        &app,
        RealtimeClient::builder()
            .api_base_url("https://api.example.com")
            .credentials(StaticCredential::new("demo-token"))
            .connector(connector)
            .notifier(notifications)
            .page(page.clone())
            .options(ClientOptions::new().with_reconnect_interval(Duration::from_millis(200))),
    )?;

    let Some(mut socket) = listener.accept().await else {
        return Ok(());
    };
    println!("    ✓ Socket requested: {}\n", socket.url());

    // ========================================================================
    // Server Events
    // ========================================================================

    println!("[2] Delivering server events...");

    socket.open();
    socket.deliver(r#"{"type":"connection_established"}"#);
    socket.deliver(r#"{"type":"connection_request","data":{"sender_name":"Alice"}}"#);
    socket.deliver(r#"{"type":"message_reaction","reaction":{"user_name":"Bob","emoji":"👍"}}"#);

    for _ in 0..3 {
        if let Some(toast) = toasts.recv().await {
            println!("    • {toast}");
        }
    }
    println!();

    // ========================================================================
    // Presence
    // ========================================================================

    println!("[3] Typing and presence...");

    let chat_view = app.child();
    let realtime = use_realtime(&chat_view)?;
    realtime.send_typing_status(ChatId::new(42), true);
    page.set_visibility(Visibility::Hidden);

    for _ in 0..2 {
        if let Some(Frame::Text(text)) = socket.next_frame().await {
            println!("    → {text}");
        }
    }
    page.set_visibility(Visibility::Visible);
    println!();

    // ========================================================================
    // Reconnect
    // ========================================================================

    println!("[4] Dropping the connection...");

    socket.close(1006, "");
    // Keep the server end alive while connected
    let retry = listener.accept().await;
    if let Some(retry) = &retry {
        println!(
            "    ✓ Reconnecting (attempt {})",
            realtime.reconnect_attempts()
        );
        retry.open();
    }

    let mut state = realtime.subscribe();
    let _ = state.wait_for(|s| s.is_connected).await;
    println!("    ✓ Connected again\n");

    println!("=== Done ===");
    Ok(())
}
