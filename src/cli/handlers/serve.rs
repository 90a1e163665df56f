//! API server handler

use crate::api::serve_api;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve_command(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let cors = cors || config.server.enable_cors;

    println!("🚀 Starting postrag API Server");
    println!("===============================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🌐 CORS: {}", if cors { "Enabled" } else { "Disabled" });
    println!();

    serve_api(config, host, port, cors).await
}
