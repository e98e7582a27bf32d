//! Serve command implementation

use std::path::Path;

use anyhow::Result;
use recur_core::DetectionPolicy;
use recur_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    policy: DetectionPolicy,
    host: &str,
    port: u16,
    cors_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Recur web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Cluster strategy: {}", policy.cluster_strategy);
    if !cors_origins.is_empty() {
        println!("   CORS origins: {}", cors_origins.join(", "));
    }

    let db = open_db(db_path)?;
    let config = ServerConfig {
        allowed_origins: cors_origins,
    };
    recur_server::serve(db, policy, host, port, config).await
}
