use anyhow::{Context, Result};
use sea_orm::{Database, DatabaseConnection};
use tracing::info;

pub async fn get_db_connection(database_url: &str) -> Result<DatabaseConnection> {
    // the URL carries credentials, so only the host part is logged
    let host = database_url.rsplit('@').next().unwrap_or_default();
    info!("Connecting to database via Sea-ORM at: {}", host);
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("failed to connect to {host}"))?;
    Ok(db)
}
