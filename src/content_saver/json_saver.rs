use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

/// Timeout for blocking JSON serialization
/// Prevents hangs on pathological data structures
const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Serialize `data` as pretty JSON off the async runtime.
///
/// # Errors
///
/// Returns an error if serialization fails, panics or times out.
pub async fn to_pretty_json<T>(data: T) -> Result<String>
where
    T: Serialize + Send + 'static,
{
    // JSON serialization (keep spawn_blocking - CPU intensive)
    let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&data));

    match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(e)) => Err(anyhow::anyhow!("JSON serialization task panicked: {}", e)),
        Err(_) => {
            log::warn!("JSON serialization timeout (timeout: {:?})", BLOCKING_SERIALIZATION_TIMEOUT);
            Err(anyhow::anyhow!(
                "JSON serialization timed out after {:?} - data structure may be pathological",
                BLOCKING_SERIALIZATION_TIMEOUT
            ))
        }
    }
}

/// Save `data` to `path` as pretty JSON
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub async fn save_json_data<T>(data: T, path: &Path) -> Result<()>
where
    T: Serialize + Send + 'static,
{
    let json_str = to_pretty_json(data).await?;

    // Create directory
    tokio::fs::create_dir_all(
        path.parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?,
    )
    .await?;

    tokio::fs::write(path, json_str)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
