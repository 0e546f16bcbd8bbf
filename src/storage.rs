use crate::errors::AppError;
use crate::models::DashboardData;
use serde::{Serialize, de::DeserializeOwned};
use std::{collections::BTreeSet, env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;
use uuid::Uuid;

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> DashboardData {
    load_json(path).await
}

/// Reads the data file for a refresh. A missing, unreadable or partially
/// written file gives `None`, so the caller keeps the data it already has.
pub async fn read_data(path: &Path) -> Option<DashboardData> {
    read_json(path).await
}

pub async fn persist_data(path: &Path, data: &DashboardData) -> Result<(), AppError> {
    persist_json(path, data).await
}

/// Ids of goals whose celebration has already played.
pub async fn load_completed(path: &Path) -> BTreeSet<String> {
    load_json(path).await
}

pub async fn persist_completed(path: &Path, ids: &BTreeSet<String>) -> Result<(), AppError> {
    persist_json(path, ids).await
}

/// Free-form goals document stored by `POST /api/goals`.
pub async fn load_goals_document(path: &Path) -> Option<serde_json::Value> {
    load_json(path).await
}

pub async fn persist_goals_document(
    path: &Path,
    document: &serde_json::Value,
) -> Result<(), AppError> {
    persist_json(path, document).await
}

async fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    read_json(path).await.unwrap_or_default()
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(path = %path.display(), "failed to parse data file: {err}");
                None
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            error!(path = %path.display(), "failed to read data file: {err}");
            None
        }
    }
}

/// Writes to a sibling temp file and renames it over `path`, so readers see
/// either the old document or the new one.
async fn persist_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(value)?;
    let tmp = temp_sibling(path);
    fs::write(&tmp, payload).await?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}
