use crate::errors::AppError;
use crate::models::DashboardData;
use crate::state::AppState;
use crate::storage::persist_data;
use crate::store::{self, Mutation};
use chrono::Utc;
use tracing::info;

/// Read-modify-write of the whole document: apply one mutation, persist the
/// full state, mirror it to the sync endpoint and notify listeners.
pub async fn commit(state: &AppState, mutation: Mutation) -> Result<DashboardData, AppError> {
    let mut data = state.data.lock().await;

    let mut next = data.clone();
    let updates = store::apply(&mut next, mutation)?;
    next.saved_at = Some(Utc::now().to_rfc3339());

    persist_data(&state.data_path, &next).await?;
    *data = next.clone();
    drop(data);

    state.sync.push(&next);
    for update in updates {
        info!(?update, "ticker update");
        state.bus.publish(update);
    }

    Ok(next)
}
