use crate::controller::commit;
use crate::errors::AppError;
use crate::models::{
    AmountRequest, DashboardData, GoalRequest, RecurringGoalRequest, RecurringProgress,
    SubsRequest, SuccessResponse, SymbolRequest, TickerItemRequest,
};
use crate::state::AppState;
use crate::storage::{load_goals_document, persist_goals_document};
use crate::store::Mutation;
use crate::ticker::TickerFrame;
use crate::ui::{render_dashboard, render_ticker};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde_json::Value;
use tracing::debug;

const SUB_MULTIPLIERS: [u32; 3] = [5, 10, 30];

type DataResult = Result<Json<DashboardData>, AppError>;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(render_dashboard(&data))
}

pub async fn ticker_page() -> Html<String> {
    Html(render_ticker())
}

pub async fn get_state(State(state): State<AppState>) -> Json<DashboardData> {
    let data = state.data.lock().await;
    Json(data.clone())
}

pub async fn post_amount(
    State(state): State<AppState>,
    Json(payload): Json<AmountRequest>,
) -> DataResult {
    if !(payload.amount.is_finite() && payload.amount > 0.0) {
        return Err(AppError::bad_request("amount must be a positive number"));
    }
    let delta = match payload.action.trim() {
        "add" => payload.amount,
        "sub" => -payload.amount,
        _ => return Err(AppError::bad_request("action must be 'add' or 'sub'")),
    };

    Ok(Json(commit(&state, Mutation::AddAmount(delta)).await?))
}

pub async fn post_subs(State(state): State<AppState>, Json(payload): Json<SubsRequest>) -> DataResult {
    if payload.count == 0 {
        return Err(AppError::bad_request("count must be at least 1"));
    }
    if !SUB_MULTIPLIERS.contains(&payload.multiplier) {
        return Err(AppError::bad_request("multiplier must be 5, 10 or 30"));
    }
    let delta = f64::from(payload.count) * f64::from(payload.multiplier);

    Ok(Json(commit(&state, Mutation::AddAmount(delta)).await?))
}

pub async fn put_goal(State(state): State<AppState>, Json(payload): Json<GoalRequest>) -> DataResult {
    let mutation = Mutation::SetGoal {
        name: payload.name,
        target: payload.target,
    };
    Ok(Json(commit(&state, mutation).await?))
}

pub async fn delete_goal(State(state): State<AppState>) -> DataResult {
    Ok(Json(commit(&state, Mutation::ClearSetGoal).await?))
}

pub async fn post_milestone(
    State(state): State<AppState>,
    Json(payload): Json<GoalRequest>,
) -> DataResult {
    let mutation = Mutation::AddMilestone {
        name: payload.name,
        target: payload.target,
    };
    Ok(Json(commit(&state, mutation).await?))
}

pub async fn put_milestone(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<GoalRequest>,
) -> DataResult {
    let mutation = Mutation::UpdateMilestone {
        id,
        name: payload.name,
        target: payload.target,
    };
    Ok(Json(commit(&state, mutation).await?))
}

pub async fn delete_milestone(State(state): State<AppState>, Path(id): Path<String>) -> DataResult {
    Ok(Json(commit(&state, Mutation::RemoveMilestone { id }).await?))
}

pub async fn put_recurring(
    State(state): State<AppState>,
    Json(payload): Json<RecurringGoalRequest>,
) -> DataResult {
    let mutation = Mutation::SetRecurring {
        interval: payload.interval,
        action: payload.action,
    };
    Ok(Json(commit(&state, mutation).await?))
}

pub async fn delete_recurring(State(state): State<AppState>) -> DataResult {
    Ok(Json(commit(&state, Mutation::ClearRecurring).await?))
}

pub async fn get_recurring_progress(
    State(state): State<AppState>,
) -> Result<Json<RecurringProgress>, AppError> {
    let data = state.data.lock().await;
    data.recurring_progress()
        .map(Json)
        .ok_or_else(|| AppError::not_found("no recurring goal configured"))
}

pub async fn post_ticker_item(
    State(state): State<AppState>,
    Json(payload): Json<TickerItemRequest>,
) -> DataResult {
    let mutation = Mutation::AddTickerItem {
        content: payload.content,
    };
    Ok(Json(commit(&state, mutation).await?))
}

pub async fn delete_ticker_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> DataResult {
    Ok(Json(commit(&state, Mutation::RemoveTickerItem { id }).await?))
}

pub async fn put_symbol(State(state): State<AppState>, Json(payload): Json<SymbolRequest>) -> DataResult {
    Ok(Json(commit(&state, Mutation::SetSymbol(payload.symbol)).await?))
}

pub async fn toggle_symbol_position(State(state): State<AppState>) -> DataResult {
    Ok(Json(commit(&state, Mutation::ToggleSymbolPosition).await?))
}

pub async fn toggle_background(State(state): State<AppState>) -> DataResult {
    Ok(Json(commit(&state, Mutation::ToggleBackground).await?))
}

pub async fn toggle_border(State(state): State<AppState>) -> DataResult {
    Ok(Json(commit(&state, Mutation::ToggleBorder).await?))
}

pub async fn get_frame(State(state): State<AppState>) -> Json<TickerFrame> {
    Json(state.frames.borrow().clone())
}

/// The overlay reads from the local store, so there is nothing to serve here.
pub async fn get_ticker() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Sync target for committed documents. Accepts anything and keeps nothing.
pub async fn post_ticker(Json(payload): Json<Value>) -> Json<SuccessResponse> {
    debug!(bytes = payload.to_string().len(), "ticker sync received");
    Json(SuccessResponse { success: true })
}

pub async fn get_goals(State(state): State<AppState>) -> Json<Value> {
    let document = load_goals_document(&state.goals_path).await;
    Json(document.unwrap_or_else(|| Value::Object(Default::default())))
}

pub async fn post_goals(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<SuccessResponse>, AppError> {
    persist_goals_document(&state.goals_path, &payload).await?;
    Ok(Json(SuccessResponse { success: true }))
}
