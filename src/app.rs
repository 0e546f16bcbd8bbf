use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/ticker", get(handlers::ticker_page))
        .route("/api/state", get(handlers::get_state))
        .route("/api/amount", post(handlers::post_amount))
        .route("/api/subs", post(handlers::post_subs))
        .route("/api/goal", put(handlers::put_goal).delete(handlers::delete_goal))
        .route("/api/milestones", post(handlers::post_milestone))
        .route(
            "/api/milestones/:id",
            put(handlers::put_milestone).delete(handlers::delete_milestone),
        )
        .route(
            "/api/recurring",
            put(handlers::put_recurring).delete(handlers::delete_recurring),
        )
        .route("/api/recurring/progress", get(handlers::get_recurring_progress))
        .route("/api/ticker-items", post(handlers::post_ticker_item))
        .route("/api/ticker-items/:id", delete(handlers::delete_ticker_item))
        .route("/api/display/symbol", put(handlers::put_symbol))
        .route(
            "/api/display/symbol-position/toggle",
            post(handlers::toggle_symbol_position),
        )
        .route("/api/display/background/toggle", post(handlers::toggle_background))
        .route("/api/display/border/toggle", post(handlers::toggle_border))
        .route("/api/ticker", get(handlers::get_ticker).post(handlers::post_ticker))
        .route("/api/ticker/frame", get(handlers::get_frame))
        .route("/api/goals", get(handlers::get_goals).post(handlers::post_goals))
        .with_state(state)
}
