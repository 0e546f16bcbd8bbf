use crate::broadcast::TickerUpdate;
use crate::errors::AppError;
use crate::models::{DashboardData, Goal, RecurringGoal, TickerItem};
use uuid::Uuid;

const MAX_TICKER_ITEM_LEN: usize = 300;

/// A single change to the dashboard document.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddAmount(f64),
    SetGoal { name: String, target: f64 },
    ClearSetGoal,
    AddMilestone { name: String, target: f64 },
    UpdateMilestone { id: String, name: String, target: f64 },
    RemoveMilestone { id: String },
    SetRecurring { interval: f64, action: String },
    ClearRecurring,
    AddTickerItem { content: String },
    RemoveTickerItem { id: String },
    SetSymbol(String),
    ToggleSymbolPosition,
    ToggleBackground,
    ToggleBorder,
}

/// Applies `mutation` in place and returns the updates listeners should see
/// right away. Nothing is modified when an error is returned.
pub fn apply(data: &mut DashboardData, mutation: Mutation) -> Result<Vec<TickerUpdate>, AppError> {
    let mut updates = Vec::new();

    match mutation {
        Mutation::AddAmount(delta) => {
            if !delta.is_finite() {
                return Err(AppError::bad_request("amount must be a finite number"));
            }
            let crossed = data.apply_amount(delta);
            updates.push(TickerUpdate::AmountChanged {
                current_amount: data.current_amount,
                last_added_amount: delta,
            });
            updates.extend(
                crossed
                    .into_iter()
                    .map(|goal| TickerUpdate::GoalCompleted { goal }),
            );
        }
        Mutation::SetGoal { name, target } => {
            let name = validate_goal(&name, target)?;
            let (id, progress) = data
                .set_goal
                .as_ref()
                .map(|goal| (goal.id.clone(), goal.progress))
                .unwrap_or_else(|| (new_id(), 0.0));
            data.set_goal = Some(Goal {
                id,
                name,
                target,
                progress,
            });
        }
        Mutation::ClearSetGoal => data.set_goal = None,
        Mutation::AddMilestone { name, target } => {
            let name = validate_goal(&name, target)?;
            data.milestone_goals.push(Goal {
                id: new_id(),
                name,
                target,
                progress: 0.0,
            });
        }
        Mutation::UpdateMilestone { id, name, target } => {
            let name = validate_goal(&name, target)?;
            let goal = data
                .milestone_goals
                .iter_mut()
                .find(|goal| goal.id == id)
                .ok_or_else(|| AppError::not_found(format!("no milestone goal with id {id}")))?;
            goal.name = name;
            goal.target = target;
        }
        Mutation::RemoveMilestone { id } => {
            let before = data.milestone_goals.len();
            data.milestone_goals.retain(|goal| goal.id != id);
            if data.milestone_goals.len() == before {
                return Err(AppError::not_found(format!("no milestone goal with id {id}")));
            }
        }
        Mutation::SetRecurring { interval, action } => {
            if !(interval.is_finite() && interval > 0.0) {
                return Err(AppError::bad_request("interval must be greater than zero"));
            }
            let action = action.trim();
            if action.is_empty() {
                return Err(AppError::bad_request("action must not be empty"));
            }
            data.recurring_goal = Some(RecurringGoal {
                interval,
                action: action.to_string(),
            });
        }
        Mutation::ClearRecurring => data.recurring_goal = None,
        Mutation::AddTickerItem { content } => {
            let content = content.trim();
            if content.is_empty() {
                return Err(AppError::bad_request("ticker item must not be empty"));
            }
            if content.chars().count() > MAX_TICKER_ITEM_LEN {
                return Err(AppError::bad_request(format!(
                    "ticker item must be at most {MAX_TICKER_ITEM_LEN} characters"
                )));
            }
            let kind = data
                .ticker_items
                .first()
                .map(|item| item.kind.clone())
                .unwrap_or_else(|| "default".to_string());
            data.ticker_items.push(TickerItem {
                id: new_id(),
                content: content.to_string(),
                kind,
            });
        }
        Mutation::RemoveTickerItem { id } => {
            let before = data.ticker_items.len();
            data.ticker_items.retain(|item| item.id != id);
            if data.ticker_items.len() == before {
                return Err(AppError::not_found(format!("no ticker item with id {id}")));
            }
        }
        Mutation::SetSymbol(symbol) => {
            let symbol = symbol.trim();
            if symbol.is_empty() {
                return Err(AppError::bad_request("symbol must not be empty"));
            }
            data.symbol = symbol.to_string();
        }
        Mutation::ToggleSymbolPosition => data.symbol_position = data.symbol_position.toggled(),
        Mutation::ToggleBackground => data.show_background = !data.show_background,
        Mutation::ToggleBorder => data.show_border = !data.show_border,
    }

    Ok(updates)
}

fn validate_goal(name: &str, target: f64) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("goal name must not be empty"));
    }
    if !(target.is_finite() && target > 0.0) {
        return Err(AppError::bad_request("goal target must be greater than zero"));
    }
    Ok(name.to_string())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
