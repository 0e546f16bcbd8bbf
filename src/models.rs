use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    #[default]
    Left,
    Right,
}

impl SymbolPosition {
    pub fn toggled(self) -> Self {
        match self {
            SymbolPosition::Left => SymbolPosition::Right,
            SymbolPosition::Right => SymbolPosition::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub target: f64,
    #[serde(default)]
    pub progress: f64,
}

impl Goal {
    /// Progress as a percentage of the target. Not capped: a goal past its
    /// target reports more than 100.
    pub fn percent(&self) -> f64 {
        self.progress / self.target * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.target
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringGoal {
    pub interval: f64,
    pub action: String,
}

impl RecurringGoal {
    pub fn progress_at(&self, amount: f64) -> RecurringProgress {
        RecurringProgress {
            interval: self.interval,
            action: self.action.clone(),
            times_reached: (amount / self.interval).floor() as u64,
            next_milestone: (amount / self.interval).ceil() * self.interval,
            in_interval: amount % self.interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringProgress {
    pub interval: f64,
    pub action: String,
    pub times_reached: u64,
    pub next_milestone: f64,
    pub in_interval: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerItem {
    pub id: String,
    pub content: String,
    #[serde(rename = "type", default = "default_item_type")]
    pub kind: String,
}

fn default_item_type() -> String {
    "default".to_string()
}

fn default_symbol() -> String {
    "$".to_string()
}

fn default_true() -> bool {
    true
}

/// The whole persisted dashboard document. Every mutation rewrites all of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub set_goal: Option<Goal>,
    #[serde(default)]
    pub milestone_goals: Vec<Goal>,
    #[serde(default)]
    pub recurring_goal: Option<RecurringGoal>,
    #[serde(default)]
    pub ticker_items: Vec<TickerItem>,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default)]
    pub symbol_position: SymbolPosition,
    #[serde(default = "default_true")]
    pub show_background: bool,
    #[serde(default = "default_true")]
    pub show_border: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl Default for DashboardData {
    fn default() -> Self {
        Self {
            current_amount: 0.0,
            set_goal: None,
            milestone_goals: Vec::new(),
            recurring_goal: None,
            ticker_items: Vec::new(),
            symbol: default_symbol(),
            symbol_position: SymbolPosition::Left,
            show_background: true,
            show_border: true,
            saved_at: None,
        }
    }
}

impl DashboardData {
    /// Set goal first, then milestones in insertion order.
    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.set_goal.iter().chain(self.milestone_goals.iter())
    }

    pub fn has_goals(&self) -> bool {
        self.set_goal.is_some() || !self.milestone_goals.is_empty()
    }

    /// Adds `delta` to the running amount and to every goal, clamping each at
    /// zero. Returns the goals that crossed their target with this update.
    pub fn apply_amount(&mut self, delta: f64) -> Vec<Goal> {
        self.current_amount = (self.current_amount + delta).max(0.0);

        let mut crossed = Vec::new();
        let goals = self.set_goal.iter_mut().chain(self.milestone_goals.iter_mut());
        for goal in goals {
            let was_complete = goal.is_complete();
            goal.progress = (goal.progress + delta).max(0.0);
            if !was_complete && goal.is_complete() {
                crossed.push(goal.clone());
            }
        }
        crossed
    }

    pub fn recurring_progress(&self) -> Option<RecurringProgress> {
        self.recurring_goal
            .as_ref()
            .map(|goal| goal.progress_at(self.current_amount))
    }

    pub fn display(&self) -> DisplayPreferences {
        DisplayPreferences {
            symbol: self.symbol.clone(),
            symbol_position: self.symbol_position,
            show_background: self.show_background,
            show_border: self.show_border,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPreferences {
    pub symbol: String,
    pub symbol_position: SymbolPosition,
    pub show_background: bool,
    pub show_border: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        DashboardData::default().display()
    }
}

impl DisplayPreferences {
    pub fn format_amount(&self, amount: f64) -> String {
        match self.symbol_position {
            SymbolPosition::Left => format!("{}{:.2}", self.symbol, amount),
            SymbolPosition::Right => format!("{:.2}{}", amount, self.symbol),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub action: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct SubsRequest {
    pub count: u32,
    pub multiplier: u32,
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub name: String,
    pub target: f64,
}

#[derive(Debug, Deserialize)]
pub struct RecurringGoalRequest {
    pub interval: f64,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct TickerItemRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SymbolRequest {
    pub symbol: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(id: &str, target: f64, progress: f64) -> Goal {
        Goal {
            id: id.to_string(),
            name: id.to_string(),
            target,
            progress,
        }
    }

    #[test]
    fn amount_never_goes_negative() {
        let mut data = DashboardData::default();
        for delta in [5.0, -20.0, 3.5, -1.0, -100.0, 42.0] {
            let before = data.current_amount;
            data.apply_amount(delta);
            assert_eq!(data.current_amount, (before + delta).max(0.0));
            assert!(data.current_amount >= 0.0);
        }
    }

    #[test]
    fn crossing_is_reported_once() {
        let mut data = DashboardData::default();
        data.milestone_goals.push(goal("m1", 100.0, 0.0));

        assert!(data.apply_amount(60.0).is_empty());
        assert_eq!(data.milestone_goals[0].percent(), 60.0);

        let crossed = data.apply_amount(50.0);
        assert_eq!(crossed.len(), 1);
        assert_eq!(crossed[0].id, "m1");
        assert_eq!(data.current_amount, 110.0);

        assert!(data.apply_amount(10.0).is_empty());
    }

    #[test]
    fn recurring_progress_is_derived_from_amount() {
        let recurring = RecurringGoal {
            interval: 50.0,
            action: "sub".to_string(),
        };
        let progress = recurring.progress_at(130.0);
        assert_eq!(progress.times_reached, 2);
        assert_eq!(progress.next_milestone, 150.0);
        assert_eq!(progress.in_interval, 30.0);
    }

    #[test]
    fn legacy_blob_without_optional_fields_loads() {
        let raw = r#"{
            "currentAmount": 12.5,
            "setGoal": {"id": "1", "name": "Camera", "target": 200},
            "milestoneGoals": [],
            "recurringGoal": null,
            "tickerItems": [{"id": "a", "content": "hello"}],
            "symbol": "€",
            "symbolPosition": "right"
        }"#;
        let data: DashboardData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.set_goal.as_ref().unwrap().progress, 0.0);
        assert_eq!(data.ticker_items[0].kind, "default");
        assert!(data.show_background);
        assert!(data.show_border);
        assert_eq!(data.display().format_amount(3.0), "3.00€");
    }
}
