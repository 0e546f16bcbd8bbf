use crate::models::{DashboardData, Goal};
use std::collections::BTreeSet;

/// Remembers which goals already had their celebration so a goal sitting at
/// or above its target is celebrated once per crossing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionTracker {
    shown: BTreeSet<String>,
}

impl CompletionTracker {
    pub fn new(shown: BTreeSet<String>) -> Self {
        Self { shown }
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.shown
    }

    pub fn is_shown(&self, id: &str) -> bool {
        self.shown.contains(id)
    }

    /// Returns true the first time a goal id is marked.
    pub fn mark(&mut self, id: &str) -> bool {
        self.shown.insert(id.to_string())
    }

    /// Goals at or above target that have not been celebrated yet.
    pub fn newly_completed(&self, data: &DashboardData) -> Vec<Goal> {
        data.goals()
            .filter(|goal| goal.is_complete() && !self.is_shown(&goal.id))
            .cloned()
            .collect()
    }

    /// Forgets goals that were removed or fell back under their target, so
    /// they can be celebrated again on a later crossing. Returns whether
    /// anything was dropped.
    pub fn prune(&mut self, data: &DashboardData) -> bool {
        let before = self.shown.len();
        self.shown.retain(|id| {
            data.goals()
                .find(|goal| &goal.id == id)
                .is_some_and(Goal::is_complete)
        });
        self.shown.len() != before
    }
}
