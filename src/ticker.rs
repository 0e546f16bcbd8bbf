//! Rotation engine behind the ticker overlay.
//!
//! The engine owns a copy of the dashboard document and decides which single
//! item the overlay shows: a goal's progress bar, the recurring goal, a custom
//! text item, or a one-shot "Goal Completed" celebration. It never reads a
//! clock itself; callers pass the elapsed time on every call so the whole
//! sequence can be replayed deterministically.

use crate::broadcast::TickerUpdate;
use crate::completion::CompletionTracker;
use crate::config::TickerTiming;
use crate::models::{DashboardData, DisplayPreferences, Goal, RecurringProgress, TickerItem};
use crate::progress::{BarView, ProgressBar};
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

pub const RECURRING_ITEM_ID: &str = "recurring-goal";

/// Share of the total weight reserved for custom items when any exist.
const CUSTOM_SHARE: f64 = 0.25;
/// Extra weight for a goal that has started moving.
const STARTED_BONUS: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateKind {
    Goal(Goal),
    Recurring,
    Custom(TickerItem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub kind: CandidateKind,
    pub weight: f64,
}

/// Relative score of a goal before normalisation. Completed goals score zero.
pub fn goal_score(goal: &Goal) -> f64 {
    if goal.is_complete() {
        return 0.0;
    }
    let bonus = if goal.progress > 0.0 { STARTED_BONUS } else { 0.0 };
    1.0 + goal.percent() / 100.0 + bonus
}

/// Everything eligible for the next rotation, with normalised weights.
pub fn candidates(data: &DashboardData, completions: &CompletionTracker) -> Vec<Candidate> {
    let goals: Vec<(&Goal, f64)> = data
        .goals()
        .filter(|goal| !completions.is_shown(&goal.id))
        .map(|goal| (goal, goal_score(goal)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    let custom_share = if data.ticker_items.is_empty() {
        0.0
    } else {
        CUSTOM_SHARE
    };
    let goal_total: f64 = goals.iter().map(|(_, score)| score).sum();
    let recurring_total = if data.recurring_goal.is_some() { 1.0 } else { 0.0 };
    let denominator = goal_total + recurring_total;
    let normalizer = if denominator > 0.0 {
        (1.0 - custom_share) / denominator
    } else {
        0.0
    };

    let mut out = Vec::with_capacity(goals.len() + data.ticker_items.len() + 1);
    out.extend(goals.into_iter().map(|(goal, score)| Candidate {
        id: goal.id.clone(),
        kind: CandidateKind::Goal(goal.clone()),
        weight: score * normalizer,
    }));
    if data.recurring_goal.is_some() {
        out.push(Candidate {
            id: RECURRING_ITEM_ID.to_string(),
            kind: CandidateKind::Recurring,
            weight: normalizer,
        });
    }
    if !data.ticker_items.is_empty() {
        let each = custom_share / data.ticker_items.len() as f64;
        out.extend(data.ticker_items.iter().map(|item| Candidate {
            id: item.id.clone(),
            kind: CandidateKind::Custom(item.clone()),
            weight: each,
        }));
    }
    out
}

/// Weighted draw. `unit` is a uniform sample from `[0, 1)`. The item shown
/// last is skipped unless nothing else is left.
pub fn pick<'a>(candidates: &'a [Candidate], last: Option<&str>, unit: f64) -> Option<&'a Candidate> {
    let mut available: Vec<&Candidate> = candidates
        .iter()
        .filter(|candidate| Some(candidate.id.as_str()) != last)
        .collect();
    if available.is_empty() {
        available = candidates.iter().collect();
    }

    let total: f64 = available.iter().map(|candidate| candidate.weight).sum();
    let draw = unit * total;
    let mut cumulative = 0.0;
    for &candidate in &available {
        cumulative += candidate.weight;
        if cumulative >= draw {
            return Some(candidate);
        }
    }
    available.last().copied()
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickerContent {
    /// Nothing configured yet.
    Empty,
    Goal { id: String, bar: ProgressBar },
    Recurring { bar: ProgressBar, progress: RecurringProgress },
    Custom { id: String, text: String },
    Celebration { goal: Goal, bar: ProgressBar },
    AllGoalsCompleted,
}

impl TickerContent {
    pub fn item_id(&self) -> Option<&str> {
        match self {
            TickerContent::Goal { id, .. } | TickerContent::Custom { id, .. } => Some(id.as_str()),
            TickerContent::Celebration { goal, .. } => Some(goal.id.as_str()),
            TickerContent::Recurring { .. } => Some(RECURRING_ITEM_ID),
            TickerContent::Empty | TickerContent::AllGoalsCompleted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameKind {
    Empty,
    Goal,
    Recurring,
    Custom,
    Celebration,
    AllGoalsCompleted,
}

/// Snapshot of the overlay at one instant, served to the ticker page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerFrame {
    pub kind: FrameKind,
    pub visible: bool,
    pub item_id: Option<String>,
    pub bar: Option<BarView>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub show_background: bool,
    pub show_border: bool,
}

impl Default for TickerFrame {
    fn default() -> Self {
        Self {
            kind: FrameKind::Empty,
            visible: false,
            item_id: None,
            bar: None,
            text: None,
            caption: None,
            show_background: true,
            show_border: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Transition {
    Rotate,
    Spotlight,
    Celebrate(Goal),
}

impl Transition {
    fn priority(&self) -> u8 {
        match self {
            Transition::Rotate => 0,
            Transition::Spotlight => 1,
            Transition::Celebrate(_) => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Showing,
    FadingOut { until: Duration, next: Transition },
    FadingIn { until: Duration },
}

/// Ids and intervals whose change resets the anti-repeat memory.
#[derive(Debug, PartialEq)]
struct Structure {
    set_goal: Option<String>,
    milestones: Vec<String>,
    recurring_interval: Option<f64>,
    items: Vec<String>,
}

impl Structure {
    fn of(data: &DashboardData) -> Self {
        Self {
            set_goal: data.set_goal.as_ref().map(|goal| goal.id.clone()),
            milestones: data.milestone_goals.iter().map(|goal| goal.id.clone()).collect(),
            recurring_interval: data.recurring_goal.as_ref().map(|goal| goal.interval),
            items: data.ticker_items.iter().map(|item| item.id.clone()).collect(),
        }
    }
}

pub struct TickerEngine {
    timing: TickerTiming,
    data: DashboardData,
    completions: CompletionTracker,
    completions_dirty: bool,
    content: TickerContent,
    visible: bool,
    phase: Phase,
    last_shown: Option<String>,
    next_rotation_at: Duration,
    celebration_until: Option<Duration>,
    queued_celebrations: VecDeque<Goal>,
    last_delta: f64,
}

impl TickerEngine {
    /// The first tick at or after `now` fills the empty overlay.
    pub fn new(
        timing: TickerTiming,
        data: DashboardData,
        completions: CompletionTracker,
        now: Duration,
    ) -> Self {
        let mut engine = Self {
            timing,
            data,
            completions,
            completions_dirty: false,
            content: TickerContent::Empty,
            visible: false,
            phase: Phase::FadingOut {
                until: now,
                next: Transition::Rotate,
            },
            last_shown: None,
            next_rotation_at: now + timing.rotation_interval,
            celebration_until: None,
            queued_celebrations: VecDeque::new(),
            last_delta: 0.0,
        };
        engine.after_data_change(0.0, now);
        engine
    }

    pub fn data(&self) -> &DashboardData {
        &self.data
    }

    pub fn content(&self) -> &TickerContent {
        &self.content
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebration_until.is_some()
    }

    pub fn last_shown(&self) -> Option<&str> {
        self.last_shown.as_deref()
    }

    pub fn completions(&self) -> &CompletionTracker {
        &self.completions
    }

    /// Celebrated ids, if they changed since the last call.
    pub fn take_completions_change(&mut self) -> Option<BTreeSet<String>> {
        if !self.completions_dirty {
            return None;
        }
        self.completions_dirty = false;
        Some(self.completions.ids().clone())
    }

    /// Takes over a freshly loaded document (the slow, polled path).
    pub fn observe(&mut self, snapshot: DashboardData, now: Duration) {
        if Structure::of(&self.data) != Structure::of(&snapshot) {
            self.last_shown = None;
        }
        let delta = snapshot.current_amount - self.data.current_amount;
        self.data = snapshot;
        self.after_data_change(delta, now);
    }

    /// Reacts to an update pushed over the bus (the fast path).
    pub fn handle_update(&mut self, update: TickerUpdate, now: Duration) {
        match update {
            TickerUpdate::AmountChanged {
                current_amount,
                last_added_amount,
            } => {
                // the poll may have picked this change up already
                if self.data.current_amount == current_amount {
                    return;
                }
                self.data.apply_amount(last_added_amount);
                self.data.current_amount = current_amount;
                self.after_data_change(last_added_amount, now);
            }
            TickerUpdate::GoalCompleted { goal } => {
                if self.completions.mark(&goal.id) {
                    self.completions_dirty = true;
                    self.begin(Transition::Celebrate(goal), now);
                }
            }
        }
    }

    /// Advances fades, the celebration window and the rotation timer.
    pub fn tick<R: Rng>(&mut self, now: Duration, rng: &mut R) {
        let phase = std::mem::replace(&mut self.phase, Phase::Showing);
        self.phase = match phase {
            Phase::FadingOut { until, next } if now >= until => {
                self.swap(next, now, rng);
                self.visible = true;
                Phase::FadingIn {
                    until: now + self.timing.fade_in,
                }
            }
            Phase::FadingIn { until } if now >= until => Phase::Showing,
            other => other,
        };

        if let Some(end) = self.celebration_until {
            if now >= end {
                self.celebration_until = None;
                let next = self
                    .queued_celebrations
                    .pop_front()
                    .map(Transition::Celebrate)
                    .unwrap_or(Transition::Rotate);
                self.begin(next, now);
            }
        }

        if now >= self.next_rotation_at && !self.timing.rotation_interval.is_zero() {
            while self.next_rotation_at <= now {
                self.next_rotation_at += self.timing.rotation_interval;
            }
            self.begin(Transition::Rotate, now);
        }
    }

    pub fn frame(&self, now: Duration) -> TickerFrame {
        let prefs = self.data.display();
        let mut frame = TickerFrame {
            visible: self.visible,
            item_id: self.content.item_id().map(str::to_string),
            show_background: prefs.show_background,
            show_border: prefs.show_border,
            ..TickerFrame::default()
        };

        match &self.content {
            TickerContent::Empty => {}
            TickerContent::Goal { bar, .. } => {
                frame.kind = FrameKind::Goal;
                frame.bar = Some(bar.view(now, &prefs));
            }
            TickerContent::Recurring { bar, progress } => {
                frame.kind = FrameKind::Recurring;
                frame.bar = Some(bar.view(now, &prefs));
                frame.caption = Some(recurring_caption(progress, &prefs));
            }
            TickerContent::Custom { text, .. } => {
                frame.kind = FrameKind::Custom;
                frame.text = Some(text.clone());
            }
            TickerContent::Celebration { bar, .. } => {
                frame.kind = FrameKind::Celebration;
                frame.bar = Some(bar.view(now, &prefs));
                frame.caption = Some("Incentive Met!".to_string());
            }
            TickerContent::AllGoalsCompleted => {
                frame.kind = FrameKind::AllGoalsCompleted;
                frame.text = Some("All goals completed!".to_string());
            }
        }
        frame
    }

    fn after_data_change(&mut self, delta: f64, now: Duration) {
        if self.completions.prune(&self.data) {
            self.completions_dirty = true;
        }

        let fresh = self.completions.newly_completed(&self.data);
        let celebrating = !fresh.is_empty();
        for goal in fresh {
            self.completions.mark(&goal.id);
            self.completions_dirty = true;
            self.begin(Transition::Celebrate(goal), now);
        }

        if delta != 0.0 {
            self.last_delta = delta;
            if !celebrating {
                self.begin(Transition::Spotlight, now);
            }
        }
    }

    /// Starts fading out towards `next`. A pending transition is replaced only
    /// by one of equal or higher priority; while a celebration is up or about
    /// to be, further celebrations queue and everything else is dropped.
    fn begin(&mut self, next: Transition, now: Duration) {
        let celebration_held = self.celebration_until.is_some()
            || matches!(
                self.phase,
                Phase::FadingOut {
                    next: Transition::Celebrate(_),
                    ..
                }
            );
        if celebration_held {
            if let Transition::Celebrate(goal) = next {
                self.queued_celebrations.push_back(goal);
            }
            return;
        }

        if let Phase::FadingOut { next: pending, .. } = &mut self.phase {
            if next.priority() >= pending.priority() {
                *pending = next;
            }
            return;
        }

        self.phase = Phase::FadingOut {
            until: now + self.timing.fade_out,
            next,
        };
        self.visible = false;
    }

    fn swap<R: Rng>(&mut self, next: Transition, now: Duration, rng: &mut R) {
        self.content = match next {
            Transition::Celebrate(goal) => self.celebrate(goal, now),
            Transition::Spotlight => match self.most_progressed_goal() {
                Some(goal) => {
                    let bar = self.goal_bar(&goal, now);
                    TickerContent::Goal { id: goal.id, bar }
                }
                None => self.rotate(now, rng),
            },
            Transition::Rotate => self.rotate(now, rng),
        };
        self.last_delta = 0.0;
    }

    fn rotate<R: Rng>(&mut self, now: Duration, rng: &mut R) -> TickerContent {
        let mut fresh = self.completions.newly_completed(&self.data).into_iter();
        if let Some(goal) = fresh.next() {
            for goal in std::iter::once(&goal).chain(fresh.as_slice()) {
                self.completions.mark(&goal.id);
            }
            self.completions_dirty = true;
            self.queued_celebrations.extend(fresh);
            return self.celebrate(goal, now);
        }

        let pool = candidates(&self.data, &self.completions);
        let unit: f64 = rng.random();
        let Some(choice) = pick(&pool, self.last_shown.as_deref(), unit) else {
            return if self.data.has_goals() {
                TickerContent::AllGoalsCompleted
            } else {
                TickerContent::Empty
            };
        };

        self.last_shown = Some(choice.id.clone());
        match &choice.kind {
            CandidateKind::Goal(goal) => TickerContent::Goal {
                id: goal.id.clone(),
                bar: self.goal_bar(goal, now),
            },
            CandidateKind::Recurring => self.recurring_content(now),
            CandidateKind::Custom(item) => TickerContent::Custom {
                id: item.id.clone(),
                text: item.content.clone(),
            },
        }
    }

    fn celebrate(&mut self, goal: Goal, now: Duration) -> TickerContent {
        self.celebration_until = Some(now + self.timing.celebration_window);
        self.last_shown = Some(goal.id.clone());
        let previous = (goal.progress - self.last_delta).clamp(0.0, goal.target);
        let bar = ProgressBar::new(
            format!("Goal Completed: {}", goal.name),
            goal.target,
            goal.target,
            previous,
            now,
            &self.timing,
        );
        TickerContent::Celebration { goal, bar }
    }

    fn goal_bar(&self, goal: &Goal, now: Duration) -> ProgressBar {
        let previous = (goal.progress - self.last_delta).max(0.0);
        ProgressBar::new(
            goal.name.clone(),
            goal.progress,
            goal.target,
            previous,
            now,
            &self.timing,
        )
    }

    fn recurring_content(&self, now: Duration) -> TickerContent {
        let Some(recurring) = self.data.recurring_goal.as_ref() else {
            return TickerContent::Empty;
        };
        let amount = self.data.current_amount;
        let progress = recurring.progress_at(amount);

        let before = (amount - self.last_delta).max(0.0);
        let same_interval =
            (before / recurring.interval).floor() == (amount / recurring.interval).floor();
        let previous = if same_interval {
            before % recurring.interval
        } else {
            0.0
        };

        let bar = ProgressBar::new(
            recurring.action.clone(),
            progress.in_interval,
            recurring.interval,
            previous,
            now,
            &self.timing,
        );
        TickerContent::Recurring { bar, progress }
    }

    /// Highest progress ratio wins; ties keep the earlier goal.
    fn most_progressed_goal(&self) -> Option<Goal> {
        self.data
            .goals()
            .fold(None::<&Goal>, |best, goal| match best {
                Some(current) if goal.percent() <= current.percent() => Some(current),
                _ => Some(goal),
            })
            .cloned()
    }
}

fn recurring_caption(progress: &RecurringProgress, prefs: &DisplayPreferences) -> String {
    format!(
        "Next {} at a total of {} | reached {} times",
        progress.action,
        prefs.format_amount(progress.next_milestone),
        progress.times_reached
    )
}
