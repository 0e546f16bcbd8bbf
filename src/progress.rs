use crate::config::TickerTiming;
use crate::models::DisplayPreferences;
use serde::Serialize;
use std::time::Duration;

/// A progress bar that eases from the value it showed before an update to the
/// new value. Time is the engine's virtual clock.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    pub label: String,
    pub current: f64,
    pub target: f64,
    pub previous: f64,
    started_at: Duration,
    start_delay: Duration,
    animation: Duration,
}

/// What the overlay needs to draw a bar at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarView {
    pub label: String,
    pub fill_percent: f64,
    pub highlight_percent: f64,
    pub current_text: String,
    pub target_text: String,
    pub percent_text: String,
}

impl ProgressBar {
    pub fn new(
        label: impl Into<String>,
        current: f64,
        target: f64,
        previous: f64,
        started_at: Duration,
        timing: &TickerTiming,
    ) -> Self {
        Self {
            label: label.into(),
            current,
            target,
            previous,
            started_at,
            start_delay: timing.bar_start_delay,
            animation: timing.bar_animation,
        }
    }

    pub fn percent(&self) -> f64 {
        self.current / self.target * 100.0
    }

    fn previous_percent(&self) -> f64 {
        self.previous / self.target * 100.0
    }

    /// Fill width in percent at `now`, clamped to [0, 100]. Holds the previous
    /// value for the start delay so the move is always visible.
    pub fn fill_at(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.started_at);
        let from = self.previous_percent();
        let to = self.percent();

        let value = if elapsed < self.start_delay {
            from
        } else if self.animation.is_zero() {
            to
        } else {
            let t = (elapsed - self.start_delay).as_secs_f64() / self.animation.as_secs_f64();
            from + (to - from) * ease_out(t.min(1.0))
        };
        clamp_percent(value)
    }

    /// Width of the segment covering the freshly added amount, relative to
    /// what was left to reach the target. Zero when nothing changed.
    pub fn highlight_percent(&self) -> f64 {
        if self.current == self.previous {
            return 0.0;
        }
        let remaining = self.target - self.previous;
        if remaining <= 0.0 {
            return 100.0;
        }
        clamp_percent((self.current - self.previous) / remaining * 100.0)
    }

    pub fn is_settled(&self, now: Duration) -> bool {
        now.saturating_sub(self.started_at) >= self.start_delay + self.animation
    }

    pub fn view(&self, now: Duration, prefs: &DisplayPreferences) -> BarView {
        BarView {
            label: self.label.clone(),
            fill_percent: self.fill_at(now),
            highlight_percent: if self.is_settled(now) {
                0.0
            } else {
                self.highlight_percent()
            },
            current_text: prefs.format_amount(self.current),
            target_text: prefs.format_amount(self.target),
            percent_text: format!("{:.1}%", self.percent()),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

// cubic ease-out, close to the overlay's CSS ease-out curve
fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(current: f64, target: f64, previous: f64) -> ProgressBar {
        ProgressBar::new(
            "Goal",
            current,
            target,
            previous,
            Duration::from_secs(10),
            &TickerTiming::default(),
        )
    }

    #[test]
    fn holds_previous_value_before_animating() {
        let bar = bar(60.0, 100.0, 20.0);
        assert_eq!(bar.fill_at(Duration::from_secs(10)), 20.0);
        assert_eq!(bar.fill_at(Duration::from_millis(10_049)), 20.0);

        let midway = bar.fill_at(Duration::from_millis(10_550));
        assert!(midway > 20.0 && midway < 60.0, "midway was {midway}");

        assert_eq!(bar.fill_at(Duration::from_millis(11_050)), 60.0);
        assert!(bar.is_settled(Duration::from_millis(11_050)));
    }

    #[test]
    fn fill_is_clamped_but_percent_is_not() {
        let bar = bar(150.0, 100.0, 90.0);
        assert_eq!(bar.percent(), 150.0);
        assert_eq!(bar.fill_at(Duration::from_secs(20)), 100.0);
    }

    #[test]
    fn highlight_covers_new_amount() {
        assert_eq!(bar(60.0, 100.0, 20.0).highlight_percent(), 50.0);
        assert_eq!(bar(60.0, 100.0, 60.0).highlight_percent(), 0.0);
        assert_eq!(bar(120.0, 100.0, 100.0).highlight_percent(), 100.0);
    }

    #[test]
    fn view_formats_amounts_with_symbol() {
        let prefs = DisplayPreferences::default();
        let view = bar(30.0, 50.0, 30.0).view(Duration::from_secs(30), &prefs);
        assert_eq!(view.current_text, "$30.00");
        assert_eq!(view.target_text, "$50.00");
        assert_eq!(view.percent_text, "60.0%");
        assert_eq!(view.fill_percent, 60.0);
    }
}
