use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Overlay anchor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPosition {
    Top,
    Bottom,
    Left,
    Right,
}

impl Default for OverlayPosition {
    fn default() -> Self {
        OverlayPosition::Bottom
    }
}

impl FromStr for OverlayPosition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(OverlayPosition::Top),
            "bottom" => Ok(OverlayPosition::Bottom),
            "left" => Ok(OverlayPosition::Left),
            "right" => Ok(OverlayPosition::Right),
            _ => Err(()),
        }
    }
}

impl OverlayPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Confidence display band. The thresholds are presentation policy, not a
/// pipeline invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence > 0.7 {
            Self::High
        } else if confidence > 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One-shot cancellable timer handle.
///
/// Deadline-based rather than task-based so presenters driven from the frame
/// loop stay deterministic; a stale handle is cancelled, never leaked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoHideTimer {
    deadline: Option<Instant>,
}

impl AutoHideTimer {
    pub fn arm(&mut self, timeout: Duration, now: Instant) {
        self.deadline = Some(now + timeout);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once `now` has reached the armed deadline.
    pub fn expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}

/// Visibility states of the overlay state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
    VisiblePendingAutoHide,
}

/// Presenter configuration
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Whether new text schedules an automatic hide
    pub auto_hide: bool,
    /// Auto-hide timeout
    pub hide_timeout: Duration,
    /// Initial anchor position
    pub position: OverlayPosition,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            auto_hide: true,
            hide_timeout: Duration::from_millis(5000),
            position: OverlayPosition::Bottom,
        }
    }
}

/// A snapshot of what the overlay should currently display.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayFrame {
    pub visible: bool,
    pub text: String,
    pub confidence_percent: u32,
    pub band: ConfidenceBand,
    pub position: OverlayPosition,
    pub status: String,
}

/// Visibility/timer state machine rendering translation state to the user.
///
/// One instance is driven synchronously by pipeline events; the OBS variant
/// is driven by the HTTP poller. Both share this state machine.
pub struct OverlayPresenter {
    config: OverlayConfig,
    visibility: Visibility,
    timer: AutoHideTimer,
    position: OverlayPosition,
    style_overrides: serde_json::Map<String, serde_json::Value>,
    text: String,
    confidence: f32,
}

impl OverlayPresenter {
    pub fn new(config: OverlayConfig) -> Self {
        let position = config.position;
        Self {
            config,
            visibility: Visibility::Hidden,
            timer: AutoHideTimer::default(),
            position,
            style_overrides: serde_json::Map::new(),
            text: String::new(),
            confidence: 0.0,
        }
    }

    #[inline]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility != Visibility::Hidden
    }

    /// Show the overlay, cancelling any pending auto-hide.
    pub fn show(&mut self) {
        self.visibility = Visibility::Visible;
        self.timer.cancel();
    }

    /// Hide the overlay, cancelling any pending auto-hide.
    pub fn hide(&mut self) {
        self.visibility = Visibility::Hidden;
        self.timer.cancel();
    }

    /// Arm the one-shot auto-hide timer. Only valid while visible.
    pub fn schedule_auto_hide(&mut self, timeout: Duration, now: Instant) {
        if self.visibility == Visibility::Hidden {
            return;
        }
        self.timer.arm(timeout, now);
        self.visibility = Visibility::VisiblePendingAutoHide;
    }

    /// Advance the timer state machine; called once per frame tick.
    pub fn tick(&mut self, now: Instant) {
        if self.visibility == Visibility::VisiblePendingAutoHide && self.timer.expired(now) {
            self.hide();
        }
    }

    /// Apply a text/confidence update. A non-empty update always forces the
    /// overlay visible and restarts the auto-hide countdown.
    pub fn update(&mut self, text: &str, confidence: f32, auto_hide: Option<Duration>, now: Instant) {
        self.text = text.to_string();
        self.confidence = confidence;

        if text.is_empty() {
            return;
        }

        self.show();
        let timeout = match auto_hide {
            Some(timeout) => Some(timeout),
            None if self.config.auto_hide => Some(self.config.hide_timeout),
            None => None,
        };
        if let Some(timeout) = timeout {
            self.schedule_auto_hide(timeout, now);
        }
    }

    pub fn set_position(&mut self, position: OverlayPosition) {
        self.position = position;
    }

    pub fn set_style(&mut self, style: serde_json::Map<String, serde_json::Value>) {
        for (key, value) in style {
            self.style_overrides.insert(key, value);
        }
    }

    pub fn style_overrides(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.style_overrides
    }

    /// Snapshot the current visual state for rendering or serialization.
    pub fn frame(&self) -> OverlayFrame {
        let status = if self.text.is_empty() {
            "waiting".to_string()
        } else {
            "active".to_string()
        };
        OverlayFrame {
            visible: self.is_visible(),
            text: self.text.clone(),
            confidence_percent: (self.confidence * 100.0).round() as u32,
            band: ConfidenceBand::from_confidence(self.confidence),
            position: self.position,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter() -> OverlayPresenter {
        OverlayPresenter::new(OverlayConfig::default())
    }

    #[test]
    fn test_auto_hide_fires_at_deadline_not_before() {
        let mut overlay = presenter();
        let t0 = Instant::now();

        overlay.show();
        overlay.schedule_auto_hide(Duration::from_millis(1000), t0);
        assert_eq!(overlay.visibility(), Visibility::VisiblePendingAutoHide);

        overlay.tick(t0 + Duration::from_millis(999));
        assert!(overlay.is_visible(), "must not hide before the deadline");

        overlay.tick(t0 + Duration::from_millis(1000));
        assert_eq!(overlay.visibility(), Visibility::Hidden);
    }

    #[test]
    fn test_show_cancels_pending_auto_hide() {
        let mut overlay = presenter();
        let t0 = Instant::now();

        overlay.show();
        overlay.schedule_auto_hide(Duration::from_millis(1000), t0);

        overlay.tick(t0 + Duration::from_millis(500));
        overlay.show();

        overlay.tick(t0 + Duration::from_millis(1500));
        assert_eq!(overlay.visibility(), Visibility::Visible);
    }

    #[test]
    fn test_schedule_invalid_from_hidden() {
        let mut overlay = presenter();
        let t0 = Instant::now();

        overlay.schedule_auto_hide(Duration::from_millis(100), t0);
        assert_eq!(overlay.visibility(), Visibility::Hidden);

        overlay.tick(t0 + Duration::from_millis(200));
        assert_eq!(overlay.visibility(), Visibility::Hidden);
    }

    #[test]
    fn test_non_empty_update_forces_show() {
        let mut overlay = presenter();
        let t0 = Instant::now();

        overlay.update("Hello!", 0.9, None, t0);
        assert!(overlay.is_visible());

        // Default config schedules auto-hide on update.
        assert_eq!(overlay.visibility(), Visibility::VisiblePendingAutoHide);
        overlay.tick(t0 + Duration::from_millis(5000));
        assert_eq!(overlay.visibility(), Visibility::Hidden);
    }

    #[test]
    fn test_empty_update_does_not_show() {
        let mut overlay = presenter();
        overlay.update("", 0.0, None, Instant::now());
        assert!(!overlay.is_visible());
        assert_eq!(overlay.frame().status, "waiting");
    }

    #[test]
    fn test_new_update_restarts_countdown() {
        let mut overlay = presenter();
        let t0 = Instant::now();

        overlay.update("Hello!", 0.9, Some(Duration::from_millis(1000)), t0);
        overlay.update(
            "Thank you!",
            0.95,
            Some(Duration::from_millis(1000)),
            t0 + Duration::from_millis(800),
        );

        overlay.tick(t0 + Duration::from_millis(1200));
        assert!(overlay.is_visible(), "second update restarted the countdown");

        overlay.tick(t0 + Duration::from_millis(1800));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_hide_cancels_timer() {
        let mut overlay = presenter();
        let t0 = Instant::now();

        overlay.show();
        overlay.schedule_auto_hide(Duration::from_millis(1000), t0);
        overlay.hide();

        overlay.show();
        overlay.tick(t0 + Duration::from_millis(2000));
        assert!(overlay.is_visible(), "stale deadline must not fire after hide");
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_confidence(0.9), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.7), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.5), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_confidence(0.4), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_confidence(0.0), ConfidenceBand::Low);
    }

    #[test]
    fn test_frame_percent_rounding() {
        let mut overlay = presenter();
        overlay.update("Hello!", 0.856, None, Instant::now());
        assert_eq!(overlay.frame().confidence_percent, 86);
        assert_eq!(overlay.frame().status, "active");
    }

    #[test]
    fn test_position_parsing() {
        assert_eq!("top".parse::<OverlayPosition>(), Ok(OverlayPosition::Top));
        assert!("middle".parse::<OverlayPosition>().is_err());
        assert_eq!(OverlayPosition::Left.as_str(), "left");
    }
}
