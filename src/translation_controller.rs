use std::time::Instant;

use crate::control_messages::ControlMessage;
use crate::detection_stabilizer::StableGestureEvent;
use crate::overlay_presenter::OverlayPresenter;
use crate::speech_announcer::SpeechAnnouncer;
use crate::surface_sync::SurfaceSync;

/// Controller thresholds
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Confidence below which a labelled event still counts as no-gesture
    pub no_gesture_confidence: f32,
    /// Minimum absolute confidence change that counts as significant
    pub confidence_delta: f32,
    /// Speak accepted translations automatically
    pub auto_speak: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            no_gesture_confidence: 0.5,
            confidence_delta: 0.1,
            auto_speak: true,
        }
    }
}

/// The single authoritative translation snapshot downstream surfaces render.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationState {
    pub text: String,
    pub confidence: f32,
    pub last_changed_at: Option<Instant>,
    pub is_no_gesture: bool,
}

impl Default for TranslationState {
    fn default() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            last_changed_at: None,
            is_no_gesture: true,
        }
    }
}

/// Owns the translation state and decides which stable gesture events are
/// significant enough to propagate.
///
/// Accepted updates fan out synchronously: overlay first, then speech, then
/// cross-surface sync. Insignificant events mutate nothing.
pub struct TranslationController {
    config: ControllerConfig,
    state: TranslationState,
    overlay: OverlayPresenter,
    announcer: SpeechAnnouncer,
    sync: SurfaceSync,
}

impl TranslationController {
    pub fn new(
        config: ControllerConfig,
        overlay: OverlayPresenter,
        announcer: SpeechAnnouncer,
        sync: SurfaceSync,
    ) -> Self {
        Self {
            config,
            state: TranslationState::default(),
            overlay,
            announcer,
            sync,
        }
    }

    #[inline]
    pub fn state(&self) -> &TranslationState {
        &self.state
    }

    pub fn overlay(&self) -> &OverlayPresenter {
        &self.overlay
    }

    pub fn sync(&self) -> &SurfaceSync {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SurfaceSync {
        &mut self.sync
    }

    /// Apply one stable gesture event. Returns whether the update was
    /// accepted as significant.
    pub fn apply(&mut self, event: &StableGestureEvent, now: Instant) -> bool {
        let text = event.label.map(|l| l.text()).unwrap_or("");
        let no_gesture = text.is_empty() || event.confidence < self.config.no_gesture_confidence;

        let significant = text != self.state.text
            || (event.confidence - self.state.confidence).abs() > self.config.confidence_delta
            || no_gesture != self.state.is_no_gesture;
        if !significant {
            return false;
        }

        self.state.text = text.to_string();
        self.state.confidence = event.confidence;
        self.state.is_no_gesture = no_gesture;
        self.state.last_changed_at = Some(now);

        // No-gesture clears the displayed text even when a low-confidence
        // label was attached.
        let display = if no_gesture { "" } else { text };

        self.overlay.update(display, event.confidence, None, now);
        if no_gesture {
            // An empty update clears the text but never hides on its own;
            // without this the panel would linger when auto-hide is off.
            self.overlay.hide();
        }

        if !no_gesture && self.config.auto_speak {
            self.announcer.speak(display, now);
        }

        if no_gesture {
            self.sync.publish_status("waiting");
        } else {
            self.sync
                .record_translation(display, event.confidence, chrono::Utc::now().timestamp_millis());
        }

        true
    }

    /// Direct display commands bypass the significance test entirely.
    pub fn handle_message(&mut self, message: ControlMessage, now: Instant) {
        match message {
            ControlMessage::Update {
                text,
                confidence,
                auto_hide,
            } => {
                self.state.text = text.clone();
                self.state.confidence = confidence;
                self.state.is_no_gesture = text.is_empty();
                self.state.last_changed_at = Some(now);
                let timeout = auto_hide.map(std::time::Duration::from_millis);
                self.overlay.update(&text, confidence, timeout, now);
            }
            ControlMessage::Show => self.overlay.show(),
            ControlMessage::Hide => self.overlay.hide(),
            ControlMessage::Position { position } => self.overlay.set_position(position),
            ControlMessage::Style { style } => self.overlay.set_style(style),
        }
    }

    /// Advance the overlay timer and the speech stall watchdog.
    pub fn tick(&mut self, now: Instant) {
        self.overlay.tick(now);
        self.announcer.poll(now);
    }

    /// Drop back to the idle state, hiding the overlay and forgetting the
    /// speech dedup history.
    pub fn reset(&mut self) {
        self.state = TranslationState::default();
        self.overlay.hide();
        self.announcer.reset();
    }
}
