use anyhow::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::control_messages::ControlMessage;
use crate::detection_stabilizer::DetectionStabilizer;
use crate::gesture_classifier::GestureClassifier;
use crate::hand_landmarks::LandmarkSet;
use crate::pipeline_stats::{PipelineStats, StatsReporter};
use crate::surface_sync::SyncEvent;
use crate::translation_controller::TranslationController;

/// Camera-side landmark supplier.
///
/// `next_frame` returns `Ok(None)` when no hand is in view; an `Err` marks a
/// transient capture failure and never terminates the session.
pub trait FrameSource: Send {
    fn acquire(&mut self) -> Result<()>;
    fn next_frame(&mut self) -> Result<Option<LandmarkSet>>;
    fn release(&mut self);
}

/// Stand-in camera for demo mode. Reports no hand every frame and leaves the
/// simulated classifier to drive the candidate stream.
pub struct SyntheticFrameSource;

impl FrameSource for SyntheticFrameSource {
    fn acquire(&mut self) -> Result<()> {
        println!("Using synthetic frame source (no camera)");
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<LandmarkSet>> {
        Ok(None)
    }

    fn release(&mut self) {}
}

/// One classify/stabilize/apply round, kept separate from the async loop so
/// the per-frame behavior stays deterministic.
struct DetectionLoop {
    source: Box<dyn FrameSource>,
    classifier: Box<dyn GestureClassifier>,
    stabilizer: DetectionStabilizer,
}

impl DetectionLoop {
    fn step(
        &mut self,
        controller: &mut TranslationController,
        stats: &mut PipelineStats,
        active: &AtomicBool,
        now: Instant,
    ) {
        // Checked under the controller lock: `stop()` clears the flag before
        // it takes the lock, so a frame already in flight when the session
        // stops can never fan out after the reset.
        if !active.load(Ordering::Relaxed) {
            return;
        }

        let frame = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                // One bad frame never takes the loop down.
                eprintln!("Frame capture failed: {}", e);
                stats.record_failure();
                controller.tick(now);
                return;
            }
        };

        let started = Instant::now();
        let candidate = self.classifier.classify(frame.as_ref(), now);
        stats.record_frame(started.elapsed().as_secs_f32());

        if let Some(event) = self.stabilizer.observe(&candidate) {
            stats.record_stable_event();
            if controller.apply(&event, now) {
                stats.record_accepted_update();
            }
        }
        controller.tick(now);
    }
}

/// Main translation coordinator that integrates all components
pub struct TranslationSession {
    running: Arc<AtomicBool>,
    controller: Arc<Mutex<TranslationController>>,
    stats: Arc<Mutex<PipelineStats>>,
    stats_reporter: Option<StatsReporter>,
    frame_interval: Duration,
    log_stats_enabled: bool,
    detection: Option<DetectionLoop>,
    task: Option<JoinHandle<()>>,
}

impl TranslationSession {
    pub fn new(
        source: Box<dyn FrameSource>,
        classifier: Box<dyn GestureClassifier>,
        stabilizer: DetectionStabilizer,
        controller: TranslationController,
        frame_interval: Duration,
        log_stats_enabled: bool,
    ) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            controller: Arc::new(Mutex::new(controller)),
            stats: Arc::new(Mutex::new(PipelineStats::new())),
            stats_reporter: None,
            frame_interval,
            log_stats_enabled,
            detection: Some(DetectionLoop {
                source,
                classifier,
                stabilizer,
            }),
            task: None,
        }
    }

    /// Acquire the frame source and spawn the frame loop.
    ///
    /// A source that cannot be acquired is a terminal error; everything past
    /// this point is recovered per frame.
    pub fn start(&mut self) -> Result<()> {
        let mut detection = match self.detection.take() {
            Some(detection) => detection,
            None => return Err(anyhow::anyhow!("Session already started")),
        };
        detection.source.acquire()?;

        self.running.store(true, Ordering::Relaxed);
        self.controller.lock().sync_mut().set_active(true);

        let stats_reporter = StatsReporter::new(
            self.stats.clone(),
            self.running.clone(),
            self.log_stats_enabled,
        );
        stats_reporter.start_periodic_reporting();
        self.stats_reporter = Some(stats_reporter);

        let running = self.running.clone();
        let controller = self.controller.clone();
        let stats = self.stats.clone();
        let frame_interval = self.frame_interval;

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame_interval);
            while running.load(Ordering::Relaxed) {
                interval.tick().await;
                let now = Instant::now();
                detection.step(&mut controller.lock(), &mut stats.lock(), &running, now);
            }
            detection.source.release();
            println!("Frame loop stopped");
        }));

        Ok(())
    }

    /// Stop the frame loop, clear the display and mark the session inactive.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);

        let mut controller = self.controller.lock();
        controller.reset();
        controller.sync_mut().set_active(false);

        let stats = self.stats.lock();
        if self.log_stats_enabled {
            stats.log_to_file(true);
        }
    }

    /// Forward a control message from another surface.
    pub fn handle_message(&self, message: ControlMessage) {
        self.controller.lock().handle_message(message, Instant::now());
    }

    /// Listen for translation/status events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.controller.lock().sync().subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn get_running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn get_stats_report(&self) -> String {
        match self.stats.try_lock() {
            Some(stats) => stats.report(),
            None => self.stats.lock().report(),
        }
    }

    pub fn print_stats(&self) {
        if let Some(stats_reporter) = &self.stats_reporter {
            stats_reporter.print_stats();
        }
    }
}

impl Drop for TranslationSession {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(mut detection) = self.detection.take() {
            detection.source.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture_classifier::{Candidate, GestureLabel};
    use crate::detection_stabilizer::StabilizerConfig;
    use crate::overlay_presenter::{OverlayConfig, OverlayPresenter};
    use crate::speech_announcer::{AnnouncerConfig, SpeechAnnouncer, SpeechBackend, SpeechRequest};
    use crate::surface_sync::SurfaceSync;
    use crate::translation_controller::ControllerConfig;

    struct SilentBackend;

    impl SpeechBackend for SilentBackend {
        fn dispatch(&mut self, _request: &SpeechRequest) -> anyhow::Result<()> {
            Ok(())
        }

        fn cancel(&mut self) {}
    }

    struct ScriptedSource {
        frames: Vec<Result<Option<LandmarkSet>>>,
        acquired: bool,
        released: bool,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<Option<LandmarkSet>>>) -> Self {
            Self {
                frames,
                acquired: false,
                released: false,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn acquire(&mut self) -> Result<()> {
            self.acquired = true;
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Option<LandmarkSet>> {
            if self.frames.is_empty() {
                Ok(None)
            } else {
                self.frames.remove(0)
            }
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    /// Emits a fixed label whenever any frame is present.
    struct ScriptedClassifier {
        label: GestureLabel,
    }

    impl GestureClassifier for ScriptedClassifier {
        fn classify(&mut self, landmarks: Option<&LandmarkSet>, now: Instant) -> Candidate {
            match landmarks {
                Some(_) => Candidate::of(self.label, now),
                None => Candidate::none(now),
            }
        }
    }

    fn controller() -> TranslationController {
        TranslationController::new(
            ControllerConfig::default(),
            OverlayPresenter::new(OverlayConfig::default()),
            SpeechAnnouncer::new(Box::new(SilentBackend), AnnouncerConfig::default()),
            SurfaceSync::new(50, None),
        )
    }

    fn flat_hand() -> LandmarkSet {
        // Geometry is irrelevant here; the scripted classifier only checks
        // frame presence.
        LandmarkSet::new(
            (0..crate::hand_landmarks::LANDMARK_COUNT)
                .map(|i| crate::hand_landmarks::LandmarkPoint::new(i as f32 * 0.01, 0.5, 0.0))
                .collect(),
        )
    }

    #[test]
    fn test_steps_confirm_and_accept_translation() {
        let mut detection = DetectionLoop {
            source: Box::new(ScriptedSource::new(vec![
                Ok(Some(flat_hand())),
                Ok(Some(flat_hand())),
                Ok(Some(flat_hand())),
            ])),
            classifier: Box::new(ScriptedClassifier {
                label: GestureLabel::OpenHand,
            }),
            stabilizer: DetectionStabilizer::new(StabilizerConfig {
                window: 5,
                min_repeats: 3,
                cooldown: Duration::from_millis(0),
            }),
        };
        let mut controller = controller();
        let mut stats = PipelineStats::new();
        let active = AtomicBool::new(true);

        for _ in 0..3 {
            detection.step(&mut controller, &mut stats, &active, Instant::now());
        }

        assert_eq!(stats.frames_processed, 3);
        assert_eq!(stats.stable_events, 1);
        assert_eq!(stats.accepted_updates, 1);
        assert_eq!(controller.state().text, "Hello!");
    }

    #[test]
    fn test_step_with_cleared_flag_mutates_nothing() {
        let mut detection = DetectionLoop {
            source: Box::new(ScriptedSource::new(vec![
                Ok(Some(flat_hand())),
                Ok(Some(flat_hand())),
                Ok(Some(flat_hand())),
            ])),
            classifier: Box::new(ScriptedClassifier {
                label: GestureLabel::OpenHand,
            }),
            stabilizer: DetectionStabilizer::new(StabilizerConfig {
                window: 5,
                min_repeats: 2,
                cooldown: Duration::from_millis(0),
            }),
        };
        let mut controller = controller();
        let mut stats = PipelineStats::new();
        let active = AtomicBool::new(false);

        // Frames that would otherwise confirm a gesture are dropped outright
        // once the session is no longer active.
        for _ in 0..3 {
            detection.step(&mut controller, &mut stats, &active, Instant::now());
        }

        assert_eq!(stats.frames_processed, 0);
        assert_eq!(stats.accepted_updates, 0);
        assert_eq!(controller.state().text, "");
        assert!(!controller.overlay().is_visible());
    }

    #[test]
    fn test_frame_error_is_recovered_per_frame() {
        let mut detection = DetectionLoop {
            source: Box::new(ScriptedSource::new(vec![
                Ok(Some(flat_hand())),
                Err(anyhow::anyhow!("camera hiccup")),
                Ok(Some(flat_hand())),
            ])),
            classifier: Box::new(ScriptedClassifier {
                label: GestureLabel::ThumbsUp,
            }),
            stabilizer: DetectionStabilizer::new(StabilizerConfig {
                window: 5,
                min_repeats: 2,
                cooldown: Duration::from_millis(0),
            }),
        };
        let mut controller = controller();
        let mut stats = PipelineStats::new();
        let active = AtomicBool::new(true);

        for _ in 0..3 {
            detection.step(&mut controller, &mut stats, &active, Instant::now());
        }

        assert_eq!(stats.frames_failed, 1);
        assert_eq!(stats.frames_processed, 2);
        // The two good frames still confirm the gesture.
        assert_eq!(stats.accepted_updates, 1);
    }

    #[tokio::test]
    async fn test_session_start_requires_source() {
        let mut session = TranslationSession::new(
            Box::new(ScriptedSource::new(Vec::new())),
            Box::new(ScriptedClassifier {
                label: GestureLabel::Fist,
            }),
            DetectionStabilizer::new(StabilizerConfig::default()),
            controller(),
            Duration::from_millis(33),
            false,
        );

        assert!(session.start().is_ok());
        assert!(session.is_running());
        assert!(session.start().is_err(), "second start is rejected");

        session.stop();
        assert!(!session.is_running());
    }
}
