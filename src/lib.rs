pub mod config;
pub mod control_messages;
pub mod detection_stabilizer;
pub mod gesture_classifier;
pub mod hand_landmarks;
pub mod obs_poller;
pub mod overlay_presenter;
pub mod pipeline_stats;
pub mod prelude;
pub mod settings_store;
pub mod speech_announcer;
pub mod surface_sync;
pub mod translation_controller;
pub mod translation_session;

// Re-export key components for easier access
pub use config::read_app_config;
pub use detection_stabilizer::DetectionStabilizer;
pub use gesture_classifier::{GeometricClassifier, SimulatedClassifier};
pub use obs_poller::ObsOverlayPoller;
pub use overlay_presenter::OverlayPresenter;
pub use pipeline_stats::{PipelineStats, StatsReporter};
pub use translation_controller::TranslationController;
pub use translation_session::TranslationSession;
