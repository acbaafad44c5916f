// Re-export common types and functions for easier imports
pub use crate::config::{read_app_config, AppConfig};
pub use crate::control_messages::{parse_control_message, ControlMessage};
pub use crate::detection_stabilizer::{DetectionStabilizer, StabilizerConfig, StableGestureEvent};
pub use crate::gesture_classifier::{Candidate, GestureClassifier, GestureLabel};
pub use crate::hand_landmarks::{HandLandmark, LandmarkPoint, LandmarkSet};
pub use crate::overlay_presenter::{OverlayConfig, OverlayPosition, OverlayPresenter};
pub use crate::surface_sync::SyncEvent;
pub use crate::translation_session::{FrameSource, TranslationSession};

// Re-export common external dependencies
pub use anyhow::{anyhow, Context, Result};
pub use serde::{Deserialize, Serialize};
pub use std::collections::VecDeque;
pub use std::sync::Arc;
pub use std::time::{Duration, Instant};
