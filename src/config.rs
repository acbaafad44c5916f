use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::detection_stabilizer::StabilizerConfig;
use crate::overlay_presenter::{OverlayConfig, OverlayPosition};
use crate::speech_announcer::AnnouncerConfig;
use crate::translation_controller::ControllerConfig;

/// Stabilization window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerConfigSerde {
    /// Number of recent frame labels in the voting window
    pub window: usize,
    /// Minimum occurrences before a label is eligible
    pub min_repeats: usize,
    /// Minimum interval between accepted gesture events in milliseconds
    pub cooldown_ms: u64,
}

impl Default for StabilizerConfigSerde {
    fn default() -> Self {
        Self {
            window: 7,
            min_repeats: 3,
            cooldown_ms: 400,
        }
    }
}

impl StabilizerConfigSerde {
    pub fn to_stabilizer_config(&self) -> StabilizerConfig {
        StabilizerConfig {
            window: self.window,
            min_repeats: self.min_repeats,
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

/// Translation significance thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfigSerde {
    /// Confidence below which a detection counts as no-gesture
    pub no_gesture_confidence: f32,
    /// Minimum absolute confidence change that counts as significant
    pub confidence_delta: f32,
    pub auto_speak: bool,
}

impl Default for ControllerConfigSerde {
    fn default() -> Self {
        Self {
            no_gesture_confidence: 0.5,
            confidence_delta: 0.1,
            auto_speak: true,
        }
    }
}

impl ControllerConfigSerde {
    pub fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            no_gesture_confidence: self.no_gesture_confidence,
            confidence_delta: self.confidence_delta,
            auto_speak: self.auto_speak,
        }
    }
}

/// Overlay display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfigSerde {
    pub auto_hide: bool,
    pub hide_timeout_ms: u64,
    /// Anchor position: top, bottom, left or right
    pub position: String,
}

impl Default for OverlayConfigSerde {
    fn default() -> Self {
        Self {
            auto_hide: true,
            hide_timeout_ms: 5000,
            position: "bottom".to_string(),
        }
    }
}

impl OverlayConfigSerde {
    pub fn to_overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            auto_hide: self.auto_hide,
            hide_timeout: Duration::from_millis(self.hide_timeout_ms),
            position: self.position.parse().unwrap_or_default(),
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfigSerde {
    pub enabled: bool,
    /// Cancel an in-flight utterance when new text arrives
    pub interrupt: bool,
    pub cooldown_ms: u64,
    /// Preference-ordered voice names
    pub preferred_voices: Vec<String>,
    pub rate: f32,
}

impl Default for TtsConfigSerde {
    fn default() -> Self {
        Self {
            enabled: true,
            interrupt: true,
            cooldown_ms: 1500,
            preferred_voices: Vec::new(),
            rate: 1.0,
        }
    }
}

impl TtsConfigSerde {
    pub fn to_announcer_config(&self, language: &str) -> AnnouncerConfig {
        AnnouncerConfig {
            enabled: self.enabled,
            interrupt: self.interrupt,
            cooldown: Duration::from_millis(self.cooldown_ms),
            preferred_voices: self.preferred_voices.clone(),
            language: language.to_string(),
            rate: self.rate,
            ..AnnouncerConfig::default()
        }
    }
}

/// Detection server polling configuration for the browser-source overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObsConfigSerde {
    pub server_url: String,
    pub poll_interval_ms: u64,
}

impl Default for ObsConfigSerde {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8765".to_string(),
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Classifier to use: "simulated" or "geometric"
    pub classifier: String,
    /// Interval between processed camera frames in milliseconds
    pub frame_interval_ms: u64,
    /// Language for voice selection
    pub language: String,
    /// Whether to log statistics
    pub log_stats_enabled: bool,
    /// Maximum entries kept in the translation history
    pub history_limit: usize,
    /// Path of the persisted state file
    pub state_file: String,
    pub stabilizer: StabilizerConfigSerde,
    pub controller: ControllerConfigSerde,
    pub overlay: OverlayConfigSerde,
    pub tts: TtsConfigSerde,
    pub obs: ObsConfigSerde,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: "simulated".to_string(),
            frame_interval_ms: 33,
            language: "en".to_string(),
            log_stats_enabled: true,
            history_limit: 50,
            state_file: "handsign_state.json".to_string(),
            stabilizer: StabilizerConfigSerde::default(),
            controller: ControllerConfigSerde::default(),
            overlay: OverlayConfigSerde::default(),
            tts: TtsConfigSerde::default(),
            obs: ObsConfigSerde::default(),
        }
    }
}

/// Helper function to read the application configuration
pub fn read_app_config() -> AppConfig {
    match std::fs::read_to_string("config.json") {
        Ok(config_str) => match serde_json::from_str(&config_str) {
            Ok(config) => config,
            Err(e) => {
                println!(
                    "Failed to parse config.json: {}. Using default configuration.",
                    e
                );
                AppConfig::default()
            }
        },
        Err(e) => {
            println!(
                "Failed to read config.json: {}. Using default configuration.",
                e
            );
            AppConfig::default()
        }
    }
}

/// Per-instance options the browser-source overlay page accepts in its URL
/// query string.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPageQuery {
    pub position: OverlayPosition,
    pub hide_timeout: Duration,
    pub debug: bool,
}

impl Default for OverlayPageQuery {
    fn default() -> Self {
        Self {
            position: OverlayPosition::default(),
            hide_timeout: Duration::from_millis(5000),
            debug: false,
        }
    }
}

impl OverlayPageQuery {
    /// Parse the overlay page URL. Unknown parameters are ignored and
    /// unparsable values fall back to their defaults.
    pub fn from_url(raw: &str) -> Self {
        let mut query = Self::default();
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(_) => return query,
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "position" => {
                    if let Ok(position) = value.parse() {
                        query.position = position;
                    }
                }
                "hideTimeout" => {
                    if let Ok(ms) = value.parse::<u64>() {
                        query.hide_timeout = Duration::from_millis(ms);
                    }
                }
                "debug" => {
                    query.debug = value == "true" || value == "1";
                }
                _ => {}
            }
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.frame_interval_ms, 33);
        assert_eq!(parsed.stabilizer.window, 7);
        assert_eq!(parsed.obs.poll_interval_ms, 250);
    }

    #[test]
    fn test_serde_conversions() {
        let config = AppConfig::default();
        let stabilizer = config.stabilizer.to_stabilizer_config();
        assert_eq!(stabilizer.cooldown, Duration::from_millis(400));

        let overlay = config.overlay.to_overlay_config();
        assert_eq!(overlay.position, OverlayPosition::Bottom);
        assert_eq!(overlay.hide_timeout, Duration::from_millis(5000));

        let announcer = config.tts.to_announcer_config(&config.language);
        assert_eq!(announcer.cooldown, Duration::from_millis(1500));
        assert_eq!(announcer.language, "en");
    }

    #[test]
    fn test_invalid_position_falls_back() {
        let overlay = OverlayConfigSerde {
            position: "diagonal".to_string(),
            ..OverlayConfigSerde::default()
        };
        assert_eq!(overlay.to_overlay_config().position, OverlayPosition::Bottom);
    }

    #[test]
    fn test_overlay_page_query() {
        let query = OverlayPageQuery::from_url(
            "http://localhost:8765/overlay?position=top&hideTimeout=3000&debug=true",
        );
        assert_eq!(query.position, OverlayPosition::Top);
        assert_eq!(query.hide_timeout, Duration::from_millis(3000));
        assert!(query.debug);
    }

    #[test]
    fn test_overlay_page_query_bad_values_use_defaults() {
        let query = OverlayPageQuery::from_url(
            "http://localhost:8765/overlay?position=center&hideTimeout=soon",
        );
        assert_eq!(query, OverlayPageQuery::default());

        assert_eq!(OverlayPageQuery::from_url("not a url"), OverlayPageQuery::default());
    }
}
