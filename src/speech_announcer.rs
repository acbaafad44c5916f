use std::time::{Duration, Instant};

/// A single utterance handed to the speech backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Option<String>,
    pub rate: f32,
}

/// External text-to-speech capability.
///
/// `dispatch` starts an utterance asynchronously; the platform reports
/// completion back through `SpeechAnnouncer::on_complete` / `on_error`.
pub trait SpeechBackend: Send {
    fn dispatch(&mut self, request: &SpeechRequest) -> anyhow::Result<()>;
    fn cancel(&mut self);
}

/// Backend that prints utterances instead of synthesizing them, for builds
/// without a speech platform.
pub struct ConsoleSpeechBackend;

impl SpeechBackend for ConsoleSpeechBackend {
    fn dispatch(&mut self, request: &SpeechRequest) -> anyhow::Result<()> {
        println!("Speaking: {}", request.text);
        Ok(())
    }

    fn cancel(&mut self) {}
}

/// A voice offered by the speech platform.
#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub name: String,
    pub language: String,
}

/// Pick a voice: first preferred name that exists, else the first voice
/// matching the configured language, else the platform default (`None`).
pub fn select_voice(
    available: &[VoiceInfo],
    preferred: &[String],
    language: &str,
) -> Option<String> {
    for name in preferred {
        if let Some(voice) = available.iter().find(|v| &v.name == name) {
            return Some(voice.name.clone());
        }
    }
    available
        .iter()
        .find(|v| v.language.starts_with(language))
        .map(|v| v.name.clone())
}

/// Announcer configuration
#[derive(Debug, Clone)]
pub struct AnnouncerConfig {
    pub enabled: bool,
    /// Cancel an in-flight utterance when new text arrives
    pub interrupt: bool,
    /// Minimum interval between dispatched utterances
    pub cooldown: Duration,
    /// Base stall timeout, extended per character
    pub stall_timeout_base: Duration,
    pub stall_timeout_per_char: Duration,
    /// Preference-ordered voice names
    pub preferred_voices: Vec<String>,
    pub language: String,
    pub rate: f32,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interrupt: true,
            cooldown: Duration::from_millis(1500),
            stall_timeout_base: Duration::from_millis(2000),
            stall_timeout_per_char: Duration::from_millis(100),
            preferred_voices: Vec::new(),
            language: "en".to_string(),
            rate: 1.0,
        }
    }
}

/// Serializes translation text into speech requests.
///
/// Never speaks the same text twice in a row, rate-limits dispatches, and
/// recovers from a backend that stops signalling completion by cancelling
/// after a timeout proportional to the text length.
pub struct SpeechAnnouncer {
    backend: Box<dyn SpeechBackend>,
    config: AnnouncerConfig,
    voice: Option<String>,
    last_spoken: Option<String>,
    last_dispatched_at: Option<Instant>,
    stall_deadline: Option<Instant>,
}

impl SpeechAnnouncer {
    pub fn new(backend: Box<dyn SpeechBackend>, config: AnnouncerConfig) -> Self {
        Self {
            backend,
            config,
            voice: None,
            last_spoken: None,
            last_dispatched_at: None,
            stall_deadline: None,
        }
    }

    /// Resolve the voice from the platform's available set.
    pub fn configure_voice(&mut self, available: &[VoiceInfo]) {
        self.voice = select_voice(available, &self.config.preferred_voices, &self.config.language);
        if let Some(voice) = &self.voice {
            println!("Using TTS voice: {}", voice);
        }
    }

    #[inline]
    pub fn is_speaking(&self) -> bool {
        self.stall_deadline.is_some()
    }

    /// Dispatch `text` to the backend. Returns whether an utterance started.
    pub fn speak(&mut self, text: &str, now: Instant) -> bool {
        if !self.config.enabled || text.is_empty() {
            return false;
        }
        if self.last_spoken.as_deref() == Some(text) {
            return false;
        }
        if let Some(last) = self.last_dispatched_at {
            if now.duration_since(last) < self.config.cooldown {
                return false;
            }
        }

        if self.is_speaking() {
            if !self.config.interrupt {
                return false;
            }
            self.backend.cancel();
            self.stall_deadline = None;
        }

        let request = SpeechRequest {
            text: spoken_form(text),
            voice: self.voice.clone(),
            rate: self.config.rate,
        };
        if let Err(e) = self.backend.dispatch(&request) {
            eprintln!("Failed to dispatch speech: {}", e);
            return false;
        }

        let timeout = self.config.stall_timeout_base
            + self.config.stall_timeout_per_char * text.chars().count() as u32;
        self.stall_deadline = Some(now + timeout);
        self.last_spoken = Some(text.to_string());
        self.last_dispatched_at = Some(now);
        true
    }

    /// Backend signalled normal completion.
    pub fn on_complete(&mut self) {
        self.stall_deadline = None;
    }

    /// Backend signalled an error: drop the utterance, no retry.
    pub fn on_error(&mut self, message: &str) {
        eprintln!("Speech backend error: {}", message);
        self.stall_deadline = None;
    }

    /// Stall watchdog; called once per frame tick. If the backend never
    /// signals completion the speaking flag is forcibly reset.
    pub fn poll(&mut self, now: Instant) {
        if let Some(deadline) = self.stall_deadline {
            if now >= deadline {
                eprintln!("Speech backend stalled, cancelling utterance");
                self.backend.cancel();
                self.stall_deadline = None;
            }
        }
    }

    /// Forget the dedup state, e.g. when a session restarts.
    pub fn reset(&mut self) {
        if self.is_speaking() {
            self.backend.cancel();
        }
        self.last_spoken = None;
        self.last_dispatched_at = None;
        self.stall_deadline = None;
    }
}

/// Single letters are wrapped so the platform voice does not swallow them.
fn spoken_form(text: &str) -> String {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => format!("The letter {}", c),
        _ => text.to_string(),
    }
}
