use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::gesture_classifier::{Candidate, GestureLabel};

/// Configuration for detection stabilization
#[derive(Debug, Clone)]
pub struct StabilizerConfig {
    /// Number of recent frame labels kept in the voting window
    pub window: usize,
    /// Minimum occurrences within the window before a label is eligible
    pub min_repeats: usize,
    /// Minimum interval between accepted stable gesture events
    pub cooldown: Duration,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: 7,
            min_repeats: 3,
            cooldown: Duration::from_millis(400),
        }
    }
}

/// A debounced, confirmed gesture transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableGestureEvent {
    /// Confirmed label, or `None` for the no-gesture transition.
    pub label: Option<GestureLabel>,
    pub confidence: f32,
    /// When the winning label first entered the current window.
    pub first_observed_at: Instant,
    pub timestamp: Instant,
}

impl StableGestureEvent {
    pub fn is_no_gesture(&self) -> bool {
        self.label.is_none()
    }
}

/// Converts the noisy per-frame candidate stream into a stable gesture stream.
///
/// Keeps a bounded FIFO of recent labels, confirms the most frequent one once
/// it has enough repeats, and only ever emits on a change: the same label is
/// never emitted twice in a row without an intervening different label or a
/// no-gesture gap. Accepted label events are additionally rate-limited by a
/// cooldown so hand jitter at a decision boundary cannot re-trigger.
pub struct DetectionStabilizer {
    config: StabilizerConfig,
    buffer: VecDeque<(Option<GestureLabel>, Instant)>,
    last_stable_label: Option<GestureLabel>,
    last_emitted_at: Option<Instant>,
}

impl DetectionStabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        let capacity = config.window;
        Self {
            config,
            buffer: VecDeque::with_capacity(capacity),
            last_stable_label: None,
            last_emitted_at: None,
        }
    }

    /// Reset all stabilizer state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_stable_label = None;
        self.last_emitted_at = None;
    }

    /// Currently confirmed label, if any.
    #[inline]
    pub fn last_stable_label(&self) -> Option<GestureLabel> {
        self.last_stable_label
    }

    /// Feed one per-frame candidate and return a stable event if the window
    /// just confirmed a transition.
    pub fn observe(&mut self, candidate: &Candidate) -> Option<StableGestureEvent> {
        self.buffer.push_back((candidate.label, candidate.timestamp));
        while self.buffer.len() > self.config.window {
            self.buffer.pop_front();
        }

        if let Some(winner) = self.eligible_label() {
            if Some(winner) == self.last_stable_label {
                return None;
            }

            // Cooldown suppresses re-triggering on jitter right after an
            // accepted event.
            if let Some(last) = self.last_emitted_at {
                if candidate.timestamp.duration_since(last) < self.config.cooldown {
                    return None;
                }
            }

            let confidence = if candidate.label == Some(winner) {
                candidate.confidence
            } else {
                winner.nominal_confidence()
            };
            let first_observed_at = self.first_seen(winner).unwrap_or(candidate.timestamp);

            self.last_stable_label = Some(winner);
            self.last_emitted_at = Some(candidate.timestamp);

            if cfg!(debug_assertions) {
                println!("Stable gesture: {}", winner.as_str());
            }

            return Some(StableGestureEvent {
                label: Some(winner),
                confidence,
                first_observed_at,
                timestamp: candidate.timestamp,
            });
        }

        // A sustained all-null window marks the transition out of the last
        // confirmed gesture, emitted exactly once.
        if self.window_is_null() && self.last_stable_label.is_some() {
            self.last_stable_label = None;

            if cfg!(debug_assertions) {
                println!("Stable gesture: none");
            }

            let first_observed_at = self
                .buffer
                .front()
                .map(|(_, t)| *t)
                .unwrap_or(candidate.timestamp);
            return Some(StableGestureEvent {
                label: None,
                confidence: 0.0,
                first_observed_at,
                timestamp: candidate.timestamp,
            });
        }

        None
    }

    /// Most frequent non-null label meeting the repeat threshold.
    ///
    /// Ties resolve to the label seen first in buffer order, which keeps the
    /// vote deterministic.
    fn eligible_label(&self) -> Option<GestureLabel> {
        let mut tallies: Vec<(GestureLabel, usize)> = Vec::new();
        for (label, _) in &self.buffer {
            if let Some(label) = label {
                match tallies.iter_mut().find(|(l, _)| l == label) {
                    Some((_, count)) => *count += 1,
                    None => tallies.push((*label, 1)),
                }
            }
        }

        let mut best: Option<(GestureLabel, usize)> = None;
        for (label, count) in tallies {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((label, count));
            }
        }

        best.filter(|(_, count)| *count >= self.config.min_repeats)
            .map(|(label, _)| label)
    }

    fn first_seen(&self, label: GestureLabel) -> Option<Instant> {
        self.buffer
            .iter()
            .find(|(l, _)| *l == Some(label))
            .map(|(_, t)| *t)
    }

    fn window_is_null(&self) -> bool {
        self.buffer.len() == self.config.window && self.buffer.iter().all(|(l, _)| l.is_none())
    }
}
