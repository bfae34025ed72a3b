use crate::config::DEFAULT_COMPLETION_THRESHOLD;

/// Decides when a session counts as watched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionPolicy {
    threshold: f64,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_THRESHOLD)
    }
}

impl CompletionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Completion is sticky: once true it stays true.
    pub fn evaluate(&self, play_ratio: f64, completed_so_far: bool) -> bool {
        completed_so_far || play_ratio >= self.threshold
    }
}
