//! Abstention policy.
//!
//! The engine declines to answer rather than cite weak evidence: if the
//! governing score of the best retrieved context falls below a fixed
//! threshold, no answer text is assembled. Both retrieval modes report
//! their governing score on the same [0, 1] scale, so one threshold
//! covers both.

use crate::config::SCORE_THRESHOLD;

/// Threshold-based abstention decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbstainPolicy {
    /// Minimum governing score required to answer.
    pub threshold: f32,
}

impl AbstainPolicy {
    /// Creates a policy with the given threshold.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Decides whether to abstain given the top context's governing score.
    ///
    /// `None` (no contexts at all) always abstains. The comparison is
    /// strict: a score exactly at the threshold answers.
    pub fn should_abstain(&self, top_score: Option<f32>) -> bool {
        match top_score {
            Some(score) => score < self.threshold,
            None => true,
        }
    }
}

impl Default for AbstainPolicy {
    fn default() -> Self {
        Self::new(SCORE_THRESHOLD)
    }
}

/// Maps a squared-Euclidean distance into a [0, 1] similarity.
///
/// `1 / (1 + d)`: an exact match scores 1.0 and the score decays toward 0
/// as distance grows. This is the governing score in baseline mode, putting
/// it on the same scale as the fused hybrid score.
pub fn baseline_similarity(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}
