use super::types::AnalysisResult;

/// Threshold decision between accepted and rejected posts.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceGate {
    threshold: f64,
}

impl RelevanceGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly greater than the threshold; a score equal to it is rejected.
    pub fn accepts(&self, analysis: &AnalysisResult) -> bool {
        analysis.relevance > self.threshold
    }
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Intent, Sentiment};

    fn scored(relevance: f64) -> AnalysisResult {
        AnalysisResult {
            relevance,
            intent: Intent::Question,
            sentiment: Sentiment::Neutral,
            summary: String::new(),
            suggestion: String::new(),
        }
    }

    #[test]
    fn test_boundary_rejects() {
        let gate = RelevanceGate::default();
        assert!(!gate.accepts(&scored(0.5)));
        assert!(gate.accepts(&scored(0.50001)));
        assert!(!gate.accepts(&scored(0.49999)));
    }

    #[test]
    fn test_accepts_iff_strictly_greater() {
        let thresholds = [0.0, 0.25, 0.5, 0.75, 1.0];
        let scores = [-0.5, 0.0, 0.1, 0.25, 0.5, 0.5000001, 0.75, 0.99, 1.0, 1.5];
        for t in thresholds {
            let gate = RelevanceGate::new(t);
            for r in scores {
                assert_eq!(gate.accepts(&scored(r)), r > t, "r={r} t={t}");
            }
        }
    }

    #[test]
    fn test_out_of_range_scores_are_not_clamped() {
        let gate = RelevanceGate::new(0.9);
        assert!(gate.accepts(&scored(1.7)));
        assert!(!RelevanceGate::new(-1.0).accepts(&scored(-2.0)));
    }
}
