//! Result Synthesizer: confidence, recommendations and change record.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::session::{CodeChange, Status, WorkflowResult, WorkflowStep};

/// Upper bound on extracted recommendations.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Synthetic path used for the single change record.
pub const CHANGE_FILE_PATH: &str = "modified_code";
pub const CHANGE_EXPLANATION: &str = "AI-generated improvements based on workflow analysis";

/// From an advice keyword through the next sentence terminator.
static RECOMMENDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:recommend|suggest|should|consider)[^.!?]*[.!?]")
        .expect("recommendation regex is valid")
});

pub fn synthesize(final_output: &str, steps: &[WorkflowStep], original_code: &str) -> WorkflowResult {
    WorkflowResult {
        final_output: final_output.to_string(),
        confidence: confidence(steps),
        recommendations: extract_recommendations(steps),
        changes: extract_changes(original_code, final_output),
    }
}

/// Percentage of recorded steps that completed, rounded; 0 with no steps.
pub fn confidence(steps: &[WorkflowStep]) -> u8 {
    if steps.is_empty() {
        return 0;
    }
    let total = steps.len();
    let completed = steps.iter().filter(|s| s.status == Status::Completed).count();
    let pct = (completed * 100 + total / 2) / total;
    u8::try_from(pct).unwrap_or(100)
}

/// Advice sentences from completed steps, first-seen order, deduplicated, capped.
pub fn extract_recommendations(steps: &[WorkflowStep]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for output in steps.iter().filter_map(WorkflowStep::completed_output) {
        for m in RECOMMENDATION_RE.find_iter(output) {
            let text = m.as_str().trim().to_string();
            if seen.insert(text.clone()) {
                out.push(text);
                if out.len() == MAX_RECOMMENDATIONS {
                    return out;
                }
            }
        }
    }
    out
}

pub fn extract_changes(original_code: &str, final_output: &str) -> Vec<CodeChange> {
    if original_code.is_empty() || final_output.is_empty() {
        return Vec::new();
    }
    vec![CodeChange {
        file_path: CHANGE_FILE_PATH.to_string(),
        original_code: original_code.to_string(),
        modified_code: final_output.to_string(),
        explanation: CHANGE_EXPLANATION.to_string(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn completed(output: &str) -> WorkflowStep {
        let mut step = WorkflowStep::new("a", "p");
        step.start().unwrap();
        step.complete(output, None, Duration::ZERO).unwrap();
        step
    }

    fn failed(message: &str) -> WorkflowStep {
        let mut step = WorkflowStep::new("a", "p");
        step.start().unwrap();
        step.fail(message, Duration::ZERO).unwrap();
        step
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence(&[]), 0);
        assert_eq!(confidence(&[completed("x"), completed("y")]), 100);
        assert_eq!(confidence(&[completed("x"), failed("e")]), 50);
        assert_eq!(confidence(&[completed("x"), completed("y"), failed("e")]), 67);
    }

    #[test]
    fn test_recommendations_case_insensitive_and_deduped() {
        let steps = [
            completed("Looks fine. We Should add tests. Consider caching the result!"),
            completed("We Should add tests. I recommend renaming x?"),
        ];
        let recs = extract_recommendations(&steps);
        assert_eq!(
            recs,
            vec![
                "Should add tests.",
                "Consider caching the result!",
                "recommend renaming x?",
            ]
        );
    }

    #[test]
    fn test_recommendations_skip_failed_steps() {
        let steps = [failed("You should check your API key.")];
        assert!(extract_recommendations(&steps).is_empty());
    }

    #[test]
    fn test_recommendations_capped() {
        let text: String = (0..25).map(|i| format!("You should fix item {i}. ")).collect();
        let recs = extract_recommendations(&[completed(&text)]);
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0], "should fix item 0.");
    }

    #[test]
    fn test_changes_require_both_sides() {
        assert!(extract_changes("", "new").is_empty());
        assert!(extract_changes("old", "").is_empty());
        let changes = extract_changes("old", "new");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file_path, CHANGE_FILE_PATH);
        assert_eq!(changes[0].modified_code, "new");
    }

    #[test]
    fn test_synthesize_assembles_result() {
        let result = synthesize("final", &[completed("consider it done.")], "orig");
        assert_eq!(result.final_output, "final");
        assert_eq!(result.confidence, 100);
        assert_eq!(result.recommendations, vec!["consider it done."]);
        assert_eq!(result.changes[0].original_code, "orig");
    }
}
