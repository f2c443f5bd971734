use std::fmt::Write;

use crate::models::ScoreRow;
use crate::stats::{self, GradingPolicy};

pub fn build_report(
    class_id: Option<i32>,
    learner_id: Option<i32>,
    rows: &[ScoreRow],
    policy: &GradingPolicy,
) -> String {
    let mut output = String::new();

    let scope_label = match (class_id, learner_id) {
        (Some(class), _) => format!("class {class}"),
        (None, Some(learner)) => format!("learner {learner}"),
        (None, None) => "all classes".to_string(),
    };

    let _ = writeln!(output, "# Gradebook Statistics Report");
    let _ = writeln!(
        output,
        "Generated for {} (exam {:.0}%, quiz {:.0}%, homework {:.0}%)",
        scope_label,
        policy.exam_weight * 100.0,
        policy.quiz_weight * 100.0,
        policy.homework_weight * 100.0
    );

    if rows.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No grades recorded for this scope.");
        return output;
    }

    if learner_id.is_some() && class_id.is_none() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Per-Class Weighted Averages");
        for average in stats::class_averages(rows, policy) {
            let _ = writeln!(output, "- class {}: {:.2}", average.class_id, average.avg);
        }
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Learner Weighted Averages");

    for average in stats::learner_averages(rows, policy) {
        let standing = if average.weighted_avg >= policy.pass_threshold {
            "pass"
        } else {
            "below threshold"
        };
        let _ = writeln!(
            output,
            "- learner {}: {:.2} ({})",
            average.learner_id, average.weighted_avg, standing
        );
    }

    let summary = stats::summarize(rows, policy);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Threshold Summary");
    let _ = writeln!(
        output,
        "{} of {} learners at or above {:.0} ({}%)",
        summary.passing, summary.total, policy.pass_threshold, summary.percentage
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreCategory;

    fn row(learner_id: i32, class_id: i32, category: ScoreCategory, score: f64) -> ScoreRow {
        ScoreRow {
            learner_id,
            class_id,
            category,
            score,
        }
    }

    #[test]
    fn class_report_lists_learners_and_summary() {
        let rows = vec![
            row(1, 110, ScoreCategory::Exam, 90.0),
            row(1, 110, ScoreCategory::Exam, 80.0),
            row(1, 110, ScoreCategory::Quiz, 70.0),
            row(1, 110, ScoreCategory::Homework, 100.0),
            row(2, 110, ScoreCategory::Exam, 60.0),
            row(2, 110, ScoreCategory::Quiz, 60.0),
            row(2, 110, ScoreCategory::Homework, 60.0),
        ];

        let report = build_report(Some(110), None, &rows, &GradingPolicy::default());
        assert!(report.contains("Generated for class 110"));
        assert!(report.contains("- learner 1: 83.50 (pass)"));
        assert!(report.contains("- learner 2: 60.00 (below threshold)"));
        assert!(report.contains("1 of 2 learners at or above 70 (50.00%)"));
    }

    #[test]
    fn learner_report_lists_classes() {
        let rows = vec![
            row(1, 110, ScoreCategory::Exam, 90.0),
            row(1, 215, ScoreCategory::Exam, 70.0),
        ];

        let report = build_report(None, Some(1), &rows, &GradingPolicy::default());
        assert!(report.contains("Generated for learner 1"));
        assert!(report.contains("- class 110: 45.00"));
        assert!(report.contains("- class 215: 35.00"));
        assert!(!report.contains("Threshold Summary"));
    }

    #[test]
    fn empty_scope_produces_placeholder() {
        let report = build_report(Some(999), None, &[], &GradingPolicy::default());
        assert!(report.contains("No grades recorded for this scope."));
    }
}
