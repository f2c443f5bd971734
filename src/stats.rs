use std::collections::HashMap;

use crate::models::{ClassAverage, LearnerAverage, ScoreCategory, ScoreRow, StatsSummary};

/// Grading policy: category weights plus the passing threshold. The weights
/// must sum to 1.0 for averages to stay on the 0-100 scale.
#[derive(Debug, Clone, Copy)]
pub struct GradingPolicy {
    pub exam_weight: f64,
    pub quiz_weight: f64,
    pub homework_weight: f64,
    pub pass_threshold: f64,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        GradingPolicy {
            exam_weight: 0.5,
            quiz_weight: 0.3,
            homework_weight: 0.2,
            pass_threshold: 70.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct CategoryTally {
    sum: f64,
    count: usize,
}

impl CategoryTally {
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Running per-category totals for one grouping key.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreTotals {
    exam: CategoryTally,
    quiz: CategoryTally,
    homework: CategoryTally,
}

impl ScoreTotals {
    pub fn add(&mut self, category: ScoreCategory, score: f64) {
        let tally = match category {
            ScoreCategory::Exam => &mut self.exam,
            ScoreCategory::Quiz => &mut self.quiz,
            ScoreCategory::Homework => &mut self.homework,
        };
        tally.sum += score;
        tally.count += 1;
    }

    /// A category with no entries contributes zero; weights are not
    /// renormalized and the entity stays in the result set.
    pub fn weighted_average(&self, policy: &GradingPolicy) -> f64 {
        policy.exam_weight * self.exam.mean().unwrap_or(0.0)
            + policy.quiz_weight * self.quiz.mean().unwrap_or(0.0)
            + policy.homework_weight * self.homework.mean().unwrap_or(0.0)
    }
}

pub fn learner_averages(rows: &[ScoreRow], policy: &GradingPolicy) -> Vec<LearnerAverage> {
    let mut totals: HashMap<i32, ScoreTotals> = HashMap::new();

    for row in rows.iter() {
        totals
            .entry(row.learner_id)
            .or_default()
            .add(row.category, row.score);
    }

    let mut averages: Vec<LearnerAverage> = totals
        .into_iter()
        .map(|(learner_id, totals)| LearnerAverage {
            learner_id,
            weighted_avg: totals.weighted_average(policy),
        })
        .collect();
    averages.sort_by(|a, b| {
        b.weighted_avg
            .partial_cmp(&a.weighted_avg)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    averages
}

/// Per-class weighted averages for rows already scoped to one learner,
/// ascending by class identifier.
pub fn class_averages(rows: &[ScoreRow], policy: &GradingPolicy) -> Vec<ClassAverage> {
    let mut totals: HashMap<i32, ScoreTotals> = HashMap::new();

    for row in rows.iter() {
        totals
            .entry(row.class_id)
            .or_default()
            .add(row.category, row.score);
    }

    let mut averages: Vec<ClassAverage> = totals
        .into_iter()
        .map(|(class_id, totals)| ClassAverage {
            class_id,
            avg: totals.weighted_average(policy),
        })
        .collect();
    averages.sort_by_key(|average| average.class_id);
    averages
}

/// Threshold summary over one scan of the rows: the distinct-learner total
/// comes from the same grouping pass that feeds the averages.
pub fn summarize(rows: &[ScoreRow], policy: &GradingPolicy) -> StatsSummary {
    let averages = learner_averages(rows, policy);
    let total = averages.len();
    let passing = averages
        .iter()
        .filter(|average| average.weighted_avg >= policy.pass_threshold)
        .count();

    let percentage = if total == 0 {
        0.0
    } else {
        passing as f64 / total as f64 * 100.0
    };

    StatsSummary {
        passing: passing as u64,
        total: total as u64,
        percentage: format!("{percentage:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(learner_id: i32, class_id: i32, category: ScoreCategory, score: f64) -> ScoreRow {
        ScoreRow {
            learner_id,
            class_id,
            category,
            score,
        }
    }

    fn learner_one_rows() -> Vec<ScoreRow> {
        vec![
            row(1, 110, ScoreCategory::Exam, 90.0),
            row(1, 110, ScoreCategory::Exam, 80.0),
            row(1, 110, ScoreCategory::Quiz, 70.0),
            row(1, 110, ScoreCategory::Homework, 100.0),
        ]
    }

    #[test]
    fn weighted_average_combines_category_means() {
        let averages = learner_averages(&learner_one_rows(), &GradingPolicy::default());
        assert_eq!(averages.len(), 1);
        assert_eq!(averages[0].learner_id, 1);
        // 0.5 * 85 + 0.3 * 70 + 0.2 * 100
        assert!((averages[0].weighted_avg - 83.5).abs() < 1e-9);
    }

    #[test]
    fn average_is_invariant_under_reordering() {
        let mut rows = learner_one_rows();
        rows.reverse();
        let forward = learner_averages(&learner_one_rows(), &GradingPolicy::default());
        let backward = learner_averages(&rows, &GradingPolicy::default());
        assert_eq!(forward[0].weighted_avg, backward[0].weighted_avg);
    }

    #[test]
    fn missing_category_contributes_zero() {
        let rows = vec![row(7, 110, ScoreCategory::Exam, 90.0)];
        let averages = learner_averages(&rows, &GradingPolicy::default());
        assert!((averages[0].weighted_avg - 45.0).abs() < 1e-9);

        let summary = summarize(&rows, &GradingPolicy::default());
        assert_eq!(summary.total, 1);
        assert_eq!(summary.passing, 0);
    }

    #[test]
    fn summary_counts_learners_at_or_above_threshold() {
        let mut rows = learner_one_rows();
        rows.extend([
            row(2, 110, ScoreCategory::Exam, 60.0),
            row(2, 110, ScoreCategory::Quiz, 60.0),
            row(2, 110, ScoreCategory::Homework, 60.0),
        ]);

        let summary = summarize(&rows, &GradingPolicy::default());
        assert_eq!(summary.passing, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.percentage, "50.00");
    }

    #[test]
    fn empty_scope_reports_zero_not_nan() {
        let summary = summarize(&[], &GradingPolicy::default());
        assert_eq!(summary.passing, 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percentage, "0.00");
    }

    #[test]
    fn percentage_always_has_two_decimals() {
        let rows = vec![
            row(1, 110, ScoreCategory::Exam, 90.0),
            row(2, 110, ScoreCategory::Exam, 10.0),
            row(3, 110, ScoreCategory::Exam, 10.0),
        ];
        let policy = GradingPolicy {
            pass_threshold: 45.0,
            ..GradingPolicy::default()
        };
        let summary = summarize(&rows, &policy);
        assert_eq!(summary.percentage, "33.33");
    }

    #[test]
    fn breakdown_returns_one_entry_per_class() {
        let rows = vec![
            row(1, 110, ScoreCategory::Exam, 90.0),
            row(1, 110, ScoreCategory::Exam, 80.0),
            row(1, 110, ScoreCategory::Quiz, 70.0),
            row(1, 110, ScoreCategory::Homework, 100.0),
            row(1, 215, ScoreCategory::Exam, 70.0),
            row(1, 215, ScoreCategory::Quiz, 80.0),
            row(1, 215, ScoreCategory::Homework, 90.0),
            row(1, 300, ScoreCategory::Exam, 50.0),
            row(1, 300, ScoreCategory::Quiz, 40.0),
            row(1, 300, ScoreCategory::Homework, 30.0),
        ];

        let averages = class_averages(&rows, &GradingPolicy::default());
        assert_eq!(averages.len(), 3);
        assert_eq!(averages[0].class_id, 110);
        assert!((averages[0].avg - 83.5).abs() < 1e-9);
        assert_eq!(averages[1].class_id, 215);
        assert!((averages[1].avg - 77.0).abs() < 1e-9);
        assert_eq!(averages[2].class_id, 300);
        assert!((averages[2].avg - 43.0).abs() < 1e-9);
    }

    #[test]
    fn custom_policy_overrides_threshold() {
        let rows = learner_one_rows();
        let strict = GradingPolicy {
            pass_threshold: 90.0,
            ..GradingPolicy::default()
        };
        let summary = summarize(&rows, &strict);
        assert_eq!(summary.passing, 0);
        assert_eq!(summary.total, 1);
    }
}
