use serde::Serialize;

/// One score entry joined with the learner and class of its grade document.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRow {
    pub learner_id: i32,
    pub class_id: i32,
    pub category: ScoreCategory,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreCategory {
    Exam,
    Quiz,
    Homework,
}

impl ScoreCategory {
    pub fn parse(value: &str) -> Option<ScoreCategory> {
        match value {
            "exam" => Some(ScoreCategory::Exam),
            "quiz" => Some(ScoreCategory::Quiz),
            "homework" => Some(ScoreCategory::Homework),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Exam => "exam",
            ScoreCategory::Quiz => "quiz",
            ScoreCategory::Homework => "homework",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LearnerAverage {
    pub learner_id: i32,
    pub weighted_avg: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassAverage {
    pub class_id: i32,
    pub avg: f64,
}

/// Wire shape of the `/stats` endpoints. The renamed fields are part of the
/// response contract.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    #[serde(rename = "learnersWithOver70")]
    pub passing: u64,
    #[serde(rename = "totalLearners")]
    pub total: u64,
    #[serde(rename = "percentageover70")]
    pub percentage: String,
}
