use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{ScoreCategory, ScoreRow};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let grades = vec![
        (Uuid::parse_str("5b9f6f2e-7c4a-4f4e-9a65-1d2b8e3c9a01")?, 1, 110),
        (Uuid::parse_str("9a1c2d3e-4f5a-4b6c-8d7e-2f3a4b5c6d02")?, 2, 110),
        (Uuid::parse_str("1f2e3d4c-5b6a-4978-8695-3a4b5c6d7e03")?, 1, 215),
        (Uuid::parse_str("7d6c5b4a-3f2e-4d1c-9b8a-4b5c6d7e8f04")?, 3, 215),
        (Uuid::parse_str("2b3c4d5e-6f7a-4859-9a6b-5c6d7e8f9a05")?, 1, 300),
    ];

    for (id, learner_id, class_id) in grades {
        sqlx::query(
            r#"
            INSERT INTO gradebook.grades (id, learner_id, class_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (learner_id, class_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(learner_id)
        .bind(class_id)
        .execute(pool)
        .await?;
    }

    let scores = vec![
        ("seed-001", 1, 110, ScoreCategory::Exam, 90.0),
        ("seed-002", 1, 110, ScoreCategory::Exam, 80.0),
        ("seed-003", 1, 110, ScoreCategory::Quiz, 70.0),
        ("seed-004", 1, 110, ScoreCategory::Homework, 100.0),
        ("seed-005", 2, 110, ScoreCategory::Exam, 60.0),
        ("seed-006", 2, 110, ScoreCategory::Quiz, 60.0),
        ("seed-007", 2, 110, ScoreCategory::Homework, 60.0),
        ("seed-008", 1, 215, ScoreCategory::Exam, 70.0),
        ("seed-009", 1, 215, ScoreCategory::Quiz, 80.0),
        ("seed-010", 1, 215, ScoreCategory::Homework, 90.0),
        ("seed-011", 3, 215, ScoreCategory::Exam, 85.0),
        ("seed-012", 3, 215, ScoreCategory::Quiz, 95.0),
        ("seed-013", 3, 215, ScoreCategory::Homework, 75.0),
        ("seed-014", 1, 300, ScoreCategory::Exam, 50.0),
        ("seed-015", 1, 300, ScoreCategory::Quiz, 40.0),
        ("seed-016", 1, 300, ScoreCategory::Homework, 30.0),
    ];

    for (source_key, learner_id, class_id, category, score) in scores {
        let grade_id: Uuid = sqlx::query(
            "SELECT id FROM gradebook.grades WHERE learner_id = $1 AND class_id = $2",
        )
        .bind(learner_id)
        .bind(class_id)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO gradebook.scores (id, grade_id, category, score, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(grade_id)
        .bind(category.as_str())
        .bind(score)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Fetch score entries joined with their grade document, optionally scoped
/// to one class or to one learner. The scopes are mutually exclusive; class
/// wins when both are given.
pub async fn fetch_score_rows(
    pool: &PgPool,
    class_id: Option<i32>,
    learner_id: Option<i32>,
) -> anyhow::Result<Vec<ScoreRow>> {
    let mut query = String::from(
        "SELECT g.learner_id, g.class_id, s.category, s.score \
         FROM gradebook.scores s \
         JOIN gradebook.grades g ON g.id = s.grade_id",
    );

    if class_id.is_some() {
        query.push_str(" WHERE g.class_id = $1");
    } else if learner_id.is_some() {
        query.push_str(" WHERE g.learner_id = $1");
    }

    let mut rows = sqlx::query(&query);

    if let Some(value) = class_id {
        rows = rows.bind(value);
    } else if let Some(value) = learner_id {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut scores = Vec::new();

    for record in records {
        let category: String = record.get("category");
        let category = ScoreCategory::parse(&category)
            .with_context(|| format!("unknown score category '{category}' in store"))?;
        scores.push(ScoreRow {
            learner_id: record.get("learner_id"),
            class_id: record.get("class_id"),
            category,
            score: record.get("score"),
        });
    }

    Ok(scores)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        learner_id: i32,
        class_id: i32,
        category: String,
        score: f64,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let category = ScoreCategory::parse(&row.category)
            .with_context(|| format!("unknown score category '{}'", row.category))?;

        let grade_id: Uuid = sqlx::query(
            r#"
            INSERT INTO gradebook.grades (id, learner_id, class_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (learner_id, class_id) DO UPDATE
            SET learner_id = EXCLUDED.learner_id
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.learner_id)
        .bind(row.class_id)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO gradebook.scores (id, grade_id, category, score, source_key)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(grade_id)
        .bind(category.as_str())
        .bind(row.score)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
