//! Feedback record persistence
//!
//! The record moves monotonically Created → Classified. Both lifecycle
//! transitions are conditional updates so that concurrent duplicate
//! deliveries cannot clobber each other: a writer that loses the race
//! observes zero affected rows and leaves the record alone.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::{Error, Result};

/// Sentinel for the analysis fields of a record that has not been classified
pub const SENTIMENT_UNSET: f64 = -1.0;

/// A feedback submission and its accumulated processing state
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub guid: Uuid,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub classified: bool,
    pub classified_at: Option<DateTime<Utc>>,
    pub sentiment_score: f64,
    pub sentiment_magnitude: f64,
    pub reported_at: Option<DateTime<Utc>>,
}

impl FeedbackRecord {
    /// New unclassified record with sentinel analysis fields
    pub fn new(feedback: String) -> Self {
        Self {
            guid: Uuid::new_v4(),
            feedback,
            created_at: Utc::now(),
            classified: false,
            classified_at: None,
            sentiment_score: SENTIMENT_UNSET,
            sentiment_magnitude: SENTIMENT_UNSET,
            reported_at: None,
        }
    }
}

/// Persist a new record
pub async fn create_feedback(pool: &SqlitePool, record: &FeedbackRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO feedback (
            guid, feedback, created_at, classified, classified_at,
            sentiment_score, sentiment_magnitude, reported_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.guid.to_string())
    .bind(&record.feedback)
    .bind(record.created_at.to_rfc3339())
    .bind(record.classified)
    .bind(record.classified_at.map(|t| t.to_rfc3339()))
    .bind(record.sentiment_score)
    .bind(record.sentiment_magnitude)
    .bind(record.reported_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a record by id, `None` if it does not exist
pub async fn get_feedback(pool: &SqlitePool, guid: Uuid) -> Result<Option<FeedbackRecord>> {
    let row = sqlx::query(
        r#"
        SELECT guid, feedback, created_at, classified, classified_at,
               sentiment_score, sentiment_magnitude, reported_at
        FROM feedback
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid_str: String = row.get("guid");
            let created_at: String = row.get("created_at");
            let classified_at: Option<String> = row.get("classified_at");
            let reported_at: Option<String> = row.get("reported_at");

            Ok(Some(FeedbackRecord {
                guid: Uuid::parse_str(&guid_str)
                    .map_err(|e| Error::Internal(format!("stored guid is invalid: {}", e)))?,
                feedback: row.get("feedback"),
                created_at: parse_timestamp(&created_at)?,
                classified: row.get("classified"),
                classified_at: classified_at.as_deref().map(parse_timestamp).transpose()?,
                sentiment_score: row.get("sentiment_score"),
                sentiment_magnitude: row.get("sentiment_magnitude"),
                reported_at: reported_at.as_deref().map(parse_timestamp).transpose()?,
            }))
        }
        None => Ok(None),
    }
}

/// Transition a record Created → Classified.
///
/// Only touches rows still in the unclassified state. Returns `true` when
/// this caller performed the transition and `false` when another writer got
/// there first (or the record is gone).
pub async fn apply_classification(
    pool: &SqlitePool,
    guid: Uuid,
    score: f64,
    magnitude: f64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE feedback
        SET classified = 1,
            classified_at = ?,
            sentiment_score = ?,
            sentiment_magnitude = ?
        WHERE guid = ? AND classified = 0
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(score)
    .bind(magnitude)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Stamp a record as reported, first writer wins
pub async fn mark_reported(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE feedback
        SET reported_at = ?
        WHERE guid = ? AND reported_at IS NULL
        "#,
    )
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("stored timestamp is invalid: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;

    #[tokio::test]
    async fn create_and_load_roundtrip() {
        let pool = init_memory_database().await.unwrap();
        let record = FeedbackRecord::new("Great service!".to_string());
        create_feedback(&pool, &record).await.unwrap();

        let loaded = get_feedback(&pool, record.guid).await.unwrap().unwrap();
        assert_eq!(loaded.guid, record.guid);
        assert_eq!(loaded.feedback, "Great service!");
        assert!(!loaded.classified);
        assert_eq!(loaded.classified_at, None);
        assert_eq!(loaded.sentiment_score, SENTIMENT_UNSET);
        assert_eq!(loaded.sentiment_magnitude, SENTIMENT_UNSET);
        assert_eq!(loaded.reported_at, None);
    }

    #[tokio::test]
    async fn absent_record_loads_as_none() {
        let pool = init_memory_database().await.unwrap();
        let loaded = get_feedback(&pool, Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn classification_transition_happens_once() {
        let pool = init_memory_database().await.unwrap();
        let record = FeedbackRecord::new("decent".to_string());
        create_feedback(&pool, &record).await.unwrap();

        let first = apply_classification(&pool, record.guid, 0.8, 0.9).await.unwrap();
        assert!(first);

        // Second writer loses and must not clobber
        let second = apply_classification(&pool, record.guid, -0.5, 0.1).await.unwrap();
        assert!(!second);

        let loaded = get_feedback(&pool, record.guid).await.unwrap().unwrap();
        assert!(loaded.classified);
        assert!(loaded.classified_at.is_some());
        assert_eq!(loaded.sentiment_score, 0.8);
        assert_eq!(loaded.sentiment_magnitude, 0.9);
    }

    #[tokio::test]
    async fn classification_of_missing_record_affects_nothing() {
        let pool = init_memory_database().await.unwrap();
        let applied = apply_classification(&pool, Uuid::new_v4(), 0.1, 0.2).await.unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn reported_stamp_is_first_writer_wins() {
        let pool = init_memory_database().await.unwrap();
        let record = FeedbackRecord::new("ok".to_string());
        create_feedback(&pool, &record).await.unwrap();

        assert!(mark_reported(&pool, record.guid).await.unwrap());
        assert!(!mark_reported(&pool, record.guid).await.unwrap());

        let loaded = get_feedback(&pool, record.guid).await.unwrap().unwrap();
        assert!(loaded.reported_at.is_some());
    }
}
