//! Word store operations and the study selection policy

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use lexideck_common::Result;

use crate::models::{EnrichmentRecord, Word, WordStats};

/// Select up to `count` words for a study session
///
/// Never-studied words (`times_studied = 0`) are drawn first, uniformly at
/// random. If they don't cover the request, the remainder comes from
/// studied words ordered by ascending `times_studied` with random
/// tie-breaking, excluding words already picked. A store with fewer than
/// `count` eligible words returns them all; shortage is not an error.
pub async fn select_for_study(pool: &SqlitePool, count: usize) -> Result<Vec<Word>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut words = Vec::with_capacity(count);

    let rows = sqlx::query(
        r#"
        SELECT id, word, times_studied, enrichment, updated_at
        FROM words
        WHERE times_studied = 0
        ORDER BY RANDOM()
        LIMIT ?
        "#,
    )
    .bind(count as i64)
    .fetch_all(pool)
    .await?;

    for row in rows {
        words.push(word_from_row(&row)?);
    }

    // Fill the remainder from already-studied words, least-studied first
    if words.len() < count {
        let remaining = (count - words.len()) as i64;
        let selected_ids: Vec<i64> = words.iter().map(|w| w.id).collect();

        let rows = if selected_ids.is_empty() {
            sqlx::query(
                r#"
                SELECT id, word, times_studied, enrichment, updated_at
                FROM words
                WHERE times_studied > 0
                ORDER BY times_studied ASC, RANDOM()
                LIMIT ?
                "#,
            )
            .bind(remaining)
            .fetch_all(pool)
            .await?
        } else {
            let placeholders = vec!["?"; selected_ids.len()].join(",");
            let sql = format!(
                "SELECT id, word, times_studied, enrichment, updated_at \
                 FROM words \
                 WHERE times_studied > 0 AND id NOT IN ({}) \
                 ORDER BY times_studied ASC, RANDOM() \
                 LIMIT ?",
                placeholders
            );
            let mut query = sqlx::query(&sql);
            for id in &selected_ids {
                query = query.bind(*id);
            }
            query.bind(remaining).fetch_all(pool).await?
        };

        for row in rows {
            words.push(word_from_row(&row)?);
        }
    }

    Ok(words)
}

/// Persist a normalized enrichment record against a word
pub async fn record_enrichment(
    pool: &SqlitePool,
    word_id: i64,
    record: &EnrichmentRecord,
) -> Result<()> {
    let content = serde_json::to_string(record)
        .map_err(|e| lexideck_common::Error::Internal(format!("Failed to serialize enrichment: {}", e)))?;

    sqlx::query("UPDATE words SET enrichment = ?, updated_at = ? WHERE id = ?")
        .bind(&content)
        .bind(Utc::now().to_rfc3339())
        .bind(word_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Increment a word's study counter
///
/// Only called after the word's enrichment was persisted, so the counter
/// never moves for a word that failed enrichment.
pub async fn increment_times_studied(pool: &SqlitePool, word_id: i64) -> Result<()> {
    sqlx::query("UPDATE words SET times_studied = times_studied + 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(word_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert a word into the store, returning its id
///
/// Bootstrap/import helper; existing words are left untouched.
pub async fn insert_word(pool: &SqlitePool, word: &str) -> Result<i64> {
    let result = sqlx::query("INSERT OR IGNORE INTO words (word, updated_at) VALUES (?, ?)")
        .bind(word)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(result.last_insert_rowid());
    }

    let id: i64 = sqlx::query_scalar("SELECT id FROM words WHERE word = ?")
        .bind(word)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Load a word by id
pub async fn load_word(pool: &SqlitePool, word_id: i64) -> Result<Option<Word>> {
    let row = sqlx::query(
        "SELECT id, word, times_studied, enrichment, updated_at FROM words WHERE id = ?",
    )
    .bind(word_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(word_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Counters over the word and composition stores
pub async fn stats(pool: &SqlitePool) -> Result<WordStats> {
    let total_words: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM words")
        .fetch_one(pool)
        .await?;

    let never_studied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM words WHERE times_studied = 0")
            .fetch_one(pool)
            .await?;

    let studied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM words WHERE times_studied > 0")
        .fetch_one(pool)
        .await?;

    let with_enrichment: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM words WHERE enrichment != '{}'")
            .fetch_one(pool)
            .await?;

    let total_compositions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM compositions")
        .fetch_one(pool)
        .await?;

    Ok(WordStats {
        total_words,
        never_studied,
        studied,
        with_enrichment,
        total_compositions,
    })
}

fn word_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Word> {
    let enrichment_json: String = row.get("enrichment");
    // '{}' means "not yet enriched"; anything else must be a full record
    let enrichment = if enrichment_json.trim() == "{}" || enrichment_json.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<EnrichmentRecord>(&enrichment_json)
            .map(Some)
            .map_err(|e| {
                lexideck_common::Error::Internal(format!("Failed to deserialize enrichment: {}", e))
            })?
    };

    let updated_at: Option<String> = row.get("updated_at");
    let updated_at = updated_at
        .map(|s| chrono::DateTime::parse_from_rfc3339(&s))
        .transpose()
        .map_err(|e| lexideck_common::Error::Internal(format!("Failed to parse updated_at: {}", e)))?
        .map(|dt| dt.with_timezone(&chrono::Utc));

    Ok(Word {
        id: row.get("id"),
        word: row.get("word"),
        times_studied: row.get("times_studied"),
        enrichment,
        updated_at,
    })
}
