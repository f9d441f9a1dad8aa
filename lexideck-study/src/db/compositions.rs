//! Composition store operations

use sqlx::{Row, SqlitePool};
use lexideck_common::Result;

use crate::models::Composition;

/// Word texts are stored joined into one column; none of them may contain
/// the separator (they are single dictionary words).
const WORD_SEPARATOR: &str = ",";

/// Persist a composition, returning its row id
pub async fn save(pool: &SqlitePool, composition: &Composition) -> Result<i64> {
    let words = composition.words.join(WORD_SEPARATOR);

    let result = sqlx::query(
        r#"
        INSERT INTO compositions (words, title, body, body_translation, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&words)
    .bind(&composition.title)
    .bind(&composition.body)
    .bind(&composition.body_translation)
    .bind(composition.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Load a composition by id
pub async fn load(pool: &SqlitePool, id: i64) -> Result<Option<Composition>> {
    let row = sqlx::query(
        "SELECT id, words, title, body, body_translation, created_at FROM compositions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let words: String = row.get("words");
            let created_at: String = row.get("created_at");
            let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| {
                    lexideck_common::Error::Internal(format!("Failed to parse created_at: {}", e))
                })?
                .with_timezone(&chrono::Utc);

            Ok(Some(Composition {
                id: row.get("id"),
                words: words
                    .split(WORD_SEPARATOR)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                title: row.get("title"),
                body: row.get("body"),
                body_translation: row.get("body_translation"),
                created_at,
            }))
        }
        None => Ok(None),
    }
}
