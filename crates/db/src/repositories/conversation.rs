use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::sqlite::SqliteRow;

use inventra_core::domain::conversation::{
    ConversationMetadata, ConversationRecord, NewConversation, SessionId, SessionSummary,
};

use super::{column, format_timestamp, parse_timestamp, ConversationRepository, RepositoryError};
use crate::DbPool;

const CONVERSATION_COLUMNS: &str =
    "id, session_id, user_message, assistant_message, intent, metadata, created_at";

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Unreadable metadata is treated as empty rather than failing the whole history.
fn parse_metadata(raw: Option<&str>) -> ConversationMetadata {
    raw.and_then(|json| serde_json::from_str(json).ok()).unwrap_or_default()
}

fn serialize_metadata(metadata: &ConversationMetadata) -> Result<Option<String>, RepositoryError> {
    if *metadata == ConversationMetadata::default() {
        return Ok(None);
    }
    serde_json::to_string(metadata)
        .map(Some)
        .map_err(|e| RepositoryError::Decode(format!("metadata serialization failed: {e}")))
}

fn row_to_record(row: &SqliteRow) -> Result<ConversationRecord, RepositoryError> {
    let metadata: Option<String> = column(row, "metadata")?;
    let created_at: String = column(row, "created_at")?;

    Ok(ConversationRecord {
        id: column(row, "id")?,
        session_id: SessionId(column(row, "session_id")?),
        user_message: column(row, "user_message")?,
        assistant_message: column(row, "assistant_message")?,
        intent: column(row, "intent")?,
        metadata: parse_metadata(metadata.as_deref()),
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn append(&self, conversation: NewConversation) -> Result<i64, RepositoryError> {
        let metadata = serialize_metadata(&conversation.metadata)?;
        let result = sqlx::query(
            "INSERT INTO conversations (session_id, user_message, assistant_message, intent,
                                        metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.session_id.as_str())
        .bind(&conversation.user_message)
        .bind(&conversation.assistant_message)
        .bind(&conversation.intent)
        .bind(metadata)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn session_history(
        &self,
        session_id: &SessionId,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE session_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(session_id.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut records = rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()?;
        records.reverse();
        Ok(records)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<ConversationRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        );
        let rows = sqlx::query(&sql).bind(i64::from(limit)).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn search(
        &self,
        keyword: &str,
        limit: u32,
    ) -> Result<Vec<ConversationRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations
             WHERE user_message LIKE ?1 OR assistant_message LIKE ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(format!("%{keyword}%"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn session_summary(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionSummary, RepositoryError> {
        let range = sqlx::query(
            "SELECT COUNT(*) AS count, MIN(created_at) AS first, MAX(created_at) AS last
             FROM conversations WHERE session_id = ?",
        )
        .bind(session_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        let first: Option<String> = column(&range, "first")?;
        let last: Option<String> = column(&range, "last")?;

        let mut intent_distribution = BTreeMap::new();
        for row in sqlx::query(
            "SELECT intent, COUNT(*) AS count FROM conversations
             WHERE session_id = ? AND intent IS NOT NULL
             GROUP BY intent",
        )
        .bind(session_id.as_str())
        .fetch_all(&self.pool)
        .await?
        {
            intent_distribution.insert(column::<String>(&row, "intent")?, column::<i64>(&row, "count")?);
        }

        Ok(SessionSummary {
            session_id: session_id.clone(),
            total_messages: column(&range, "count")?,
            intent_distribution,
            first_message: first.as_deref().map(|raw| parse_timestamp("first", raw)).transpose()?,
            last_message: last.as_deref().map(|raw| parse_timestamp("last", raw)).transpose()?,
        })
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE session_id = ?")
            .bind(session_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use inventra_core::domain::conversation::{ConversationMetadata, NewConversation, SessionId};

    use super::{parse_metadata, SqlConversationRepository};
    use crate::repositories::ConversationRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlConversationRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlConversationRepository::new(pool)
    }

    fn turn(session: &SessionId, question: &str, intent: Option<&str>) -> NewConversation {
        NewConversation {
            session_id: session.clone(),
            user_message: question.to_string(),
            assistant_message: format!("answer to {question}"),
            intent: intent.map(str::to_string),
            metadata: ConversationMetadata {
                region: Some("north".to_string()),
                ..ConversationMetadata::default()
            },
        }
    }

    #[tokio::test]
    async fn history_is_chronological_and_limited_to_latest_turns() {
        let repo = setup().await;
        let session = SessionId("s-1".to_string());
        for question in ["first", "second", "third"] {
            repo.append(turn(&session, question, Some("general"))).await.expect("append");
        }
        repo.append(turn(&SessionId("other".to_string()), "elsewhere", None)).await.expect("append");

        let history = repo.session_history(&session, 2).await.expect("history");
        let questions: Vec<_> = history.iter().map(|r| r.user_message.as_str()).collect();
        assert_eq!(questions, vec!["second", "third"]);
        assert_eq!(history[0].metadata.region.as_deref(), Some("north"));

        let recent = repo.recent(1).await.expect("recent");
        assert_eq!(recent[0].user_message, "elsewhere");
    }

    #[tokio::test]
    async fn search_summary_and_clear() {
        let repo = setup().await;
        let session = SessionId("s-2".to_string());
        repo.append(turn(&session, "low stock in north", Some("inventory_status"))).await.expect("a");
        repo.append(turn(&session, "vendor for umbrellas", Some("vendor_selection"))).await.expect("a");
        repo.append(turn(&session, "hello", None)).await.expect("a");

        let hits = repo.search("umbrella", 20).await.expect("search");
        assert_eq!(hits.len(), 1);

        let summary = repo.session_summary(&session).await.expect("summary");
        assert_eq!(summary.total_messages, 3);
        assert_eq!(summary.intent_distribution.len(), 2);
        assert!(summary.first_message <= summary.last_message);

        assert_eq!(repo.clear_session(&session).await.expect("clear"), 3);
        let empty = repo.session_summary(&session).await.expect("summary");
        assert_eq!(empty.total_messages, 0);
        assert_eq!(empty.first_message, None);
    }

    #[test]
    fn corrupt_metadata_reads_as_empty() {
        assert_eq!(parse_metadata(Some("{not json")), ConversationMetadata::default());
        assert_eq!(parse_metadata(None), ConversationMetadata::default());
    }
}
