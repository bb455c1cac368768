use inventra_core::domain::conversation::{ConversationRecord, SessionId, SessionSummary};
use inventra_db::repositories::ConversationRepository;
use inventra_db::Repositories;

use crate::commands::{block_on, load_config, open_database, repository_failure, CommandResult};

pub struct HistoryArgs {
    pub session: Option<String>,
    pub search: Option<String>,
    pub clear: bool,
    pub limit: Option<u32>,
}

pub fn run(args: HistoryArgs) -> CommandResult {
    let config = match load_config("history") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let limit = args.limit.unwrap_or(config.pipeline.history_limit);

    block_on("history", async {
        let pool = open_database(&config).await?;
        let conversations = Repositories::sqlite(pool.clone()).conversations;

        let rendered = match (args.session.map(SessionId), args.search) {
            (Some(session), _) if args.clear => {
                let removed =
                    conversations.clear_session(&session).await.map_err(repository_failure)?;
                format!("cleared {removed} messages from session {session}")
            }
            (None, _) if args.clear => {
                return Err(("bad_request", "--clear requires --session".to_string(), 8));
            }
            (Some(session), _) => {
                let summary =
                    conversations.session_summary(&session).await.map_err(repository_failure)?;
                let records = conversations
                    .session_history(&session, limit)
                    .await
                    .map_err(repository_failure)?;
                format!("{}\n\n{}", render_summary(&summary), render_records(&records))
            }
            (None, Some(keyword)) => {
                let records =
                    conversations.search(&keyword, limit).await.map_err(repository_failure)?;
                render_records(&records)
            }
            (None, None) => {
                let records = conversations.recent(limit).await.map_err(repository_failure)?;
                render_records(&records)
            }
        };

        pool.close().await;
        Ok(rendered)
    })
}

pub fn render_records(records: &[ConversationRecord]) -> String {
    if records.is_empty() {
        return "No conversations found.".to_string();
    }

    records
        .iter()
        .map(|record| {
            format!(
                "[{}] {} ({})\n  You: {}\n  Inventra: {}",
                record.created_at.format("%Y-%m-%d %H:%M:%S"),
                record.session_id,
                record.intent.as_deref().unwrap_or("unknown"),
                record.user_message,
                record.assistant_message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_summary(summary: &SessionSummary) -> String {
    let mut lines = vec![format!(
        "Session {}: {} messages",
        summary.session_id, summary.total_messages
    )];
    if let (Some(first), Some(last)) = (summary.first_message, summary.last_message) {
        lines.push(format!(
            "Active {} to {}",
            first.format("%Y-%m-%d %H:%M:%S"),
            last.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    for (intent, count) in &summary.intent_distribution {
        lines.push(format!("  {intent}: {count}"));
    }
    lines.join("\n")
}
