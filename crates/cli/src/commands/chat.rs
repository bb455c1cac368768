use inventra_agent::PipelineController;
use inventra_core::domain::conversation::SessionId;
use inventra_db::repositories::ConversationRepository;
use inventra_db::Repositories;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::commands::ask::answer;
use crate::commands::history::render_records;
use crate::commands::{block_on, load_config, open_database, repository_failure, CommandResult, Failure};

const PROMPT: &str = "you> ";

pub fn run(session: Option<String>) -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("chat", async {
        let pool = open_database(&config).await?;
        let repositories = Repositories::sqlite(pool.clone());
        let controller = PipelineController::from_config(&config, &repositories)
            .map_err(|error| ("agent_init", error.to_string(), 3u8))?;
        let session = session.map(SessionId).unwrap_or_else(SessionId::generate);

        let turns = converse(
            &controller,
            repositories.conversations.as_ref(),
            &session,
            config.pipeline.history_limit,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await;
        pool.close().await;

        Ok(format!("chat session {session} ended after {} turns", turns?))
    })
}

/// Read-eval loop over `input`. `history` and `clear` act on the session; `exit` or `quit`
/// (or end of input) stops. Returns the number of answered queries.
pub async fn converse<R, W>(
    controller: &PipelineController,
    conversations: &dyn ConversationRepository,
    session: &SessionId,
    history_limit: u32,
    input: R,
    mut output: W,
) -> Result<usize, Failure>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    emit(&mut output, &format!("Inventra chat (session {session}). Type `exit` to leave.\n")).await?;

    let mut turns = 0;
    let mut lines = input.lines();
    loop {
        emit(&mut output, PROMPT).await?;

        let Some(line) = lines.next_line().await.map_err(io_failure)? else { break };
        let query = line.trim();

        match query.to_ascii_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" => break,
            "history" => {
                let records = conversations
                    .session_history(session, history_limit)
                    .await
                    .map_err(repository_failure)?;
                emit(&mut output, &format!("{}\n", render_records(&records))).await?;
            }
            "clear" => {
                let removed =
                    conversations.clear_session(session).await.map_err(repository_failure)?;
                emit(&mut output, &format!("cleared {removed} messages\n")).await?;
            }
            _ => {
                let reply = match answer(controller, query, Some(session)).await {
                    Ok(response) => {
                        turns += 1;
                        response
                    }
                    Err((_, message, _)) => message,
                };
                emit(&mut output, &format!("inventra> {reply}\n\n")).await?;
            }
        }
    }

    Ok(turns)
}

async fn emit<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), Failure> {
    output.write_all(text.as_bytes()).await.map_err(io_failure)?;
    output.flush().await.map_err(io_failure)
}

fn io_failure(error: std::io::Error) -> Failure {
    ("io", error.to_string(), 9)
}
