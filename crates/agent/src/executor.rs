use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, ChatModel, ToolCallRequest};
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

pub fn iteration_cap_message(max_iterations: u32) -> String {
    format!("Analysis stopped after {max_iterations} iterations without a final answer.")
}

/// Bounded tool-calling loop. Every `run` starts from an empty transcript; nothing carries over
/// between calls.
pub struct AnalysisExecutor {
    model: Arc<dyn ChatModel>,
    max_iterations: u32,
}

impl AnalysisExecutor {
    pub fn new(model: Arc<dyn ChatModel>, max_iterations: u32) -> Self {
        Self { model, max_iterations: max_iterations.max(1) }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub async fn run(&self, system_prompt: &str, prompt: &str, tools: &ToolRegistry) -> Result<String> {
        let specs = tools.specs();
        let mut transcript = vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)];

        for iteration in 1..=self.max_iterations {
            let reply = self.model.chat(&transcript, &specs).await?;

            if reply.tool_calls.is_empty() {
                debug!(
                    event_name = "pipeline.executor.finished",
                    iterations = iteration,
                    "analysis finished"
                );
                return Ok(reply.content.unwrap_or_default());
            }

            let calls = reply.tool_calls;
            transcript.push(ChatMessage::assistant(reply.content.unwrap_or_default(), calls.clone()));
            for call in &calls {
                let output = match invoke(tools, call).await {
                    Ok(output) => output,
                    Err(error) => {
                        warn!(
                            event_name = "pipeline.executor.tool_error",
                            iteration,
                            tool = call.name.as_str(),
                            error = %error,
                            "tool call failed; reporting back to the model"
                        );
                        format!("Error: {error}")
                    }
                };
                transcript.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        warn!(
            event_name = "pipeline.executor.iteration_cap",
            max_iterations = self.max_iterations,
            "analysis hit the iteration cap"
        );
        Ok(iteration_cap_message(self.max_iterations))
    }
}

async fn invoke(tools: &ToolRegistry, call: &ToolCallRequest) -> Result<String> {
    if !tools.contains(&call.name) {
        return Err(anyhow!("unknown tool `{}`", call.name));
    }
    let input: Value = if call.arguments.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(&call.arguments)
            .map_err(|error| anyhow!("invalid arguments for `{}`: {error}", call.name))?
    };

    match tools.execute(&call.name, input).await? {
        Value::String(text) => Ok(text),
        other => Ok(other.to_string()),
    }
}
