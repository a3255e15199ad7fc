//! # Conversation runner (orientation)
//!
//! Drives turns between user input, model invocation, and tool execution.
//! Each user turn cycles between awaiting the model and executing the tools it
//! requested until the model issues a *sole* structured-response call; that
//! call is the turn's final answer and moves the conversation to awaiting the
//! next user message, or ends it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::items::{unanswered_tool_calls, Message, Role};
use crate::model::ModelProvider;
use crate::tool::Dependencies;
use crate::tools::{StructuredResponse, RESPOND_TOOL_NAME};
use crate::usage::UsageStats;

/// Tool-result content acknowledging a structured-response call. Providers
/// require a tool message after every assistant tool call, including the one
/// whose arguments already carried the final answer.
const RESPOND_ACK: &str = "*message displayed to user*";

/// Synthetic first instruction; there is no real user turn yet when the
/// conversation opens.
pub const GREETING_INSTRUCTION: &str = "*Greet the customer*";

fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() > max {
        let mut out = s.chars().take(max).collect::<String>();
        out.push('…');
        out
    } else {
        s.to_string()
    }
}

fn format_messages_for_log(messages: &[Message]) -> String {
    let mut lines = Vec::new();
    for (idx, m) in messages.iter().enumerate() {
        match m.role {
            Role::User => {
                lines.push(format!(
                    "{:02} USER     | {}",
                    idx,
                    truncate_for_log(&m.content, 160)
                ));
            }
            Role::System => {
                lines.push(format!(
                    "{:02} SYSTEM   | {}",
                    idx,
                    truncate_for_log(&m.content, 160)
                ));
            }
            Role::Assistant => {
                if let Some(tool_calls) = &m.tool_calls {
                    let calls: Vec<String> = tool_calls
                        .iter()
                        .map(|tc| format!("id={}, name={}", tc.id, tc.name))
                        .collect();
                    lines.push(format!(
                        "{:02} ASSIST   | tool_calls=[{}] content=\"{}\"",
                        idx,
                        calls.join(", "),
                        truncate_for_log(&m.content, 120)
                    ));
                } else {
                    lines.push(format!(
                        "{:02} ASSIST   | {}",
                        idx,
                        truncate_for_log(&m.content, 160)
                    ));
                }
            }
            Role::Tool => {
                let tcid = m
                    .tool_call_id
                    .as_deref()
                    .unwrap_or("<missing tool_call_id>");
                lines.push(format!(
                    "{:02} TOOL     | tool_call_id={} payload={}",
                    idx,
                    tcid,
                    truncate_for_log(&m.content, 120)
                ));
            }
        }
    }
    lines.join("\n")
}

/// Configuration for a conversation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum model invocations within a single user turn before the loop
    /// gives up. Overrides the agent's own setting when present.
    pub max_turns: Option<usize>,

    /// Upper bound on a single model round trip. The loop performs no retry
    /// of its own; transport retry policy belongs to the gateway.
    pub model_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: None,
            model_timeout: Duration::from_secs(60),
        }
    }
}

/// Where the conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The next step is a model invocation.
    AwaitingModel,
    /// Requested tool calls are being executed.
    ExecutingTools,
    /// Blocked on the next user message.
    AwaitingUser,
    /// Terminal; no further model invocation happens.
    Done,
}

/// A single turn-sequential conversation between a user, the model, and the
/// agent's tools.
pub struct Conversation {
    agent: Agent,
    deps: Dependencies,
    provider: Arc<dyn ModelProvider>,
    config: RunConfig,
    transcript: Vec<Message>,
    phase: Phase,
    usage: UsageStats,
}

impl Conversation {
    /// Opens a conversation: transcript seeded with the rendered system
    /// prompt and the synthetic greeting instruction.
    pub fn new(
        agent: Agent,
        deps: Dependencies,
        provider: Arc<dyn ModelProvider>,
        config: RunConfig,
    ) -> Self {
        let transcript = vec![
            agent.build_system_message(&deps),
            Message::user(GREETING_INSTRUCTION),
        ];
        info!(agent = %agent.name(), restaurant = %deps.restaurant_name, "Starting conversation");
        Self {
            agent,
            deps,
            provider,
            config,
            transcript,
            phase: Phase::AwaitingModel,
            usage: UsageStats::new(),
        }
    }

    /// Runs model invocations and tool executions until the model addresses
    /// the user, then returns that structured response. The conversation ends
    /// up awaiting user input, or done when the model asked to end it.
    pub async fn advance(&mut self) -> Result<StructuredResponse> {
        if self.phase != Phase::AwaitingModel {
            return Err(AgentError::ConversationState {
                message: format!("advance called in phase {:?}", self.phase),
            });
        }

        let max_turns = self
            .config
            .max_turns
            .unwrap_or(self.agent.config.max_turns.unwrap_or(10));
        let mut turn_count = 0;

        loop {
            turn_count += 1;
            if turn_count > max_turns {
                return Err(AgentError::MaxTurnsExceeded { max_turns });
            }

            debug_assert!(
                unanswered_tool_calls(&self.transcript).is_empty(),
                "assistant tool calls must be answered before the next model invocation"
            );

            debug!(
                target: "runner::messages",
                "\n=== Sending to provider (model: {}) ===\n{}\n=== end ===",
                self.provider.model_name(),
                format_messages_for_log(&self.transcript)
            );

            let round_trip = self.provider.complete(
                self.transcript.clone(),
                self.agent.config.tools.clone(),
                self.agent.config.temperature,
                self.agent.config.max_tokens,
            );
            let (response, usage) = timeout(self.config.model_timeout, round_trip)
                .await
                .map_err(|_| AgentError::ModelTimeout {
                    seconds: self.config.model_timeout.as_secs(),
                })??;

            self.usage.record(self.provider.model_name(), usage);

            if response.tool_calls.is_empty() {
                // Forced tool choice means a free-text reply is a contract
                // breach on the provider side, not something to retry.
                return Err(AgentError::ProtocolViolation {
                    message: "model replied in free text despite mandatory tool selection"
                        .to_string(),
                });
            }

            self.transcript.push(Message::assistant_with_tool_calls(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            // Only a sole structured-response call ends the turn; batched with
            // other calls it means the model still has work to do.
            if let Some(call) = response.sole_tool_call(RESPOND_TOOL_NAME) {
                let parsed: StructuredResponse = serde_json::from_value(call.arguments.clone())
                    .map_err(|e| AgentError::ProtocolViolation {
                        message: format!("structured response failed validation: {e}"),
                    })?;

                self.transcript.push(Message::tool(RESPOND_ACK, &call.id));

                self.phase = if parsed.end_conversation {
                    Phase::Done
                } else {
                    Phase::AwaitingUser
                };
                info!(
                    turns = turn_count,
                    end_conversation = parsed.end_conversation,
                    "Turn complete"
                );
                return Ok(parsed);
            }

            self.phase = Phase::ExecutingTools;
            for call in &response.tool_calls {
                let content = match self.agent.tool_named(&call.name) {
                    Some(tool) => {
                        debug!(tool = %call.name, id = %call.id, "Executing tool");
                        match tool.execute(call.arguments.clone(), &self.deps).await {
                            Ok(result) => match result.error {
                                Some(err) => format!("Error: {}", err),
                                None => serde_json::to_string(&result.output)
                                    .unwrap_or_else(|_| "null".to_string()),
                            },
                            Err(e) => format!("Error: {}", e),
                        }
                    }
                    None => format!("Error: Unknown tool '{}'", call.name),
                };
                self.transcript.push(Message::tool(content, &call.id));
            }

            debug!(
                target: "runner::messages",
                "\n↳ Appended TOOL replies (batched)\n{}\n---",
                format_messages_for_log(&self.transcript)
            );

            self.phase = Phase::AwaitingModel;
        }
    }

    /// Appends the next user message. Only valid while awaiting user input.
    pub fn push_user_message(&mut self, text: impl Into<String>) -> Result<()> {
        if self.phase != Phase::AwaitingUser {
            return Err(AgentError::ConversationState {
                message: format!("user message submitted in phase {:?}", self.phase),
            });
        }
        self.transcript.push(Message::user(text));
        self.phase = Phase::AwaitingModel;
        Ok(())
    }

    /// Current conversation phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once the model has ended the conversation.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The conversation transcript so far (append-only).
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// The session dependencies (services, restaurant, table).
    pub fn deps(&self) -> &Dependencies {
        &self.deps
    }

    /// Aggregated token usage across all model invocations.
    pub fn usage(&self) -> &UsageStats {
        &self.usage
    }
}
