//! Error types for the waiter agent

use thiserror::Error;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, AgentError>;

/// Main error type for the waiter agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model spec did not have the `provider:model` shape
    #[error("invalid model spec '{spec}': expected provider:model")]
    InvalidModelSpec { spec: String },

    /// Provider prefix is not one the gateway knows how to construct
    #[error("unsupported provider '{provider}': expected one of openai, anthropic, google, groq, mistral, ollama")]
    UnsupportedProvider { provider: String },

    /// No credential given on the command line or in the environment
    #[error("missing API key: pass --api-key or set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    /// The model broke the forced tool-use contract (free-text reply, or a
    /// structured response that failed schema validation)
    #[error("protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// Tool execution error
    #[error("tool execution error: {message}")]
    ToolExecutionError { message: String },

    /// Maximum model invocations in a single turn exceeded
    #[error("maximum turns exceeded: {max_turns}")]
    MaxTurnsExceeded { max_turns: usize },

    /// Model invocation exceeded the configured time bound
    #[error("model request timed out after {seconds}s")]
    ModelTimeout { seconds: u64 },

    /// The conversation was driven from a state that does not allow it
    #[error("conversation state error: {message}")]
    ConversationState { message: String },

    /// Error from the chat-completions API
    #[error("API error: {0}")]
    Api(#[from] async_openai::error::OpenAIError),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// True for errors that indicate a provider/prompt mismatch rather than a
    /// user-facing problem.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, AgentError::ProtocolViolation { .. })
    }
}
