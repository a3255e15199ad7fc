//! # maitred
//!
//! A tool-calling AI waiter: a restaurant-ordering conversational agent built
//! around a forced-tool-use conversation loop.
//!
//! ## Core Concepts
//!
//! - **Conversation**: the turn-sequential loop between user input, model
//!   invocation, and tool execution
//! - **Tools**: named capabilities the model can call (`get_menu`,
//!   `create_order`), plus a structured-response tool that is the only way
//!   the model may address the user
//! - **Model gateway**: resolves a `provider:model` identifier to a concrete
//!   chat-completions client with mandatory tool selection
//! - **Dependencies**: menu and order services injected explicitly into every
//!   tool invocation
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use maitred::{Agent, ChatModel, Conversation, Dependencies, RunConfig};
//! use maitred::services::{MenuService, OrderService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = ChatModel::resolve("openai:gpt-4o-mini", None)?;
//!
//! let deps = Dependencies {
//!     menu_service: Arc::new(MenuService::new()),
//!     order_service: Arc::new(OrderService::new()),
//!     restaurant_name: "Le Bistro".to_string(),
//!     table_number: 1,
//! };
//!
//! let mut conversation = Conversation::new(
//!     Agent::waiter(),
//!     deps,
//!     Arc::new(model),
//!     RunConfig::default(),
//! );
//!
//! let greeting = conversation.advance().await?;
//! println!("AI Waiter: {}", greeting.message);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod items;
pub mod model;
pub mod prompt;
pub mod runner;
pub mod services;
pub mod tool;
pub mod tools;
pub mod usage;

// Re-export the main types
pub use agent::{Agent, AgentConfig};
pub use error::{AgentError, Result};
pub use items::{Message, ModelResponse, Role, ToolCall};
pub use model::{ChatModel, ModelProvider};
pub use runner::{Conversation, Phase, RunConfig, GREETING_INSTRUCTION};
pub use tool::{Dependencies, Tool, ToolResult};
pub use tools::{StructuredResponse, RESPOND_TOOL_NAME};
pub use usage::{Usage, UsageStats};
