//! # Agent (orientation)
//!
//! An `Agent` is a configured participant in a conversation: a name, an
//! instructions template, a tool set, and model settings. The waiter agent is
//! the preconfigured instance this crate ships; the builder surface keeps the
//! configuration testable and reusable.

use std::sync::Arc;

use crate::items::Message;
use crate::prompt;
use crate::tool::{Dependencies, Tool};
use crate::tools::{CreateOrderTool, GetMenuTool, RespondTool};

/// Defines the complete configuration for an [`Agent`].
#[derive(Clone)]
pub struct AgentConfig {
    /// The name of the agent, used for identification and in logs.
    pub name: String,

    /// Instructions template for the system prompt. Placeholders are filled
    /// from the session [`Dependencies`] when the conversation starts.
    pub instructions: String,

    /// Tools the agent can call. Includes the structured-response tool so
    /// the model always has a way to address the user.
    pub tools: Vec<Arc<dyn Tool>>,

    /// Temperature for response generation.
    pub temperature: Option<f32>,

    /// The maximum number of tokens to generate in a single response.
    pub max_tokens: Option<u32>,

    /// The maximum number of model invocations within a single user turn.
    /// Guards against tool-call loops that never produce a response.
    pub max_turns: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Assistant".to_string(),
            instructions: "You are a helpful assistant.".to_string(),
            tools: vec![],
            temperature: None,
            max_tokens: None,
            max_turns: Some(10),
        }
    }
}

/// A conversational agent backed by a tool set.
#[derive(Clone)]
pub struct Agent {
    /// The configuration that defines the agent's behavior and capabilities.
    pub config: AgentConfig,
}

impl Agent {
    /// Creates a new agent with the given configuration.
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Creates an agent with just a name and instructions template.
    pub fn simple(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self::new(AgentConfig {
            name: name.into(),
            instructions: instructions.into(),
            ..Default::default()
        })
    }

    /// The restaurant waiter: menu lookup, order creation, and the
    /// structured-response tool.
    pub fn waiter() -> Self {
        Self::simple("Waiter", prompt::PROMPT_TEMPLATE)
            .with_tool(Arc::new(GetMenuTool))
            .with_tool(Arc::new(CreateOrderTool))
            .with_tool(Arc::new(RespondTool))
    }

    /// Adds a tool to the agent.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.config.tools.push(tool);
        self
    }

    /// Sets the temperature for the agent's model.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Sets the maximum number of model invocations per user turn.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.config.max_turns = Some(max_turns);
        self
    }

    /// Sets the maximum number of tokens for a single response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Returns the agent's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Returns a slice of the tools available to the agent.
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.config.tools
    }

    /// Looks a tool up by its dispatch name.
    pub fn tool_named(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.config.tools.iter().find(|t| t.name() == name)
    }

    /// Renders the system message for a session from the instructions
    /// template and the session dependencies.
    pub fn build_system_message(&self, deps: &Dependencies) -> Message {
        Message::system(prompt::render(&self.config.instructions, deps))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.config.name)
            .field("tools_count", &self.config.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MenuService, OrderService};
    use crate::tools::RESPOND_TOOL_NAME;

    fn test_deps() -> Dependencies {
        Dependencies {
            menu_service: Arc::new(MenuService::new()),
            order_service: Arc::new(OrderService::new()),
            restaurant_name: "Chez Test".to_string(),
            table_number: 9,
        }
    }

    #[test]
    fn test_waiter_agent_tool_set() {
        let agent = Agent::waiter();
        assert_eq!(agent.name(), "Waiter");
        assert_eq!(agent.tools().len(), 3);
        assert!(agent.tool_named("get_menu").is_some());
        assert!(agent.tool_named("create_order").is_some());
        assert!(agent.tool_named(RESPOND_TOOL_NAME).is_some());
        assert!(agent.tool_named("refund_order").is_none());
    }

    #[test]
    fn test_system_message_renders_dependencies() {
        let agent = Agent::waiter();
        let sys_msg = agent.build_system_message(&test_deps());

        assert_eq!(sys_msg.role, crate::items::Role::System);
        assert!(sys_msg.content.contains("Chez Test"));
        assert!(sys_msg.content.contains("table number 9"));
        assert!(sys_msg.content.contains("get_menu"));
    }

    #[test]
    fn test_agent_builder() {
        let agent = Agent::simple("Builder", "Test instructions")
            .with_temperature(0.5)
            .with_max_turns(5)
            .with_max_tokens(1000);

        assert_eq!(agent.config.temperature, Some(0.5));
        assert_eq!(agent.config.max_turns, Some(5));
        assert_eq!(agent.config.max_tokens, Some(1000));
        assert!(agent.tools().is_empty());
    }

    #[test]
    fn test_agent_debug_format() {
        let agent = Agent::waiter();
        let debug_str = format!("{:?}", agent);
        assert!(debug_str.contains("Waiter"));
        assert!(debug_str.contains("tools_count"));
    }
}
