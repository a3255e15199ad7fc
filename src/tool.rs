//! Tool system for the waiter agent
//!
//! Tools are named capabilities the model can call. Every implementation
//! receives the session's `Dependencies` bundle as an explicit argument; there
//! is no ambient or global lookup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::services::{MenuService, OrderService};

/// Session-scoped collaborators handed to every tool invocation.
///
/// Passed by reference for the duration of a session and never mutated by the
/// orchestration loop itself.
#[derive(Debug, Clone)]
pub struct Dependencies {
    pub menu_service: Arc<MenuService>,
    pub order_service: Arc<OrderService>,
    pub restaurant_name: String,
    pub table_number: u32,
}

/// Result from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output from the tool
    pub output: Value,
    /// Optional error message if the tool failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: Value) -> Self {
        Self {
            output,
            error: None,
        }
    }

    /// Create an error result
    pub fn error(message: String) -> Self {
        Self {
            output: Value::Null,
            error: Some(message),
        }
    }
}

/// Trait for all tools the agent can call
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Get the name of the tool (unique, stable; used as the dispatch key)
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments and session dependencies
    async fn execute(&self, arguments: Value, deps: &Dependencies) -> Result<ToolResult>;
}

/// Derive a parameters schema from a typed argument struct.
pub fn schema_for<A: schemars::JsonSchema>() -> Value {
    let schema = schemars::schema_for!(A);
    serde_json::to_value(schema.schema).expect("schema to value")
}
