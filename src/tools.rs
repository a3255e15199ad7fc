//! The waiter's tool set: menu lookup, order creation, and the
//! structured-response tool that ends a turn.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tool::{schema_for, Dependencies, Tool, ToolResult};

/// Dispatch name of the structured-response tool.
pub const RESPOND_TOOL_NAME: &str = "respond_to_user";

/// The contract the model must fill to end a turn.
///
/// Validated against the schema before being trusted; a payload missing a
/// required field is a protocol violation, not a user-facing error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StructuredResponse {
    /// What the waiter says to the customer this turn.
    pub message: String,
    /// True when the conversation should end after this response.
    pub end_conversation: bool,
}

/// Returns the full menu for the restaurant.
#[derive(Debug, Default)]
pub struct GetMenuTool;

#[async_trait]
impl Tool for GetMenuTool {
    fn name(&self) -> &str {
        "get_menu"
    }

    fn description(&self) -> &str {
        "Get the full menu for the restaurant"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: Value, deps: &Dependencies) -> Result<ToolResult> {
        let menu = deps.menu_service.menu();
        Ok(ToolResult::success(serde_json::to_value(menu)?))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateOrderArgs {
    /// Table the order is for.
    table_number: u32,
    /// List of food menu items to order.
    order_items: Vec<String>,
}

/// Creates an order for the table through the order service.
#[derive(Debug, Default)]
pub struct CreateOrderTool;

#[async_trait]
impl Tool for CreateOrderTool {
    fn name(&self) -> &str {
        "create_order"
    }

    fn description(&self) -> &str {
        "Create an order for the table"
    }

    fn parameters_schema(&self) -> Value {
        schema_for::<CreateOrderArgs>()
    }

    async fn execute(&self, arguments: Value, deps: &Dependencies) -> Result<ToolResult> {
        let args: CreateOrderArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(ToolResult::error(format!("invalid arguments: {e}"))),
        };

        match deps
            .order_service
            .create_order(args.table_number, args.order_items)
        {
            Ok(()) => Ok(ToolResult::success(Value::String(
                "Order placed".to_string(),
            ))),
            Err(e) => Ok(ToolResult::error(e.to_string())),
        }
    }
}

/// The structured-response pseudo-tool.
///
/// Has no side effects: a *sole* call to it is how the model signals turn
/// completion, and the loop parses the arguments as the final answer. When the
/// model batches it with other tool calls, it executes like any other tool and
/// simply echoes the validated payload back.
#[derive(Debug, Default)]
pub struct RespondTool;

#[async_trait]
impl Tool for RespondTool {
    fn name(&self) -> &str {
        RESPOND_TOOL_NAME
    }

    fn description(&self) -> &str {
        "ALWAYS use this tool to provide a response to the user, INSTEAD OF responding directly. \
         The `message` content should be what you would normally respond with in a conversation. \
         The `end_conversation` flag should be set to true if the conversation should end after \
         this response."
    }

    fn parameters_schema(&self) -> Value {
        schema_for::<StructuredResponse>()
    }

    async fn execute(&self, arguments: Value, _deps: &Dependencies) -> Result<ToolResult> {
        match serde_json::from_value::<StructuredResponse>(arguments) {
            Ok(response) => Ok(ToolResult::success(serde_json::to_value(response)?)),
            Err(e) => Ok(ToolResult::error(format!("invalid arguments: {e}"))),
        }
    }
}
