//! End-to-end conversation tests against a scripted model provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use maitred::items::unanswered_tool_calls;
use maitred::services::{MenuService, OrderService};
use maitred::usage::Usage;
use maitred::{
    Agent, AgentError, ChatModel, Conversation, Dependencies, Message, ModelProvider,
    ModelResponse, Phase, Role, RunConfig, Tool, ToolCall, RESPOND_TOOL_NAME,
};

/// Model provider that replays a fixed script of responses.
#[derive(Debug)]
struct ScriptedProvider {
    responses: Mutex<Vec<ModelResponse>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }

    fn respond(message: &str, end_conversation: bool) -> ModelResponse {
        ModelResponse::new_tool_calls(vec![ToolCall {
            id: format!("call_{message_len}", message_len = message.len()),
            name: RESPOND_TOOL_NAME.to_string(),
            arguments: serde_json::json!({
                "message": message,
                "end_conversation": end_conversation,
            }),
        }])
    }

    fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ModelResponse {
        ModelResponse::new_tool_calls(vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }])
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _tools: Vec<Arc<dyn Tool>>,
        _temperature: Option<f32>,
        _max_tokens: Option<u32>,
    ) -> maitred::Result<(ModelResponse, Usage)> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(AgentError::Other(
                "scripted provider ran out of responses".to_string(),
            ));
        }
        Ok((responses.remove(0), Usage::new(20, 10)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn bistro_deps(table_number: u32) -> Dependencies {
    Dependencies {
        menu_service: Arc::new(MenuService::new()),
        order_service: Arc::new(OrderService::new()),
        restaurant_name: "Le Bistro".to_string(),
        table_number,
    }
}

#[tokio::test]
async fn full_dinner_service_places_the_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        // Greeting turn
        ScriptedProvider::respond("Welcome to Le Bistro! Any dietary restrictions?", false),
        // Menu question: tool round trip, then answer
        ScriptedProvider::tool_call("call_menu", "get_menu", serde_json::json!({})),
        ScriptedProvider::respond("Tonight I'd recommend the Coq au vin.", false),
        // Order turn: place the order, confirm, end
        ScriptedProvider::tool_call(
            "call_order",
            "create_order",
            serde_json::json!({"table_number": 3, "order_items": ["Coq au vin", "House red"]}),
        ),
        ScriptedProvider::respond("Your order is in. Enjoy!", true),
    ]));

    let deps = bistro_deps(3);
    let mut conversation = Conversation::new(
        Agent::waiter(),
        deps.clone(),
        provider,
        RunConfig::default(),
    );

    // Turn 1: greeting
    let greeting = conversation.advance().await.unwrap();
    assert!(greeting.message.contains("Welcome"));
    assert_eq!(conversation.phase(), Phase::AwaitingUser);

    // Turn 2: menu question
    conversation
        .push_user_message("What do you recommend?")
        .unwrap();
    let recommendation = conversation.advance().await.unwrap();
    assert!(recommendation.message.contains("Coq au vin"));
    assert_eq!(conversation.phase(), Phase::AwaitingUser);

    // Turn 3: order and finish
    conversation
        .push_user_message("The coq au vin and a glass of house red, please")
        .unwrap();
    let farewell = conversation.advance().await.unwrap();
    assert!(farewell.end_conversation);
    assert!(conversation.is_done());

    // Exactly one order, in call order
    let orders = deps.order_service.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].table_number, 3);
    assert_eq!(orders[0].items, vec!["Coq au vin", "House red"]);

    // Transcript invariant held across every model invocation
    assert!(unanswered_tool_calls(conversation.transcript()).is_empty());

    // One usage record per model invocation
    assert_eq!(conversation.usage().total.request_count, 5);
}

#[tokio::test]
async fn transcript_interleaves_tool_results_in_request_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tool_call("call_menu", "get_menu", serde_json::json!({})),
        ScriptedProvider::respond("Here's what we have.", false),
    ]));

    let mut conversation = Conversation::new(
        Agent::waiter(),
        bistro_deps(1),
        provider,
        RunConfig::default(),
    );
    conversation.advance().await.unwrap();

    let roles: Vec<Role> = conversation.transcript().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,      // *Greet the customer*
            Role::Assistant, // get_menu call
            Role::Tool,      // menu payload
            Role::Assistant, // respond_to_user call
            Role::Tool,      // synthetic acknowledgment
        ]
    );

    // The menu tool result is addressed to the call that requested it.
    assert_eq!(
        conversation.transcript()[3].tool_call_id.as_deref(),
        Some("call_menu")
    );
}

#[tokio::test]
async fn provider_transport_errors_surface_unretried() {
    // An empty script makes the provider fail; the loop must pass the error
    // through rather than retrying or swallowing it.
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let mut conversation = Conversation::new(
        Agent::waiter(),
        bistro_deps(1),
        provider,
        RunConfig::default(),
    );

    assert!(conversation.advance().await.is_err());
}

#[test]
fn gateway_resolution_is_startup_checked() {
    // Valid specs resolve to the bare model name
    let gateway = ChatModel::resolve("groq:llama-3.3-70b-versatile", Some("key")).unwrap();
    assert_eq!(gateway.model_name(), "llama-3.3-70b-versatile");

    // Unknown prefixes fail with the named error before any model call
    let err = ChatModel::resolve("watsonx:granite", Some("key")).unwrap_err();
    assert!(matches!(err, AgentError::UnsupportedProvider { .. }));
}
