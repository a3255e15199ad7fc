//! Model gateway
//!
//! Wraps the async-openai crate behind a uniform invoke interface. A
//! `provider:model` identifier and credential are resolved once at startup to
//! a concrete client; every supported provider is reached through its
//! OpenAI-compatible chat-completions endpoint, so the orchestration loop sees
//! one shape regardless of provider.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs,
        ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
        FunctionObjectArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::items::{Message, ModelResponse, Role, ToolCall};
use crate::tool::Tool;
use crate::usage::Usage;

/// Trait for model providers
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a completion. Tool usage is mandatory: the provider must
    /// return at least one tool call or the caller treats the reply as a
    /// protocol violation.
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<Arc<dyn Tool>>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<(ModelResponse, Usage)>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Endpoint and credential conventions for a supported provider prefix.
struct ProviderEndpoint {
    /// Chat-completions base URL; `None` means the client's default (OpenAI).
    api_base: Option<&'static str>,
    /// Environment variable consulted when no key is passed explicitly.
    key_env: &'static str,
    /// Key used when neither the flag nor the environment provides one.
    default_key: Option<&'static str>,
}

fn provider_endpoint(provider: &str) -> Option<ProviderEndpoint> {
    match provider {
        "openai" => Some(ProviderEndpoint {
            api_base: None,
            key_env: "OPENAI_API_KEY",
            default_key: None,
        }),
        "anthropic" => Some(ProviderEndpoint {
            api_base: Some("https://api.anthropic.com/v1"),
            key_env: "ANTHROPIC_API_KEY",
            default_key: None,
        }),
        "google" => Some(ProviderEndpoint {
            api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            key_env: "GEMINI_API_KEY",
            default_key: None,
        }),
        "groq" => Some(ProviderEndpoint {
            api_base: Some("https://api.groq.com/openai/v1"),
            key_env: "GROQ_API_KEY",
            default_key: None,
        }),
        "mistral" => Some(ProviderEndpoint {
            api_base: Some("https://api.mistral.ai/v1"),
            key_env: "MISTRAL_API_KEY",
            default_key: None,
        }),
        // Local ollama accepts any key; mirror its SDK convention
        "ollama" => Some(ProviderEndpoint {
            api_base: Some("http://localhost:11434/v1"),
            key_env: "OLLAMA_API_KEY",
            default_key: Some("ollama"),
        }),
        _ => None,
    }
}

/// Chat-completions model gateway with mandatory tool selection.
#[derive(Debug)]
pub struct ChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatModel {
    /// Resolves a `provider:model` identifier and credential to a concrete
    /// client. Unknown provider prefixes and missing credentials fail fast,
    /// before any model call is made.
    pub fn resolve(spec: &str, api_key: Option<&str>) -> Result<Self> {
        let (provider, model) = spec
            .split_once(':')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| AgentError::InvalidModelSpec {
                spec: spec.to_string(),
            })?;

        let endpoint =
            provider_endpoint(provider).ok_or_else(|| AgentError::UnsupportedProvider {
                provider: provider.to_string(),
            })?;

        let key = match api_key {
            Some(key) => key.to_string(),
            None => std::env::var(endpoint.key_env)
                .ok()
                .or_else(|| endpoint.default_key.map(String::from))
                .ok_or_else(|| AgentError::MissingApiKey {
                    env_var: endpoint.key_env.to_string(),
                })?,
        };

        let mut config = OpenAIConfig::new().with_api_key(key);
        if let Some(api_base) = endpoint.api_base {
            config = config.with_api_base(api_base);
        }

        debug!(provider, model, "resolved model gateway");
        Ok(Self {
            client: Client::with_config(config),
            model: model.to_string(),
        })
    }

    /// Create a gateway with a custom client (tests, custom endpoints).
    pub fn with_client(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Convert our Message to the wire format
    fn convert_message(&self, msg: &Message) -> Result<ChatCompletionRequestMessage> {
        let converted = match msg.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(msg.content.clone())
                .build()?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(msg.content.clone())
                .build()?
                .into(),
            Role::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                builder.content(msg.content.clone());

                if let Some(tool_calls) = &msg.tool_calls {
                    let wire_tool_calls: Vec<_> = tool_calls
                        .iter()
                        .map(|tc| async_openai::types::ChatCompletionMessageToolCall {
                            id: tc.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: async_openai::types::FunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.arguments.to_string(),
                            },
                        })
                        .collect();
                    builder.tool_calls(wire_tool_calls);
                }

                builder.build()?.into()
            }
            Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(msg.content.clone())
                .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
                .build()?
                .into(),
        };
        Ok(converted)
    }

    /// Convert tools to wire function specs
    fn convert_tools(&self, tools: &[Arc<dyn Tool>]) -> Result<Vec<ChatCompletionTool>> {
        tools
            .iter()
            .map(|tool| {
                Ok(ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(
                        FunctionObjectArgs::default()
                            .name(tool.name())
                            .description(tool.description())
                            .parameters(tool.parameters_schema())
                            .build()?,
                    )
                    .build()?)
            })
            .collect()
    }
}

#[async_trait]
impl ModelProvider for ChatModel {
    async fn complete(
        &self,
        messages: Vec<Message>,
        tools: Vec<Arc<dyn Tool>>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<(ModelResponse, Usage)> {
        let wire_messages = messages
            .iter()
            .map(|msg| self.convert_message(msg))
            .collect::<Result<Vec<ChatCompletionRequestMessage>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.model).messages(wire_messages);

        if !tools.is_empty() {
            // The model may never answer in free text, so tool selection is
            // mandatory on every call.
            request
                .tools(self.convert_tools(&tools)?)
                .tool_choice(ChatCompletionToolChoiceOption::Required);
        }

        if let Some(temp) = temperature {
            request.temperature(temp);
        }

        if let Some(max) = max_tokens {
            request.max_tokens(max);
        }

        let response = self.client.chat().create(request.build()?).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AgentError::ProtocolViolation {
                message: "no choices in model response".to_string(),
            })?;

        let tool_calls = if let Some(tool_calls) = &choice.message.tool_calls {
            tool_calls
                .iter()
                .map(|tc| ToolCall {
                    id: tc.id.clone(),
                    name: tc.function.name.clone(),
                    arguments: serde_json::from_str(&tc.function.arguments)
                        .unwrap_or(Value::Null),
                })
                .collect()
        } else {
            vec![]
        };

        debug!(
            model = %self.model,
            tool_calls = tool_calls.len(),
            has_content = choice.message.content.is_some(),
            "model response"
        );

        let model_response = ModelResponse {
            id: response.id.clone(),
            content: choice.message.content.clone(),
            tool_calls,
            finish_reason: choice.finish_reason.as_ref().map(|r| format!("{:?}", r)),
            created_at: chrono::Utc::now(),
        };

        let usage = if let Some(usage) = response.usage {
            Usage::new(
                usage.prompt_tokens as usize,
                usage.completion_tokens as usize,
            )
        } else {
            Usage::empty()
        };

        Ok((model_response, usage))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock model provider for testing
#[cfg(test)]
pub struct MockProvider {
    model: String,
    responses: std::sync::Mutex<Vec<ModelResponse>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            responses: std::sync::Mutex::new(vec![]),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn with_response(self, response: ModelResponse) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_message(self, content: impl Into<String>) -> Self {
        self.with_response(ModelResponse::new_message(content))
    }

    pub fn with_tool_call(self, tool_name: impl Into<String>, args: Value) -> Self {
        let tool_call = ToolCall {
            id: uuid::Uuid::new_v4().to_string(),
            name: tool_name.into(),
            arguments: args,
        };
        self.with_response(ModelResponse::new_tool_calls(vec![tool_call]))
    }

    pub fn with_tool_calls(self, calls: Vec<(&str, Value)>) -> Self {
        let tool_calls = calls
            .into_iter()
            .map(|(name, args)| ToolCall {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                arguments: args,
            })
            .collect();
        self.with_response(ModelResponse::new_tool_calls(tool_calls))
    }

    pub fn with_respond_call(self, message: &str, end_conversation: bool) -> Self {
        self.with_tool_call(
            crate::tools::RESPOND_TOOL_NAME,
            serde_json::json!({"message": message, "end_conversation": end_conversation}),
        )
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProvider for MockProvider {
    async fn complete(
        &self,
        _messages: Vec<Message>,
        _tools: Vec<Arc<dyn Tool>>,
        _temperature: Option<f32>,
        _max_tokens: Option<u32>,
    ) -> Result<(ModelResponse, Usage)> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok((
                ModelResponse::new_message("Default response"),
                Usage::new(10, 5),
            ));
        }

        let response = responses.remove(0);
        Ok((response, Usage::new(10, 5)))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::GetMenuTool;

    #[test]
    fn test_resolve_openai() {
        let gateway = ChatModel::resolve("openai:gpt-4o-mini", Some("sk-test")).unwrap();
        assert_eq!(gateway.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_resolve_every_supported_provider() {
        for spec in [
            "openai:gpt-4o-mini",
            "anthropic:claude-sonnet-4-0",
            "google:gemini-2.0-flash",
            "groq:llama-3.3-70b-versatile",
            "mistral:mistral-large-latest",
            "ollama:llama3",
        ] {
            let gateway = ChatModel::resolve(spec, Some("test-key")).unwrap();
            let (_, model) = spec.split_once(':').unwrap();
            assert_eq!(gateway.model_name(), model);
        }
    }

    #[test]
    fn test_resolve_unsupported_provider_is_named_error() {
        let err = ChatModel::resolve("cohere:command-r", Some("key")).unwrap_err();
        match err {
            AgentError::UnsupportedProvider { provider } => assert_eq!(provider, "cohere"),
            other => panic!("expected UnsupportedProvider, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_rejects_missing_separator() {
        let err = ChatModel::resolve("gpt-4o-mini", Some("key")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidModelSpec { .. }));

        let err = ChatModel::resolve("openai:", Some("key")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidModelSpec { .. }));
    }

    #[test]
    fn test_resolve_missing_credential_fails_fast() {
        std::env::remove_var("MISTRAL_API_KEY");
        let err = ChatModel::resolve("mistral:mistral-small-latest", None).unwrap_err();
        match err {
            AgentError::MissingApiKey { env_var } => assert_eq!(env_var, "MISTRAL_API_KEY"),
            other => panic!("expected MissingApiKey, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_ollama_defaults_credential() {
        std::env::remove_var("OLLAMA_API_KEY");
        let gateway = ChatModel::resolve("ollama:llama3", None).unwrap();
        assert_eq!(gateway.model_name(), "llama3");
    }

    #[test]
    fn test_message_conversion() {
        let gateway = ChatModel::resolve("openai:gpt-4o-mini", Some("sk-test")).unwrap();

        gateway.convert_message(&Message::system("Be a waiter")).unwrap();
        gateway.convert_message(&Message::user("Hello")).unwrap();
        gateway.convert_message(&Message::assistant("Hi there")).unwrap();
        gateway.convert_message(&Message::tool("Result", "call_123")).unwrap();

        let with_calls = Message::assistant_with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "get_menu".to_string(),
                arguments: serde_json::json!({}),
            }],
        );
        gateway.convert_message(&with_calls).unwrap();
    }

    #[test]
    fn test_tool_conversion() {
        let gateway = ChatModel::resolve("openai:gpt-4o-mini", Some("sk-test")).unwrap();
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(GetMenuTool)];

        let converted = gateway.convert_tools(&tools).unwrap();
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].function.name, "get_menu");
        assert_eq!(
            converted[0].function.description.as_deref(),
            Some("Get the full menu for the restaurant")
        );
    }

    #[tokio::test]
    async fn test_mock_provider_scripting() {
        let provider = MockProvider::new("mock-model")
            .with_respond_call("Welcome!", false)
            .with_message("free text");

        assert_eq!(provider.model_name(), "mock-model");

        let (response, usage) = provider.complete(vec![], vec![], None, None).await.unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, crate::tools::RESPOND_TOOL_NAME);
        assert_eq!(usage.prompt_tokens, 10);

        let (response, _) = provider.complete(vec![], vec![], None, None).await.unwrap();
        assert_eq!(response.content, Some("free text".to_string()));
        assert_eq!(provider.call_count(), 2);
    }
}
