//! Token usage tracking
//!
//! Tracks token consumption per model invocation and aggregates it across a
//! conversation. The CLI prints the summary in debug mode.

use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Token usage for a single LLM API call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// The number of tokens in the input prompt.
    pub prompt_tokens: usize,

    /// The number of tokens in the generated completion.
    pub completion_tokens: usize,

    /// The total number of tokens (prompt + completion).
    pub total_tokens: usize,

    /// The number of API requests made.
    pub request_count: usize,
}

impl Usage {
    /// Creates a new `Usage` instance from the prompt and completion token counts.
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            request_count: 1,
        }
    }

    /// Creates an empty `Usage` instance with all fields set to zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds the values from another `Usage` instance to this one.
    pub fn add_usage(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.request_count += other.request_count;
    }
}

impl Add for Usage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
            request_count: self.request_count + other.request_count,
        }
    }
}

/// Aggregated usage across a conversation, broken down by model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    /// The total usage across all models.
    pub total: Usage,

    /// Usage broken down by model name.
    pub by_model: std::collections::HashMap<String, Usage>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new `Usage` instance, updating the total and the breakdown.
    pub fn record(&mut self, model: &str, usage: Usage) {
        self.total.add_usage(&usage);
        self.by_model
            .entry(model.to_string())
            .and_modify(|u| u.add_usage(&usage))
            .or_insert(usage);
    }

    /// Generates a human-readable summary report of the usage statistics.
    pub fn summary(&self) -> String {
        let mut report = format!(
            "Usage Summary:\n\
             Total Tokens: {}\n\
             Total Requests: {}\n",
            self.total.total_tokens, self.total.request_count
        );

        if !self.by_model.is_empty() {
            report.push_str("\nBy Model:\n");
            for (model, usage) in &self.by_model {
                report.push_str(&format!(
                    "  {}: {} tokens, {} requests\n",
                    model, usage.total_tokens, usage.request_count
                ));
            }
        }

        report
    }
}
