use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Core trait for text-generation providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    /// Absent when the provider does not report usage
    pub usage: Option<UsageMetadata>,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Per-million-token prices used to estimate what a call cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for TokenPricing {
    // gpt-4o-mini list prices
    fn default() -> Self {
        Self {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    }
}

impl UsageMetadata {
    /// Estimated cost in USD.
    pub fn estimated_cost(&self, pricing: &TokenPricing) -> f64 {
        let input = self.prompt_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
        let output = self.completion_tokens as f64 / 1_000_000.0 * pricing.output_per_million;
        input + output
    }
}

pub mod remote;
