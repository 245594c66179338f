//! FundMatch LLM - provider clients and pricing
//!
//! This crate holds everything that talks to (or reasons about) the AI
//! provider itself:
//! - **Client**: the `ProviderClient` trait plus request/response types
//! - **OpenAI**: an OpenAI-compatible chat-completions client over HTTPS
//! - **Pricing**: per-model token prices in micro-USD and cost computation
//!
//! Resilience concerns (circuit breaking, caching, quotas, budgets) live in
//! `fundmatch-gateway`, which wraps these clients.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod openai;
pub mod pricing;

pub use client::{CompletionRequest, CompletionResponse, ProviderClient, TokenUsage};
pub use error::{Error, Result};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use pricing::{default_pricing, Cost, ModelPricing, PricingTable};
