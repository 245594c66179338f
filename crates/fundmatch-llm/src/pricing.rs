//! Model pricing and cost computation
//!
//! All money is integer micro-USD (1 USD = 1,000,000 micro-USD) so cost
//! accounting stays exact under summation. Floats never touch amounts.
//! Fractional micro-USD truncate toward zero.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Micro-USD in one USD
pub const MICROS_PER_DOLLAR: u64 = 1_000_000;

/// GPT-4o-mini: $0.15 / $0.60 per million tokens
const GPT4O_MINI_INPUT: u64 = 150_000;
const GPT4O_MINI_OUTPUT: u64 = 600_000;

/// GPT-4o: $2.50 / $10.00 per million tokens
const GPT4O_INPUT: u64 = 2_500_000;
const GPT4O_OUTPUT: u64 = 10_000_000;

/// GPT-4.1-mini: $0.40 / $1.60 per million tokens
const GPT41_MINI_INPUT: u64 = 400_000;
const GPT41_MINI_OUTPUT: u64 = 1_600_000;

/// GPT-4.1: $2.00 / $8.00 per million tokens
const GPT41_INPUT: u64 = 2_000_000;
const GPT41_OUTPUT: u64 = 8_000_000;

/// Conservative default for unknown models: $5.00 per million input tokens
pub const DEFAULT_INPUT_MICROS_PER_MILLION: u64 = 5_000_000;
/// Conservative default for unknown models: $15.00 per million output tokens
pub const DEFAULT_OUTPUT_MICROS_PER_MILLION: u64 = 15_000_000;

/// Pricing for a single model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model identifier
    pub model: String,
    /// Provider name
    pub provider: String,
    /// Micro-USD per million input tokens
    pub input_micros_per_million: u64,
    /// Micro-USD per million output tokens
    pub output_micros_per_million: u64,
    /// Context window size in tokens
    pub context_window: u32,
}

impl ModelPricing {
    /// Cost of a call at this model's rates
    #[must_use]
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> Cost {
        Cost {
            input_microdollars: token_cost(input_tokens, self.input_micros_per_million),
            output_microdollars: token_cost(output_tokens, self.output_micros_per_million),
        }
    }
}

/// Cost of one call, split by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    /// Micro-USD charged for input tokens
    pub input_microdollars: u64,
    /// Micro-USD charged for output tokens
    pub output_microdollars: u64,
}

impl Cost {
    /// Total micro-USD for the call
    #[must_use]
    pub fn total_microdollars(&self) -> u64 {
        self.input_microdollars
            .saturating_add(self.output_microdollars)
    }
}

// Widened to u128 so tokens * price never overflows mid-multiply
fn token_cost(tokens: u32, micros_per_million: u64) -> u64 {
    let micros = u128::from(tokens) * u128::from(micros_per_million) / 1_000_000;
    u64::try_from(micros).unwrap_or(u64::MAX)
}

/// Default pricing table
#[must_use]
pub fn default_pricing() -> HashMap<String, ModelPricing> {
    let mut pricing = HashMap::new();

    pricing.insert(
        "gpt-4o-mini".to_string(),
        ModelPricing {
            model: "gpt-4o-mini".to_string(),
            provider: "openai".to_string(),
            input_micros_per_million: GPT4O_MINI_INPUT,
            output_micros_per_million: GPT4O_MINI_OUTPUT,
            context_window: 128_000,
        },
    );

    pricing.insert(
        "gpt-4o".to_string(),
        ModelPricing {
            model: "gpt-4o".to_string(),
            provider: "openai".to_string(),
            input_micros_per_million: GPT4O_INPUT,
            output_micros_per_million: GPT4O_OUTPUT,
            context_window: 128_000,
        },
    );

    pricing.insert(
        "gpt-4.1-mini".to_string(),
        ModelPricing {
            model: "gpt-4.1-mini".to_string(),
            provider: "openai".to_string(),
            input_micros_per_million: GPT41_MINI_INPUT,
            output_micros_per_million: GPT41_MINI_OUTPUT,
            context_window: 1_047_576,
        },
    );

    pricing.insert(
        "gpt-4.1".to_string(),
        ModelPricing {
            model: "gpt-4.1".to_string(),
            provider: "openai".to_string(),
            input_micros_per_million: GPT41_INPUT,
            output_micros_per_million: GPT41_OUTPUT,
            context_window: 1_047_576,
        },
    );

    pricing
}

/// Lookup table mapping model names to prices
#[derive(Debug, Clone)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingTable {
    /// Table pre-loaded with the default pricing
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: default_pricing(),
        }
    }

    /// Add or replace pricing for a model
    pub fn insert(&mut self, pricing: ModelPricing) {
        self.models.insert(pricing.model.clone(), pricing);
    }

    /// Pricing for an exact model name
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&ModelPricing> {
        self.models.get(model)
    }

    /// Cost of a call.
    ///
    /// Dated model names ("gpt-4o-mini-2024-07-18") resolve to their base
    /// model's rates via longest-prefix match. Fully unknown models are
    /// charged at the conservative default rates.
    #[must_use]
    pub fn cost_for(&self, model: &str, input_tokens: u32, output_tokens: u32) -> Cost {
        let pricing = self.models.get(model).or_else(|| {
            self.models
                .iter()
                .filter(|(name, _)| model.starts_with(name.as_str()))
                .max_by_key(|(name, _)| name.len())
                .map(|(_, pricing)| pricing)
        });

        match pricing {
            Some(pricing) => pricing.cost(input_tokens, output_tokens),
            None => Cost {
                input_microdollars: token_cost(input_tokens, DEFAULT_INPUT_MICROS_PER_MILLION),
                output_microdollars: token_cost(output_tokens, DEFAULT_OUTPUT_MICROS_PER_MILLION),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pricing_contains_known_models() {
        let pricing = default_pricing();
        assert!(pricing.contains_key("gpt-4o-mini"));
        assert!(pricing.contains_key("gpt-4o"));
        assert!(pricing.contains_key("gpt-4.1"));
        assert_eq!(pricing["gpt-4o-mini"].input_micros_per_million, 150_000);
    }

    #[test]
    fn test_cost_computation_is_exact() {
        let table = PricingTable::new();
        // 120 input tokens at $0.15/M = 18 micro-USD
        // 80 output tokens at $0.60/M = 48 micro-USD
        let cost = table.cost_for("gpt-4o-mini", 120, 80);
        assert_eq!(cost.input_microdollars, 18);
        assert_eq!(cost.output_microdollars, 48);
        assert_eq!(cost.total_microdollars(), 66);
    }

    #[test]
    fn test_fractional_micros_truncate() {
        let table = PricingTable::new();
        // 1 token at $0.15/M = 0.15 micro-USD, truncates to 0
        let cost = table.cost_for("gpt-4o-mini", 1, 0);
        assert_eq!(cost.input_microdollars, 0);

        // 7 tokens at $0.15/M = 1.05 micro-USD, truncates to 1
        let cost = table.cost_for("gpt-4o-mini", 7, 0);
        assert_eq!(cost.input_microdollars, 1);
    }

    #[test]
    fn test_unknown_model_uses_default_rates() {
        let table = PricingTable::new();
        // 1M input tokens at the $5/M default = exactly 5 USD
        let cost = table.cost_for("some-future-model", 1_000_000, 0);
        assert_eq!(cost.input_microdollars, 5 * MICROS_PER_DOLLAR);
    }

    #[test]
    fn test_dated_model_resolves_by_prefix() {
        let table = PricingTable::new();
        let dated = table.cost_for("gpt-4o-mini-2024-07-18", 1_000_000, 0);
        let base = table.cost_for("gpt-4o-mini", 1_000_000, 0);
        assert_eq!(dated, base);
        // "gpt-4o-2024-08-06" must resolve to gpt-4o, not gpt-4o-mini
        let dated_4o = table.cost_for("gpt-4o-2024-08-06", 1_000_000, 0);
        assert_eq!(dated_4o.input_microdollars, GPT4O_INPUT);
    }

    #[test]
    fn test_extreme_prices_saturate_instead_of_overflowing() {
        let pricing = ModelPricing {
            model: "stress".to_string(),
            provider: "test".to_string(),
            input_micros_per_million: u64::MAX,
            output_micros_per_million: u64::MAX,
            context_window: 1,
        };
        let cost = pricing.cost(u32::MAX, u32::MAX);
        assert_eq!(cost.input_microdollars, u64::MAX);
        assert_eq!(cost.total_microdollars(), u64::MAX);
    }

    #[test]
    fn test_insert_overrides_default() {
        let mut table = PricingTable::new();
        table.insert(ModelPricing {
            model: "gpt-4o-mini".to_string(),
            provider: "openai".to_string(),
            input_micros_per_million: 100_000,
            output_micros_per_million: 400_000,
            context_window: 128_000,
        });
        let cost = table.cost_for("gpt-4o-mini", 1_000_000, 0);
        assert_eq!(cost.input_microdollars, 100_000);
    }
}
