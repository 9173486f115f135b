//! Per-model token pricing.

use std::collections::HashMap;

use safety_core::TokenUsage;

/// USD per million tokens for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPrice {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// Price lookup by model name.
///
/// Dated variants (`gpt-4o-mini-2024-07-18`) match their base entry; the
/// longest matching prefix wins. Unknown models use the fallback price.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, ModelPrice>,
    fallback: ModelPrice,
}

impl Default for PricingTable {
    fn default() -> Self {
        let fallback = ModelPrice::new(0.15, 0.60);
        Self::new(fallback)
            .with_model("gpt-4o-mini", ModelPrice::new(0.15, 0.60))
            .with_model("gpt-4o", ModelPrice::new(2.50, 10.00))
            .with_model("gpt-4.1-mini", ModelPrice::new(0.40, 1.60))
            .with_model("gpt-4.1-nano", ModelPrice::new(0.10, 0.40))
            .with_model("gpt-4.1", ModelPrice::new(2.00, 8.00))
    }
}

impl PricingTable {
    /// Create an empty table with the given fallback price.
    pub fn new(fallback: ModelPrice) -> Self {
        Self {
            prices: HashMap::new(),
            fallback,
        }
    }

    /// Add or replace a model price.
    pub fn with_model(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        self.prices.insert(model.into(), price);
        self
    }

    /// Price entry for a model name.
    pub fn lookup(&self, model: &str) -> ModelPrice {
        if let Some(price) = self.prices.get(model) {
            return *price;
        }

        self.prices
            .iter()
            .filter(|(name, _)| model.starts_with(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, price)| *price)
            .unwrap_or(self.fallback)
    }

    /// Cost of a call in US dollars.
    pub fn price_usd(&self, model: &str, usage: &TokenUsage) -> f64 {
        let price = self.lookup(model);
        (usage.input as f64 * price.input_per_million
            + usage.output as f64 * price.output_per_million)
            / 1_000_000.0
    }

    /// Cost of a call in millionths of a dollar.
    pub fn price_micros(&self, model: &str, usage: &TokenUsage) -> i64 {
        usd_to_micros(self.price_usd(model, usage))
    }
}

/// Round a dollar amount to six decimal places, as integer micro-dollars.
pub fn usd_to_micros(usd: f64) -> i64 {
    (usd * 1_000_000.0).round() as i64
}
