//! Mandi price board: indicative crop quotes, search, and market insights.
//!
//! Quotes are seeded from an embedded snapshot and drift on refresh; trend is
//! always derived from the stored prices rather than stored itself.

use anyhow::Context;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const QUOTES_JSON: &str = include_str!("quotes.json");

/// Number of quotes shown on the popular board.
const POPULAR_COUNT: usize = 4;

/// Price movement relative to the previous quote.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// A single crop quote at a mandi.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropQuote {
    pub id: String,
    pub name: String,
    pub current_price: f64,
    pub previous_price: f64,
    pub unit: String,
    pub location: String,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl CropQuote {
    /// Percentage change against the previous price.
    #[must_use]
    pub fn change_pct(&self) -> f64 {
        if self.previous_price == 0.0 {
            return 0.0;
        }
        (self.current_price - self.previous_price) / self.previous_price * 100.0
    }

    #[must_use]
    pub fn trend(&self) -> Trend {
        if self.current_price > self.previous_price {
            Trend::Up
        } else if self.current_price < self.previous_price {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

/// Commentary attached to a crop's market situation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketInsight {
    pub crop: String,
    pub insight: String,
    pub recommendation: String,
}

#[derive(Debug, Deserialize)]
struct QuotesFile {
    quotes: Vec<CropQuote>,
    insights: Vec<MarketInsight>,
}

/// In-memory price board seeded from the embedded snapshot.
#[derive(Debug, Clone)]
pub struct PriceBoard {
    quotes: Vec<CropQuote>,
    insights: Vec<MarketInsight>,
}

impl PriceBoard {
    /// Load the board from the embedded quote snapshot.
    pub fn from_reference() -> anyhow::Result<Self> {
        let file: QuotesFile = serde_json::from_str(QUOTES_JSON)
            .context("Failed to parse embedded market quotes")?;
        Ok(Self {
            quotes: file.quotes,
            insights: file.insights,
        })
    }

    #[must_use]
    pub fn quotes(&self) -> &[CropQuote] {
        &self.quotes
    }

    #[must_use]
    pub fn insights(&self) -> &[MarketInsight] {
        &self.insights
    }

    /// The first `n` quotes, mirroring the featured crops on the board.
    #[must_use]
    pub fn popular(&self, n: usize) -> &[CropQuote] {
        &self.quotes[..n.min(self.quotes.len())]
    }

    /// Default-sized popular board.
    #[must_use]
    pub fn featured(&self) -> &[CropQuote] {
        self.popular(POPULAR_COUNT)
    }

    /// Case-insensitive search over crop name and mandi location.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&CropQuote> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.quotes.iter().collect();
        }
        self.quotes
            .iter()
            .filter(|q| {
                q.name.to_lowercase().contains(&needle)
                    || q.location.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Simulate a fresh tick: the current price becomes the previous one and
    /// a new current price drifts within a few percent.
    pub fn refresh(&mut self) {
        let mut rng = rand::rng();
        let now = Utc::now();
        for quote in &mut self.quotes {
            let drift: f64 = rng.random_range(0.97..1.03);
            quote.previous_price = quote.current_price;
            quote.current_price = (quote.current_price * drift * 100.0).round() / 100.0;
            quote.last_updated = now;
        }
        debug!(count = self.quotes.len(), "Refreshed market quotes");
    }
}
