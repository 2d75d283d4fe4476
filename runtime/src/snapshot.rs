// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Data model for one extraction of the rates page.

use serde::{Deserialize, Serialize};

/// One labelled rate panel, e.g. "GOLD SPOT".
///
/// Values are kept as the raw text shown on the page. Fields are filled
/// positionally from the panel's numeric-looking spans: bid, ask, high, low.
/// Missing trailing values serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBox {
    pub bid: Option<String>,
    pub ask: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
}

impl QuoteBox {
    /// Build a box from values in document order. Anything past the fourth
    /// value is dropped.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut it = fields.into_iter().map(Into::into);
        Self {
            bid: it.next(),
            ask: it.next(),
            high: it.next(),
            low: it.next(),
        }
    }

    /// True when no value at all was found in the panel.
    pub fn is_empty(&self) -> bool {
        self.bid.is_none() && self.ask.is_none() && self.high.is_none() && self.low.is_none()
    }
}

/// The fixed set of panels read from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    GoldSpot,
    SilverSpot,
    InrSpot,
    GoldFuture,
    SilverFuture,
    GoldNext,
    SilverNext,
}

impl Panel {
    pub const ALL: [Panel; 7] = [
        Panel::GoldSpot,
        Panel::SilverSpot,
        Panel::InrSpot,
        Panel::GoldFuture,
        Panel::SilverFuture,
        Panel::GoldNext,
        Panel::SilverNext,
    ];

    /// Heading text that identifies the panel on the page.
    pub fn title(self) -> &'static str {
        match self {
            Panel::GoldSpot => "GOLD SPOT",
            Panel::SilverSpot => "SILVER SPOT",
            Panel::InrSpot => "INR SPOT",
            Panel::GoldFuture => "GOLD FUTURE",
            Panel::SilverFuture => "SILVER FUTURE",
            Panel::GoldNext => "GOLD NEXT",
            Panel::SilverNext => "SILVER NEXT",
        }
    }
}

/// Spot rates. `None` means the panel was not found on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotQuotes {
    pub gold: Option<QuoteBox>,
    pub silver: Option<QuoteBox>,
    pub inr: Option<QuoteBox>,
}

/// Gold and silver pair used for futures and next-month contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetalQuotes {
    pub gold: Option<QuoteBox>,
    pub silver: Option<QuoteBox>,
}

/// One complete extraction. Only ever published whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub spots: SpotQuotes,
    pub futures: MetalQuotes,
    pub next: MetalQuotes,
    /// Outer HTML of every `<table>` on the page, in document order.
    pub tables: Vec<String>,
}

impl Snapshot {
    /// Look up a panel by its identifier.
    pub fn panel(&self, panel: Panel) -> Option<&QuoteBox> {
        match panel {
            Panel::GoldSpot => self.spots.gold.as_ref(),
            Panel::SilverSpot => self.spots.silver.as_ref(),
            Panel::InrSpot => self.spots.inr.as_ref(),
            Panel::GoldFuture => self.futures.gold.as_ref(),
            Panel::SilverFuture => self.futures.silver.as_ref(),
            Panel::GoldNext => self.next.gold.as_ref(),
            Panel::SilverNext => self.next.silver.as_ref(),
        }
    }

    /// Number of panels that were located on the page.
    pub fn panels_found(&self) -> usize {
        Panel::ALL
            .iter()
            .filter(|p| self.panel(**p).is_some())
            .count()
    }

    /// Number of located panels that yielded no value at all. A page that
    /// still renders its titles but not its rates shows up here.
    pub fn empty_panels(&self) -> usize {
        Panel::ALL
            .iter()
            .filter_map(|p| self.panel(*p))
            .filter(|q| q.is_empty())
            .count()
    }
}
