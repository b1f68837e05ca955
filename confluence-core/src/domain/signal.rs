//! Per-bar signal annotations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fixed-schema signal flags for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalRow {
    pub breakout_buy: bool,
    pub breakout_sell: bool,
    pub ma_buy: bool,
    pub ma_sell: bool,
    pub or_buy: bool,
    pub or_sell: bool,
    pub synergy_buy: bool,
    pub synergy_sell: bool,
}

impl SignalRow {
    /// Column names in schema order.
    pub const COLUMNS: [&'static str; 8] = [
        "breakout_buy",
        "breakout_sell",
        "ma_buy",
        "ma_sell",
        "or_buy",
        "or_sell",
        "synergy_buy",
        "synergy_sell",
    ];

    /// Flags in schema order (matches [`SignalRow::COLUMNS`]).
    pub fn flags(&self) -> [bool; 8] {
        [
            self.breakout_buy,
            self.breakout_sell,
            self.ma_buy,
            self.ma_sell,
            self.or_buy,
            self.or_sell,
            self.synergy_buy,
            self.synergy_sell,
        ]
    }

    pub fn has_signal(&self) -> bool {
        self.synergy_buy || self.synergy_sell
    }
}

/// Direction of a fused signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSide {
    Buy,
    Sell,
}

/// A chart marker: a fused signal placed at the bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMarker {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub side: SignalSide,
}

/// Number of true flags per column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub breakout_buy: usize,
    pub breakout_sell: usize,
    pub ma_buy: usize,
    pub ma_sell: usize,
    pub or_buy: usize,
    pub or_sell: usize,
    pub synergy_buy: usize,
    pub synergy_sell: usize,
}

impl SignalCounts {
    pub fn from_rows(rows: &[SignalRow]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            counts.breakout_buy += usize::from(row.breakout_buy);
            counts.breakout_sell += usize::from(row.breakout_sell);
            counts.ma_buy += usize::from(row.ma_buy);
            counts.ma_sell += usize::from(row.ma_sell);
            counts.or_buy += usize::from(row.or_buy);
            counts.or_sell += usize::from(row.or_sell);
            counts.synergy_buy += usize::from(row.synergy_buy);
            counts.synergy_sell += usize::from(row.synergy_sell);
        }
        counts
    }

    /// Counts in schema order (matches [`SignalRow::COLUMNS`]).
    pub fn values(&self) -> [usize; 8] {
        [
            self.breakout_buy,
            self.breakout_sell,
            self.ma_buy,
            self.ma_sell,
            self.or_buy,
            self.or_sell,
            self.synergy_buy,
            self.synergy_sell,
        ]
    }
}
