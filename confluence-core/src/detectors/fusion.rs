//! Signal fusion: per-bar logical OR of the three detectors.
//!
//! Each input is named, so a swapped argument is a type error rather than a
//! silently wrong column. An absent detector output counts as all-false, and
//! so does any index past the end of a shorter column.

use super::{BreakoutSignals, DirectionalFlags, MaCrossoverSignals, OpeningRangeSignals};

/// Stateless combiner producing the synergy columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalFusion;

/// Fused buy/sell flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynergySignals {
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

fn flag(column: &[bool], i: usize) -> bool {
    column.get(i).copied().unwrap_or(false)
}

impl SignalFusion {
    pub fn new() -> Self {
        Self
    }

    /// OR the buy columns and the sell columns over `len` bars.
    pub fn fuse(
        &self,
        len: usize,
        breakout: Option<&BreakoutSignals>,
        ma: Option<&MaCrossoverSignals>,
        opening_range: Option<&OpeningRangeSignals>,
    ) -> SynergySignals {
        let inputs: [Option<&dyn DirectionalFlags>; 3] = [
            breakout.map(|s| s as &dyn DirectionalFlags),
            ma.map(|s| s as &dyn DirectionalFlags),
            opening_range.map(|s| s as &dyn DirectionalFlags),
        ];

        let mut out = SynergySignals {
            buy: vec![false; len],
            sell: vec![false; len],
        };
        for input in inputs.into_iter().flatten() {
            for i in 0..len {
                out.buy[i] |= flag(input.buy(), i);
                out.sell[i] |= flag(input.sell(), i);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakout(buy: &[bool], sell: &[bool]) -> BreakoutSignals {
        BreakoutSignals {
            buy: buy.to_vec(),
            sell: sell.to_vec(),
            ..BreakoutSignals::default()
        }
    }

    fn ma(buy: &[bool], sell: &[bool]) -> MaCrossoverSignals {
        MaCrossoverSignals {
            buy: buy.to_vec(),
            sell: sell.to_vec(),
            ..MaCrossoverSignals::default()
        }
    }

    fn opening(buy: &[bool], sell: &[bool]) -> OpeningRangeSignals {
        OpeningRangeSignals {
            buy: buy.to_vec(),
            sell: sell.to_vec(),
            ..OpeningRangeSignals::default()
        }
    }

    #[test]
    fn ors_each_direction() {
        let b = breakout(&[true, false, false, false], &[false, false, false, false]);
        let m = ma(&[false, true, false, false], &[false, false, true, false]);
        let o = opening(&[false, false, false, false], &[false, false, true, true]);
        let fused = SignalFusion::new().fuse(4, Some(&b), Some(&m), Some(&o));

        assert_eq!(fused.buy, vec![true, true, false, false]);
        assert_eq!(fused.sell, vec![false, false, true, true]);
    }

    #[test]
    fn missing_detector_counts_as_false() {
        let m = ma(&[false, true, false], &[true, false, false]);
        let fused = SignalFusion.fuse(3, None, Some(&m), None);
        assert_eq!(fused.buy, m.buy);
        assert_eq!(fused.sell, m.sell);
    }

    #[test]
    fn all_missing_is_all_false() {
        let fused = SignalFusion.fuse(5, None, None, None);
        assert_eq!(fused.buy, vec![false; 5]);
        assert_eq!(fused.sell, vec![false; 5]);
    }

    #[test]
    fn short_column_is_padded_with_false() {
        let b = breakout(&[true], &[false]);
        let fused = SignalFusion.fuse(3, Some(&b), None, None);
        assert_eq!(fused.buy, vec![true, false, false]);
    }

    #[test]
    fn buy_and_sell_may_coincide_across_detectors() {
        let b = breakout(&[true], &[false]);
        let o = opening(&[false], &[true]);
        let fused = SignalFusion.fuse(1, Some(&b), None, Some(&o));
        assert!(fused.buy[0] && fused.sell[0]);
    }
}
