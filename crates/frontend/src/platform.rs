//! Browser implementations of the quiz core's clock and random seams.

use mapquiz_shared::clock::{Clock, Millis};
use mapquiz_shared::picker::TargetPicker;
use mapquiz_shared::regions::RegionId;

/// `performance.now()`, falling back to wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceClock;

impl Clock for PerformanceClock {
    fn now(&self) -> Millis {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }
}

/// Uniform choice backed by `Math.random()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathRandomPicker;

impl TargetPicker for MathRandomPicker {
    fn pick(&mut self, candidates: &[RegionId]) -> usize {
        scale_unit(js_sys::Math::random(), candidates.len())
    }
}

/// Map a value in `[0, 1)` onto an index below `len`.
fn scale_unit(unit: f64, len: usize) -> usize {
    ((unit * len as f64) as usize).min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_unit_bounds() {
        assert_eq!(scale_unit(0.0, 4), 0);
        assert_eq!(scale_unit(0.999_999, 4), 3);
        assert_eq!(scale_unit(0.5, 4), 2);
        // A unit value of exactly 1 stays in range.
        assert_eq!(scale_unit(1.0, 4), 3);
    }
}
