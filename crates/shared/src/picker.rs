use std::collections::VecDeque;

use crate::regions::RegionId;

/// Chooses the next target among the remaining ids.
///
/// Implementations must return an index into `candidates`, which is never
/// empty when called.
pub trait TargetPicker {
    fn pick(&mut self, candidates: &[RegionId]) -> usize;
}

/// Uniform random choice backed by `rand`.
#[cfg(feature = "rand-support")]
#[derive(Debug, Default)]
pub struct RandomPicker;

#[cfg(feature = "rand-support")]
impl TargetPicker for RandomPicker {
    fn pick(&mut self, candidates: &[RegionId]) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..candidates.len())
    }
}

/// Replays a fixed sequence of ids, for deterministic runs.
///
/// When the next scripted id is not among the candidates (or the script is
/// exhausted) the first candidate is chosen.
#[derive(Debug, Clone, Default)]
pub struct SequencePicker {
    script: VecDeque<RegionId>,
}

impl SequencePicker {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RegionId>,
    {
        SequencePicker {
            script: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl TargetPicker for SequencePicker {
    fn pick(&mut self, candidates: &[RegionId]) -> usize {
        self.script
            .pop_front()
            .and_then(|want| candidates.iter().position(|c| *c == want))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<RegionId> {
        raw.iter().map(|s| RegionId::from(*s)).collect()
    }

    #[test]
    fn test_sequence_picker_follows_script() {
        let mut picker = SequencePicker::new(["C", "A"]);
        let candidates = ids(&["A", "B", "C"]);
        assert_eq!(picker.pick(&candidates), 2);
        assert_eq!(picker.pick(&candidates), 0);
    }

    #[test]
    fn test_sequence_picker_falls_back_to_first() {
        let mut picker = SequencePicker::new(["Z"]);
        let candidates = ids(&["A", "B"]);
        assert_eq!(picker.pick(&candidates), 0);
        assert_eq!(picker.pick(&candidates), 0);
    }

    #[cfg(feature = "rand-support")]
    #[test]
    fn test_random_picker_stays_in_bounds() {
        let mut picker = RandomPicker;
        let candidates = ids(&["A", "B", "C"]);
        for _ in 0..100 {
            assert!(picker.pick(&candidates) < candidates.len());
        }
    }
}
