use thiserror::Error;

use crate::regions::RegionId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuizError {
    /// `start` was called on a map with no selectable regions.
    #[error("map has no selectable regions")]
    EmptyMap,

    /// The render target has no area, so screen coordinates cannot be mapped.
    #[error("viewport is degenerate ({width}x{height})")]
    DegenerateViewport { width: f64, height: f64 },

    #[error("unknown region: {0}")]
    UnknownRegion(RegionId),

    #[error("unknown map: {0}")]
    UnknownMap(String),
}
