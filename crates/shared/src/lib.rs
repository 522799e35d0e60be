//! Core of the map quiz: viewport math, gesture recognition and the game
//! session, with no I/O of its own.

pub mod clock;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod models;
pub mod picker;
pub mod quiz;
pub mod regions;
pub mod session;
pub mod viewport;

pub use error::QuizError;
pub use quiz::{FrameUpdate, Quiz, QuizConfig};
