//! Periodization of position histories into bases

mod history;
mod loader;
mod periodizer;

pub use history::{PositionHistory, PositionRecord};
pub use loader::{load_positions, load_positions_from_reader};
pub use periodizer::Periodizer;
