pub mod codec;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod report;
pub mod table;
pub mod unicode;

pub use engine::{are_confusable, detect, is_confusable, normalize, ConfusableEngine, Segment};
pub use table::ConfusableTable;
pub use unicode::{unicode_normalize, NormalizationForm};
