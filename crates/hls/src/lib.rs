// HLS (HTTP Live Streaming) master playlist handling
pub mod label;
pub mod ladder;

// Export common types for ease of use
pub use ladder::{QualityLadder, QualityVariant};
pub use label::QualityLabel;
