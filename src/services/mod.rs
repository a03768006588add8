// Marathi Sieve Core Services

pub mod text_processor;
pub mod config_store;
pub mod detection;
pub mod content_views;
pub mod training_validator;
pub mod source;
pub mod sink;
pub mod pipeline;

pub use text_processor::*;
pub use config_store::*;
pub use content_views::*;
pub use training_validator::*;
pub use source::*;
pub use sink::*;
pub use pipeline::*;

// Re-export detection entry points
pub use detection::{
    is_devanagari,
    split_sentences,
    DetectorConfig,
    DetectorConfigError,
    LanguageDetector,
};
