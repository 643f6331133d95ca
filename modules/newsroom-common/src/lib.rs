pub mod config;
pub mod error;
pub mod json_extract;
pub mod text;
pub mod traits;
pub mod types;
pub mod vocab;

pub use config::Config;
pub use error::Error;
pub use traits::{EmbeddingLookup, TextEmbedder};
pub use types::*;
