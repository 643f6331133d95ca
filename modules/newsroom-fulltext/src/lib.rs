pub mod extract;
pub mod fetcher;

pub use fetcher::{FullTextFetcher, FullTextResult};
