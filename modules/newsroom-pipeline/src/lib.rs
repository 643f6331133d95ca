pub mod adapters;
pub mod embedding;
pub mod orchestrator;
pub mod publisher;

pub use adapters::StoreAdapter;
pub use embedding::OpenAiEmbedder;
pub use orchestrator::{CycleStats, Orchestrator, SYNTHESIS_MODEL};
pub use publisher::{PublishAction, Publisher};
