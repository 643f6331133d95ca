pub mod display_tagger;
pub mod enricher;
pub mod image_selector;
pub mod retry;
pub mod scorer;
pub mod synthesizer;

pub use display_tagger::{DisplayTagger, ReferenceAnchor, Tags};
pub use enricher::{Enrichment, Enricher};
pub use image_selector::{ImageCandidate, ImageSelector};
pub use scorer::{filter_has_image, ScoreCandidate, Scorer, ScoredArticle};
pub use synthesizer::{Synthesis, SourceText, Synthesizer};
