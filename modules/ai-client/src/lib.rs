pub mod claude;
pub mod openai;
pub mod util;

pub use claude::Claude;
pub use openai::{OpenAi, StructuredOutput};
