//! Prompt construction and model-output parsing

pub mod parse;
pub mod prompt;

pub use parse::parse_analysis;
pub use prompt::PromptBuilder;
