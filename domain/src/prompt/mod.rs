//! Prompt domain

mod template;

pub use template::PromptTemplate;
