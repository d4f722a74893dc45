pub mod config;
pub mod content;
pub mod error;
pub mod keywords;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod scheduler;
pub mod terminal;
pub mod types;
pub mod wordpress;
