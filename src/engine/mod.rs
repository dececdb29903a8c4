pub mod engine;
pub mod protocol;
pub mod session;

pub mod cache;
pub mod llm_client;
pub mod prompt_builder;
