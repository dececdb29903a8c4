pub mod knowledge;
pub mod message;
pub mod transcript;
