use crate::model::message::Message;

pub enum EngineCommand {
    Ask(String),
    Clear,
}

#[derive(Debug, PartialEq, Eq)]
pub enum EngineResponse {
    FullTranscript(Vec<Message>),
    Warning(String),
}
