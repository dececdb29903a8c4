use crate::model::message::Message;

pub const WELCOME_MESSAGE: &str =
    "👋 Welcome to Arduino Expert! Ask me anything about Arduino projects.";

/// Ordered, append-only chat history of one session.
///
/// Always holds at least the synthetic welcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            messages: vec![Message::system(WELCOME_MESSAGE)],
        }
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drops everything except a fresh welcome message.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(Message::system(WELCOME_MESSAGE));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
