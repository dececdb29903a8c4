use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::engine::cache::ResponseCache;
use crate::engine::llm_client::CompletionService;
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::knowledge::KnowledgeBase;
use crate::model::message::Message;
use crate::model::transcript::Transcript;
use crate::notify::{FirstMessageNotice, NotificationWorker};
use crate::store::{TranscriptSink, TurnRecord};

/// Conditions under which a question is refused before reaching the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskWarning {
    EmptyInput,
    MissingApiKey,
    EmptyKnowledge,
}

impl AskWarning {
    pub fn message(self) -> &'static str {
        match self {
            AskWarning::EmptyInput => "⚠️ Please enter a question.",
            AskWarning::MissingApiKey => {
                "⚠️ API key not set. Set GEMINI_API_KEY or add api_key to config.toml."
            }
            AskWarning::EmptyKnowledge => "⚠️ Knowledge base is empty.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Both turns were appended; the text is the assistant reply.
    Answered(String),
    /// Nothing was appended and the model was not called.
    Refused(AskWarning),
}

/// Process-wide collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    pub knowledge: KnowledgeBase,
    pub llm: Arc<dyn CompletionService>,
    pub prompt: PromptBuilder,
    pub cache: Option<Arc<Mutex<ResponseCache>>>,
    pub sink: Arc<dyn TranscriptSink>,
    pub notifier: Option<NotificationWorker>,
}

/// One conversation: its transcript plus the id used by persistence and
/// notifications.
pub struct ChatSession {
    id: Uuid,
    transcript: Transcript,
    notified: bool,
    ctx: SessionContext,
}

impl ChatSession {
    pub fn new(ctx: SessionContext) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, "session started");
        Self {
            id,
            transcript: Transcript::new(),
            notified: false,
            ctx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Answers `user_input` against the knowledge base.
    ///
    /// Model failures become the assistant reply; they are never returned as
    /// errors. The input is stored and used as a cache key verbatim.
    pub fn ask(&mut self, user_input: &str) -> AskOutcome {
        if user_input.trim().is_empty() {
            return AskOutcome::Refused(AskWarning::EmptyInput);
        }
        if !self.ctx.llm.is_configured() {
            tracing::warn!(session = %self.id, "question refused, no API key");
            return AskOutcome::Refused(AskWarning::MissingApiKey);
        }
        if self.ctx.knowledge.is_empty() {
            tracing::warn!(session = %self.id, "question refused, knowledge base is empty");
            return AskOutcome::Refused(AskWarning::EmptyKnowledge);
        }

        let reply = self.answer(user_input);

        let user = Message::user(user_input);
        let assistant = Message::assistant(reply.clone());
        self.persist(&user);
        self.persist(&assistant);
        self.transcript.push(user);
        self.transcript.push(assistant);
        tracing::debug!(session = %self.id, messages = self.transcript.len(), "turn recorded");

        self.notify_first_message(user_input);

        AskOutcome::Answered(reply)
    }

    /// Back to the single welcome message. The session id is kept.
    pub fn clear(&mut self) -> &Transcript {
        self.transcript.clear();
        tracing::info!(session = %self.id, "transcript cleared");
        &self.transcript
    }

    fn answer(&self, user_input: &str) -> String {
        if let Some(hit) = self.cached(user_input) {
            tracing::debug!(session = %self.id, "answer served from cache");
            return hit;
        }

        let prompt = self
            .ctx
            .prompt
            .build(&self.ctx.knowledge, self.transcript.messages(), user_input);

        match self.ctx.llm.complete(&prompt) {
            Ok(text) => {
                if let Some(cache) = &self.ctx.cache {
                    lock(cache).insert(user_input.to_string(), text.clone());
                }
                text
            }
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "completion failed");
                format!("❌ Error calling Gemini model: {e}")
            }
        }
    }

    fn cached(&self, user_input: &str) -> Option<String> {
        let cache = self.ctx.cache.as_ref()?;
        lock(cache).get(user_input)
    }

    fn persist(&self, message: &Message) {
        if let Err(e) = self.ctx.sink.record(self.id, &TurnRecord::now(message)) {
            tracing::warn!(session = %self.id, error = %e, "failed to persist turn");
        }
    }

    fn notify_first_message(&mut self, user_input: &str) {
        if self.notified {
            return;
        }
        self.notified = true;

        if let Some(worker) = &self.ctx.notifier {
            worker.submit(FirstMessageNotice {
                session_id: self.id,
                message: user_input.to_string(),
            });
        }
    }
}

// A panic while holding the cache cannot leave it half-written, so a
// poisoned lock is still usable.
fn lock(cache: &Mutex<ResponseCache>) -> std::sync::MutexGuard<'_, ResponseCache> {
    cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
