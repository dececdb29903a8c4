use std::sync::mpsc::{Receiver, Sender};

use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::session::{AskOutcome, ChatSession, SessionContext};

/// Worker that owns the chat session and answers UI commands.
///
/// The session is created on the first command and dropped with the engine.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    ctx: SessionContext,
    session: Option<ChatSession>,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        ctx: SessionContext,
    ) -> Self {
        Self {
            rx,
            tx,
            ctx,
            session: None,
        }
    }

    /// Runs until the UI side hangs up.
    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            let response = self.handle(cmd);
            if self.tx.send(response).is_err() {
                break;
            }
        }
        tracing::debug!("engine stopped");
    }

    fn handle(&mut self, cmd: EngineCommand) -> EngineResponse {
        let ctx = &self.ctx;
        let session = self
            .session
            .get_or_insert_with(|| ChatSession::new(ctx.clone()));
        tracing::trace!(session = %session.id(), "handling command");

        match cmd {
            EngineCommand::Ask(text) => match session.ask(&text) {
                AskOutcome::Answered(_) => {
                    EngineResponse::FullTranscript(session.transcript().messages().to_vec())
                }
                AskOutcome::Refused(warning) => {
                    EngineResponse::Warning(warning.message().to_string())
                }
            },
            EngineCommand::Clear => {
                EngineResponse::FullTranscript(session.clear().messages().to_vec())
            }
        }
    }
}
