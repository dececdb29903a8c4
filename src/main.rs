mod config;
mod engine;
mod error;
mod logging;
mod model;
mod notify;
mod store;
mod ui;

use std::sync::{Arc, Mutex};

use eframe::egui;

use crate::config::AppConfig;
use crate::engine::cache::ResponseCache;
use crate::engine::llm_client::GeminiClient;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::session::SessionContext;
use crate::model::knowledge::KnowledgeBase;

fn main() -> anyhow::Result<()> {
    logging::init_tracing()?;

    let config = AppConfig::load()?;
    tracing::debug!(
        model = %config.model.name,
        persistence = ?config.persistence.backend,
        cache = config.cache.enabled,
        "configuration loaded"
    );

    let ctx = build_context(&config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Arduino Expert")
            .with_inner_size([720.0, 820.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Arduino Expert",
        options,
        Box::new(|_cc| Ok(Box::new(ui::app::ChatApp::new(ctx)))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}

fn build_context(config: &AppConfig) -> SessionContext {
    let knowledge = KnowledgeBase::load(&config.knowledge.path);

    let llm = GeminiClient::new(config.model.clone());
    if config.model.api_key.trim().is_empty() {
        tracing::warn!("no API key configured, questions will be refused");
    }

    let cache = config.cache.enabled.then(|| {
        tracing::info!(capacity = config.cache.capacity, "response cache enabled");
        Arc::new(Mutex::new(ResponseCache::new(config.cache.capacity)))
    });

    SessionContext {
        knowledge,
        llm: Arc::new(llm),
        prompt: PromptBuilder::new(config.prompt.style, config.knowledge.max_chars),
        cache,
        sink: store::open_sink(&config.persistence),
        notifier: notify::start_worker(&config.notify),
    }
}
