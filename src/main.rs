//! Application entry point — PAL assistant on the console.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk and apply environment overrides.
//! 3. Build the completion backends.
//! 4. Build the judgement, conversation and media services.
//! 5. Spawn the router on an event channel.
//! 6. Feed stdin lines (`#channel message`) into the channel until EOF.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use pal_assistant::{
    chat::{ConversationHandler, MessageEvent, Router},
    config::{AppConfig, AppPaths},
    console::ConsolePlatform,
    judgement::{Judgement, PersonalityRegistry},
    llm::BackendRegistry,
    media::AudioFetcher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("PAL assistant starting up");

    // 2. Configuration
    let settings_file = AppPaths::new().settings_file;
    let mut config = AppConfig::load_from(&settings_file)
        .with_context(|| format!("loading {}", settings_file.display()))?;
    config.apply_env_overrides();
    for (id, backend) in &config.backends {
        if backend.api_key.is_none() {
            log::warn!("backend '{id}' has no API key configured");
        }
    }

    // 3. Backends
    let backends = Arc::new(BackendRegistry::from_config(&config));
    log::info!("{} completion backends registered", backends.len());

    // 4. Services
    let personalities = Arc::new(PersonalityRegistry::with_overrides(&config.personalities));
    let judgement = Arc::new(Judgement::from_config(&config, Arc::clone(&backends)));
    let conversation = Arc::new(ConversationHandler::new(
        &config,
        Arc::clone(&backends),
        personalities,
    ));
    let media = Arc::new(AudioFetcher::from_config(&config.media));

    // 5. Router
    let user = std::env::var("USER").unwrap_or_else(|_| "user".into());
    let console = Arc::new(ConsolePlatform::new(user));
    let router = Arc::new(Router::new(
        console.clone(),
        judgement,
        conversation,
        media,
        config.media.channel.clone(),
    ));

    let (event_tx, event_rx) = mpsc::channel::<MessageEvent>(32);
    let router_task = tokio::spawn(router.run(event_rx));

    // 6. Console input
    log::info!("reading messages from stdin as `#channel message`");
    let stdin = BufReader::new(tokio::io::stdin());
    console
        .forward_lines(stdin, event_tx)
        .await
        .context("reading stdin")?;

    router_task.await.context("router task")?;
    log::info!("PAL assistant shut down");
    Ok(())
}
