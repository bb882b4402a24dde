//! # word-draw binary
//!
//! The entry point that assembles settings, logging, storage and services
//! based on compile-time features, then runs a single command.

mod cli;
mod output;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use configs::{LogSettings, Settings};
use domains::ports::{Clock, DrawRepository, WordRepository, WorkRepository};
use services::{DrawService, RandomPicker, SystemClock, WordService, WorkService};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// The services one command invocation works with.
pub struct App {
    pub words: WordService,
    pub draws: DrawService,
    pub works: WorkService,
}

impl App {
    fn new<S>(store: Arc<S>) -> Self
    where
        S: WordRepository + DrawRepository + WorkRepository + 'static,
    {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            words: WordService::new(store.clone(), clock.clone()),
            draws: DrawService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
                Arc::new(RandomPicker),
            ),
            works: WorkService::new(store.clone(), store, clock),
        }
    }

    #[cfg(feature = "db-sqlite")]
    async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        use secrecy::ExposeSecret;
        use storage_adapters::SqliteStore;

        let url = settings.database.url.expose_secret();
        let opened = if url.contains(":memory:") {
            SqliteStore::in_memory().await
        } else {
            SqliteStore::connect(url, settings.database.max_connections).await
        };
        let store = opened.context("opening database")?;
        Ok(Self::new(Arc::new(store)))
    }

    #[cfg(not(feature = "db-sqlite"))]
    async fn connect(_settings: &Settings) -> anyhow::Result<Self> {
        tracing::warn!("built without db-sqlite; state lives only for this invocation");
        Ok(Self::new(Arc::new(storage_adapters::MemoryStore::new())))
    }
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    init_tracing(&settings.log);
    let window = settings.draw_window()?;
    tracing::debug!(window = ?window.as_duration(), "draw window configured");

    let app = App::connect(&settings).await?;
    cli.command.run(&app, window, cli.json).await
}
