//! Command-line surface and dispatch.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use domains::models::{DrawId, DrawWindow, UserId};

use crate::output;
use crate::App;

#[derive(Debug, Parser)]
#[command(name = "word-draw", version, about = "Draw words to translate, one at a time")]
pub struct Cli {
    /// Settings file (defaults to ./word-draw.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct UserArg {
    /// Acting user
    #[arg(long, short, env = "WORD_DRAW_USER")]
    pub user: UserId,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a word to the pool
    AddWord {
        #[command(flatten)]
        user: UserArg,
        /// Language code, e.g. en-us
        #[arg(long, short)]
        language: String,
        word: String,
    },
    /// Add words from a file of `language<TAB>word` lines
    Import {
        #[command(flatten)]
        user: UserArg,
        file: PathBuf,
    },
    /// List every word in the pool
    Words,
    /// Get the word to work on, drawing a new one if needed
    Draw {
        #[command(flatten)]
        user: UserArg,
    },
    /// Show the word currently assigned, without drawing
    Current {
        #[command(flatten)]
        user: UserArg,
    },
    /// Show the most recent draw
    Last {
        #[command(flatten)]
        user: UserArg,
    },
    /// Accept a pending draw
    Accept {
        #[command(flatten)]
        user: UserArg,
        draw_id: DrawId,
    },
    /// Reject a pending draw
    Reject {
        #[command(flatten)]
        user: UserArg,
        draw_id: DrawId,
    },
    /// Record uploaded work for an accepted draw
    Upload {
        #[command(flatten)]
        user: UserArg,
        draw_id: DrawId,
        /// Language the work was written in
        #[arg(long, short)]
        language: String,
    },
    /// List all draws with their outcome
    History {
        #[command(flatten)]
        user: UserArg,
    },
    /// List successful and failed words
    Results {
        #[command(flatten)]
        user: UserArg,
    },
}

impl Command {
    pub async fn run(self, app: &App, window: DrawWindow, json: bool) -> anyhow::Result<()> {
        match self {
            Command::AddWord {
                user,
                language,
                word,
            } => {
                let word = app.words.add_word(&user.user, &language, &word).await?;
                output::word(&word, json)
            }
            Command::Import { user, file } => {
                let input = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("reading {}", file.display()))?;
                let summary = app.words.import_words(&user.user, &input).await?;
                output::import_summary(&summary, json)
            }
            Command::Words => {
                let words = app.words.list_words().await?;
                output::words(&words, json)
            }
            Command::Draw { user } => {
                let word = app.draws.draw_word(&user.user, window).await?;
                let record = match word {
                    Some(_) => app.draws.current_draw(&user.user).await?,
                    None => None,
                };
                output::drawn(word.as_ref(), record.as_ref(), json)
            }
            Command::Current { user } => {
                let record = app.draws.current_draw(&user.user).await?;
                output::optional_record(record.as_ref(), "no current word", json)
            }
            Command::Last { user } => {
                let record = app.draws.last_draw(&user.user).await?;
                output::optional_record(record.as_ref(), "no draws yet", json)
            }
            Command::Accept { user, draw_id } => {
                let draw = app.draws.accept_draw(&user.user, draw_id).await?;
                output::draw(&draw, json)
            }
            Command::Reject { user, draw_id } => {
                let draw = app.draws.reject_draw(&user.user, draw_id).await?;
                output::draw(&draw, json)
            }
            Command::Upload {
                user,
                draw_id,
                language,
            } => {
                let work = app.works.upload_work(&user.user, draw_id, &language).await?;
                output::work(&work, json)
            }
            Command::History { user } => {
                let history = app.works.history(&user.user, window).await?;
                output::history(&history, json)
            }
            Command::Results { user } => {
                let successful = app.works.successful_words(&user.user, window).await?;
                let failed = app.works.failed_words(&user.user, window).await?;
                output::results(&successful, &failed, json)
            }
        }
    }
}
