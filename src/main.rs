// src/main.rs
//! Clipboard history command line front end
//!
//! Runs the store service in-process on top of a JSON file, then drives it
//! the way the page agents and the history view would: captured lines go
//! through a capture agent, everything else through a view controller.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use clipboard_history::capture::{
    CaptureAgent, CaptureConfig, CaptureOutcome, ClipboardError, PageContext, PageEvent,
    PageSnapshot,
};
use clipboard_history::core::{RetentionPolicy, SystemClock};
use clipboard_history::service::StoreService;
use clipboard_history::storage::{HistoryRepository, JsonFileStore};
use clipboard_history::store::StoreManager;
use clipboard_history::view::{
    ActionOutcome, AutoConfirm, ClipboardWriter, Confirmer, RenderedView, TracingNotifier,
    ViewController,
};

/// Command line interface for the clipboard history
#[derive(Debug, Parser)]
#[command(
    name = "clip-history",
    about = "Bounded, de-duplicated clipboard history",
    long_about = "Keeps copied text as a bounded history with pinning, search and de-duplication. Entries live in a single JSON file."
)]
struct Args {
    /// JSON file holding the history record
    #[arg(long, default_value = "clipboard_history.json")]
    store: PathBuf,

    /// Entries kept before unpinned ones are evicted
    #[arg(long, default_value_t = clipboard_history::core::retention::DEFAULT_MAX_ENTRIES)]
    max_entries: usize,

    /// Recent insertions checked for duplicate text
    #[arg(long, default_value_t = clipboard_history::core::retention::DEFAULT_DUPLICATE_WINDOW)]
    duplicate_window: usize,

    /// Verbosity level for logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add one piece of text to the history
    Add { text: String },

    /// Treat every line on stdin as a copy event
    Capture,

    /// Show the history, pinned entries first
    List {
        /// Case-insensitive text filter
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(long, default_value = "human", value_enum)]
        format: OutputFormat,
    },

    /// Print an entry's full text to stdout
    Copy { id: String },

    /// Pin or unpin an entry
    Pin { id: String },

    /// Delete an entry
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Delete every entry, pinned ones included
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable rows
    Human,
    /// JSON for programmatic processing
    Json,
}

/// Confirmation read from the terminal
struct PromptConfirmer;

impl Confirmer for PromptConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// "Clipboard" that is simply stdout, so output can be piped
struct StdoutClipboard;

#[async_trait]
impl ClipboardWriter for StdoutClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text).map_err(|e| ClipboardError::Blocked(e.to_string()))
    }
}

/// stdin has no selection; the copied line arrives as the copy event payload
struct StdinPage;

impl PageContext for StdinPage {
    fn snapshot(&self) -> PageSnapshot {
        PageSnapshot::default()
    }
}

struct HistoryApp {
    service: StoreService,
    config: Args,
}

impl HistoryApp {
    fn new(config: Args) -> Result<Self> {
        Self::setup_logging(&config)?;

        info!(
            "🚀 Starting clipboard history v{}",
            env!("CARGO_PKG_VERSION")
        );
        debug!("Configuration: {:#?}", config);

        let policy = RetentionPolicy {
            max_entries: config.max_entries,
            duplicate_window: config.duplicate_window,
        };
        let backend = Arc::new(JsonFileStore::new(&config.store));
        info!("💾 History file: {}", backend.path().display());
        let manager =
            StoreManager::with_policy(HistoryRepository::new(backend), policy, Arc::new(SystemClock));

        Ok(Self {
            service: StoreService::spawn(manager),
            config,
        })
    }

    async fn run(self) -> Result<()> {
        let result = match &self.config.command {
            Command::Add { text } => self.add(text).await,
            Command::Capture => self.capture().await,
            Command::List { search, format } => self.list(search.as_deref(), format).await,
            Command::Copy { id } => self.copy(id).await,
            Command::Pin { id } => {
                let mut view = self.view(false);
                Self::expect_applied(view.toggle_pin(id).await)
            }
            Command::Delete { id, yes } => {
                let mut view = self.view(*yes);
                Self::expect_applied(view.delete_entry(id).await)
            }
            Command::Clear { yes } => {
                let mut view = self.view(*yes);
                Self::expect_applied(view.clear_all().await)
            }
        };

        self.service.shutdown().await;
        result
    }

    fn view(&self, skip_confirmation: bool) -> ViewController {
        let confirmer: Box<dyn Confirmer> = if skip_confirmation {
            Box::new(AutoConfirm(true))
        } else {
            Box::new(PromptConfirmer)
        };
        ViewController::new(
            self.service.client(),
            confirmer,
            Box::new(TracingNotifier),
            Box::new(StdoutClipboard),
        )
    }

    fn expect_applied(outcome: ActionOutcome) -> Result<()> {
        match outcome {
            ActionOutcome::Applied => Ok(()),
            ActionOutcome::Cancelled => {
                info!("Cancelled");
                Ok(())
            }
            ActionOutcome::Failed => Err(anyhow::anyhow!("Operation failed")),
        }
    }

    async fn add(&self, text: &str) -> Result<()> {
        self.service
            .client()
            .add_entry(text)
            .await
            .context("Failed to add entry")?;
        info!("📋 Added to history");
        Ok(())
    }

    async fn copy(&self, id: &str) -> Result<()> {
        let mut view = self.view(false);
        view.refresh()
            .await
            .context("Failed to load clipboard history")?;
        Self::expect_applied(view.copy_entry(id).await)
    }

    /// Feed stdin lines through a capture agent, one copy event per line
    async fn capture(&self) -> Result<()> {
        let agent = CaptureAgent::new(
            self.service.client(),
            Arc::new(StdinPage),
            None,
            CaptureConfig::default(),
        );
        let listener = agent.listen(self.service.subscribe());
        self.service.announce_reload();

        info!("👀 Capturing stdin lines. Press Ctrl+D to stop.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut forwarded = 0usize;

        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let Some(handle) = agent.on_event(PageEvent::Copy {
                payload: Some(line),
            }) else {
                continue;
            };

            match handle.await.context("Capture task failed")? {
                CaptureOutcome::Forwarded(text) => {
                    forwarded += 1;
                    info!("📋 Captured {} chars", text.chars().count());
                }
                CaptureOutcome::Rejected(reason) => debug!("Skipped: {}", reason),
                CaptureOutcome::ChannelLost => {
                    warn!("⚠️  Store unreachable, stopping capture");
                    break;
                }
                other => debug!("Capture outcome: {:?}", other),
            }
        }

        listener.abort();
        info!("📊 Captured {} entries", forwarded);
        Ok(())
    }

    async fn list(&self, search: Option<&str>, format: &OutputFormat) -> Result<()> {
        let mut view = self.view(false);
        view.refresh()
            .await
            .context("Failed to load clipboard history")?;
        if let Some(query) = search {
            view.set_query(query);
        }

        match format {
            OutputFormat::Json => {
                let visible = view.visible_entries();
                println!("{}", serde_json::to_string_pretty(&visible)?);
            }
            OutputFormat::Human => {
                println!("{}", view.entry_count_label());
                match view.render() {
                    RenderedView::Empty => {
                        println!("📋 No clipboard history yet");
                        println!("Copy some text and it will appear here!");
                    }
                    RenderedView::NoMatches => {
                        println!("🔍 No matches found");
                    }
                    RenderedView::Entries(rows) => {
                        for row in rows {
                            let marker = if row.pinned { "📌" } else { "  " };
                            println!(
                                "{} {:>14}  {:<10} {}",
                                marker, row.id, row.relative_time, row.preview
                            );
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Set up logging based on verbosity level
    fn setup_logging(config: &Args) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let level = match config.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(config.verbose > 1)
            .with_thread_ids(config.verbose > 2)
            .init();

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let app = HistoryApp::new(args).context("Failed to initialize clipboard history")?;
    app.run().await.context("Application runtime error")?;

    Ok(())
}
