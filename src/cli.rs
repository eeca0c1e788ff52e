use crate::api::HttpSentimentApi;
use crate::model::{Classification, ConnectivityState, HistoryEntry, Settings};
use crate::orchestrator::{Clock, Confirmation, SystemClock, View, Workflow};
use crate::storage::{self, FileStore};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::UtcOffset;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sentiment-cli",
    version,
    about = "Sentiment analysis client with local history and optional TUI"
)]
pub struct Cli {
    /// Base URL of the sentiment analysis service
    #[arg(long, default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Analyze this text, print the result and exit (no TUI)
    #[arg(long, value_name = "TEXT")]
    pub analyze: Option<String>,

    /// Print the analysis result as JSON (with --analyze)
    #[arg(long)]
    pub json: bool,

    /// Print stored history and exit
    #[arg(long)]
    pub history: bool,

    /// Clear stored history and exit (asks for confirmation)
    #[arg(long)]
    pub clear_history: bool,

    /// Answer yes to the clear-history confirmation
    #[arg(long)]
    pub yes: bool,

    /// Export stored history as JSON to this path and exit
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// History file location (defaults to the user data directory)
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// Interval between connectivity probes
    #[arg(long, default_value = "30s")]
    pub probe_interval: humantime::Duration,

    /// How long error messages stay on screen
    #[arg(long, default_value = "5s")]
    pub error_dismiss: humantime::Duration,

    /// Probe the service right before each submission instead of trusting the last probe
    #[arg(long)]
    pub recheck_before_submit: bool,

    /// Show example history and input on first launch
    #[arg(long)]
    pub seed_examples: bool,

    /// Log file used while the TUI is active
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    fn is_tui(&self) -> bool {
        self.analyze.is_none() && !self.history && !self.clear_history && self.export_json.is_none()
    }
}

/// Build `Settings` from CLI arguments.
pub fn build_settings(args: &Cli) -> Result<Settings> {
    let history_path = match &args.history_file {
        Some(p) => p.clone(),
        None => storage::default_history_path().context("resolve history file location")?,
    };
    let probe_interval = Duration::from(args.probe_interval);
    if probe_interval.is_zero() {
        anyhow::bail!("--probe-interval must be greater than zero");
    }
    Ok(Settings {
        base_url: args.base_url.clone(),
        history_path,
        probe_interval,
        error_dismiss: Duration::from(args.error_dismiss),
        recheck_before_submit: args.recheck_before_submit,
        seed_examples: args.seed_examples,
    })
}

/// Wire the workflow to the real HTTP client, history file, and wall clock.
pub fn build_workflow(settings: &Settings, offset: UtcOffset, view: Box<dyn View>) -> Result<Workflow> {
    let api = HttpSentimentApi::new(&settings.base_url).context("build HTTP client")?;
    let store = FileStore::new(settings.history_path.clone());
    let clock: Box<dyn Clock> = Box::new(SystemClock::new(offset));
    Ok(
        Workflow::new(Arc::new(api), Box::new(store), clock, view)
            .with_recheck_before_submit(settings.recheck_before_submit),
    )
}

fn init_logging(args: &Cli) -> Result<()> {
    if args.is_tui() {
        let path = match &args.log_file {
            Some(p) => p.clone(),
            None => storage::base_dir()
                .context("resolve log file location")?
                .join("sentiment-cli.log"),
        };
        crate::logging::init_file(&path)
    } else {
        crate::logging::init_stderr();
        Ok(())
    }
}

pub async fn run(args: Cli, offset: UtcOffset) -> Result<()> {
    if args.json && args.analyze.is_none() {
        anyhow::bail!("--json can only be used with --analyze");
    }
    if args.yes && !args.clear_history {
        anyhow::bail!("--yes can only be used with --clear-history");
    }

    init_logging(&args)?;
    let settings = build_settings(&args)?;

    if args.is_tui() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(settings, offset).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            let _ = (settings, offset);
            anyhow::bail!("built without TUI support; use --analyze, --history, --export-json or --clear-history");
        }
    }

    if let Some(text) = args.analyze.as_deref() {
        return run_analyze(&settings, offset, text, args.json).await;
    }

    run_history_actions(&args, &settings, offset).await
}

/// Console presentation for text mode. Connectivity and info go to stderr;
/// failures are reported through the command's result instead.
struct ConsoleView {
    out: mpsc::UnboundedSender<OutputLine>,
}

impl View for ConsoleView {
    fn connectivity(&mut self, state: &ConnectivityState) {
        let _ = self.out.send(OutputLine::Stderr(state.message.clone()));
    }

    fn submitting(&mut self, active: bool) {
        if active {
            let _ = self.out.send(OutputLine::Stderr("Analyzing…".into()));
        }
    }

    fn result(&mut self, _classification: &Classification) {}

    fn error(&mut self, _message: &str) {}

    fn history(&mut self, _entries: &[HistoryEntry]) {}

    fn info(&mut self, message: &str) {
        let _ = self.out.send(OutputLine::Stderr(message.to_string()));
    }
}

async fn run_analyze(settings: &Settings, offset: UtcOffset, text: &str, json: bool) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let view = ConsoleView {
        out: out_tx.clone(),
    };
    let mut workflow = build_workflow(settings, offset, Box::new(view))?;

    workflow.restore_history();
    workflow.check_connectivity().await;
    let outcome = workflow.analyze(text).await;

    let res = match outcome {
        Ok(_) => {
            if workflow.storage_failures() > 0 {
                let _ = out_tx.send(OutputLine::Stderr(
                    "Warning: result could not be saved to history".into(),
                ));
            }
            // The new entry is always at the front.
            if let Some(entry) = workflow.history().first() {
                if json {
                    let out = serde_json::to_string_pretty(entry)?;
                    let _ = out_tx.send(OutputLine::Stdout(out));
                } else {
                    for line in crate::text_summary::build_result_summary(entry).lines {
                        let _ = out_tx.send(OutputLine::Stdout(line));
                    }
                }
            }
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e)),
    };

    drop(workflow);
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_history_actions(args: &Cli, settings: &Settings, offset: UtcOffset) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let view = ConsoleView {
        out: out_tx.clone(),
    };
    let mut workflow = build_workflow(settings, offset, Box::new(view))?;
    workflow.restore_history();

    let mut res = Ok(());

    if let Some(path) = args.export_json.as_deref() {
        if let Err(e) = workflow.export_history(path) {
            res = Err(anyhow::Error::new(e).context("export history"));
        }
    }

    if args.history {
        for line in crate::text_summary::build_history_summary(workflow.history()).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    if args.clear_history && res.is_ok() {
        let confirmation = if args.yes {
            Confirmation::Granted
        } else {
            let count = workflow.history().len();
            ask_confirmation(format!("Clear {count} history entries? [y/N] ")).await?
        };
        if workflow.clear_history(confirmation) {
            let _ = out_tx.send(OutputLine::Stderr("History cleared".into()));
        } else {
            let _ = out_tx.send(OutputLine::Stderr("History left unchanged".into()));
        }
    }

    drop(workflow);
    drop(out_tx);
    let _ = out_handle.await;
    res
}

/// Prompt on stderr and read a yes/no answer from stdin.
async fn ask_confirmation(prompt: String) -> Result<Confirmation> {
    tokio::task::spawn_blocking(move || -> Result<Confirmation> {
        let mut err = std::io::stderr();
        write!(err, "{prompt}")?;
        err.flush()?;
        let mut answer = String::new();
        std::io::stdin()
            .read_line(&mut answer)
            .context("read confirmation")?;
        Ok(parse_confirmation(&answer))
    })
    .await
    .context("confirmation prompt failed")?
}

fn parse_confirmation(answer: &str) -> Confirmation {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "s" | "sim" => Confirmation::Granted,
        _ => Confirmation::Declined,
    }
}
