//! CLI binary for meeting-minutes.
//!
//! A thin shim over the library crate: maps flags to `ClientConfig`, keeps
//! the workspace session on disk between invocations, and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use meeting_minutes::session::ChatRole;
use meeting_minutes::workflow::{self, default_download_name};
use meeting_minutes::{
    default_session_path, ApiClient, ClientConfig, DownloadFormat, MeetingDetails, Paginator,
    PersistentSession, PollProgressCallback, ProcessingOutcome, ProgressCallback, SessionStore,
    TaskPoller, TaskStatus, DEFAULT_API_URL, PROCESS_STEP_COUNT,
};
use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar with a position per processing step.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(PROCESS_STEP_COUNT as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:30.green/238}] {pos}/{len}  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.set_message("Waiting for the server…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PollProgressCallback for CliProgressCallback {
    fn on_poll_start(&self, task_id: &str) {
        self.bar
            .println(format!("{} {}", cyan("◆"), bold(&format!("Task {task_id}"))));
    }

    fn on_status(&self, _task_id: &str, status: &TaskStatus, step: i32) {
        if step >= 0 {
            self.bar.set_position(step as u64);
        }
        self.bar.set_message(status.label());
    }

    fn on_complete(&self, task_id: &str) {
        self.bar.set_position(PROCESS_STEP_COUNT as u64);
        self.bar.finish_and_clear();
        eprintln!("{} Task {} complete", green("✔"), bold(task_id));
    }

    fn on_error(&self, task_id: &str, error: &str) {
        self.bar.abandon();
        eprintln!("{} Task {}: {}", red("✘"), task_id, red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload a recording and wait for its minutes
  minutes upload standup.mp3 --title "Daily standup" -p Anna -p Boris

  # Queue only; check back later
  minutes upload retro.m4a --no-wait
  minutes resume

  # Read what the server produced
  minutes transcript
  minutes info
  minutes minutes --page 2

  # Save the minutes as Word
  minutes download --format docx -o retro.docx

  # Talk to a remote backend
  MINUTES_API_URL=https://minutes.example.com minutes status 4f1c...

SESSION:
  Every command reads and updates one session file holding the current
  meeting, task, fetched documents and progress. If polling is interrupted
  (Ctrl-C, closed terminal), `minutes resume` continues where it stopped.

  Default location: $XDG_STATE_HOME/meeting-minutes/session.json
                    (or ~/.local/state/meeting-minutes/session.json)

ENVIRONMENT VARIABLES:
  MINUTES_API_URL           Backend base URL (default http://localhost:8001)
  MINUTES_SESSION           Session file path
  MINUTES_POLL_INTERVAL_MS  Delay between status requests
  RUST_LOG                  Override the log filter
"#;

/// Upload meeting recordings and fetch their generated minutes.
#[derive(Parser, Debug)]
#[command(
    name = "minutes",
    version,
    about = "Upload meeting recordings and fetch their generated minutes",
    long_about = "Client for the meeting-minutes backend. Uploads an audio recording, follows the \
processing task through conversion, transcription and generation, then shows, paginates or \
downloads the resulting minutes.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL.
    #[arg(long, global = true, env = "MINUTES_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Session file.
    #[arg(long = "session", global = true, env = "MINUTES_SESSION")]
    session_file: Option<PathBuf>,

    /// Delay between task status requests, in milliseconds.
    #[arg(long, global = true, env = "MINUTES_POLL_INTERVAL_MS", default_value_t = 3000)]
    poll_interval_ms: u64,

    /// Per-request timeout in seconds (uploads and downloads get longer).
    #[arg(long, global = true, env = "MINUTES_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "MINUTES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MINUTES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the requested document.
    #[arg(short, long, global = true, env = "MINUTES_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a recording (.mp3, .wav, .m4a) and process it.
    Upload {
        file: PathBuf,

        /// Meeting title.
        #[arg(long)]
        title: Option<String>,

        /// Participant name; repeat for several.
        #[arg(short = 'p', long = "participant")]
        participants: Vec<String>,

        /// Queue the task and exit without polling.
        #[arg(long)]
        no_wait: bool,
    },

    /// Print the current status of a task once.
    Status { task: String },

    /// Poll a task until it completes or fails.
    Wait { task: String },

    /// Continue polling the task recorded in the session.
    Resume,

    /// Print the transcript of the session's meeting.
    Transcript,

    /// Print the session's meeting metadata as a table.
    Info,

    /// Print the generated minutes.
    Minutes {
        /// Print only this page (1-based).
        #[arg(long)]
        page: Option<usize>,

        /// Output the minutes and their pages as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Download the rendered minutes.
    Download {
        #[arg(long, value_enum, default_value = "pdf")]
        format: FormatArg,

        /// Output path (default: minutes_<meeting>.<ext>).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete the session's meeting on the backend.
    Delete,

    /// Inspect or reset the local session.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Print the session as JSON.
    Show,
    /// Add a message to the session chat, or print the chat when no text is given.
    Chat { text: Option<String> },
    /// Remove the session file.
    Clear,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Docx,
    Md,
}

impl From<FormatArg> for DownloadFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => DownloadFormat::Pdf,
            FormatArg::Docx => DownloadFormat::Docx,
            FormatArg::Md => DownloadFormat::Md,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar covers what INFO logs would say while polling.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build client and session ─────────────────────────────────────────
    let config = ClientConfig::builder()
        .base_url(cli.api_url.clone())
        .poll_interval_ms(cli.poll_interval_ms)
        .request_timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")?;
    let client = ApiClient::new(&config).context("Failed to build HTTP client")?;

    let store = SessionStore::new(cli.session_file.clone().unwrap_or_else(default_session_path));
    // The bar starts ticking when created, so only polling commands make one.
    let progress = || -> Option<ProgressCallback> {
        show_progress.then(|| CliProgressCallback::new() as Arc<dyn PollProgressCallback>)
    };

    match &cli.command {
        Command::Upload {
            file,
            title,
            participants,
            no_wait,
        } => {
            let mut session = open_session(&store)?;
            let details = MeetingDetails::new(title.as_deref(), participants);
            let output = until_interrupted(workflow::process_recording(
                &client,
                file,
                &details,
                Some(&mut session),
                !no_wait,
                if *no_wait { None } else { progress() },
            ))
            .await?
            .context("Processing failed")?;

            if !cli.quiet {
                eprintln!(
                    "{}  meeting {}  task {}",
                    green("✔"),
                    bold(&output.meeting.id),
                    output.task_id
                );
                match output.outcome {
                    ProcessingOutcome::Completed(done) => eprintln!(
                        "   {} status checks  →  {}",
                        dim(&done.ticks.to_string()),
                        dim("minutes minutes")
                    ),
                    ProcessingOutcome::Queued => {
                        eprintln!("   queued  →  {}", dim("minutes resume"))
                    }
                }
            }
        }

        Command::Status { task } => {
            let poller = TaskPoller::new(client.clone(), config.poll_interval());
            let snapshot = poller
                .tick(task)
                .await
                .context("Failed to read task status")?;
            println!("Task:    {}", snapshot.task_id);
            println!("Status:  {} ({})", snapshot.status, snapshot.status.label());
            println!("Step:    {}/{}", snapshot.step, PROCESS_STEP_COUNT);
            if let Some(ref msg) = snapshot.error_message {
                println!("Error:   {}", msg);
            }
        }

        Command::Wait { task } => {
            let mut session = open_session(&store)?;
            // Only mirror progress into the session when it tracks this task.
            let tracked = session.get().task_id.as_deref() == Some(task.as_str());
            let done = until_interrupted(workflow::wait_for_task(
                &client,
                task,
                tracked.then_some(&mut session),
                progress(),
            ))
            .await?
            .context("Polling failed")?;
            if !cli.quiet && !show_progress {
                eprintln!("Task {} complete after {} checks", done.task_id, done.ticks);
            }
        }

        Command::Resume => {
            let mut session = open_session(&store)?;
            let resumed = until_interrupted(workflow::resume(&client, &mut session, progress()))
                .await?
                .context("Polling failed")?;
            match resumed {
                Some(done) if !cli.quiet && !show_progress => {
                    eprintln!("Task {} complete after {} checks", done.task_id, done.ticks)
                }
                Some(_) => {}
                None => {
                    if !cli.quiet {
                        eprintln!("Nothing to resume: no task in progress.");
                    }
                }
            }
        }

        Command::Transcript => {
            let mut session = open_session(&store)?;
            let text = workflow::fetch_transcript(&client, &mut session)
                .await
                .context("Failed to fetch transcript")?;
            print_document(&text)?;
        }

        Command::Info => {
            let mut session = open_session(&store)?;
            let table = workflow::fetch_meeting_info(&client, &mut session)
                .await
                .context("Failed to fetch meeting info")?;
            print_document(&table)?;
        }

        Command::Minutes { page, json } => {
            let mut session = open_session(&store)?;
            let doc = workflow::fetch_minutes(&client, &mut session, &Paginator::default())
                .await
                .context("Failed to fetch minutes")?;

            if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&doc).context("Failed to serialise minutes")?
                );
            } else if let Some(n) = page {
                let selected = n
                    .checked_sub(1)
                    .and_then(|i| doc.pages.get(i))
                    .with_context(|| {
                        format!("Page {n} out of range (minutes have {} pages)", doc.pages.len())
                    })?;
                print_document(&selected.text)?;
            } else {
                print_document(&doc.markdown)?;
                if !cli.quiet {
                    eprintln!("{}", dim(&format!("{} pages", doc.pages.len())));
                }
            }
        }

        Command::Download { format, output } => {
            let mut session = open_session(&store)?;
            let meeting_id = session
                .get()
                .meeting_id
                .clone()
                .context("No meeting in the current session; upload a recording first")?;
            let format = DownloadFormat::from(*format);
            let path = output
                .clone()
                .unwrap_or_else(|| default_download_name(&meeting_id, format));
            let bytes =
                workflow::download_to_file(&client, &meeting_id, format, &path, Some(&mut session))
                    .await
                    .context("Download failed")?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}  {}",
                    green("✔"),
                    bold(&path.display().to_string()),
                    dim(&format!("{bytes} bytes"))
                );
            }
        }

        Command::Delete => {
            let mut session = open_session(&store)?;
            let meeting_id = workflow::delete_meeting(&client, &mut session)
                .await
                .context("Failed to delete meeting")?;
            if !cli.quiet {
                eprintln!("{}  deleted meeting {}", green("✔"), bold(&meeting_id));
            }
        }

        Command::Session { action } => match action {
            SessionAction::Show => {
                let session = store.load().context("Failed to read session")?;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&session)
                        .context("Failed to serialise session")?
                );
            }
            SessionAction::Chat { text: Some(text) } => {
                let mut session = open_session(&store)?;
                session
                    .update(|s| s.say(text))
                    .context("Failed to save session")?;
            }
            SessionAction::Chat { text: None } => {
                let session = store.load().context("Failed to read session")?;
                let chat: String = session
                    .messages
                    .iter()
                    .map(|m| match m.role {
                        ChatRole::User => format!("{} {}\n", bold("you:"), m.text),
                        ChatRole::Ai => format!("{} {}\n", cyan("ai:"), m.text),
                    })
                    .collect();
                if !chat.is_empty() {
                    print_document(&chat)?;
                }
            }
            SessionAction::Clear => {
                store.clear().context("Failed to remove session")?;
                if !cli.quiet {
                    eprintln!("Removed {}", store.path().display());
                }
            }
        },
    }

    Ok(())
}

fn open_session(store: &SessionStore) -> Result<PersistentSession> {
    PersistentSession::open(store.clone())
        .with_context(|| format!("Failed to open session {}", store.path().display()))
}

/// Run `fut`, giving up on Ctrl-C.
///
/// The session keeps its processing flag on interruption, so `minutes resume`
/// picks the task up again.
async fn until_interrupted<F: Future>(fut: F) -> Result<F::Output> {
    tokio::select! {
        out = fut => Ok(out),
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("Interrupted; run `minutes resume` to continue polling")
        }
    }
}

fn print_document(text: &str) -> Result<()> {
    write_document(&mut io::stdout().lock(), text)
}

/// Write `text`, ending it with a newline if it lacks one.
fn write_document<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts `budget` bytes, then fails every write.
    struct ShortWriter {
        budget: usize,
        written: Vec<u8>,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn document_gets_trailing_newline() {
        let mut out = Vec::new();
        write_document(&mut out, "# Minutes").unwrap();
        write_document(&mut out, "done\n").unwrap();
        assert_eq!(out, b"# Minutes\ndone\n");
    }

    #[test]
    fn closed_stdout_on_trailing_newline_is_an_error() {
        let mut out = ShortWriter {
            budget: 9,
            written: Vec::new(),
        };
        let err = write_document(&mut out, "# Minutes").unwrap_err();
        assert!(err.to_string().contains("stdout"), "got {err:#}");
        assert_eq!(out.written, b"# Minutes");
    }
}
