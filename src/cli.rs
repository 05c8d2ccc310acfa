use crate::client::{Connector, HttpConnector};
use crate::credentials::{FileCredentialStore, LayeredCredentials};
use crate::model::{IndexerConfig, Outcome, SubmissionReport};
use crate::orchestrator::{self, InputEdit, Panel, PanelProps};
use crate::secret::{parse_secret, SecretString};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
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
    name = "doc-indexer",
    version,
    about = "Submit documents to a remote indexer run, with an optional TUI panel"
)]
pub struct Cli {
    /// Base URL of the run service (e.g. http://localhost:2024)
    #[arg(long, env = "LANGGRAPH_API_URL")]
    pub api_url: Option<String>,

    /// API key sent as x-api-key; falls back to the stored key
    #[arg(
        long,
        env = "LANGGRAPH_API_KEY",
        hide_env_values = true,
        value_parser = parse_secret
    )]
    pub api_key: Option<SecretString>,

    /// User the documents are indexed for
    #[arg(long, env = "INDEXER_USER_ID", default_value = "default-user")]
    pub user_id: String,

    /// Retriever backend the indexer should write to
    #[arg(long, env = "RETRIEVER_PROVIDER", default_value = "elastic-local")]
    pub retriever_provider: String,

    /// Request timeout for run creation
    #[arg(long, default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Read documents from a file (`-` for stdin); used by --text and --json
    #[arg(long)]
    pub docs_file: Option<PathBuf>,

    /// Submit once and print a JSON report (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Submit once and print a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Persist --api-key for later runs
    #[arg(long)]
    pub save_api_key: bool,

    /// Remove the stored API key and exit
    #[arg(long)]
    pub forget_api_key: bool,

    /// Log file used in TUI mode
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text && !self.forget_api_key
    }
}

/// How the process should exit after a successful `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Ok,
    SubmissionFailed,
}

pub async fn run(args: Cli) -> Result<Exit> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }
    if args.save_api_key && args.api_key.is_none() {
        return Err(anyhow::anyhow!("--save-api-key requires --api-key"));
    }

    if args.forget_api_key {
        let store = FileCredentialStore::open_default()?;
        store.remove().context("remove stored api key")?;
        eprintln!("Removed stored API key ({})", store.path().display());
        return Ok(Exit::Ok);
    }

    if args.save_api_key {
        if let Some(key) = args.api_key.as_ref() {
            let store = FileCredentialStore::open_default()?;
            store.set(key).context("store api key")?;
            tracing::info!(path = %store.path().display(), "api key saved");
        }
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            crate::tui::run(args).await?;
            return Ok(Exit::Ok);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Build an `IndexerConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> IndexerConfig {
    IndexerConfig {
        api_url: args.api_url.clone().filter(|u| !u.trim().is_empty()),
        user_id: args.user_id.clone(),
        retriever_provider: args.retriever_provider.clone(),
        timeout: Duration::from(args.timeout),
        user_agent: format!("doc-indexer/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub fn panel_props(cfg: &IndexerConfig) -> PanelProps {
    PanelProps {
        api_url: cfg.api_url.clone(),
        user_id: cfg.user_id.clone(),
        retriever_provider: cfg.retriever_provider.clone(),
    }
}

/// HTTP connector reading the flag/env key first, then the stored key.
pub fn build_connector(args: &Cli, cfg: &IndexerConfig) -> Arc<dyn Connector> {
    let stored = match FileCredentialStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "credential store unavailable");
            None
        }
    };
    let credentials = LayeredCredentials::new(args.api_key.clone(), stored);
    Arc::new(HttpConnector::new(
        Arc::new(credentials),
        cfg.timeout,
        cfg.user_agent.clone(),
    ))
}

async fn read_documents(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        None => Ok(String::new()),
        Some(p) if p.as_os_str() == "-" => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("read documents from stdin")?;
            Ok(buf)
        }
        Some(p) => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("read documents from {}", p.display())),
    }
}

/// Run one submission through the panel state machine and report the outcome.
async fn submit_once(args: &Cli) -> Result<SubmissionReport> {
    let cfg = build_config(args);
    let props = panel_props(&cfg);
    let connector = build_connector(args, &cfg);
    let documents = read_documents(args.docs_file.as_deref()).await?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut panel = Panel::new(props.clone(), true, event_tx);
    panel.edit(InputEdit::Replace(documents));

    let result = panel.submit(connector.as_ref()).await;
    tracing::debug!(
        state = ?panel.state(),
        open = panel.is_open(),
        documents_left = panel.documents().len(),
        "one-shot submission finished"
    );
    Ok(orchestrator::build_report(&props, result, &mut event_rx))
}

fn exit_for(report: &SubmissionReport) -> Exit {
    if report.outcome == Outcome::Succeeded {
        Exit::Ok
    } else {
        Exit::SubmissionFailed
    }
}

async fn run_json(args: Cli) -> Result<Exit> {
    let report = submit_once(&args).await?;
    let (out_tx, out_handle) = spawn_output_writer();
    let out = serde_json::to_string_pretty(&report)?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    drop(out_tx);
    let _ = out_handle.await;
    Ok(exit_for(&report))
}

async fn run_text(args: Cli) -> Result<Exit> {
    let report = submit_once(&args).await?;
    let (out_tx, out_handle) = spawn_output_writer();

    let summary = crate::text_summary::build_text_summary(&report);
    for line in summary.stderr {
        let _ = out_tx.send(OutputLine::Stderr(line));
    }
    for line in summary.stdout {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(exit_for(&report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_indexer_expectations() {
        let args = Cli::try_parse_from(["doc-indexer", "--text"]).unwrap();
        let cfg = build_config(&args);
        assert_eq!(cfg.retriever_provider, "elastic-local");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.user_agent.starts_with("doc-indexer/"));
    }

    #[test]
    fn blank_api_url_is_treated_as_missing() {
        let args = Cli::try_parse_from(["doc-indexer", "--api-url", " ", "--json"]).unwrap();
        assert_eq!(build_config(&args).api_url, None);
        let args =
            Cli::try_parse_from(["doc-indexer", "--api-url", "http://localhost:2024"]).unwrap();
        assert_eq!(
            build_config(&args).api_url.as_deref(),
            Some("http://localhost:2024")
        );
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let args =
            Cli::try_parse_from(["doc-indexer", "--text", "--api-key", "lsv2_from_flag"]).unwrap();
        assert_eq!(
            args.api_key.as_ref().map(|k| k.expose().as_str()),
            Some("lsv2_from_flag")
        );
        assert!(!format!("{args:?}").contains("lsv2_from_flag"));
    }

    #[tokio::test]
    async fn conflicting_modes_are_refused() {
        let args = Cli::try_parse_from(["doc-indexer", "--json", "--text"]).unwrap();
        assert!(run(args).await.is_err());
    }

    #[tokio::test]
    async fn reads_documents_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.txt");
        std::fs::write(&path, "  first doc\n").unwrap();
        assert_eq!(read_documents(Some(&path)).await.unwrap(), "  first doc\n");
        assert_eq!(read_documents(None).await.unwrap(), "");
        assert!(read_documents(Some(&dir.path().join("missing"))).await.is_err());
    }
}
