//! PaperLab Server
//!
//! Command line entry point: runs one analysis in the terminal, serves the
//! HTTP API, or lists archived runs.

mod api;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use paperlab_core::state::io::get_runtime_path;
use paperlab_core::state::RunArchive;
use paperlab_core::swarm::{Coordinator, PipelineEvent, PipelineEventKind};

use api::config::{default_config_path, PersistedConfig};
use api::AppState;

#[derive(Parser, Clone)]
#[command(author, version, about = "PaperLab - paper critique and hypothesis generation")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Analyze one paper in the terminal
    Analyze {
        /// Path to the paper text, or `-` for stdin
        file: String,
        /// LLM provider (anthropic, openai, openrouter, grok, deepseek)
        #[arg(long)]
        provider: Option<String>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
        /// Base URL for OpenAI-compatible endpoints
        #[arg(long)]
        base_url: Option<String>,
        /// Print the report as JSON instead of markdown
        #[arg(long)]
        json: bool,
        /// Debate rounds per criticism
        #[arg(long)]
        rounds: Option<u32>,
        /// Do not save the report under .paperlab/runs
        #[arg(long)]
        no_archive: bool,
    },
    /// Start the HTTP API server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// List archived runs
    Runs,
}

async fn read_document(file: &str) -> anyhow::Result<String> {
    if file == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read document from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read document: {}", file))
    }
}

/// Log pipeline progress to the terminal as it arrives
async fn log_events(mut rx: mpsc::Receiver<PipelineEvent>) {
    while let Some(event) = rx.recv().await {
        match event.kind {
            PipelineEventKind::StageStarted => {
                let label = event.stage.map(|s| s.label()).unwrap_or_default();
                tracing::info!("▶ {}", label);
            }
            PipelineEventKind::AgentFailed => {
                tracing::warn!(agent = %event.agent, data = ?event.data, "agent failed");
            }
            PipelineEventKind::AgentStarted | PipelineEventKind::DebateTurn => {
                tracing::debug!(agent = %event.agent, kind = ?event.kind, data = ?event.data);
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_analyze(
    file: String,
    provider: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    json: bool,
    rounds: Option<u32>,
    no_archive: bool,
) -> anyhow::Result<()> {
    let document = read_document(&file).await?;

    let mut persisted = PersistedConfig::load().await;
    persisted.merge(PersistedConfig {
        provider,
        model,
        base_url,
        debate_rounds: rounds,
        ..Default::default()
    });
    let config = persisted.to_coordinator_config()?;
    tracing::info!(
        provider = config.model.provider.id(),
        model = %config.model.model,
        "analyzing {}",
        file
    );

    let (tx, rx) = mpsc::channel::<PipelineEvent>(100);
    let logger = tokio::spawn(log_events(rx));

    let mut coordinator = Coordinator::from_config(config)?.with_event_channel(tx);
    let result = coordinator.run(&document).await;
    drop(coordinator);
    let _ = logger.await;

    let report = result.context("Analysis failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_markdown());
    }

    if !no_archive {
        let path = RunArchive::default().save(&report).await?;
        tracing::info!("report saved to {}", path.display());
    }
    Ok(())
}

async fn list_runs() -> anyhow::Result<()> {
    let archive = RunArchive::default();
    let runs = archive.list().await?;
    if runs.is_empty() {
        println!("No archived runs in {}", archive.root().display());
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {}  {:<28}  {} hypotheses  {}",
            run.id,
            run.finished_at.format("%Y-%m-%d %H:%M"),
            run.model,
            run.hypotheses,
            run.chosen_title.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub async fn run_server(port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(RunArchive::default(), default_config_path()));
    let app = api::router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("PaperLab server running at http://{}", addr);
    tracing::info!("  Analysis:  /api/v1/analysis/start, /status, /events, /report");
    tracing::info!("  Runs:      /api/v1/runs, /api/v1/runs/:id");
    tracing::info!("  Config:    /api/v1/config (GET, PATCH), /api/v1/providers");
    tracing::info!("  OpenAPI:   /api/v1/openapi.json");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_env() {
    let _ = dotenvy::dotenv();
    let runtime_env: PathBuf = get_runtime_path().join(".env");
    if runtime_env.exists() {
        if let Err(e) = dotenvy::from_path(&runtime_env) {
            tracing::warn!(path = ?runtime_env, error = %e, "failed to load env file");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    load_env();

    let args = Args::parse();
    match args.command {
        Some(CliCommand::Analyze {
            file,
            provider,
            model,
            base_url,
            json,
            rounds,
            no_archive,
        }) => run_analyze(file, provider, model, base_url, json, rounds, no_archive).await,
        Some(CliCommand::Runs) => list_runs().await,
        Some(CliCommand::Serve { port }) => run_server(port).await,
        None => run_server(8080).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_flags() {
        let args = Args::parse_from([
            "paperlab",
            "analyze",
            "paper.txt",
            "--provider",
            "openai",
            "--rounds",
            "2",
            "--json",
            "--no-archive",
        ]);
        match args.command {
            Some(CliCommand::Analyze {
                file,
                provider,
                rounds,
                json,
                no_archive,
                model,
                ..
            }) => {
                assert_eq!(file, "paper.txt");
                assert_eq!(provider.as_deref(), Some("openai"));
                assert_eq!(rounds, Some(2));
                assert!(json && no_archive);
                assert_eq!(model, None);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_serve_defaults_to_8080() {
        let args = Args::parse_from(["paperlab", "serve"]);
        assert!(matches!(args.command, Some(CliCommand::Serve { port: 8080 })));
        assert!(Args::parse_from(["paperlab"]).command.is_none());
    }

    #[tokio::test]
    async fn test_read_document_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        tokio::fs::write(&path, "Abstract.").await.unwrap();

        let text = read_document(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "Abstract.");
        assert!(read_document("/definitely/not/here.txt").await.is_err());
    }
}
