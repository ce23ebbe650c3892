//! `aibot` command-line client: chat, trace inspection and the HTTP API.

use aibot_rs::config::{AibotConfig, ProcessEnv};
use aibot_rs::core::{ChatSession, RequestContext, dashboard_rows, role_options, session_options};
use aibot_rs::protocol::TraceFilter;
use aibot_rs::server::{AppState, serve};
use aibot_rs::traces::open_trace_store;
use aibot_rs::{build_runner, init_logging, load_config, render_rows};
use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line options for the aibot client.
#[derive(Parser)]
#[command(name = "aibot", version)]
struct Cli {
    /// Optional path to an aibot.json5 config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat; every turn is logged
    Chat,
    /// Send a single prompt
    Ask {
        prompt: String,
    },
    /// Inspect the local trace log
    Traces {
        #[command(subcommand)]
        command: TracesCommand,
    },
    /// Run the HTTP API
    Serve {
        /// Listen address (defaults to server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
enum TracesCommand {
    /// Print records, optionally filtered
    List {
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the session and role filter options
    Sessions,
    /// Write the raw trace file
    Export {
        /// Destination path, or `-` for stdout (defaults to traces.export_filename)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let config = load_config(cli.config.as_deref(), &cwd, &ProcessEnv)?;

    match cli.command {
        Command::Chat => chat(&config, &cwd).await,
        Command::Ask { prompt } => ask(&config, &cwd, &prompt).await,
        Command::Traces { command } => traces(&config, command),
        Command::Serve { bind } => {
            let runner = build_runner(&config, &cwd, &ProcessEnv)?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let state = AppState::new(Arc::new(runner), config.traces.export_filename.clone());
            serve(state, &bind)
                .await
                .with_context(|| format!("failed to serve on {bind}"))
        }
    }
}

async fn chat(config: &AibotConfig, cwd: &Path) -> anyhow::Result<()> {
    let runner = build_runner(config, cwd, &ProcessEnv)?;
    let mut session = ChatSession::new();
    let request = RequestContext::default();
    println!("Session ID: {}", session.short_id());
    println!("Type a message, or `exit` to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt, "exit" | "quit") {
            break;
        }
        match runner.run_turn(&mut session, prompt, &request).await {
            Ok(outcome) => {
                println!("{}", outcome.response);
                println!("Trace ID: {}", outcome.trace_id);
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    info!(
        "chat finished (session_id={}, turns={})",
        session.id(),
        session.completed_turns()
    );
    Ok(())
}

async fn ask(config: &AibotConfig, cwd: &Path, prompt: &str) -> anyhow::Result<()> {
    let runner = build_runner(config, cwd, &ProcessEnv)?;
    let mut session = ChatSession::new();
    let outcome = runner
        .run_turn(&mut session, prompt, &RequestContext::default())
        .await
        .context("turn failed")?;
    println!("{}", outcome.response);
    println!("Trace ID: {}", outcome.trace_id);
    Ok(())
}

fn traces(config: &AibotConfig, command: TracesCommand) -> anyhow::Result<()> {
    let store = open_trace_store(&config.traces).context("failed to open trace store")?;
    match command {
        TracesCommand::List {
            session,
            role,
            search,
        } => {
            let filter = TraceFilter::from_selection(
                session.as_deref(),
                role.as_deref(),
                search.as_deref(),
            )?;
            let records = store.query(&filter).context("failed to read traces")?;
            if store.is_empty() {
                println!("No traces recorded yet.");
            } else {
                print!("{}", render_rows(&dashboard_rows(&records)));
            }
        }
        TracesCommand::Sessions => {
            let sessions = store.sessions().context("failed to read traces")?;
            println!("sessions: {}", session_options(&sessions).join(", "));
            println!("roles: {}", role_options().join(", "));
        }
        TracesCommand::Export { out } => {
            let Some(bytes) = store.export().context("failed to read trace file")? else {
                println!("No trace file found yet.");
                return Ok(());
            };
            let out = out.unwrap_or_else(|| PathBuf::from(&config.traces.export_filename));
            if out.as_os_str() == "-" {
                std::io::stdout()
                    .write_all(&bytes)
                    .context("failed to write stdout")?;
            } else {
                std::fs::write(&out, &bytes)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Exported {} bytes to {}", bytes.len(), out.display());
            }
        }
    }
    Ok(())
}
