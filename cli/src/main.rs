use std::rc::Rc;

use clap::{Parser, Subcommand};
use devwell_assistant::config::WidgetConfig;
use devwell_assistant::net::api::AssistantApi;
use devwell_assistant::net::csrf::StaticCsrf;
use devwell_assistant::net::types::ApiError;
use devwell_assistant::widget::{ChatWidget, Spawner};
use futures_util::future::LocalBoxFuture;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod http;
mod terminal;

use http::ReqwestApi;
use terminal::TerminalSurface;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http client build failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("assistant request failed: {0}")]
    Api(#[from] ApiError),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("message is empty")]
    EmptyMessage,
    #[error("assistant stopped before replying")]
    NoReply,
}

#[derive(Parser, Debug)]
#[command(name = "devwell-cli", about = "Talk to the DevWell assistant from a terminal")]
struct Cli {
    #[arg(long, env = "DEVWELL_BASE_URL", default_value = "http://127.0.0.1:5000")]
    base_url: String,

    /// Value of the Flask `session` cookie of a logged-in user.
    #[arg(long, env = "DEVWELL_SESSION_COOKIE")]
    session_cookie: Option<String>,

    #[arg(long, env = "DEVWELL_CSRF_TOKEN", default_value = "")]
    csrf_token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session; opening the panel triggers a background reindex.
    Chat,
    /// Send one message and print the reply.
    Ask { message: String },
    /// Rebuild the assistant index and wait for the result.
    Reindex,
}

/// A line typed into the interactive session.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput<'a> {
    Toggle,
    Close,
    Quit,
    Message(&'a str),
}

impl<'a> ReplInput<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/toggle" => Self::Toggle,
            "/close" => Self::Close,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Message(line),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let config = WidgetConfig::default();
    let api = ReqwestApi::new(&cli.base_url, cli.session_cookie.as_deref(), &config)?;
    let csrf = StaticCsrf(cli.csrf_token);

    match cli.command {
        Command::Reindex => reindex(&api, &csrf.0).await,
        Command::Ask { message } => {
            tokio::task::LocalSet::new()
                .run_until(ask(api, csrf, &config, &message))
                .await
        }
        Command::Chat => tokio::task::LocalSet::new().run_until(chat(api, csrf, &config)).await,
    }
}

const DEFAULT_LOG_FILTER: &str = "info";

/// `RUST_LOG` directives, or `info` when unset or unparseable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn local_spawner() -> Spawner {
    Rc::new(|task: LocalBoxFuture<'static, ()>| {
        tokio::task::spawn_local(task);
    })
}

async fn reindex(api: &ReqwestApi, csrf_token: &str) -> Result<(), CliError> {
    let reply = api.reindex(csrf_token).await?;
    println!(
        "reindex {}: {} documents indexed",
        reply.status.as_deref().unwrap_or("done"),
        reply.documents_indexed.unwrap_or(0)
    );
    Ok(())
}

async fn ask(api: ReqwestApi, csrf: StaticCsrf, config: &WidgetConfig, message: &str) -> Result<(), CliError> {
    let (tx, mut replies) = mpsc::unbounded_channel();
    let widget = ChatWidget::new(api, TerminalSurface::new(tx, true), csrf, local_spawner(), config);

    if !widget.submit(message) {
        return Err(CliError::EmptyMessage);
    }
    replies.recv().await.ok_or(CliError::NoReply)
}

async fn chat(api: ReqwestApi, csrf: StaticCsrf, config: &WidgetConfig) -> Result<(), CliError> {
    let (tx, mut replies) = mpsc::unbounded_channel();
    let widget = ChatWidget::new(api, TerminalSurface::new(tx, false), csrf, local_spawner(), config);

    widget.toggle();
    println!("{} (commands: /toggle /close /quit)", config.title);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match ReplInput::parse(&line) {
            ReplInput::Quit => break,
            ReplInput::Toggle => {
                widget.toggle();
            }
            ReplInput::Close => widget.close(),
            ReplInput::Message(text) => {
                if widget.submit(text) && replies.recv().await.is_none() {
                    return Err(CliError::NoReply);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repl_commands_are_recognized() {
        assert_eq!(ReplInput::parse("/toggle"), ReplInput::Toggle);
        assert_eq!(ReplInput::parse(" /close "), ReplInput::Close);
        assert_eq!(ReplInput::parse("/quit"), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/exit"), ReplInput::Quit);
    }

    #[test]
    fn other_lines_are_messages() {
        assert_eq!(ReplInput::parse("how am I doing?"), ReplInput::Message("how am I doing?"));
        assert_eq!(ReplInput::parse("/unknown"), ReplInput::Message("/unknown"));
    }

    #[test]
    fn log_filter_honors_directives() {
        assert_eq!(log_filter(Some("devwell_cli=debug")).to_string(), "devwell_cli=debug");
        assert_eq!(log_filter(Some("warn")).to_string(), "warn");
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("devwell_cli=loud")).to_string(), "info");
    }

    #[test]
    fn cli_parses_ask_subcommand() {
        let cli = Cli::try_parse_from(["devwell-cli", "--csrf-token", "t", "ask", "hello"]).unwrap();
        assert_eq!(cli.csrf_token, "t");
        assert!(matches!(cli.command, Command::Ask { message } if message == "hello"));
    }
}
