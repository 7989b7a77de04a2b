//! Console Bot Example
//!
//! Every line typed on stdin becomes an event for the Herald runtime:
//!
//! - `!ping`, `!add 2 3`, `!echo hello world` are text messages
//! - `/ping`, `/add a=2 b=3` are interactions, options given as `key=value`
//!
//! Replies and rejected commands are printed to stdout, logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --owner --deny MANAGE_MESSAGES
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use futures::Stream;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use herald::prelude::*;
use herald::runtime::config::{DispatchConfig, LogLevel, LogOutput, LoggingConfig};

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Drive Herald commands from the terminal")]
struct Cli {
    /// Actor id attached to every typed line.
    #[arg(long, default_value = "console")]
    user: String,

    /// Treat the console user as a bot owner.
    #[arg(long)]
    owner: bool,

    /// Permissions the console user does not hold.
    #[arg(long = "deny", value_name = "PERMISSION")]
    denied: Vec<String>,

    /// Configuration file; `herald.toml` is searched for otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Platform
// ============================================================================

/// Grants every permission except the denied ones. The bot itself holds all.
struct ConsoleClient {
    denied: PermissionSet,
}

#[async_trait]
impl Client for ConsoleClient {
    fn self_id(&self) -> &str {
        "herald"
    }

    async fn has_permissions(
        &self,
        _location: &Location,
        actor_id: &str,
        required: &PermissionSet,
    ) -> bool {
        actor_id == self.self_id() || required.iter().all(|p| !self.denied.contains(p))
    }
}

/// Parses `/name key=value ...` into an interaction and anything else into a
/// text message.
fn parse_line(user: &str, line: &str, seq: u64) -> InboundEvent {
    let Some(rest) = line.strip_prefix('/') else {
        return MessageEvent::new(user, "console", line)
            .with_id(seq.to_string())
            .into();
    };

    let mut tokens = rest.split_whitespace();
    let name = tokens.next().unwrap_or_default();
    let mut event = InteractionEvent::new(user, "console", name).with_id(seq.to_string());
    for token in tokens {
        if let Some((key, value)) = token.split_once('=') {
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            event = event.option(key, value);
        }
    }
    event.into()
}

fn console_events(user: String) -> impl Stream<Item = InboundEvent> {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    futures::stream::unfold((lines, 0u64), move |(mut lines, seq)| {
        let user = user.clone();
        async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        return Some((parse_line(&user, line.trim(), seq), (lines, seq + 1)));
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        return None;
                    }
                }
            }
        }
    })
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Default)]
struct Notes {
    entries: Mutex<Vec<String>>,
}

impl Module for Notes {
    fn name(&self) -> &str {
        "notes"
    }

    fn init(self: Arc<Self>, scope: &mut ModuleScope<'_>) -> RegistryResult<()> {
        let this = Arc::clone(&self);
        scope.command(
            Command::builder("note")
                .description("Remember a line of text")
                .param(Parameter::rest())
                .handler(move |_event, args| {
                    let this = Arc::clone(&this);
                    async move {
                        let mut entries = this.entries.lock();
                        entries.push(args.str(0).unwrap_or_default().to_string());
                        println!("noted #{}", entries.len());
                    }
                }),
        )?;
        scope.check(
            "note",
            Check::sync(|event| event.content.len() <= 200).named("short_note"),
        )?;

        let this = Arc::clone(&self);
        scope.command(
            Command::builder("notes")
                .description("List remembered notes")
                .handler(move |_event, _args| {
                    let this = Arc::clone(&this);
                    async move {
                        for (i, note) in this.entries.lock().iter().enumerate() {
                            println!("{}. {note}", i + 1);
                        }
                    }
                }),
        )
    }
}

fn register_commands(runtime: &HeraldRuntime) -> Result<()> {
    runtime.register_command(
        Command::builder("ping")
            .alias("p")
            .description("Check the bot is alive")
            .handler(|_event, _args| async { println!("pong") }),
    )?;

    runtime.register_command(
        Command::builder("echo")
            .param(Parameter::rest())
            .handler(|_event, args| async move { println!("{}", args.str(0).unwrap_or_default()) }),
    )?;

    runtime.register_command(
        Command::builder("add")
            .param(Parameter::required(TypeTag::NUMBER))
            .param(Parameter::required(TypeTag::NUMBER))
            .handler(|_event, args| async move {
                let a: f64 = args.parse(0)?.unwrap_or_default();
                let b: f64 = args.parse(1)?.unwrap_or_default();
                println!("{}", a + b);
                Ok::<_, serde_json::Error>(())
            }),
    )?;

    runtime.register_command(
        Command::builder("whoami")
            .context_handler(|ctx, _args| async move {
                println!(
                    "{} via {}{}",
                    ctx.event().author_id,
                    ctx.prefix(),
                    ctx.invoked_with()
                );
            }),
    )?;

    runtime.register_command(
        Command::builder("purge")
            .permissions(["MANAGE_MESSAGES"])
            .client_permissions(["MANAGE_MESSAGES"])
            .handler(|_event, _args| async { println!("purged") }),
    )?;

    let shutdown = runtime.shutdown_token();
    runtime.register_command(
        Command::builder("shutdown")
            .owner_only()
            .handler(move |_event, _args| {
                let shutdown = shutdown.clone();
                async move {
                    println!("bye");
                    shutdown.cancel();
                }
            }),
    )?;

    runtime.register_slash_command(
        SlashCommand::builder("ping").handler(|_event, _options| async { println!("pong") }),
    )?;

    runtime.register_slash_command(SlashCommand::builder("add").handler(
        |_event, options| async move {
            let sum: f64 = ["a", "b"]
                .iter()
                .filter_map(|key| options.get(*key).and_then(|v| v.as_f64()))
                .sum();
            println!("{sum}");
        },
    ))?;

    runtime.register_module(Arc::new(Notes::default()))?;
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let defaults = HeraldConfig {
        dispatch: DispatchConfig {
            owners: if cli.owner { vec![cli.user.clone()] } else { Vec::new() },
            ..Default::default()
        },
        logging: LoggingConfig {
            level: LogLevel::Warn,
            output: LogOutput::Stderr,
            ..Default::default()
        },
        ..Default::default()
    };

    let client = Arc::new(ConsoleClient {
        denied: cli.denied.iter().cloned().collect(),
    });
    let mut builder = HeraldRuntime::builder(client).merge(defaults);
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    let runtime = builder.build().context("failed to build runtime")?;

    register_commands(&runtime)?;

    let mut errors = runtime.subscribe_errors();
    tokio::spawn(async move {
        while let Some(report) = errors.recv().await {
            if report.kind().is_user_facing() {
                println!("✗ {}", report.error);
            }
        }
    });

    runtime.run_until_signal(console_events(cli.user)).await?;
    Ok(())
}
