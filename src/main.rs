use std::process;
use std::sync::Arc;

use anyhow::Context as _;
use chatwarden::capability::StaticEditorDirectory;
use chatwarden::chat::{ChatDriver, ConsoleResponder};
use chatwarden::commands;
use chatwarden::config::Config;
use chatwarden::cooldown::CooldownStore;
use chatwarden::gate::Gate;
use chatwarden::moderation::RegexContentFilter;
use chatwarden::pipeline::ExecutionEngine;
use chatwarden::recorder::{self, NullRecorder, Recorder, SqliteRecorder};
use chatwarden::{ChannelIdentity, ChatUser, CommandRegistry, IncomingMessage};
use clap::{Arg, Command};
use log::LevelFilter;
use tokio::io::AsyncBufReadExt;

#[tokio::main]
async fn main() {
    let matches = Command::new("chatwarden")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Chat command bot core: policed command execution for streaming chat")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/chatwarden.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and the builtin command set")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Show per-channel and per-command execution statistics")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats-reset")
                .long("stats-reset")
                .help("Reset all execution statistics and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .help("Run a scripted set of chat lines through the pipeline")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        match Config::default().to_file(generate_path) {
            Ok(()) => println!("Default configuration written to {generate_path}"),
            Err(e) => {
                eprintln!("Error writing configuration: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        match test_config(&config) {
            Ok(command_count) => {
                println!("Configuration valid.");
                println!("Channels: {}", config.channels.len());
                println!("Commands: {command_count}");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("stats") {
        if let Err(e) = print_stats(&config.recorder_db_path) {
            eprintln!("Error reading statistics: {e:#}");
            process::exit(1);
        }
        return;
    }

    if matches.get_flag("stats-reset") {
        match recorder::reset_stats(&config.recorder_db_path) {
            Ok(()) => println!("Statistics reset."),
            Err(e) => {
                eprintln!("Error resetting statistics: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    let result = if matches.get_flag("demo") {
        run_demo(&config).await
    } else {
        run_console(&config).await
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if !std::path::Path::new(path).exists() {
        log::warn!("Configuration file {path} not found, using defaults");
        return Ok(Config::default());
    }
    Config::from_file(path).with_context(|| format!("failed to load {path}"))
}

/// Build the full pipeline from configuration. Registration errors
/// (duplicate names, colliding short flags) surface here, at load time.
fn build_driver(config: &Config, recorder: Arc<dyn Recorder>) -> anyhow::Result<ChatDriver> {
    let mut registry = CommandRegistry::new();
    let editors = Arc::new(StaticEditorDirectory::new(config.channel_editors()));
    commands::register_builtins(&mut registry, editors)?;

    let filter = RegexContentFilter::new(&config.banned_phrases, &config.channel_banned_phrases())?;
    let gate = Gate::new(CooldownStore::new(), config.admins.iter().cloned());

    let engine = ExecutionEngine::new(
        config.prefix.clone(),
        Arc::new(registry),
        gate,
        Arc::new(filter),
        recorder,
    );

    Ok(ChatDriver::new(
        Arc::new(engine),
        Arc::new(ConsoleResponder),
        config.evasion_character.clone(),
    ))
}

fn test_config(config: &Config) -> anyhow::Result<usize> {
    RegexContentFilter::new(&config.banned_phrases, &config.channel_banned_phrases())?;

    let mut registry = CommandRegistry::new();
    let editors = Arc::new(StaticEditorDirectory::new(config.channel_editors()));
    commands::register_builtins(&mut registry, editors)?;

    anyhow::ensure!(!config.channels.is_empty(), "no channels configured");
    Ok(registry.len())
}

fn print_stats(db_path: &str) -> anyhow::Result<()> {
    let (channels, commands) = recorder::read_stats(db_path)?;

    println!("Per-channel handled commands:");
    if channels.is_empty() {
        println!("  (none recorded)");
    }
    for channel in channels {
        println!("  {}: {}", channel.channel_id, channel.commands_handled);
    }

    println!();
    println!("Per-command executions:");
    if commands.is_empty() {
        println!("  (none recorded)");
    }
    for command in commands {
        let last = command
            .last_executed
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  {}: {} total, {} failed, last {}",
            command.command, command.executions, command.failures, last
        );
    }

    Ok(())
}

fn console_channel(config: &Config) -> anyhow::Result<ChannelIdentity> {
    let channel = config.channels.first().context("no channels configured")?;
    Ok(ChannelIdentity {
        id: channel.id.clone(),
        name: channel.name.clone(),
        live: false,
        disabled_commands: channel.disabled_commands.clone(),
    })
}

/// Interactive mode: every stdin line is a chat message from the channel's
/// broadcaster. Useful for poking at commands without a chat connection.
async fn run_console(config: &Config) -> anyhow::Result<()> {
    let recorder: Arc<dyn Recorder> = Arc::new(SqliteRecorder::new(
        config.recorder_db_path.clone(),
        config.flush_interval_seconds,
    )?);
    let driver = build_driver(config, recorder)?;
    let channel = console_channel(config)?;

    log::info!(
        "Reading chat lines from stdin as broadcaster of #{} (prefix '{}')",
        channel.name,
        config.prefix
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let msg = IncomingMessage {
            channel: channel.clone(),
            user: ChatUser {
                id: channel.id.clone(),
                name: channel.name.clone(),
                ..Default::default()
            },
            text: line,
            is_self: false,
            metadata: Default::default(),
        };
        driver.handle(msg).await;
    }

    Ok(())
}

/// Scripted walk through the pipeline's branches: success, not-a-command,
/// silent policy rejections, capability denial, soft failure and cooldown.
async fn run_demo(config: &Config) -> anyhow::Result<()> {
    let driver = build_driver(config, Arc::new(NullRecorder))?;
    let channel = console_channel(config)?;

    let admin = config
        .admins
        .first()
        .cloned()
        .unwrap_or_else(|| "keeper".to_string());

    let viewer = ChatUser {
        id: "100".to_string(),
        name: "someone".to_string(),
        ..Default::default()
    };
    let moderator = ChatUser {
        id: "200".to_string(),
        name: "moddy".to_string(),
        channel_moderator: true,
        ..Default::default()
    };
    let vip = ChatUser {
        id: "250".to_string(),
        name: "vippy".to_string(),
        channel_vip: true,
        ..Default::default()
    };
    let keeper = ChatUser {
        id: "300".to_string(),
        name: admin,
        ..Default::default()
    };

    let script: Vec<(&ChatUser, &str)> = vec![
        (&viewer, "!ping"),
        (&viewer, "hello there"),
        (&viewer, "!say I am not a mod"),
        (&moderator, "!say hello chat"),
        (&viewer, "!time --utc"),
        (&vip, "!announce big news"),
        (&keeper, "!announce big news"),
        (&viewer, "!suggest --category emotes add pepe"),
        (&viewer, "!ping"),
        (&viewer, "!help"),
    ];

    for (user, text) in script {
        println!("> {}: {text}", user.name);
        let msg = IncomingMessage {
            channel: channel.clone(),
            user: user.clone(),
            text: text.to_string(),
            is_self: false,
            metadata: Default::default(),
        };
        driver.handle(msg).await;
    }

    Ok(())
}
