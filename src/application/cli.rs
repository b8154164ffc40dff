#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Local;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatType;
use crate::domain::models::SessionIndexEntry;
use crate::domain::services::events::help_text;
use crate::domain::services::SessionStore;
use crate::infrastructure::responders::simulator::Pacing;
use crate::infrastructure::responders::stream_client::StreamClient;
use crate::infrastructure::storage::StorageName;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

fn configured_chat_type() -> ChatType {
    return ChatType::parse(Config::get(ConfigKey::ChatType)).unwrap_or(ChatType::Unified);
}

fn format_session(session: &SessionIndexEntry, now: DateTime<FixedOffset>) -> String {
    return format!(
        "- (ID: {}) {}, {} messages, {}",
        session.id,
        session.updated_ago(now),
        session.message_count,
        session.title
    );
}

async fn print_sessions_list() -> Result<()> {
    let chat_type = configured_chat_type();
    let now: DateTime<FixedOffset> = Local::now().into();
    let sessions = SessionStore::from_config()?
        .list_sessions(chat_type)
        .await
        .iter()
        .map(|session| {
            return format_session(session, now);
        })
        .collect::<Vec<String>>();

    if sessions.is_empty() {
        println!(
            "There are no {} sessions yet. You should start your first one!",
            chat_type
        );
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn open_session_interactive() -> Result<bool> {
    let now: DateTime<FixedOffset> = Local::now().into();
    let sessions = SessionStore::from_config()?
        .list_sessions(configured_chat_type())
        .await;

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
        return Ok(false);
    }

    let session_options = sessions
        .iter()
        .map(|session| {
            return format_session(session, now);
        })
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which session would you like to open?")
        .default(0)
        .items(&session_options)
        .interact_opt()?;

    if let Some(idx) = idx {
        Config::set(ConfigKey::SessionID, &sessions[idx].id);
        return Ok(true);
    }

    return Ok(false);
}

async fn reindex_documents() -> Result<()> {
    let res = StreamClient::default().reindex().await?;
    println!("{}", serde_json::to_string_pretty(&res)?);
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_sessions_delete() -> Command {
    return Command::new("delete")
        .about("Delete one or all sessions of the selected chat type.")
        .arg(
            clap::Arg::new("session-id")
                .short('i')
                .long("id")
                .help("Session ID")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("all")
                .long("all")
                .help("Delete all sessions.")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("delete-args")
                .args(["session-id", "all"])
                .required(true),
        );
}

fn subcommand_sessions() -> Command {
    return Command::new("sessions")
        .about("Manage past study sessions.")
        .arg_required_else_help(true)
        .subcommand(Command::new("dir").about("Print the sessions storage directory path."))
        .subcommand(Command::new("list").about("List previous sessions of the selected chat type, most recent first."))
        .subcommand(
            Command::new("open")
                .about("Open a previous session by ID. Omit passing any session ID to load an interactive selection.")
                .arg(
                    clap::Arg::new(ConfigKey::SessionID.to_string())
                        .short('i')
                        .long("id")
                        .help("Session ID")
                        .required(false),
                ),
        )
        .subcommand(subcommand_sessions_delete());
}

fn arg_api_url() -> Arg {
    return Arg::new(ConfigKey::ApiUrl.to_string())
        .long(ConfigKey::ApiUrl.to_string())
        .env("STUDYCHAT_API_URL")
        .num_args(1)
        .help(format!(
            "Course assistant API URL. [default: {}]",
            Config::default(ConfigKey::ApiUrl)
        ))
        .global(true);
}

fn arg_chat_type() -> Arg {
    return Arg::new(ConfigKey::ChatType.to_string())
        .short('t')
        .long(ConfigKey::ChatType.to_string())
        .env("STUDYCHAT_CHAT_TYPE")
        .num_args(1)
        .help(format!(
            "Which assistant to talk to. Each keeps its own sessions. [default: {}]",
            Config::default(ConfigKey::ChatType)
        ))
        .value_parser(PossibleValuesParser::new(ChatType::VARIANTS))
        .global(true);
}

fn arg_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::HealthCheckTimeout.to_string())
        .long(ConfigKey::HealthCheckTimeout.to_string())
        .env("STUDYCHAT_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds before timing out when checking if the course assistant is up. [default: {}]",
            Config::default(ConfigKey::HealthCheckTimeout)
        ))
        .global(true);
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Start or resume a study session.");
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("studychat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(Command::new("reindex").about("Asks the course assistant to rebuild its document index."))
        .subcommand(subcommand_sessions())
        .arg(arg_api_url())
        .arg(arg_chat_type())
        .arg(arg_health_check_timeout())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("STUDYCHAT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::SimulatorDelay.to_string())
                .long(ConfigKey::SimulatorDelay.to_string())
                .env("STUDYCHAT_SIMULATOR_DELAY")
                .num_args(1)
                .help(format!("Milliseconds between characters when answering offline. [default: {}]", Config::default(ConfigKey::SimulatorDelay)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SimulatorPacing.to_string())
                .long(ConfigKey::SimulatorPacing.to_string())
                .env("STUDYCHAT_SIMULATOR_PACING")
                .num_args(1)
                .help(format!("How offline answers are paced. Punctuation pauses longer after sentences and clauses. [default: {}]", Config::default(ConfigKey::SimulatorPacing)))
                .value_parser(PossibleValuesParser::new(Pacing::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::SimulatorStages.to_string())
                .long(ConfigKey::SimulatorStages.to_string())
                .env("STUDYCHAT_SIMULATOR_STAGES")
                .num_args(1)
                .help(format!("Show progress stages before offline answers. [default: {}]", Config::default(ConfigKey::SimulatorStages)))
                .value_parser(PossibleValuesParser::new(["true", "false"]))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Storage.to_string())
                .long(ConfigKey::Storage.to_string())
                .env("STUDYCHAT_STORAGE")
                .num_args(1)
                .help(format!("Where sessions are kept. Memory forgets them on exit. [default: {}]", Config::default(ConfigKey::Storage)))
                .value_parser(PossibleValuesParser::new(StorageName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StorageDir.to_string())
                .long(ConfigKey::StorageDir.to_string())
                .env("STUDYCHAT_STORAGE_DIR")
                .num_args(1)
                .help(format!("Directory sessions are saved to when using file storage. [default: {}]", Config::default(ConfigKey::StorageDir)))
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("reindex", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            reindex_documents().await?;
            return Ok(false);
        }
        Some(("sessions", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("dir", dir_matches)) => {
                Config::load(build(), vec![&matches, subcmd_matches, dir_matches]).await?;
                println!("{}", Config::get(ConfigKey::StorageDir));
                return Ok(false);
            }
            Some(("list", list_matches)) => {
                Config::load(build(), vec![&matches, subcmd_matches, list_matches]).await?;
                print_sessions_list().await?;
                return Ok(false);
            }
            Some(("open", open_matches)) => {
                Config::load(build(), vec![&matches, subcmd_matches, open_matches]).await?;
                if let Some(session_id) =
                    open_matches.get_one::<String>(&ConfigKey::SessionID.to_string())
                {
                    Config::set(ConfigKey::SessionID, session_id);
                } else {
                    return open_session_interactive().await;
                }
            }
            Some(("delete", delete_matches)) => {
                Config::load(build(), vec![&matches, subcmd_matches, delete_matches]).await?;
                let chat_type = configured_chat_type();
                let store = SessionStore::from_config()?;

                if let Some(session_id) = delete_matches.get_one::<String>("session-id") {
                    if !store.delete_session(session_id, chat_type).await {
                        bail!(format!("Failed to delete session {session_id}"));
                    }
                    println!("Deleted session {session_id}");
                } else if delete_matches.get_flag("all") {
                    if !store.clear_all_sessions(chat_type).await {
                        bail!(format!("Failed to delete {chat_type} sessions"));
                    }
                    println!("Deleted all {chat_type} sessions");
                } else {
                    subcommand_sessions_delete().print_long_help()?;
                }
                return Ok(false);
            }
            _ => {
                subcommand_sessions().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
