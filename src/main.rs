//! Factcheck administration CLI.
//!
//! Runs the core operations directly against the configured database and
//! prints results as JSON on stdout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use factcheck::config::Config;
use factcheck::repo::{ListOptions, Repository};
use factcheck::service::Service;
use factcheck::types::{GroupStatus, UserInfo, UserType};
use factcheck::{db, logging};

/// Factcheck: message deduplication and topic resolution.
#[derive(Parser)]
#[command(name = "factcheck", version, about)]
struct Cli {
    /// Config file (default: `$FACTCHECK_CONFIG_PATH` or `~/.factcheck/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Create the database and apply the schema.
    Migrate,
    /// Create a pending topic.
    CreateTopic {
        /// Topic name.
        name: String,
        /// Topic description.
        #[arg(default_value = "")]
        description: String,
    },
    /// Submit a message.
    Submit {
        /// Message text.
        text: String,
        /// Topic the submitter believes the message belongs to.
        #[arg(long)]
        topic: Option<Uuid>,
        /// Submitting user id.
        #[arg(long, default_value = "cli")]
        user: String,
        /// Submitting user type.
        #[arg(long, value_enum, default_value_t = CliUserType::Admin)]
        user_type: CliUserType,
    },
    /// Answer and resolve a topic.
    Resolve {
        /// Topic id.
        topic: Uuid,
        /// Answer text.
        answer: String,
        /// Answering admin id.
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Assign a message group to a topic.
    AssignTopic {
        /// Group id.
        group: Uuid,
        /// Topic id.
        topic: Uuid,
    },
    /// Remove a message group from its topic.
    UnassignTopic {
        /// Group id.
        group: Uuid,
    },
    /// Move a single message into another group.
    MoveMessage {
        /// Message id.
        message: Uuid,
        /// Target group id.
        group: Uuid,
    },
    /// Set a message group's triage status.
    Review {
        /// Group id.
        group: Uuid,
        /// New status.
        #[arg(value_enum)]
        status: CliGroupStatus,
    },
    /// Print every row of a table.
    Dump {
        /// Table to print.
        #[arg(value_enum)]
        table: Table,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliUserType {
    Admin,
    LineChat,
}

impl From<CliUserType> for UserType {
    fn from(value: CliUserType) -> Self {
        match value {
            CliUserType::Admin => Self::Admin,
            CliUserType::LineChat => Self::LineChat,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliGroupStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<CliGroupStatus> for GroupStatus {
    fn from(value: CliGroupStatus) -> Self {
        match value {
            CliGroupStatus::Pending => Self::Pending,
            CliGroupStatus::Approved => Self::Approved,
            CliGroupStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Topics,
    Groups,
    Messages,
    Answers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.db {
        config.database.path = path;
    }

    let _logging_guard = match &config.logging.dir {
        Some(dir) => Some(logging::init_production(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    let pool = db::open(&config.database).await?;
    let service = Service::new(Repository::new(pool))
        .with_timeout(config.service.transaction_timeout());

    match cli.command {
        Command::Migrate => {
            debug!(path = %config.database.path.display(), "schema applied");
            print_json(&serde_json::json!({ "database": config.database.path }))
        }
        Command::CreateTopic { name, description } => {
            print_json(&service.create_topic(&name, &description).await?)
        }
        Command::Submit {
            text,
            topic,
            user,
            user_type,
        } => {
            let user = UserInfo {
                user_type: user_type.into(),
                user_id: user,
            };
            print_json(&service.submit(&user, &text, topic).await?)
        }
        Command::Resolve {
            topic,
            answer,
            user,
        } => print_json(&service.resolve(&UserInfo::admin(user), topic, &answer).await?),
        Command::AssignTopic { group, topic } => {
            print_json(&service.assign_group_topic(group, topic).await?)
        }
        Command::UnassignTopic { group } => print_json(&service.unassign_group_topic(group).await?),
        Command::MoveMessage { message, group } => {
            print_json(&service.move_message_to_group(message, group).await?)
        }
        Command::Review { group, status } => {
            print_json(&service.review_group(group, status.into()).await?)
        }
        Command::Dump { table } => dump(&service, table).await,
    }
}

async fn dump(service: &Service, table: Table) -> anyhow::Result<()> {
    let repo = service.repository();
    let mut conn = repo.acquire().await?;
    match table {
        Table::Topics => print_json(&repo.topics.list(&mut conn, &ListOptions::new()).await?),
        Table::Groups => print_json(
            &repo
                .message_groups
                .list(&mut conn, &ListOptions::new())
                .await?,
        ),
        Table::Messages => {
            let groups = repo
                .message_groups
                .list(&mut conn, &ListOptions::new())
                .await?;
            let mut messages = Vec::new();
            for group in &groups {
                messages.extend(repo.messages.list_by_group(&mut conn, group.id).await?);
            }
            print_json(&messages)
        }
        Table::Answers => {
            let topics = repo.topics.list(&mut conn, &ListOptions::new()).await?;
            let mut answers = Vec::new();
            for topic in &topics {
                answers.extend(repo.answers.list_by_topic(&mut conn, topic.id).await?);
            }
            print_json(&answers)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}
