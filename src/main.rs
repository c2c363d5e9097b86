use std::{path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use media_container::{db::Db, schema::container_ext, validate::ValidationErrors};
use sea_orm::ConnectOptions;
use tracing::*;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(version, about = "Media fields for archival containers")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations
    Migrate,
    /// Show applied and pending migrations
    Status,
    /// Print the container extension schema as JSON
    Schema,
    /// Inspect or edit an editable enumeration
    Enum {
        #[command(subcommand)]
        command: EnumCommand,
    },
    /// Validate a JSON record against the schema and live enum values
    Validate { file: PathBuf },
}

#[derive(Subcommand)]
enum EnumCommand {
    List { name: String },
    Add { name: String, value: String },
    Remove { name: String, value: String },
    /// Mark a value read-only so it can't be removed
    Lock { name: String, value: String },
    Unlock { name: String, value: String },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                tracing_subscriber::filter::LevelFilter::from_str(
                    &std::env::var("RUST_LOG").unwrap_or_else(|_| String::from("info")),
                )
                .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO),
            ),
        )
        .with(
            sentry_tracing::layer().event_filter(|md| match *md.level() {
                Level::TRACE => sentry_tracing::EventFilter::Ignore,
                _ => sentry_tracing::EventFilter::Breadcrumb,
            }),
        )
        .try_init()?;

    let _sentry_guard = match std::env::var("SENTRY_DSN") {
        Ok(d) => {
            let guard = sentry::init((
                d,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    attach_stacktrace: true,
                    ..Default::default()
                },
            ));
            Some(guard)
        }
        Err(e) => {
            debug!("can't get SENTRY_DSN: {:?}", e);
            None
        }
    };

    let cli = Cli::parse();
    let res = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(_main(cli));

    if let Err(e) = &res {
        sentry_anyhow::capture_anyhow(e);
    }
    res
}

fn database_url(url: Option<&str>) -> Result<&str> {
    url.context("DATABASE_URL is not set")
}

async fn connect(url: Option<&str>) -> Result<Db> {
    Db::open(ConnectOptions::new(database_url(url)?)).await
}

async fn _main(cli: Cli) -> Result<()> {
    let url = cli.database_url.as_deref();
    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&container_ext())?);
        }
        Command::Migrate => {
            Db::connect(database_url(url)?).await?;
            info!("database is up to date");
        }
        Command::Status => {
            let db = connect(url).await?;
            for (name, status) in db.migration_status().await? {
                println!("{status:<8} {name}");
            }
        }
        Command::Enum { command } => {
            let db = connect(url).await?;
            db.ensure_migrated().await?;
            match command {
                EnumCommand::List { name } => {
                    for value in db.enum_values(&name).await? {
                        let flag = if value.readonly { " (read-only)" } else { "" };
                        println!("{:>3} {}{}", value.position, value.value, flag);
                    }
                }
                EnumCommand::Add { name, value } => {
                    let id = db.add_enum_value(&name, &value).await?;
                    println!("added {value} to {name} with id {id}");
                }
                EnumCommand::Remove { name, value } => {
                    db.remove_enum_value(&name, &value).await?;
                    println!("removed {value} from {name}");
                }
                EnumCommand::Lock { name, value } => {
                    db.set_enum_readonly(&name, &value, true).await?;
                    println!("locked {value} in {name}");
                }
                EnumCommand::Unlock { name, value } => {
                    db.set_enum_readonly(&name, &value, false).await?;
                    println!("unlocked {value} in {name}");
                }
            }
        }
        Command::Validate { file } => {
            let db = connect(url).await?;
            db.ensure_migrated().await?;
            if let Err(e) = db.check_record_file(&file).await {
                if let Some(errors) = e.downcast_ref::<ValidationErrors>() {
                    for error in errors.errors() {
                        eprintln!("{error}");
                    }
                }
                return Err(e.context(format!("{} is invalid", file.display())));
            }
            println!("{} is valid", file.display());
        }
    }

    Ok(())
}
