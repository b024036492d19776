//! confess - ConfessWorld command-line client
//!
//! Browses, submits, likes, and watches anonymous confessions against the
//! hosted service or a local SQLite store, and offers the admin list and
//! delete commands.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use confess_common::config::{load_config, Backend, TomlConfig};
use confess_common::session::SessionFlag;
use confess_common::VerificationCodes;
use confess_client::detail::{lookup, spawn_view_increment};
use confess_client::sync::MergeOutcome;
use confess_client::{
    render, AdminConsole, ConfessionForm, ConfessionGateway, DeleteOutcome, DetailOutcome,
    HttpGateway, LikeController, LikeState, ListSynchronizer, SharePayload, SqliteGateway,
    ToggleOutcome,
};
use tracing::{debug, info};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "confess", version, about = "Anonymous confessions, from the terminal")]
struct Args {
    /// Configuration file (overrides CONFESS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend (overrides the configuration file)
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List approved confessions, newest first
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one confession by its permalink slug
    Show { slug: String },
    /// Submit a new confession
    Submit {
        /// Recipient name, optionally prefixed with `{CODE}`
        #[arg(long)]
        to: String,
        #[arg(long)]
        message: String,
        /// Spotify track link
        #[arg(long)]
        song: Option<String>,
    },
    /// Toggle the like on a confession
    Like { id: Uuid },
    /// Follow new confessions as they arrive
    Watch {
        #[arg(long)]
        search: Option<String>,
    },
    /// Moderation commands
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    /// Preview how a recipient name is verified
    CheckCode { name: String },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// List every confession, including unapproved ones
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Permanently delete a confession
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn parse_backend(s: &str) -> std::result::Result<Backend, String> {
    s.parse().map_err(|e: confess_common::Error| e.to_string())
}

/// Filter with `level` as the default directive; RUST_LOG still applies
fn log_filter(level: &str) -> Result<EnvFilter> {
    let directive: Directive = level
        .parse()
        .with_context(|| format!("Invalid logging.level '{}'", level))?;
    Ok(EnvFilter::from_default_env().add_directive(directive))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Installed before configuration loads so its messages are kept
    let (filter, filter_handle) = reload::Layer::new(log_filter("info")?);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(backend) = args.backend {
        config.backend = backend;
    }

    filter_handle
        .reload(log_filter(&config.logging.level)?)
        .context("Failed to apply logging.level")?;

    debug!(
        "Starting confess v{} (backend: {})",
        env!("CARGO_PKG_VERSION"),
        config.backend
    );

    match config.backend {
        Backend::Http => {
            let gateway = HttpGateway::new(&config.remote).context("Remote backend unavailable")?;
            run(Arc::new(gateway), args.command, &config).await
        }
        Backend::Sqlite => {
            let path = config.sqlite.database_path();
            info!("Database path: {}", path.display());
            let gateway = SqliteGateway::open(&path)
                .await
                .with_context(|| format!("Failed to open database {}", path.display()))?
                .with_poll_interval(config.sqlite.poll_interval());
            run(Arc::new(gateway), args.command, &config).await
        }
    }
}

async fn run<G: ConfessionGateway>(gateway: Arc<G>, command: Command, config: &TomlConfig) -> Result<()> {
    let codes = config.verification_codes();
    let session = SessionFlag::new();
    let site = config.site_url.as_str();

    match command {
        Command::List { search } => {
            if let Some(banner) = render::welcome_banner(&session) {
                println!("{}\n", banner);
            }
            let mut list = ListSynchronizer::new();
            list.load(gateway.as_ref()).await.context("Failed to load confessions")?;
            list.set_search(search.unwrap_or_default());
            print_list(&list, site);
        }

        Command::Show { slug } => match lookup(gateway.as_ref(), &slug).await? {
            DetailOutcome::Found(confession) => {
                let views = spawn_view_increment(&gateway, confession.id);
                println!("{}\n", render::card(&confession, &LikeState::seed(&confession), site));
                let share = SharePayload::for_confession(&confession, site);
                println!("{}\n{}", share.title, share.text);
                views.await.context("View counter task failed")?;
            }
            DetailOutcome::NotFound => {
                println!("Confession not found. It may have been removed.");
            }
        },

        Command::Submit { to, message, song } => {
            submit(gateway.as_ref(), &codes, to, message, song, site).await?;
        }

        Command::Like { id } => {
            let records = gateway.list_approved().await.context("Failed to load confessions")?;
            let Some(record) = records.into_iter().find(|c| c.id == id) else {
                bail!("Confession {} not found", id);
            };

            let likes = LikeController::new(Arc::clone(&gateway));
            match likes.toggle_like(&record).await.context("Like failed")? {
                ToggleOutcome::Confirmed(state) => {
                    println!("{}", render::card(&record, &state, site));
                }
                ToggleOutcome::Ignored | ToggleOutcome::Discarded => {}
            }
        }

        Command::Watch { search } => watch(gateway.as_ref(), search, site).await?,

        Command::Admin { command } => admin(gateway, command).await?,

        Command::CheckCode { name } => {
            println!("{}", render::verification(&codes.parse(&name)));
        }
    }

    Ok(())
}

async fn submit<G: ConfessionGateway>(
    gateway: &G,
    codes: &VerificationCodes,
    to: String,
    message: String,
    song: Option<String>,
    site: &str,
) -> Result<()> {
    let mut form = ConfessionForm::new(to, message, song.unwrap_or_default());
    println!("{}", render::verification(&form.verification_preview(codes)));

    let confession = form
        .submit(gateway, codes)
        .await
        .context("Failed to send confession")?;

    println!("Confession sent 💌");
    println!("{}", render::card(&confession, &LikeState::seed(&confession), site));
    Ok(())
}

async fn watch<G: ConfessionGateway>(gateway: &G, search: Option<String>, site: &str) -> Result<()> {
    // Subscribe first; overlap with the initial load merges away
    let mut feed = gateway.subscribe();

    let mut list = ListSynchronizer::new();
    list.load(gateway).await.context("Failed to load confessions")?;
    list.set_search(search.unwrap_or_default());
    print_list(&list, site);
    println!("\nWatching for new confessions (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            event = feed.recv() => {
                let Some(event) = event else {
                    info!("Change feed closed");
                    break;
                };
                let id = event.confession_id();
                if list.apply(event) == MergeOutcome::Inserted {
                    if let Some(confession) = list.visible().find(|c| c.id == id) {
                        println!("\n✨ New confession!");
                        println!("{}", render::card(confession, &LikeState::seed(confession), site));
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn admin<G: ConfessionGateway>(gateway: Arc<G>, command: AdminCommand) -> Result<()> {
    let mut console = AdminConsole::new(gateway);
    console.load().await.context("Failed to load confessions")?;

    match command {
        AdminCommand::List { search } => {
            console.set_search(search.unwrap_or_default());
            println!("{}\n", render::stats(&console.stats()));
            for confession in console.visible() {
                println!("{}\n", render::admin_row(confession));
            }
        }
        AdminCommand::Delete { id, yes } => {
            let outcome = console
                .delete(id, |held| yes || confirm_delete(id, held.map(|c| c.target_name.as_str())))
                .await
                .context("Failed to delete confession")?;
            match outcome {
                DeleteOutcome::Deleted => println!("Deleted {}", id),
                DeleteOutcome::Declined => println!("Cancelled"),
            }
        }
    }

    Ok(())
}

fn confirm_delete(id: Uuid, target_name: Option<&str>) -> bool {
    match target_name {
        Some(name) => print!("Delete the confession to {}? This cannot be undone. [y/N] ", name),
        None => print!("Delete confession {}? This cannot be undone. [y/N] ", id),
    }
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_list(list: &ListSynchronizer, site: &str) {
    if list.visible_len() == 0 {
        if list.search().trim().is_empty() {
            println!("No confessions yet. Be the first!");
        } else {
            println!("No confessions match \"{}\".", list.search());
        }
        return;
    }

    for confession in list.visible() {
        println!("{}\n", render::card(confession, &LikeState::seed(confession), site));
    }
}
