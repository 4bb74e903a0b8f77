//! teamup-admin - send team messages and publish teams from the command line
//!
//! Drives the same form controllers the admin dialogs use, on a single
//! event loop: requests run as tasks, completions come back over a channel,
//! and the dismiss timer is polled between events.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use teamup_admin::config::AdminConfig;
use teamup_admin::error::SubmitBlocked;
use teamup_admin::rpc::{dispatch, AjaxClient, Completion, Outbound, RpcTransport};
use teamup_admin::state::{
    CompletionEffect, FormLifecycle, MessageComposer, MessageContext, NotifyTarget, StatusCard,
    Student, TeamId, TeamRef, TeamStatus,
};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timer polling interval of the event loop
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(author, version, about = "Team messaging and publishing for the teamup plugin")]
struct Cli {
    /// Base URL of the LMS site (overrides config and TEAMUP_SITE_URL)
    #[arg(long, global = true)]
    site_url: Option<String>,

    /// Session key (overrides config and TEAMUP_SESSKEY)
    #[arg(long, global = true)]
    sesskey: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message to one team's students or to selected teams
    Message(MessageArgs),
    /// Publish a saved team
    Publish { team: String },
    /// Return a live team to planning
    Unpublish { team: String },
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Message the students of this team (requires --roster)
    #[arg(long, requires = "roster", conflicts_with = "select")]
    team: Option<String>,

    /// JSON roster file: [{"un": .., "fn": .., "ln": ..}]
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Leave a student out of a fixed-team message
    #[arg(long = "exclude", value_name = "USERNAME")]
    exclude: Vec<String>,

    /// Target team as ID:NAME (repeatable)
    #[arg(long = "select", value_name = "ID:NAME", value_parser = parse_team_ref)]
    select: Vec<TeamRef>,

    #[arg(long)]
    subject: String,

    #[arg(long)]
    body: String,

    /// students, parents or teamstaff (repeatable; default students)
    #[arg(long = "notify")]
    notify: Vec<NotifyTarget>,
}

fn parse_team_ref(raw: &str) -> Result<TeamRef, String> {
    let (id, name) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected ID:NAME, got '{raw}'"))?;
    if id.is_empty() {
        return Err("team id must not be empty".to_string());
    }
    Ok(TeamRef::new(TeamId::from(id), name))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamup_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AdminConfig::load()?
        .with_env_overrides()
        .with_overrides(cli.site_url, cli.sesskey);

    let transport: Arc<dyn RpcTransport> = Arc::new(AjaxClient::new(
        config.site_url()?,
        config.sesskey()?,
        config.request_timeout(),
    )?);

    match cli.command {
        Commands::Message(args) => send_message(transport, &config, args).await,
        Commands::Publish { team } => change_status(transport, &config, team, true).await,
        Commands::Unpublish { team } => change_status(transport, &config, team, false).await,
    }
}

async fn send_message(
    transport: Arc<dyn RpcTransport>,
    config: &AdminConfig,
    args: MessageArgs,
) -> Result<()> {
    let roster = match &args.roster {
        Some(path) => load_roster(path)?,
        None => Vec::new(),
    };
    let context = match args.team {
        Some(id) => MessageContext::FixedTeam(TeamId::from(id)),
        None => MessageContext::FreeSelection,
    };

    let mut composer = MessageComposer::new(context, roster, config.message_dismiss_delay());
    composer.open();
    for username in &args.exclude {
        if !composer.remove_recipient(username) {
            tracing::warn!(username = %username, "not on the roster, nothing to exclude");
        }
    }
    for team in args.select {
        composer.select_team(team)?;
    }
    composer.set_subject(args.subject);
    composer.set_message(args.body);
    if !args.notify.is_empty() {
        composer.set_notify(args.notify);
    }

    let outbound = match composer.submit() {
        Ok(outbound) => outbound,
        Err(SubmitBlocked::Invalid) => {
            for (field, messages) in composer.errors().iter() {
                eprintln!("{field}: {}", messages.join(" "));
            }
            bail!(composer
                .form_error_banner()
                .unwrap_or("Correct form errors and try again."));
        }
        Err(e) => return Err(e.into()),
    };

    drive(&mut composer, transport, outbound).await?;
    if let Some(text) = composer.success_message() {
        println!("{text}");
    }
    println!("Notified: {}", notified_labels(&composer.draft().notify));
    // The success panel stays until the dialog auto-closes
    wait_for_dismiss(&mut composer).await;
    Ok(())
}

async fn change_status(
    transport: Arc<dyn RpcTransport>,
    config: &AdminConfig,
    team: String,
    publish: bool,
) -> Result<()> {
    // The server is authoritative; assume the team is in the state the
    // requested transition starts from.
    let current = if publish {
        TeamStatus::Saved
    } else {
        TeamStatus::Live
    };
    let mut card = StatusCard::new(
        Some(TeamId::from(team)),
        current,
        config.status_dismiss_delay(),
    );
    card.mark_form_loaded();
    card.mark_students_loaded();

    let outbound = if publish {
        card.publish()?
    } else {
        card.return_to_planning()?
    };

    drive(&mut card, transport, outbound).await?;
    println!("{}", card.headline());
    Ok(())
}

/// Run one request to completion on the event loop
async fn drive<F: FormLifecycle>(
    form: &mut F,
    transport: Arc<dyn RpcTransport>,
    outbound: Outbound,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Completion>(1);
    tokio::spawn(async move {
        let completion = dispatch(transport.as_ref(), outbound).await;
        if tx.send(completion).await.is_err() {
            tracing::debug!("event loop gone, dropping completion");
        }
    });

    loop {
        tokio::select! {
            completion = rx.recv() => {
                let completion =
                    completion.ok_or_else(|| anyhow!("request task ended without a response"))?;
                return match form.on_completion(completion, Instant::now()) {
                    CompletionEffect::Succeeded => Ok(()),
                    CompletionEffect::Failed(detail) => Err(anyhow!(detail)),
                    CompletionEffect::Stale => {
                        Err(anyhow!("response arrived for an outdated request"))
                    }
                };
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                form.poll(Instant::now());
            }
        }
    }
}

async fn wait_for_dismiss<F: FormLifecycle>(form: &mut F) {
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        if let Some(action) = form.poll(Instant::now()) {
            tracing::debug!(?action, "dismissed");
            return;
        }
    }
}

fn notified_labels(targets: &[NotifyTarget]) -> String {
    targets
        .iter()
        .map(|target| target.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn load_roster(path: &Path) -> Result<Vec<Student>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading roster {}", path.display()))?;
    let roster = serde_json::from_str(&content)
        .with_context(|| format!("parsing roster {}", path.display()))?;
    Ok(roster)
}
