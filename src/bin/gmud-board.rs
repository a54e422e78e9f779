//! `gmud-board` -- terminal view of the GMUD board.
//!
//! # Environment variables
//!
//! | Variable                    | Required | Default                 |
//! |-----------------------------|----------|-------------------------|
//! | `GMUD_API_URL`              | no       | `http://localhost:3000` |
//! | `GMUD_REQUEST_TIMEOUT_SECS` | no       | `30`                    |
//! | `GMUD_SNAPSHOT_PATH`        | no       | --                      |
//! | `GMUD_TOKEN`                | one of   | --                      |
//! | `GMUD_USERNAME` + `GMUD_PASSWORD` | one of | --                |

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gmud_board_core::{
    AuthClient, BoardController, CardId, CardSource, ClientConfig, Credentials, DropOutcome,
    ExecutionTeam, RestStorage, Session, SnapshotStore, SyncCoordinator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gmud-board")]
#[command(about = "Inspect and move GMUD change-request cards")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(flatten)]
    auth: AuthOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct AuthOptions {
    /// Bearer token from a previous login
    #[arg(long, env = "GMUD_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "GMUD_USERNAME", global = true)]
    username: Option<String>,

    #[arg(long, env = "GMUD_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Print every column with its cards
    Show {
        /// Only cards with at least one of these approvers (full names)
        #[arg(long = "approver")]
        approvers: Vec<String>,

        /// Only these teams in the pending-execution column (case-insensitive)
        #[arg(long = "team")]
        teams: Vec<String>,
    },
    /// Move a card onto a column id or onto another card
    Move { card_id: String, target: String },
    /// List approvers
    Approvers,
}

async fn open_session(config: &ClientConfig, auth: &AuthOptions) -> Result<Session> {
    let client = AuthClient::from_config(config)?;
    if let Some(token) = &auth.token {
        return client
            .restore(token.clone())
            .await
            .context("stored token was rejected");
    }
    match (&auth.username, &auth.password) {
        (Some(username), Some(password)) => client
            .login(&Credentials::new(username.clone(), password.clone()))
            .await
            .context("login failed"),
        _ => bail!("set GMUD_TOKEN, or GMUD_USERNAME and GMUD_PASSWORD"),
    }
}

fn parse_teams(raw: &[String]) -> Result<Vec<ExecutionTeam>> {
    raw.iter()
        .map(|name| match ExecutionTeam::parse_known(name) {
            Some(team) => Ok(team),
            None => {
                let known: Vec<String> =
                    ExecutionTeam::KNOWN.iter().map(|team| team.name().to_string()).collect();
                bail!("unknown team '{}', expected one of: {}", name, known.join(", "))
            }
        })
        .collect()
}

fn print_board(controller: &BoardController) {
    if controller.is_empty() {
        println!("No GMUDs on the board yet.");
        return;
    }

    for view in controller.columns() {
        println!("== {} ({}) ==", view.column.title, view.count());
        for card in view.cards {
            let mut flags = Vec::new();
            if card.is_overdue() {
                flags.push("OVERDUE");
            }
            if card.is_completed() {
                flags.push("DONE");
            }
            println!(
                "  [{}] {} | {} | forecast {} | {} {}",
                card.id,
                card.title,
                card.executor,
                card.execution_forecast_display(),
                card.approver_names().join(", "),
                flags.join(" "),
            );
        }
    }
    println!("Overdue: {}", controller.overdue_count());
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gmud_board_core=info,gmud_board=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    tracing::debug!(api_url = %config.api_url, "Loaded configuration");

    let session = open_session(&config, &cli.auth).await?;
    let storage = Arc::new(RestStorage::from_config(&config)?);

    let mut sync = SyncCoordinator::new(storage, session);
    if let Some(path) = &config.snapshot_path {
        sync = sync.with_snapshot(SnapshotStore::new(path));
    }
    let mut controller = BoardController::new(sync);

    if controller.load().await? == CardSource::Snapshot {
        tracing::warn!("Backend unreachable, showing the last saved snapshot");
    }

    match cli.command {
        Command::Show { approvers, teams } => {
            controller.set_approver_filter(approvers);
            controller.set_team_filter(parse_teams(&teams)?);
            print_board(&controller);
        }
        Command::Move { card_id, target } => {
            match controller.move_card(&CardId::new(card_id.clone()), &target).await? {
                DropOutcome::Moved(card) => println!("{} -> {}", card.id, card.status),
                DropOutcome::Ignored => println!("{} stays where it is", card_id),
            }
        }
        Command::Approvers => {
            for approver in controller.sync().approvers().approvers() {
                println!("{}\t{}", approver.id, approver.full_name());
            }
        }
    }

    Ok(())
}
