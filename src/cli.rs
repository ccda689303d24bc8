//! CLI commands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::autopost::Supervisor;
use crate::config::{self, Config};
use crate::gateway::DiscordGateway;
use crate::store::{AccountsStore, SubscriptionsStore};
use crate::{admin, auth, logging, setups, subscription};

#[derive(Parser)]
#[command(name = "autoposter", about = "autoposter — scheduled message posting daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory.
    Onboard,

    /// Run the daemon: rehydrate running setups and keep posting.
    Start,

    /// Login with a user token and a subscription id.
    Login {
        #[arg(long)]
        user: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        subscription: String,
    },

    /// Logout: drop token and subscription reference.
    Logout {
        #[arg(long)]
        user: String,
    },

    /// Manage posting setups.
    Setup {
        #[command(subcommand)]
        action: SetupAction,
    },

    /// Manage subscriptions (admin-side bookkeeping).
    Sub {
        #[command(subcommand)]
        action: SubAction,
    },

    /// Manage admin records.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SetupAction {
    /// Create a setup with defaults.
    Add {
        #[arg(long)]
        user: String,
        name: String,
    },
    /// Replace channel, message and intervals of a setup.
    Edit {
        #[arg(long)]
        user: String,
        name: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        message: String,
        /// Base interval in minutes.
        #[arg(long)]
        interval: f64,
        /// Upper bound of extra random delay, minutes.
        #[arg(long, default_value_t = 0.0)]
        random_interval: f64,
    },
    /// Delete a setup.
    Remove {
        #[arg(long)]
        user: String,
        name: String,
    },
    /// List setups of an account.
    List {
        #[arg(long)]
        user: String,
    },
    /// Mark a setup running and spawn its loop.
    Start {
        #[arg(long)]
        user: String,
        name: String,
    },
    /// Request a setup to stop at its next cycle boundary.
    Stop {
        #[arg(long)]
        user: String,
        name: String,
    },
    /// Start every setup of an account.
    StartAll {
        #[arg(long)]
        user: String,
    },
    /// Stop every setup of an account.
    StopAll {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
enum SubAction {
    /// Create a subscription and print its id.
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        package: String,
    },
    /// Show available packages.
    Packages,
    /// Show one subscription.
    Info { id: String },
    /// Extend a subscription by N days.
    Extend {
        id: String,
        #[arg(long)]
        days: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Add an admin record.
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
    },
    /// Check an admin password.
    Verify {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
    },
}

struct App {
    accounts: AccountsStore,
    subscriptions: SubscriptionsStore,
    gateway: Arc<DiscordGateway>,
}

impl App {
    fn new(cfg: &Config) -> Self {
        Self {
            accounts: AccountsStore::new(config::accounts_path(cfg)),
            subscriptions: SubscriptionsStore::new(config::subscriptions_path(cfg)),
            gateway: Arc::new(DiscordGateway::new(&cfg.sender)),
        }
    }

    fn supervisor(&self) -> Supervisor {
        Supervisor::new(self.accounts.clone(), self.gateway.clone())
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    // The daemon logs to file + stdout; one-shot commands keep it simple.
    match &cli.command {
        Commands::Start => logging::init_logging(&cfg)?,
        _ => logging::init_simple_logging(),
    }

    let app = App::new(&cfg);

    match cli.command {
        Commands::Onboard => cmd_onboard(&cfg),
        Commands::Start => cmd_start(&app).await,
        Commands::Login {
            user,
            token,
            subscription,
        } => {
            auth::login(
                &app.accounts,
                &app.subscriptions,
                app.gateway.as_ref(),
                &user,
                &token,
                &subscription,
            )
            .await?;
            println!("Login successful for {user}");
            Ok(())
        }
        Commands::Logout { user } => {
            auth::logout(&app.accounts, &user).await?;
            println!("Logged out {user}");
            Ok(())
        }
        Commands::Setup { action } => cmd_setup(&app, action).await,
        Commands::Sub { action } => cmd_sub(&app, action).await,
        Commands::Admin { action } => cmd_admin(&app, action).await,
    }
}

// ---------------------------------------------------------------------------
// onboard / start
// ---------------------------------------------------------------------------

fn cmd_onboard(cfg: &Config) -> Result<()> {
    let cfg_path = config::config_path();
    if cfg_path.exists() {
        println!("Config already exists at {}", cfg_path.display());
        println!("Delete it first if you want to re-initialize.");
        return Ok(());
    }

    config::save_config(cfg, None)?;
    println!("Created config at {}", cfg_path.display());

    let data_dir = config::data_dir_path(cfg);
    std::fs::create_dir_all(&data_dir)?;
    println!("Created data directory at {}", data_dir.display());

    println!("\nNext steps:");
    println!("  1. autoposter sub create --user <id> --package monthly");
    println!("  2. autoposter login --user <id> --token <token> --subscription <id>");
    println!("  3. autoposter setup add --user <id> <name>");
    Ok(())
}

async fn cmd_start(app: &App) -> Result<()> {
    let supervisor = app.supervisor();
    let started = supervisor.rehydrate().await?;
    info!(started, "daemon running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    let remaining = supervisor.running_keys().await;
    info!(loops = remaining.len(), "shutting down");
    Ok(())
}

// ---------------------------------------------------------------------------
// setups
// ---------------------------------------------------------------------------

async fn cmd_setup(app: &App, action: SetupAction) -> Result<()> {
    match action {
        SetupAction::Add { user, name } => {
            setups::create_setup(&app.accounts, &user, &name).await?;
            println!("Created setup '{name}'");
        }
        SetupAction::Edit {
            user,
            name,
            channel,
            message,
            interval,
            random_interval,
        } => {
            setups::edit_setup(
                &app.accounts,
                &user,
                &name,
                &channel,
                &message,
                interval,
                random_interval,
            )
            .await?;
            println!("Updated setup '{name}'");
        }
        SetupAction::Remove { user, name } => {
            setups::delete_setup(&app.accounts, &user, &name).await?;
            println!("Deleted setup '{name}'");
        }
        SetupAction::List { user } => {
            let list = setups::list_setups(&app.accounts, &user).await?;
            if list.is_empty() {
                println!("No setups.");
            }
            for (name, setup) in list {
                let status = if setup.running { "running" } else { "stopped" };
                println!(
                    "{name}: {status}, channel={}, every {} min (+0..{} min)",
                    if setup.channel.is_empty() {
                        "<unset>"
                    } else {
                        setup.channel.as_str()
                    },
                    setup.interval,
                    setup.random_interval,
                );
            }
        }
        SetupAction::Start { user, name } => {
            app.supervisor().start(&user, &name).await?;
            println!("Setup '{name}' started");
        }
        SetupAction::Stop { user, name } => {
            app.supervisor().stop(&user, &name).await?;
            println!("Setup '{name}' will stop at its next cycle");
        }
        SetupAction::StartAll { user } => {
            let n = app.supervisor().start_all(&user).await?;
            println!("Started {n} setups");
        }
        SetupAction::StopAll { user } => {
            let n = app.supervisor().stop_all(&user).await?;
            println!("Stopped {n} setups");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// subscriptions / admin
// ---------------------------------------------------------------------------

async fn cmd_sub(app: &App, action: SubAction) -> Result<()> {
    match action {
        SubAction::Create { user, package } => {
            let id = subscription::create_subscription(&app.subscriptions, &user, &package).await?;
            println!("Subscription created: {id}");
        }
        SubAction::Packages => {
            for pkg in subscription::PACKAGES {
                println!("{}: {} ({} days)", pkg.id, pkg.name, pkg.days);
            }
        }
        SubAction::Info { id } => match subscription::get_subscription(&app.subscriptions, &id).await? {
            Some(sub) => {
                let status = if sub.active { "active" } else { "inactive" };
                println!(
                    "{id}: {} for {}, {status}, until {}",
                    sub.package_type,
                    sub.discord_user_id.as_deref().unwrap_or("<unbound>"),
                    sub.end_date.format("%Y-%m-%d"),
                );
            }
            None => println!("Subscription {id} not found"),
        },
        SubAction::Extend { id, days } => {
            subscription::extend_subscription(&app.subscriptions, &id, days).await?;
            println!("Extended {id} by {days} days");
        }
    }
    Ok(())
}

async fn cmd_admin(app: &App, action: AdminAction) -> Result<()> {
    match action {
        AdminAction::Add { user, password } => {
            admin::add_admin(&app.accounts, &user, &password).await?;
            println!("Admin {user} added");
        }
        AdminAction::Verify { user, password } => {
            if admin::verify_admin(&app.accounts, &user, &password).await? {
                println!("Password OK");
            } else {
                println!("Password rejected");
            }
        }
    }
    Ok(())
}
