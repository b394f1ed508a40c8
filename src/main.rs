use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use approvals_desk::cache::QueryCache;
use approvals_desk::config;
use approvals_desk::model::{Notification, RelatedItem, Role, RoleScope};
use approvals_desk::mutation::MarkRead;
use approvals_desk::panel::{ApproveOutcome, NotificationPanel};
use approvals_desk::poller::spawn_poller;
use approvals_desk::query::NotificationQueries;
use approvals_desk::store::{NotificationStore, RestStore};

#[derive(Debug, Parser)]
#[command(author, version, about = "Order and price-list approval notifications")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, ClapArgs)]
struct ScopeArgs {
    /// admin, supplier or customer
    #[arg(long, default_value = "admin")]
    role: Role,

    /// Supplier or customer id the view is scoped to
    #[arg(long)]
    recipient: Option<String>,
}

impl ScopeArgs {
    fn scope(&self) -> Result<RoleScope> {
        RoleScope::new(self.role, self.recipient.clone())
            .ok_or_else(|| anyhow!("--recipient is required for role {}", self.role))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the current notifications for a role
    List(ScopeArgs),
    /// Poll a role's notifications and log changes until Ctrl-C
    Watch(ScopeArgs),
    /// Mark one notification read
    MarkRead { id: String },
    /// Approve a pending notification as admin
    Approve { id: String },
    /// Mark a notification read and print the item it points to
    View {
        id: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print an example config file
    PrintConfigExample,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::PrintConfigExample = args.command {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let store = Arc::new(RestStore::from_config(&cfg).context("failed to build backend client")?);
    let cache = Arc::new(QueryCache::new(cfg.app.stale_after()));
    let queries = NotificationQueries::new(store.clone(), cache.clone());
    let mark_read = MarkRead::new(store.clone(), cache);
    let panel_for = |scope: RoleScope| {
        NotificationPanel::new(scope, queries.clone(), mark_read.clone(), store.clone())
    };

    match args.command {
        Command::List(scope) => {
            let panel = panel_for(scope.scope()?);
            let list = panel.list().await.context("failed to fetch notifications")?;
            print_list(&list);
        }
        Command::Watch(scope) => {
            let scope = scope.scope()?;
            info!(role = %scope.role(), every = ?cfg.app.poll_interval(), "watching notifications");
            let handle = spawn_poller(queries.clone(), scope, cfg.app.poll_interval());
            let mut rx = handle.subscribe();
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let latest = rx.borrow_and_update().clone();
                        if let Some(list) = latest {
                            print_list(&list);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("stopping");
                        break;
                    }
                }
            }
            handle.stop();
        }
        Command::MarkRead { id } => {
            if let Err(err) = mark_read.execute(&id).await {
                error!(?err, %id, "mark read failed");
                return Err(err).context("could not mark notification read");
            }
            println!("marked {id} read");
        }
        Command::Approve { id } => {
            let n = find_unread(store.as_ref(), &id).await?;
            let panel = panel_for(RoleScope::Admin);
            match panel.approve(&n).await {
                Ok(ApproveOutcome::Approved) => {
                    println!("approved {} {}", n.kind.item_kind(), n.related_item_id)
                }
                Ok(ApproveOutcome::InFlight) => println!("approval for {id} already in progress"),
                Err(err) => {
                    error!(?err, %id, "approve failed");
                    return Err(err).context("could not approve");
                }
            }
        }
        Command::View { id, scope } => {
            let n = find_unread(store.as_ref(), &id).await?;
            let panel = panel_for(scope.scope()?);
            panel
                .view(&n, &|item: RelatedItem| {
                    println!("open {} {}", item.kind, item.id)
                })
                .await
                .context("could not open notification")?;
        }
        Command::PrintConfigExample => {}
    }

    Ok(())
}

async fn find_unread(store: &dyn NotificationStore, id: &str) -> Result<Notification> {
    store
        .fetch_unread()
        .await
        .context("failed to fetch notifications")?
        .into_iter()
        .find(|n| n.id == id)
        .ok_or_else(|| anyhow!("no unread notification with id {id}"))
}

fn print_list(list: &[Notification]) {
    if list.is_empty() {
        println!("no notifications");
        return;
    }
    for n in list {
        let p = n.kind.presentation();
        println!(
            "{}  [{}] {}  {} ({}, {})",
            n.id,
            p.icon,
            p.label,
            n.message,
            n.created_by_name,
            n.created_at.to_rfc3339()
        );
    }
}
