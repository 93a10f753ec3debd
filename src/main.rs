//! Tally main entry point

mod render;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_client::HttpGateway;
use tally_config::Config;
use tally_core::{
    BatchEntry, Category, CoreError, DraftField, SortDirection, SortField, TransactionId,
    TransactionListController, TransactionPatch,
};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version = "0.1.0")]
#[command(about = "Browse and record transactions on a personal-finance server", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "tally.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of transactions
    List(ListArgs),
    /// Save one or more transactions
    Add {
        /// Row as "date,category,description,amount[,recurring]"; repeatable.
        /// The description may contain commas; recurring is true/false/yes/no.
        #[arg(short, long = "row", required = true)]
        rows: Vec<String>,
    },
    /// Change fields of an existing transaction
    Update {
        id: TransactionId,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        recurring: Option<bool>,
    },
    /// Delete a transaction
    Delete { id: TransactionId },
    /// Fetch the monthly analysis report
    Analysis {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Free-text search over descriptions
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    /// Earliest date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Latest date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    min: Option<Decimal>,
    #[arg(long)]
    max: Option<Decimal>,
    /// Sort column: date or amount
    #[arg(long, default_value = "date")]
    sort: SortField,
    /// Sort direction: asc or desc
    #[arg(long, default_value = "desc")]
    direction: SortDirection,
    #[arg(short, long, default_value_t = 1)]
    page: u64,
    /// Print the view as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::InitConfig { force } = &args.command {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        return init_config(&args.config, *force);
    }

    let config = match Config::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            for suggestion in e.suggestions() {
                eprintln!("  - {}", suggestion);
            }
            return Err(e).with_context(|| {
                format!("Failed to load configuration from {}", args.config.display())
            });
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::debug!("Using API at {}", config.api.base_url);

    let gateway = Arc::new(HttpGateway::from_config(&config));

    match args.command {
        Command::List(list) => run_list(&config, gateway, list).await,
        Command::Add { rows } => run_add(&config, gateway, &rows).await,
        Command::Update {
            id,
            date,
            category,
            description,
            amount,
            recurring,
        } => {
            let patch = TransactionPatch {
                date,
                category,
                description,
                amount,
                is_recurring: recurring,
            };
            run_update(&config, gateway, id, patch).await
        }
        Command::Delete { id } => {
            let controller = session(&config, gateway).await?;
            controller
                .delete(id)
                .await
                .with_context(|| format!("Failed to delete transaction {}", id))?;
            println!("Deleted transaction {}", id);
            Ok(())
        }
        Command::Analysis { year, month } => {
            require_session(&config)?;
            match gateway.analysis(year, month).await {
                Ok(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(())
                }
                Err(e) => bail!("{}", e.user_message()),
            }
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    std::fs::write(path, Config::generate_default())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Fail with login instructions unless a token is configured
fn require_session(config: &Config) -> anyhow::Result<()> {
    if !config.is_authenticated() {
        bail!("{}", CoreError::NotAuthenticated.to_details());
    }
    Ok(())
}

/// Logged-in controller; requires a configured token
async fn session(config: &Config, gateway: Arc<HttpGateway>) -> anyhow::Result<TransactionListController> {
    require_session(config)?;
    let controller = TransactionListController::new(gateway, config.pagination.page_size);
    controller.set_authenticated(true).await;
    Ok(controller)
}

async fn run_list(config: &Config, gateway: Arc<HttpGateway>, args: ListArgs) -> anyhow::Result<()> {
    require_session(config)?;
    let controller = TransactionListController::new(gateway, config.pagination.page_size);

    // Filters are applied while logged out so only one fetch goes out
    if let Some(search) = &args.search {
        controller.set_search_input(search).await;
        controller.commit_search().await;
    }
    controller.set_category(args.category).await;
    controller.set_date_range(args.from, args.to).await;
    controller.set_amount_range(args.min, args.max).await;
    if args.sort != SortField::default() {
        controller.toggle_sort(args.sort).await;
    }
    if args.direction != SortDirection::Descending {
        controller.toggle_sort(args.sort).await;
    }

    controller.set_authenticated(config.is_authenticated()).await;

    if args.page > 1 && !controller.go_to_page(args.page).await {
        let total = controller.view().await.page.total_pages;
        log::warn!("Page {} is out of range (1..={}), showing page 1", args.page, total);
    }

    let view = controller.view().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render::list_view(&view, &config.currency));
    }

    if let Some(error) = view.error {
        bail!(error);
    }
    Ok(())
}

const ROW_FIELDS: [DraftField; 5] = [
    DraftField::Date,
    DraftField::Category,
    DraftField::Description,
    DraftField::Amount,
    DraftField::IsRecurring,
];

fn is_recurring_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "false" | "yes" | "no"
    )
}

/// Split a "date,category,description,amount[,recurring]" row.
///
/// Date and category are taken from the left, amount and the optional
/// recurring flag from the right; everything between is the description.
fn split_row(row: &str) -> Option<[&str; 5]> {
    let mut head = row.splitn(3, ',');
    let date = head.next()?;
    let category = head.next()?;
    let rest = head.next()?;

    let (rest, recurring) = match rest.rsplit_once(',') {
        Some((before, last)) if is_recurring_flag(last) => (before, last),
        _ => (rest, "false"),
    };
    let (description, amount) = rest.rsplit_once(',')?;

    Some([
        date.trim(),
        category.trim(),
        description.trim(),
        amount.trim(),
        recurring.trim(),
    ])
}

fn parse_row(entry: &mut BatchEntry, index: usize, row: &str) -> anyhow::Result<()> {
    let Some(values) = split_row(row) else {
        bail!(
            "Row {} must look like date,category,description,amount[,recurring]",
            index + 1
        );
    };
    for (field, value) in ROW_FIELDS.iter().zip(values) {
        entry.update_field(index, *field, value)?;
    }
    Ok(())
}

async fn run_add(config: &Config, gateway: Arc<HttpGateway>, rows: &[String]) -> anyhow::Result<()> {
    require_session(config)?;
    let mut entry = BatchEntry::new(config.success_ack());
    for (index, row) in rows.iter().enumerate() {
        if index > 0 {
            entry.add_row();
        }
        parse_row(&mut entry, index, row)?;
    }

    let result = entry.submit(gateway.as_ref()).await;

    let status = render::batch_status(&entry);
    if !status.is_empty() {
        println!("{}", status);
    }
    if let Err(e) = result {
        if let Some(fields) = e.field_errors() {
            println!("{}", fields.flatten());
        }
        bail!(e);
    }

    let controller = session(config, gateway).await?;
    entry.acknowledge().await;
    println!("{}", controller.view().await.range_label());
    Ok(())
}

async fn run_update(
    config: &Config,
    gateway: Arc<HttpGateway>,
    id: TransactionId,
    patch: TransactionPatch,
) -> anyhow::Result<()> {
    if patch.is_empty() {
        bail!("Nothing to update; pass at least one field");
    }

    let controller = session(config, gateway).await?;
    match controller.update(id, &patch).await {
        Ok(tx) => {
            println!("Updated transaction {}: {}", tx.id, tx.display_description());
            Ok(())
        }
        Err(e) => {
            let message = controller
                .view()
                .await
                .mutation_error
                .map(|failure| failure.display_message())
                .unwrap_or_else(|| e.to_string());
            bail!("Failed to update transaction {}: {}", id, message)
        }
    }
}
