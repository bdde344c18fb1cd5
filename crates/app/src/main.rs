//! Batua command line client.
//!
//! A thin presentation layer over the wallet engine: it loads settings,
//! picks the record store, runs caller-side validation against the
//! configured limits, and invokes one lifecycle operation per run. For
//! operations with a deferred resolution it waits out the delay so the
//! final status can be shown.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use engine::{
    HistoryFilter, HistoryView, HttpStore, MemoryStore, Money, RecordStore, Transaction,
    TransactionKind, TransactionStatus, Wallet,
};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "batua")]
#[command(about = "Personal wallet demo: balance, deposits, transfers, history")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current user and balance.
    Balance,
    /// List all users.
    Users,
    /// Add money to the current user's wallet.
    Deposit(DepositArgs),
    /// Transfer money to another user (a percentage fee applies).
    Transfer(TransferArgs),
    /// Browse the transaction history.
    History(HistoryArgs),
    /// Hide a transaction from history (soft delete).
    Delete(IdArgs),
    /// Retry a failed transaction.
    Retry(IdArgs),
}

#[derive(Args, Debug)]
struct DepositArgs {
    /// Amount in rupees, e.g. "1000" or "10.50".
    amount: String,
}

#[derive(Args, Debug)]
struct TransferArgs {
    /// Recipient user id.
    recipient: String,
    /// Amount in rupees; the fee is added on top.
    amount: String,
}

#[derive(Args, Debug)]
struct IdArgs {
    /// Transaction id.
    id: String,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// Filter by status (pending, success, failed).
    #[arg(long)]
    status: Option<String>,
    /// Filter by type (credit, debit, fee).
    #[arg(long = "type")]
    kind: Option<String>,
    /// Start date (YYYY-MM-DD, local calendar day).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// End date (YYYY-MM-DD, local calendar day).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Page to show (1-based).
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "batua={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let config = settings.wallet.into_config();
    let store: Arc<dyn RecordStore> = match &settings.store.url {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(config.network_timeout)
                .build()?;
            Arc::new(HttpStore::new(client, url.clone()))
        }
        None => {
            tracing::info!("no store url configured, using the seeded demo store");
            Arc::new(MemoryStore::seeded())
        }
    };

    let wallet = Wallet::builder()
        .shared_store(store)
        .config(config)
        .build();
    wallet.load().await;
    if let Some(err) = wallet.error() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    match cli.command {
        Command::Balance => show_balance(&wallet),
        Command::Users => show_users(&wallet),
        Command::Deposit(args) => deposit(&wallet, &args).await?,
        Command::Transfer(args) => transfer(&wallet, &args).await?,
        Command::History(args) => show_history(&wallet, &args)?,
        Command::Delete(args) => {
            let outcome = wallet.delete_transaction(&args.id).await;
            println!("{}", outcome.message);
        }
        Command::Retry(args) => retry(&wallet, &args).await,
    }

    Ok(())
}

fn show_balance(wallet: &Wallet) {
    match wallet.current_user() {
        Some(user) => {
            println!("{}: {}", user.name, wallet.balance());
            let pending = wallet.pending_count();
            if pending > 0 {
                println!("{pending} pending transaction(s)");
            }
        }
        None => println!("No user loaded"),
    }
}

fn show_users(wallet: &Wallet) {
    let current = wallet.current_user();
    for user in wallet.users() {
        let marker = if current.as_ref().is_some_and(|c| c.id == user.id) {
            " (current)"
        } else {
            ""
        };
        println!("{}  {}  {}{marker}", user.id, user.name, user.balance);
    }
}

async fn deposit(wallet: &Wallet, args: &DepositArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let amount: Money = args.amount.parse()?;
    if let Err(err) = wallet.config().validate_deposit_amount(amount) {
        println!("{err}");
        return Ok(());
    }

    let outcome = wallet.deposit(amount).await;
    println!("{}", outcome.message);
    if !outcome.success {
        return Ok(());
    }
    println!("Balance: {}", wallet.balance());

    wait_for_resolution(wallet.config().deposit_resolve_delay).await;
    if let Some(tx) = wallet.recent_transactions(1).into_iter().next() {
        println!("Transaction {}: {}", tx.id, tx.status.as_str());
    }
    Ok(())
}

async fn transfer(
    wallet: &Wallet,
    args: &TransferArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let amount: Money = args.amount.parse()?;
    if let Err(err) = wallet
        .config()
        .validate_transfer_amount(amount, wallet.balance())
    {
        println!("{err}");
        return Ok(());
    }

    let fee = wallet.config().calculate_fee(amount);
    let outcome = wallet.transfer(&args.recipient, amount, fee).await;
    println!("{}", outcome.message);
    if !outcome.success {
        return Ok(());
    }
    println!("Amount: {amount}, fee: {fee}. Balance: {}", wallet.balance());

    if outcome.is_pending {
        wait_for_resolution(wallet.config().transfer_resolve_delay).await;
        for tx in wallet.recent_transactions(2).into_iter().rev() {
            print_transaction(&tx);
        }
        println!("Balance: {}", wallet.balance());
    }
    Ok(())
}

async fn retry(wallet: &Wallet, args: &IdArgs) {
    let outcome = wallet.retry_transaction(&args.id).await;
    println!("{}", outcome.message);
    if !outcome.success {
        return;
    }

    wait_for_resolution(wallet.config().retry_resolve_delay).await;
    if let Some(tx) = wallet
        .transactions()
        .into_iter()
        .find(|t| t.id == args.id)
    {
        println!("Transaction {}: {}", tx.id, tx.status.as_str());
    }
}

fn show_history(wallet: &Wallet, args: &HistoryArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = HistoryFilter {
        status: parse_dimension(args.status.as_deref(), |s| TransactionStatus::try_from(s))?,
        kind: parse_dimension(args.kind.as_deref(), |s| TransactionKind::try_from(s))?,
        from: args.from,
        to: args.to,
    };

    let mut view = HistoryView::new(wallet.config().items_per_page);
    view.set_filter(filter);
    view.set_page(args.page);

    let page = wallet.history_page(&view);
    if page.total_items == 0 {
        println!("No transactions found");
        return Ok(());
    }
    for tx in &page.items {
        print_transaction(tx);
    }
    println!(
        "Page {} of {} ({} transactions)",
        page.page, page.total_pages, page.total_items
    );
    Ok(())
}

/// `"all"` (or omission) means no constraint on that dimension.
fn parse_dimension<T, E>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<Option<T>, E> {
    match value {
        None | Some("all") => Ok(None),
        Some(other) => parse(other).map(Some),
    }
}

fn print_transaction(tx: &Transaction) {
    let time = tx.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let mut line = format!(
        "{}  {time}  {:<6}  {:>12}  {:<7}  {} ({})",
        tx.id,
        tx.kind.as_str(),
        tx.amount.to_string(),
        tx.status.as_str(),
        tx.description,
        tx.recipient,
    );
    if let Some(reason) = &tx.reason {
        line.push_str(&format!(" - {reason}"));
    }
    println!("{line}");
}

/// Sleeps past the configured resolution delay so the deferred task has
/// landed before we read the final status.
async fn wait_for_resolution(delay: Duration) {
    tokio::time::sleep(delay + Duration::from_millis(250)).await;
}
