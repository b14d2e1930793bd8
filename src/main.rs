use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use circle_wallet::cli::{
    handle_approve, handle_audit, handle_config_command, handle_decline, handle_deposit,
    handle_family_command, handle_group_command, handle_member_command, handle_pay, handle_report,
    handle_transaction_command, AuditArgs, ConfigCommands, DepositArgs, FamilyCommands,
    GroupCommands, MemberCommands, PayArgs, ResolveArgs, TransactionCommands,
};
use circle_wallet::config::{CirclePaths, Settings};
use circle_wallet::storage::Storage;

#[derive(Parser)]
#[command(
    name = "circle",
    author = "Kaylee Beyene",
    version,
    about = "Shared prepaid wallet and weighted expense splitting for travelling groups",
    long_about = "Circle Wallet keeps one prepaid wallet per travelling group. Families \
                  deposit into it, payments are split across members by share ratio, \
                  and large payments wait for an admin's approval."
)]
struct Cli {
    /// Group name or ID (defaults to the only group)
    #[arg(short, long, global = true, env = "CIRCLE_WALLET_GROUP")]
    group: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and default settings
    Init,

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Group management commands
    #[command(subcommand)]
    Group(GroupCommands),

    /// Family management commands
    #[command(subcommand)]
    Family(FamilyCommands),

    /// Member management commands
    #[command(subcommand)]
    Member(MemberCommands),

    /// Add money to the shared wallet
    Deposit(DepositArgs),

    /// Pay from the shared wallet and split the cost
    Pay(PayArgs),

    /// Approve a pending payment
    Approve(ResolveArgs),

    /// Decline a pending payment
    Decline(ResolveArgs),

    /// Transaction listing and lookup
    #[command(subcommand, alias = "transaction")]
    Txn(TransactionCommands),

    /// Totals, breakdowns and the ledger check for a group
    Report,

    /// Show recent audit log entries
    Audit(AuditArgs),
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = CirclePaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    let storage = Storage::open(paths.clone())?;
    let group = cli.group.as_deref();

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Circle Wallet at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Next steps:");
            println!("  circle group create \"Goa Trip\"");
            println!("  circle family add Sharma");
            println!("  circle member add Sharma Asha --type adult");
            println!("  circle deposit 25000 --family Sharma");
        }
        Some(Commands::Config(cmd)) => handle_config_command(&paths, &mut settings, cmd)?,
        Some(Commands::Group(cmd)) => handle_group_command(&storage, &settings, group, cmd)?,
        Some(Commands::Family(cmd)) => handle_family_command(&storage, &settings, group, cmd)?,
        Some(Commands::Member(cmd)) => handle_member_command(&storage, group, cmd)?,
        Some(Commands::Deposit(args)) => handle_deposit(&storage, &settings, group, args)?,
        Some(Commands::Pay(args)) => handle_pay(&storage, &settings, group, args)?,
        Some(Commands::Approve(args)) => handle_approve(&storage, &settings, group, args)?,
        Some(Commands::Decline(args)) => handle_decline(&storage, &settings, group, args)?,
        Some(Commands::Txn(cmd)) => handle_transaction_command(&storage, &settings, group, cmd)?,
        Some(Commands::Report) => handle_report(&storage, &settings, group)?,
        Some(Commands::Audit(args)) => handle_audit(&storage, args)?,
        None => {
            println!("Circle Wallet - shared group wallet with weighted splits");
            println!();
            println!("Run 'circle --help' for usage information.");
            println!("Run 'circle init' to get started.");
        }
    }

    Ok(())
}
