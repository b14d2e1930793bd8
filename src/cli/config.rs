//! Config CLI commands

use clap::Subcommand;

use crate::config::{CirclePaths, Settings};
use crate::error::CircleResult;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show paths and current settings
    Show,
    /// Change a setting
    Set {
        /// currency_symbol, currency_code, default_large_payment_threshold,
        /// default_require_approval, balance_policy or log_level
        key: String,
        value: String,
    },
}

pub fn handle_config_command(
    paths: &CirclePaths,
    settings: &mut Settings,
    cmd: ConfigCommands,
) -> CircleResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("Circle Wallet Configuration");
            println!("===========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  currency_symbol:                 {}", settings.currency_symbol);
            println!("  currency_code:                   {}", settings.currency_code);
            println!(
                "  default_large_payment_threshold: {}",
                settings.format_money(settings.default_large_payment_threshold)
            );
            println!(
                "  default_require_approval:        {}",
                settings.default_require_approval
            );
            println!("  balance_policy:                  {}", settings.balance_policy);
            println!("  log_level:                       {}", settings.log_level);
        }

        ConfigCommands::Set { key, value } => {
            settings.set(&key, &value)?;
            settings.save(paths)?;
            tracing::info!(%key, %value, "setting changed");
            println!("Set {} = {}", key, value);
        }
    }

    Ok(())
}
