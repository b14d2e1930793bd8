//! Circle Wallet - shared prepaid wallet for travelling groups
//!
//! A group holds one wallet. Families deposit into it, and payments out of it
//! are split across members in proportion to their share ratios (adult 1.0,
//! teenager 0.8, child 0.5 by default). Payments at or above the group's
//! threshold wait for an admin to approve or decline them.
//!
//! # Architecture
//!
//! - `config`: Path resolution and persisted settings
//! - `error`: Custom error types
//! - `models`: Groups, families, members, transactions, money
//! - `engine`: Participant selection, allocation and balance bookkeeping (pure)
//! - `storage`: JSON file store with atomic balance increments
//! - `realtime`: Per-group transaction change feed
//! - `audit`: Append-only audit log
//! - `services`: Orchestration over engine, store and audit
//! - `display` / `cli`: Terminal output and clap commands
//!
//! # Example
//!
//! ```rust,ignore
//! use circle_wallet::config::{CirclePaths, Settings};
//! use circle_wallet::storage::Storage;
//! use circle_wallet::services::WalletService;
//!
//! let paths = CirclePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! let wallet = WalletService::new(&storage, settings.balance_policy);
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod realtime;
pub mod services;
pub mod storage;

pub use engine::{allocate, select_participants, BalancePolicy};
pub use error::{CircleError, CircleResult};
pub use models::{Money, ShareRatio};
