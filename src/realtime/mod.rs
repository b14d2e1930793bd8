//! Realtime transaction change feed and the in-memory view it keeps current

pub mod feed;
pub mod view;

pub use feed::{Subscription, TransactionEvent, TransactionFeed};
pub use view::TransactionView;
