//! Split & balance engine
//!
//! Pure functions: participant selection, proportional allocation, and the
//! balance effects of deposits, payments, approvals and declines. Nothing
//! here reads or writes storage; callers persist the returned mutations.

pub mod allocation;
pub mod balance;
pub mod participants;

pub use allocation::{allocate, Allocation, MemberShare};
pub use balance::{
    apply_deposit, apply_payment, approve_transaction, confirmed_mutations, decline_transaction,
    ledger_balance, ApprovalOutcome, BalanceMutation, BalancePolicy, BalanceWarning,
    DepositOutcome, PaymentOutcome, PaymentRequest, TransactionDetails,
};
pub use participants::select_participants;
