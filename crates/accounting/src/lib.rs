//! `tillguard-accounting` — double-entry ledger engine.
//!
//! Chart-of-accounts store with running balances, the journal engine (sole
//! mutator of those balances), hash-sealed period closures, and read-only
//! financial reports. The [`Ledger`] facade wires the pieces into one owned
//! service object.

pub mod chart;
pub mod journal;
pub mod ledger;
pub mod period;
pub mod reports;

pub use chart::{Account, AccountLifecycle, AccountType, ChartOfAccounts, Nature, NewAccount};
pub use journal::{
    EntryKind, EntryStatus, JournalEngine, JournalEntry, JournalLine, NewEntry, NewLine,
    PaymentMethod, RecordExpense, RecordPayment, RecordSale,
};
pub use ledger::Ledger;
pub use period::{NewClosure, PeriodBook, PeriodClosure};
pub use reports::{BalanceSheet, IncomeStatement, TrialBalance, TrialBalanceRow};
