//! The [`Ledger`] facade: one object owning the chart, journal engine, and
//! period book, with the full posting/reporting API on it.

use std::sync::Arc;

use chrono::NaiveDate;

use tillguard_core::{AuditSink, ClosureId, EntryId, LedgerResult, NullAuditSink};

use crate::chart::{Account, ChartOfAccounts, NewAccount};
use crate::journal::{
    JournalEngine, JournalEntry, JournalLine, NewEntry, RecordExpense, RecordPayment, RecordSale,
};
use crate::period::{NewClosure, PeriodBook, PeriodClosure};
use crate::reports::{self, BalanceSheet, IncomeStatement, TrialBalance};

/// Fully wired double-entry ledger. Construction seeds the standard chart.
pub struct Ledger {
    chart: Arc<ChartOfAccounts>,
    periods: Arc<PeriodBook>,
    journal: JournalEngine,
}

impl Ledger {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        let chart = Arc::new(ChartOfAccounts::new());
        chart.seed();
        let periods = Arc::new(PeriodBook::new(audit.clone()));
        let journal = JournalEngine::new(chart.clone(), periods.clone(), audit);
        Self {
            chart,
            periods,
            journal,
        }
    }

    /// Ledger with no audit trail, for tests and tooling.
    pub fn unaudited() -> Self {
        Self::new(Arc::new(NullAuditSink))
    }

    pub fn chart(&self) -> &ChartOfAccounts {
        &self.chart
    }

    pub fn periods(&self) -> &PeriodBook {
        &self.periods
    }

    // Accounts

    pub fn create_account(&self, new: NewAccount) -> LedgerResult<Account> {
        self.chart.create(new)
    }

    pub fn account(&self, code: &str) -> Option<Account> {
        self.chart.get(code)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.chart.list()
    }

    // Journal

    pub fn create_entry(&self, new: NewEntry) -> LedgerResult<JournalEntry> {
        self.journal.create_entry(new)
    }

    pub fn void_entry(
        &self,
        entry_id: EntryId,
        reason: impl Into<String>,
    ) -> LedgerResult<JournalEntry> {
        self.journal.void_entry(entry_id, reason)
    }

    pub fn record_sale(&self, sale: RecordSale) -> LedgerResult<JournalEntry> {
        self.journal.record_sale(sale)
    }

    pub fn record_payment_received(&self, payment: RecordPayment) -> LedgerResult<JournalEntry> {
        self.journal.record_payment_received(payment)
    }

    pub fn record_expense(&self, expense: RecordExpense) -> LedgerResult<JournalEntry> {
        self.journal.record_expense(expense)
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.journal.entries()
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<JournalEntry> {
        self.journal.entry(entry_id)
    }

    pub fn lines_of(&self, entry_id: EntryId) -> Vec<JournalLine> {
        self.journal.lines_of(entry_id)
    }

    // Periods

    pub fn close_period(&self, new: NewClosure) -> LedgerResult<PeriodClosure> {
        self.periods.close(new)
    }

    pub fn verify_closure(&self, closure: &PeriodClosure) -> bool {
        self.periods.verify(closure)
    }

    /// Ids of retained closures whose stored hash no longer verifies.
    pub fn verify_closures(&self) -> Vec<ClosureId> {
        self.periods.verify_all()
    }

    pub fn reopen_period(&self) {
        self.periods.reopen();
    }

    pub fn is_closed_for(&self, date: NaiveDate) -> bool {
        self.periods.is_closed_for(date)
    }

    pub fn closures(&self) -> Vec<PeriodClosure> {
        self.periods.closures()
    }

    // Reports

    pub fn trial_balance(&self) -> TrialBalance {
        reports::trial_balance(&self.chart)
    }

    pub fn balance_sheet(&self) -> BalanceSheet {
        reports::balance_sheet(&self.chart)
    }

    pub fn income_statement(&self) -> IncomeStatement {
        reports::income_statement(&self.chart)
    }
}
