//! Journal engine: validates and posts balanced entries.
//!
//! The engine is the sole mutator of account balances. Posting is atomic:
//! entry, lines, and every balance effect take effect together or not at
//! all. Voiding never deletes; it posts a mirror entry and flags the
//! original.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use tillguard_core::{
    AuditRecord, AuditSink, EntryId, LedgerError, LedgerResult, approx_eq, emit, round2,
};

use crate::chart::{ChartOfAccounts, codes};
use crate::period::PeriodBook;

/// Business meaning of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Sale,
    Payment,
    Expense,
    Reversal,
    Manual,
}

/// Entry lifecycle. Voided entries stay queryable forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Posted,
    Voided,
}

/// Posted journal entry header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub description: String,
    pub reference: Option<String>,
    pub kind: EntryKind,
    pub date: NaiveDate,
    pub total_debit: f64,
    pub total_credit: f64,
    pub status: EntryStatus,
    pub void_reason: Option<String>,
    pub voided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One side of an entry. Immutable once posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub line_no: u32,
    pub entry_id: EntryId,
    pub account_code: String,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
}

/// Input line for a new entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLine {
    pub account_code: String,
    pub description: Option<String>,
    pub debit: f64,
    pub credit: f64,
}

impl NewLine {
    pub fn debit(account_code: impl Into<String>, amount: f64) -> Self {
        Self {
            account_code: account_code.into(),
            description: None,
            debit: amount,
            credit: 0.0,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: f64) -> Self {
        Self {
            account_code: account_code.into(),
            description: None,
            debit: 0.0,
            credit: amount,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for a new entry. `date` defaults to today when absent.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub description: String,
    pub reference: Option<String>,
    pub kind: EntryKind,
    pub lines: Vec<NewLine>,
    pub date: Option<NaiveDate>,
}

/// Settlement account selector for the domain builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl PaymentMethod {
    fn account_code(self) -> &'static str {
        match self {
            PaymentMethod::Cash => codes::CASH,
            PaymentMethod::Bank => codes::BANK,
        }
    }
}

/// Sale posting input (line construction only; no balance math).
#[derive(Debug, Clone)]
pub struct RecordSale {
    pub sale_reference: String,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub payment: PaymentMethod,
    pub on_credit: bool,
}

/// Customer payment posting input.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub customer: String,
    pub amount: f64,
    pub reference: String,
}

/// Expense posting input. `expense_account` falls back to Other Expenses.
#[derive(Debug, Clone)]
pub struct RecordExpense {
    pub description: String,
    pub amount: f64,
    pub expense_account: Option<String>,
    pub payment: PaymentMethod,
}

#[derive(Debug, Default)]
struct JournalState {
    entries: HashMap<EntryId, JournalEntry>,
    lines: HashMap<EntryId, Vec<JournalLine>>,
    order: Vec<EntryId>,
}

/// Validates and posts balanced transactions.
pub struct JournalEngine {
    chart: Arc<ChartOfAccounts>,
    periods: Arc<PeriodBook>,
    state: RwLock<JournalState>,
    audit: Arc<dyn AuditSink>,
}

impl JournalEngine {
    pub fn new(
        chart: Arc<ChartOfAccounts>,
        periods: Arc<PeriodBook>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            chart,
            periods,
            state: RwLock::new(JournalState::default()),
            audit,
        }
    }

    /// Validate and post an entry, applying every line's balance effect.
    pub fn create_entry(&self, new: NewEntry) -> LedgerResult<JournalEntry> {
        let date = new.date.unwrap_or_else(|| Utc::now().date_naive());
        if self.periods.is_closed_for(date) {
            // closed_range is present whenever is_closed_for is true
            let (start, end) = self.periods.closed_range().unwrap_or((date, date));
            return Err(LedgerError::period_closed(date, start, end));
        }

        if new.description.trim().is_empty() {
            return Err(LedgerError::validation("entry description is required"));
        }
        if new.lines.len() < 2 {
            return Err(LedgerError::validation(
                "an entry needs at least two lines",
            ));
        }

        let mut total_debit = 0.0;
        let mut total_credit = 0.0;
        for line in &new.lines {
            if line.debit < 0.0 || line.credit < 0.0 {
                return Err(LedgerError::validation(format!(
                    "negative amount on account {}",
                    line.account_code
                )));
            }
            if line.debit == 0.0 && line.credit == 0.0 {
                return Err(LedgerError::validation(format!(
                    "line on account {} has no amount",
                    line.account_code
                )));
            }
            match self.chart.get(&line.account_code) {
                None => return Err(LedgerError::UnknownAccount(line.account_code.clone())),
                Some(account) if !account.is_active() => {
                    return Err(LedgerError::InactiveAccount(line.account_code.clone()));
                }
                Some(_) => {}
            }
            total_debit += line.debit;
            total_credit += line.credit;
        }
        // Balance check runs on the raw sums: rounding first would collapse
        // a 0.011 mismatch into the tolerance.
        if !approx_eq(total_debit, total_credit) {
            return Err(LedgerError::unbalanced(
                round2(total_debit),
                round2(total_credit),
            ));
        }
        let total_debit = round2(total_debit);
        let total_credit = round2(total_credit);

        let entry_id = EntryId::new();
        let entry = JournalEntry {
            id: entry_id,
            description: new.description.clone(),
            reference: new.reference,
            kind: new.kind,
            date,
            total_debit,
            total_credit,
            status: EntryStatus::Posted,
            void_reason: None,
            voided_at: None,
            created_at: Utc::now(),
        };
        let lines: Vec<JournalLine> = new
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| JournalLine {
                line_no: (i + 1) as u32,
                entry_id,
                account_code: line.account_code.clone(),
                description: line
                    .description
                    .clone()
                    .unwrap_or_else(|| new.description.clone()),
                debit: line.debit,
                credit: line.credit,
            })
            .collect();

        self.apply_atomically(entry.clone(), lines)?;

        tracing::info!(
            entry_id = %entry.id,
            kind = ?entry.kind,
            total = total_debit,
            "journal entry posted"
        );
        emit(
            self.audit.as_ref(),
            AuditRecord::new(
                "journal_entry",
                entry.id.to_string(),
                "post",
                json!({
                    "description": entry.description,
                    "total_debit": entry.total_debit,
                    "total_credit": entry.total_credit,
                }),
            ),
        );
        Ok(entry)
    }

    /// Persist entry + lines and apply balances as one unit. On a balance
    /// failure, already-applied deltas are compensated and the persisted
    /// records removed.
    fn apply_atomically(&self, entry: JournalEntry, lines: Vec<JournalLine>) -> LedgerResult<()> {
        let entry_id = entry.id;
        {
            let mut state = self.write();
            state.entries.insert(entry_id, entry);
            state.lines.insert(entry_id, lines.clone());
            state.order.push(entry_id);
        }

        let mut applied: Vec<&JournalLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            match self
                .chart
                .update_balance(&line.account_code, line.debit, line.credit)
            {
                Ok(()) => applied.push(line),
                Err(e) => {
                    for done in applied {
                        // Inverse delta; accounts we just updated still exist.
                        let _ = self
                            .chart
                            .update_balance(&done.account_code, done.credit, done.debit);
                    }
                    let mut state = self.write();
                    state.entries.remove(&entry_id);
                    state.lines.remove(&entry_id);
                    state.order.retain(|id| *id != entry_id);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Void an entry by posting its mirror and flagging the original.
    pub fn void_entry(&self, entry_id: EntryId, reason: impl Into<String>) -> LedgerResult<JournalEntry> {
        let (entry, lines) = {
            let state = self.read();
            let entry = state
                .entries
                .get(&entry_id)
                .cloned()
                .ok_or(LedgerError::NotFound)?;
            let lines = state.lines.get(&entry_id).cloned().unwrap_or_default();
            (entry, lines)
        };

        if entry.status == EntryStatus::Voided {
            return Err(LedgerError::AlreadyVoided(entry_id));
        }
        if self.periods.is_closed_for(entry.date) {
            let (start, end) = self.periods.closed_range().unwrap_or((entry.date, entry.date));
            return Err(LedgerError::period_closed(entry.date, start, end));
        }

        let mirror: Vec<NewLine> = lines
            .iter()
            .map(|line| NewLine {
                account_code: line.account_code.clone(),
                description: Some(format!("Reversal: {}", line.description)),
                debit: line.credit,
                credit: line.debit,
            })
            .collect();

        let reason = reason.into();
        let reversal = self.create_entry(NewEntry {
            description: format!("REVERSAL: {}", entry.description),
            reference: Some(format!("VOID-{entry_id}")),
            kind: EntryKind::Reversal,
            lines: mirror,
            date: None,
        })?;

        {
            let mut state = self.write();
            if let Some(stored) = state.entries.get_mut(&entry_id) {
                stored.status = EntryStatus::Voided;
                stored.void_reason = Some(reason.clone());
                stored.voided_at = Some(Utc::now());
            }
        }

        tracing::info!(entry_id = %entry_id, reversal_id = %reversal.id, "journal entry voided");
        emit(
            self.audit.as_ref(),
            AuditRecord::new(
                "journal_entry",
                entry_id.to_string(),
                "void",
                json!({ "reason": reason, "reversal_id": reversal.id.to_string() }),
            ),
        );
        Ok(reversal)
    }

    /// Post a sale: settlement account debited for the total, sales credited
    /// for the subtotal, VAT payable credited for the tax portion.
    pub fn record_sale(&self, sale: RecordSale) -> LedgerResult<JournalEntry> {
        let settlement = if sale.on_credit {
            codes::ACCOUNTS_RECEIVABLE
        } else {
            sale.payment.account_code()
        };
        let mut lines = vec![
            NewLine::debit(settlement, sale.total).with_description(if sale.on_credit {
                "Credit sale"
            } else {
                match sale.payment {
                    PaymentMethod::Cash => "Cash sale",
                    PaymentMethod::Bank => "Bank sale",
                }
            }),
            NewLine::credit(codes::SALES, sale.subtotal).with_description("Sales"),
        ];
        if sale.tax > 0.0 {
            lines.push(NewLine::credit(codes::VAT_PAYABLE, sale.tax).with_description("VAT"));
        }

        self.create_entry(NewEntry {
            description: format!("Sale #{}", sale.sale_reference),
            reference: Some(sale.sale_reference),
            kind: EntryKind::Sale,
            lines,
            date: None,
        })
    }

    /// Post a received customer payment: cash up, receivable down.
    pub fn record_payment_received(&self, payment: RecordPayment) -> LedgerResult<JournalEntry> {
        self.create_entry(NewEntry {
            description: format!("Customer payment {}", payment.customer),
            reference: Some(payment.reference),
            kind: EntryKind::Payment,
            lines: vec![
                NewLine::debit(codes::CASH, payment.amount),
                NewLine::credit(codes::ACCOUNTS_RECEIVABLE, payment.amount),
            ],
            date: None,
        })
    }

    /// Post an expense against the chosen expense account.
    pub fn record_expense(&self, expense: RecordExpense) -> LedgerResult<JournalEntry> {
        let expense_account = expense
            .expense_account
            .unwrap_or_else(|| codes::OTHER_EXPENSES.to_string());
        self.create_entry(NewEntry {
            description: expense.description,
            reference: None,
            kind: EntryKind::Expense,
            lines: vec![
                NewLine::debit(expense_account, expense.amount),
                NewLine::credit(expense.payment.account_code(), expense.amount),
            ],
            date: None,
        })
    }

    /// All entries in posting order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|id| state.entries.get(id).cloned())
            .collect()
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<JournalEntry> {
        self.read().entries.get(&entry_id).cloned()
    }

    pub fn lines_of(&self, entry_id: EntryId) -> Vec<JournalLine> {
        self.read().lines.get(&entry_id).cloned().unwrap_or_default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, JournalState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, JournalState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
