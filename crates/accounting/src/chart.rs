//! Chart-of-accounts store with running balances.
//!
//! Accounts are seeded once from the standard chart, then only
//! balance-mutated and soft-deactivated. The journal engine is the only
//! caller of [`ChartOfAccounts::update_balance`].

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillguard_core::{LedgerError, LedgerResult, round2};

/// High-level account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Cost,
    Expense,
}

/// Which posting side increases the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nature {
    Debit,
    Credit,
}

/// Account lifecycle. Accounts are never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountLifecycle {
    Active,
    Inactive,
}

/// Account registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub nature: Nature,
    /// Code of the parent account, for hierarchical charts.
    pub parent: Option<String>,
    /// Running balance, maintained exclusively by the journal engine.
    pub balance: f64,
    pub lifecycle: AccountLifecycle,
    /// Seeded accounts are system accounts and cannot be deactivated.
    pub system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.lifecycle == AccountLifecycle::Active
    }
}

/// Input for creating a user-defined account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub nature: Nature,
    pub parent: Option<String>,
}

/// Well-known seeded account codes used by the journal builders.
pub mod codes {
    pub const CASH: &str = "1100";
    pub const BANK: &str = "1120";
    pub const ACCOUNTS_RECEIVABLE: &str = "1200";
    pub const VAT_PAYABLE: &str = "2210";
    pub const SALES: &str = "4100";
    pub const OTHER_EXPENSES: &str = "6900";
}

/// Standard seed chart (code, name, type, nature).
///
/// Recreates the GAAP small-business chart: assets 1xxx, liabilities 2xxx,
/// equity 3xxx, revenue 4xxx, costs 5xxx, expenses 6xxx.
const SEED_ACCOUNTS: &[(&str, &str, AccountType, Nature)] = &[
    ("1100", "Cash", AccountType::Asset, Nature::Debit),
    ("1110", "Petty Cash", AccountType::Asset, Nature::Debit),
    ("1120", "Bank", AccountType::Asset, Nature::Debit),
    ("1200", "Accounts Receivable", AccountType::Asset, Nature::Debit),
    ("1300", "Merchandise Inventory", AccountType::Asset, Nature::Debit),
    ("1310", "Supplies", AccountType::Asset, Nature::Debit),
    ("1400", "Prepaid Expenses", AccountType::Asset, Nature::Debit),
    ("1500", "Equipment and Furniture", AccountType::Asset, Nature::Debit),
    ("1590", "Accumulated Depreciation", AccountType::Asset, Nature::Credit),
    ("2100", "Accounts Payable", AccountType::Liability, Nature::Credit),
    ("2200", "Taxes Payable", AccountType::Liability, Nature::Credit),
    ("2210", "VAT Payable", AccountType::Liability, Nature::Credit),
    ("2300", "Salaries Payable", AccountType::Liability, Nature::Credit),
    ("2400", "Loans Payable", AccountType::Liability, Nature::Credit),
    ("2500", "Unearned Revenue", AccountType::Liability, Nature::Credit),
    ("3100", "Owner's Capital", AccountType::Equity, Nature::Credit),
    ("3200", "Retained Earnings", AccountType::Equity, Nature::Credit),
    ("3300", "Current Period Earnings", AccountType::Equity, Nature::Credit),
    ("3400", "Owner's Drawings", AccountType::Equity, Nature::Debit),
    ("3999", "Rounding Adjustments", AccountType::Equity, Nature::Credit),
    ("4100", "Merchandise Sales", AccountType::Revenue, Nature::Credit),
    ("4110", "Sales Returns", AccountType::Revenue, Nature::Debit),
    ("4120", "Sales Discounts", AccountType::Revenue, Nature::Debit),
    ("4200", "Service Revenue", AccountType::Revenue, Nature::Credit),
    ("4900", "Other Income", AccountType::Revenue, Nature::Credit),
    ("5100", "Cost of Goods Sold", AccountType::Cost, Nature::Debit),
    ("5110", "Purchases", AccountType::Cost, Nature::Debit),
    ("5120", "Purchase Returns", AccountType::Cost, Nature::Credit),
    ("5130", "Freight In", AccountType::Cost, Nature::Debit),
    ("6100", "Salaries and Wages", AccountType::Expense, Nature::Debit),
    ("6200", "Rent", AccountType::Expense, Nature::Debit),
    ("6300", "Utilities", AccountType::Expense, Nature::Debit),
    ("6400", "Supplies Expense", AccountType::Expense, Nature::Debit),
    ("6500", "Depreciation Expense", AccountType::Expense, Nature::Debit),
    ("6600", "Insurance", AccountType::Expense, Nature::Debit),
    ("6700", "Advertising", AccountType::Expense, Nature::Debit),
    ("6800", "Bank Fees", AccountType::Expense, Nature::Debit),
    ("6900", "Other Expenses", AccountType::Expense, Nature::Debit),
];

/// In-memory account registry.
#[derive(Debug, Default)]
pub struct ChartOfAccounts {
    accounts: RwLock<HashMap<String, Account>>,
}

impl ChartOfAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the standard chart. Idempotent: a non-empty store is untouched.
    pub fn seed(&self) -> usize {
        let mut accounts = self.write();
        if !accounts.is_empty() {
            return 0;
        }

        let now = Utc::now();
        for (code, name, account_type, nature) in SEED_ACCOUNTS {
            accounts.insert(
                code.to_string(),
                Account {
                    code: code.to_string(),
                    name: name.to_string(),
                    account_type: *account_type,
                    nature: *nature,
                    parent: None,
                    balance: 0.0,
                    lifecycle: AccountLifecycle::Active,
                    system: true,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        tracing::info!(count = accounts.len(), "seeded chart of accounts");
        accounts.len()
    }

    /// Create a user-defined account.
    pub fn create(&self, new: NewAccount) -> LedgerResult<Account> {
        if new.code.trim().is_empty() {
            return Err(LedgerError::validation("account code must not be empty"));
        }
        if new.name.trim().is_empty() {
            return Err(LedgerError::validation("account name must not be empty"));
        }

        let mut accounts = self.write();
        if accounts.contains_key(&new.code) {
            return Err(LedgerError::DuplicateAccount(new.code));
        }
        if let Some(parent) = &new.parent {
            match accounts.get(parent) {
                None => return Err(LedgerError::UnknownAccount(parent.clone())),
                Some(p) if !p.is_active() => {
                    return Err(LedgerError::InactiveAccount(parent.clone()));
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();
        let account = Account {
            code: new.code.clone(),
            name: new.name,
            account_type: new.account_type,
            nature: new.nature,
            parent: new.parent,
            balance: 0.0,
            lifecycle: AccountLifecycle::Active,
            system: false,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(new.code, account.clone());
        Ok(account)
    }

    /// Apply one posted line's effect to the account balance.
    ///
    /// `delta = debit - credit` for debit-nature accounts, `credit - debit`
    /// otherwise. Must be called exactly once per posted line.
    pub fn update_balance(&self, code: &str, debit: f64, credit: f64) -> LedgerResult<()> {
        let mut accounts = self.write();
        let account = accounts
            .get_mut(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))?;

        let delta = match account.nature {
            Nature::Debit => debit - credit,
            Nature::Credit => credit - debit,
        };
        account.balance = round2(account.balance + delta);
        account.updated_at = Utc::now();
        Ok(())
    }

    /// Deactivate an account. System accounts are protected; the historical
    /// balance is left as is.
    pub fn deactivate(&self, code: &str) -> LedgerResult<()> {
        let mut accounts = self.write();
        let account = accounts
            .get_mut(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))?;
        if account.system {
            return Err(LedgerError::SystemAccount(code.to_string()));
        }
        account.lifecycle = AccountLifecycle::Inactive;
        account.updated_at = Utc::now();
        Ok(())
    }

    pub fn activate(&self, code: &str) -> LedgerResult<()> {
        let mut accounts = self.write();
        let account = accounts
            .get_mut(code)
            .ok_or_else(|| LedgerError::UnknownAccount(code.to_string()))?;
        account.lifecycle = AccountLifecycle::Active;
        account.updated_at = Utc::now();
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<Account> {
        self.read().get(code).cloned()
    }

    /// All accounts, code-sorted.
    pub fn list(&self) -> Vec<Account> {
        let mut all: Vec<Account> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    /// Active accounts only, code-sorted.
    pub fn list_active(&self) -> Vec<Account> {
        let mut active: Vec<Account> = self
            .read()
            .values()
            .filter(|a| a.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.code.cmp(&b.code));
        active
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Account>> {
        self.accounts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_idempotent() {
        let chart = ChartOfAccounts::new();
        let first = chart.seed();
        assert_eq!(first, SEED_ACCOUNTS.len());
        assert!(chart.list().iter().all(|a| a.balance == 0.0));

        let second = chart.seed();
        assert_eq!(second, 0);
        assert_eq!(chart.count(), SEED_ACCOUNTS.len());
    }

    #[test]
    fn create_rejects_duplicate_code() {
        let chart = ChartOfAccounts::new();
        chart.seed();

        let err = chart
            .create(NewAccount {
                code: codes::CASH.to_string(),
                name: "Cash again".to_string(),
                account_type: AccountType::Asset,
                nature: Nature::Debit,
                parent: None,
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateAccount(_)));
    }

    #[test]
    fn create_rejects_missing_or_inactive_parent() {
        let chart = ChartOfAccounts::new();
        chart.seed();

        let missing = chart
            .create(NewAccount {
                code: "1101".to_string(),
                name: "Register 1".to_string(),
                account_type: AccountType::Asset,
                nature: Nature::Debit,
                parent: Some("9999".to_string()),
            })
            .unwrap_err();
        assert!(matches!(missing, LedgerError::UnknownAccount(_)));

        chart
            .create(NewAccount {
                code: "1101".to_string(),
                name: "Register 1".to_string(),
                account_type: AccountType::Asset,
                nature: Nature::Debit,
                parent: Some(codes::CASH.to_string()),
            })
            .unwrap();
        chart.deactivate("1101").unwrap();

        let inactive = chart
            .create(NewAccount {
                code: "1102".to_string(),
                name: "Register 2".to_string(),
                account_type: AccountType::Asset,
                nature: Nature::Debit,
                parent: Some("1101".to_string()),
            })
            .unwrap_err();
        assert!(matches!(inactive, LedgerError::InactiveAccount(_)));
    }

    #[test]
    fn update_balance_is_nature_adjusted() {
        let chart = ChartOfAccounts::new();
        chart.seed();

        chart.update_balance(codes::CASH, 115.0, 0.0).unwrap();
        chart.update_balance(codes::SALES, 0.0, 100.0).unwrap();
        chart.update_balance(codes::VAT_PAYABLE, 0.0, 15.0).unwrap();

        assert_eq!(chart.get(codes::CASH).unwrap().balance, 115.0);
        assert_eq!(chart.get(codes::SALES).unwrap().balance, 100.0);
        assert_eq!(chart.get(codes::VAT_PAYABLE).unwrap().balance, 15.0);

        // Credit against a debit-nature account decreases it.
        chart.update_balance(codes::CASH, 0.0, 15.0).unwrap();
        assert_eq!(chart.get(codes::CASH).unwrap().balance, 100.0);
    }

    #[test]
    fn system_accounts_cannot_be_deactivated() {
        let chart = ChartOfAccounts::new();
        chart.seed();

        let err = chart.deactivate(codes::CASH).unwrap_err();
        assert!(matches!(err, LedgerError::SystemAccount(_)));
    }

    #[test]
    fn deactivation_preserves_balance() {
        let chart = ChartOfAccounts::new();
        chart.seed();
        chart
            .create(NewAccount {
                code: "6950".to_string(),
                name: "Donations".to_string(),
                account_type: AccountType::Expense,
                nature: Nature::Debit,
                parent: None,
            })
            .unwrap();
        chart.update_balance("6950", 40.0, 0.0).unwrap();

        chart.deactivate("6950").unwrap();
        let account = chart.get("6950").unwrap();
        assert_eq!(account.lifecycle, AccountLifecycle::Inactive);
        assert_eq!(account.balance, 40.0);

        chart.activate("6950").unwrap();
        assert!(chart.get("6950").unwrap().is_active());
    }
}
