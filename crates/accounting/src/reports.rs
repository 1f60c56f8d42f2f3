//! Read-only financial statements derived from current account balances.
//!
//! Reports never mutate anything; they fold over a chart snapshot. A
//! trial balance whose columns differ by more than the posting tolerance
//! means balances were mutated outside the journal engine.

use serde::{Deserialize, Serialize};

use tillguard_core::{approx_eq, round2};

use crate::chart::{AccountType, ChartOfAccounts, Nature};

/// One account's contribution to the trial balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub code: String,
    pub name: String,
    /// Balance placed in the column matching the account's nature. A
    /// negative balance flips to the opposite column.
    pub debit: f64,
    pub credit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: f64,
    pub total_credit: f64,
}

impl TrialBalance {
    /// Columns agree within posting tolerance.
    pub fn is_balanced(&self) -> bool {
        approx_eq(self.total_debit, self.total_credit)
    }

    pub fn difference(&self) -> f64 {
        round2(self.total_debit - self.total_credit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    /// Period result folded into equity so the statement articulates with
    /// the income statement.
    pub net_income: f64,
}

impl BalanceSheet {
    /// Assets == liabilities + equity (net income included), within tolerance.
    pub fn balances(&self) -> bool {
        approx_eq(self.total_assets, self.total_liabilities + self.total_equity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: f64,
    pub cost_of_sales: f64,
    pub gross_profit: f64,
    pub expenses: f64,
    pub net_income: f64,
}

/// Trial balance over active accounts with nonzero balances, code-sorted.
pub fn trial_balance(chart: &ChartOfAccounts) -> TrialBalance {
    let mut rows = Vec::new();
    let mut total_debit = 0.0;
    let mut total_credit = 0.0;

    for account in chart.list_active() {
        if account.balance == 0.0 {
            continue;
        }
        // A negative balance sits in the opposite column, as a positive.
        let (debit, credit) = match (account.nature, account.balance >= 0.0) {
            (Nature::Debit, true) => (account.balance, 0.0),
            (Nature::Debit, false) => (0.0, -account.balance),
            (Nature::Credit, true) => (0.0, account.balance),
            (Nature::Credit, false) => (-account.balance, 0.0),
        };
        total_debit += debit;
        total_credit += credit;
        rows.push(TrialBalanceRow {
            code: account.code,
            name: account.name,
            debit,
            credit,
        });
    }

    TrialBalance {
        rows,
        total_debit: round2(total_debit),
        total_credit: round2(total_credit),
    }
}

/// Income statement from current revenue, cost, and expense balances.
pub fn income_statement(chart: &ChartOfAccounts) -> IncomeStatement {
    let mut revenue = 0.0;
    let mut cost_of_sales = 0.0;
    let mut expenses = 0.0;

    for account in chart.list() {
        match account.account_type {
            AccountType::Revenue => {
                // Contra-revenue accounts (returns, discounts) are
                // debit-nature and subtract from revenue.
                match account.nature {
                    Nature::Credit => revenue += account.balance,
                    Nature::Debit => revenue -= account.balance,
                }
            }
            AccountType::Cost => match account.nature {
                Nature::Debit => cost_of_sales += account.balance,
                Nature::Credit => cost_of_sales -= account.balance,
            },
            AccountType::Expense => expenses += account.balance,
            _ => {}
        }
    }

    let revenue = round2(revenue);
    let cost_of_sales = round2(cost_of_sales);
    let expenses = round2(expenses);
    let gross_profit = round2(revenue - cost_of_sales);
    IncomeStatement {
        revenue,
        cost_of_sales,
        gross_profit,
        expenses,
        net_income: round2(gross_profit - expenses),
    }
}

/// Balance sheet with the period result folded into equity.
pub fn balance_sheet(chart: &ChartOfAccounts) -> BalanceSheet {
    let mut assets = 0.0;
    let mut liabilities = 0.0;
    let mut equity = 0.0;

    for account in chart.list() {
        match account.account_type {
            AccountType::Asset => match account.nature {
                Nature::Debit => assets += account.balance,
                // Contra-assets like accumulated depreciation.
                Nature::Credit => assets -= account.balance,
            },
            AccountType::Liability => liabilities += account.balance,
            AccountType::Equity => match account.nature {
                Nature::Credit => equity += account.balance,
                // Drawings reduce equity.
                Nature::Debit => equity -= account.balance,
            },
            _ => {}
        }
    }

    let net_income = income_statement(chart).net_income;
    BalanceSheet {
        total_assets: round2(assets),
        total_liabilities: round2(liabilities),
        total_equity: round2(equity + net_income),
        net_income,
    }
}
