//! Persistence seam consumed by the conversation engine, plus an in-memory
//! ledger used by the CLI (persisted as JSON) and by tests.
//!
//! The engine only needs a handful of operations; everything else about
//! storage (schema, sync, auth) lives outside this workspace.

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};
use fintrack_core::{AdvisoryStyle, FinancialSnapshot, Tone, TxKind};
use serde::{Deserialize, Serialize};

pub type CategoryId = u64;
pub type AccountId = u64;

/// A transaction to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    /// `None` means "today".
    pub date: Option<NaiveDate>,
    pub kind: TxKind,
    /// Positive magnitude.
    pub amount: f64,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub note: Option<String>,
}

/// The operations the conversation engine needs from storage.
pub trait LedgerStore {
    fn find_category(&self, name: &str) -> Option<CategoryId>;
    fn create_category(&mut self, name: &str) -> Result<CategoryId>;
    /// Find-or-create the user's principal account.
    fn principal_account(&mut self) -> Result<AccountId>;
    fn insert_entry(&mut self, account: AccountId, entry: NewEntry) -> Result<()>;
    fn update_account_balance(&mut self, account: AccountId, delta: f64) -> Result<()>;
    fn count_active_in_month(&self, month: u32, year: i32) -> Result<usize>;
    /// Marks entries deleted; never removes rows. Returns how many were
    /// affected.
    fn soft_delete_month(&mut self, month: u32, year: i32) -> Result<usize>;
    /// Point-in-time read used to build projections.
    fn snapshot(&self) -> Result<FinancialSnapshot>;
}

/// Budget settings that are not derivable from the entries themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    pub monthly_income: f64,
    pub reserve_target: f64,
    pub reserve_actual: f64,
    pub style: AdvisoryStyle,
    pub tone: Tone,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            monthly_income: 0.0,
            reserve_target: 0.0,
            reserve_actual: 0.0,
            style: AdvisoryStyle::default(),
            tone: Tone::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    id: AccountId,
    name: String,
    balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Category {
    id: CategoryId,
    name: String,
}

/// A persisted transaction row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub kind: TxKind,
    pub amount: f64,
    pub description: String,
    pub month: u32,
    pub year: i32,
    pub day: u32,
    pub note: Option<String>,
    pub deleted: bool,
}

/// Whole-ledger in-memory store, serializable so the CLI can keep it as a
/// JSON file under the app home.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryLedger {
    next_id: u64,
    pub settings: LedgerSettings,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    entries: Vec<LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: LedgerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    pub fn account_balance(&self, id: AccountId) -> Option<f64> {
        self.accounts.iter().find(|a| a.id == id).map(|a| a.balance)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl LedgerStore for MemoryLedger {
    fn find_category(&self, name: &str) -> Option<CategoryId> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.id)
    }

    fn create_category(&mut self, name: &str) -> Result<CategoryId> {
        if let Some(existing) = self.find_category(name) {
            return Ok(existing);
        }
        let id = self.next_id();
        self.categories.push(Category {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn principal_account(&mut self) -> Result<AccountId> {
        if let Some(first) = self.accounts.first() {
            return Ok(first.id);
        }
        let id = self.next_id();
        self.accounts.push(Account {
            id,
            name: "Conta principal".to_string(),
            balance: 0.0,
        });
        Ok(id)
    }

    fn insert_entry(&mut self, account: AccountId, entry: NewEntry) -> Result<()> {
        if !self.accounts.iter().any(|a| a.id == account) {
            return Err(anyhow!("conta {account} não existe"));
        }
        let date = entry.date.unwrap_or_else(|| Local::now().date_naive());
        let id = self.next_id();
        self.entries.push(LedgerEntry {
            id,
            account_id: account,
            category_id: entry.category_id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            month: date.month(),
            year: date.year(),
            day: date.day(),
            note: entry.note,
            deleted: false,
        });
        Ok(())
    }

    fn update_account_balance(&mut self, account: AccountId, delta: f64) -> Result<()> {
        let acc = self
            .accounts
            .iter_mut()
            .find(|a| a.id == account)
            .ok_or_else(|| anyhow!("conta {account} não existe"))?;
        acc.balance += delta;
        Ok(())
    }

    fn count_active_in_month(&self, month: u32, year: i32) -> Result<usize> {
        Ok(self
            .entries
            .iter()
            .filter(|e| !e.deleted && e.month == month && e.year == year)
            .count())
    }

    fn soft_delete_month(&mut self, month: u32, year: i32) -> Result<usize> {
        let mut affected = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| !e.deleted && e.month == month && e.year == year)
        {
            entry.deleted = true;
            affected += 1;
        }
        Ok(affected)
    }

    fn snapshot(&self) -> Result<FinancialSnapshot> {
        let today = Local::now().date_naive();
        let balance = self.accounts.first().map(|a| a.balance).unwrap_or(0.0);

        let mut fixed = 0.0;
        let mut daily = 0.0;
        for entry in self
            .entries
            .iter()
            .filter(|e| !e.deleted && e.month == today.month() && e.year == today.year())
        {
            match entry.kind {
                TxKind::FixedExpense => fixed += entry.amount,
                TxKind::DailyExpense => daily += entry.amount,
                TxKind::Income => {}
            }
        }

        Ok(FinancialSnapshot {
            balance,
            monthly_income: self.settings.monthly_income,
            fixed_expenses: fixed,
            daily_expenses: daily,
            reserve_target: self.settings.reserve_target,
            reserve_actual: self.settings.reserve_actual,
            style: self.settings.style,
            tone: self.settings.tone,
        })
    }
}
