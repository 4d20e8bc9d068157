use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use fintrack_assist::store::{LedgerSettings, MemoryLedger};

pub fn fintrack_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".fintrack"))
}

pub fn ensure_fintrack_home() -> Result<PathBuf> {
    let dir = fintrack_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn ledger_path() -> Result<PathBuf> {
    Ok(ensure_fintrack_home()?.join("ledger.json"))
}

/// Load the ledger, seeding a fresh one with the configured settings when no
/// file exists yet.
pub fn load_ledger(settings: LedgerSettings) -> Result<MemoryLedger> {
    let p = ledger_path()?;
    if !p.exists() {
        return Ok(MemoryLedger::with_settings(settings));
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let mut ledger: MemoryLedger =
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    ledger.settings = settings;
    Ok(ledger)
}

pub fn save_ledger(ledger: &MemoryLedger) -> Result<()> {
    let p = ledger_path()?;
    let json = serde_json::to_string_pretty(ledger)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}
