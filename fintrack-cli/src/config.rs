use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use fintrack_assist::classifier::ClassifierConfig;
use fintrack_assist::store::LedgerSettings;
use fintrack_core::{AdvisoryStyle, Tone};

use crate::state::ensure_fintrack_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub classifier: ClassifierSection,
    pub advisor: AdvisorSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSection {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Environment variable holding the API key; the key itself never lands
    /// in the config file.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorSection {
    pub style: AdvisoryStyle,
    pub tone: Tone,
    pub monthly_income: f64,
    pub reserve_target: f64,
    pub reserve_actual: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier: ClassifierSection {
                model: "gpt-4o-mini".to_string(),
                base_url: "https://api.openai.com".to_string(),
                temperature: 0.7,
                api_key_env: "OPENAI_API_KEY".to_string(),
            },
            advisor: AdvisorSection {
                style: AdvisoryStyle::default(),
                tone: Tone::default(),
                monthly_income: 0.0,
                reserve_target: 0.0,
                reserve_actual: 0.0,
            },
        }
    }
}

impl Config {
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            base_url: self.classifier.base_url.clone(),
            model: self.classifier.model.clone(),
            api_key: std::env::var(&self.classifier.api_key_env).unwrap_or_default(),
            temperature: self.classifier.temperature,
        }
    }

    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            monthly_income: self.advisor.monthly_income,
            reserve_target: self.advisor.reserve_target,
            reserve_actual: self.advisor.reserve_actual,
            style: self.advisor.style,
            tone: self.advisor.tone,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_fintrack_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}
