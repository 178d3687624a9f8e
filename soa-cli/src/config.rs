use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use soa_core::{parse_timezone, MinDateResolution, RulePolicy};
use std::fs;
use std::path::PathBuf;

use crate::state::{ensure_soa_home, soa_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesSection,
    #[serde(default)]
    pub simulation: SimulationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSection {
    /// IANA zone the cooldown boundary is rendered in.
    pub target_timezone: String,
    /// IANA zone whose calendar decides weekends, midnights and months.
    pub calendar_timezone: String,
    #[serde(default)]
    pub min_date_resolution: MinDateResolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    pub default_steps: usize,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            target_timezone: "America/Denver".to_string(),
            calendar_timezone: "UTC".to_string(),
            min_date_resolution: MinDateResolution::Instant,
        }
    }
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self { default_steps: 3 }
    }
}

impl RulesSection {
    pub fn to_policy(&self) -> Result<RulePolicy> {
        Ok(RulePolicy {
            target_timezone: parse_timezone(&self.target_timezone)
                .context("config [rules].target_timezone")?,
            calendar_timezone: parse_timezone(&self.calendar_timezone)
                .context("config [rules].calendar_timezone")?,
            min_date_resolution: self.min_date_resolution,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(soa_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_soa_home()?.join("config.toml");
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
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
