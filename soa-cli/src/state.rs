use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use soa_core::parse_instant;
use std::fs;
use std::path::PathBuf;

/// SOA the simulator starts from after a reset.
pub const SEED_SOA: &str = "2024-09-09 12:29:30.2960503";

pub fn soa_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".soa"))
}

pub fn ensure_soa_home() -> Result<PathBuf> {
    let dir = soa_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// The editable SOA list kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    #[serde(rename = "soaListUTC")]
    pub entries: Vec<DateTime<Utc>>,
}

impl SessionHistory {
    pub fn seeded(calendar: Tz) -> Result<Self> {
        Ok(Self {
            entries: vec![parse_instant(SEED_SOA, calendar)?],
        })
    }
}

pub fn history_path() -> Result<PathBuf> {
    Ok(soa_home()?.join("history.json"))
}

/// Read the session history, falling back to the seed when none was saved.
pub fn read_history(calendar: Tz) -> Result<SessionHistory> {
    let p = history_path()?;
    if !p.exists() {
        return SessionHistory::seeded(calendar);
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn write_history(history: &SessionHistory) -> Result<()> {
    let p = ensure_soa_home()?.join("history.json");
    let json = serde_json::to_string_pretty(history)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}
