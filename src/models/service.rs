use std::fmt;
use std::fs;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Price as it appears in the price list: either a plain amount or a
/// display string like "a partir de R$ 70,00".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Display(String),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(v) => write!(f, "R$ {v:.2}"),
            Price::Display(s) => write!(f, "{s}"),
        }
    }
}

fn default_duration() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub name: String,
    pub category: String,
    pub price: Price,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
}

/// The static service catalog, loaded once at startup. Declaration order is
/// significant: menu numbers resolve as 1-based indexes into this list.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
}

impl Catalog {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let catalog: Catalog = serde_json::from_str(s).context("invalid price list JSON")?;
        anyhow::ensure!(!catalog.services.is_empty(), "price list has no services");
        for service in &catalog.services {
            anyhow::ensure!(
                service.duration_minutes > 0 && service.duration_minutes % 30 == 0,
                "service '{}' has invalid duration {} (must be a positive multiple of 30)",
                service.name,
                service.duration_minutes
            );
        }
        Ok(catalog)
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read price list: {path}"))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, index: usize) -> Option<&Service> {
        self.services.get(index)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
