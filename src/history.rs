// src/history.rs
use crate::models::DamageAnalysis;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceFilter {
    #[default]
    All,
    Damage,
    NoDamage,
}

impl PresenceFilter {
    fn admits(self, analysis: &DamageAnalysis) -> bool {
        match self {
            PresenceFilter::All => true,
            PresenceFilter::Damage => analysis.damage_detected,
            PresenceFilter::NoDamage => !analysis.damage_detected,
        }
    }
}

impl FromStr for PresenceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PresenceFilter::All),
            "damage" => Ok(PresenceFilter::Damage),
            "no-damage" => Ok(PresenceFilter::NoDamage),
            other => Err(format!(
                "unknown filter '{}', expected all, damage or no-damage",
                other
            )),
        }
    }
}

/// In-memory search over a fetched history.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub query: String,
    pub presence: PresenceFilter,
}

impl HistoryFilter {
    pub fn new(query: impl Into<String>, presence: PresenceFilter) -> Self {
        Self {
            query: query.into(),
            presence,
        }
    }

    /// An empty query matches everything; otherwise some finding's location
    /// has to contain it, ignoring case.
    pub fn matches(&self, analysis: &DamageAnalysis) -> bool {
        let query = self.query.to_lowercase();
        let matches_search = query.is_empty()
            || analysis
                .damage_type
                .iter()
                .any(|finding| finding.location.to_lowercase().contains(&query));

        matches_search && self.presence.admits(analysis)
    }

    pub fn apply<'a>(&self, history: &'a [DamageAnalysis]) -> Vec<&'a DamageAnalysis> {
        history.iter().filter(|a| self.matches(a)).collect()
    }
}
