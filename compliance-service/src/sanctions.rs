use crate::error::{ComplianceError, Result};
use crate::types::{DenyEntry, SanctionsList};
use chrono::Utc;
use dashmap::DashMap;
use remittance_core::{ComplianceOracle, Principal};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// SanctionsScreener holds deny-lists and screens remittance senders against them
#[derive(Debug, Clone, Default)]
pub struct SanctionsScreener {
    // Map: list_name -> (normalized principal -> DenyEntry)
    lists: Arc<DashMap<String, DashMap<String, DenyEntry>>>,
}

#[derive(Deserialize)]
struct ImportRecord {
    principal: String,
    #[serde(default)]
    reason: Option<String>,
}

impl SanctionsScreener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of one list
    pub fn load_list(&self, list: SanctionsList, entries: Vec<DenyEntry>) -> Result<usize> {
        let map = DashMap::new();
        for mut entry in entries {
            let key = Self::normalize(&entry.principal)?;
            entry.list = list.clone();
            map.insert(key, entry);
        }

        let count = map.len();
        self.lists.insert(list.as_str().to_string(), map);
        info!("Loaded {} sanctions list with {} entries", list, count);

        Ok(count)
    }

    /// Replace one list from a JSON array of `{ "principal", "reason"? }` records
    pub fn load_json(&self, list: SanctionsList, json: &str) -> Result<usize> {
        let records: Vec<ImportRecord> = serde_json::from_str(json)?;
        let listed_at = Utc::now();
        let entries = records
            .into_iter()
            .map(|r| DenyEntry {
                principal: r.principal,
                list: list.clone(),
                reason: r.reason,
                listed_at,
            })
            .collect();

        self.load_list(list, entries)
    }

    /// Add a single entry, creating its list if needed
    pub fn add_entry(&self, entry: DenyEntry) -> Result<()> {
        let key = Self::normalize(&entry.principal)?;
        debug!(list = %entry.list, principal = %entry.principal, "Adding deny entry");

        self.lists
            .entry(entry.list.as_str().to_string())
            .or_default()
            .insert(key, entry);
        Ok(())
    }

    /// Remove a principal from one list
    pub fn remove_entry(&self, list: &SanctionsList, principal: &str) -> Result<DenyEntry> {
        let key = Self::normalize(principal)?;
        let entries = self
            .lists
            .get(list.as_str())
            .ok_or_else(|| ComplianceError::ListNotLoaded(list.to_string()))?;

        entries
            .remove(&key)
            .map(|(_, entry)| entry)
            .ok_or_else(|| ComplianceError::EntryNotFound {
                list: list.to_string(),
                principal: principal.to_string(),
            })
    }

    /// Entries of one list, sorted by principal
    pub fn entries(&self, list: &SanctionsList) -> Result<Vec<DenyEntry>> {
        let entries = self
            .lists
            .get(list.as_str())
            .ok_or_else(|| ComplianceError::ListNotLoaded(list.to_string()))?;

        let mut out: Vec<DenyEntry> = entries.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| a.principal.cmp(&b.principal));
        Ok(out)
    }

    /// Every listing of `principal`, one per list it appears on
    pub fn matches(&self, principal: &str) -> Vec<DenyEntry> {
        let Ok(key) = Self::normalize(principal) else {
            return Vec::new();
        };

        self.lists
            .iter()
            .filter_map(|list| list.value().get(&key).map(|e| e.value().clone()))
            .collect()
    }

    pub fn is_denied(&self, principal: &str) -> bool {
        let Ok(key) = Self::normalize(principal) else {
            return false;
        };
        self.lists.iter().any(|list| list.value().contains_key(&key))
    }

    /// Get total number of entries across all lists
    pub fn total_entries(&self) -> usize {
        self.lists.iter().map(|l| l.value().len()).sum()
    }

    /// Get list of loaded sanctions lists
    pub fn loaded_lists(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lists.iter().map(|l| l.key().clone()).collect();
        names.sort();
        names
    }

    // Principals compare case-insensitively, surrounding whitespace ignored
    fn normalize(principal: &str) -> Result<String> {
        let trimmed = principal.trim();
        if trimmed.is_empty() {
            return Err(ComplianceError::InvalidInput("empty principal".to_string()));
        }
        Ok(trimmed.to_uppercase())
    }
}

impl ComplianceOracle for SanctionsScreener {
    fn check(&self, principal: &Principal) -> bool {
        let hits = self.matches(principal.as_str());
        if hits.is_empty() {
            return true;
        }

        let lists: Vec<&str> = hits.iter().map(|e| e.list.as_str()).collect();
        warn!(principal = %principal, lists = ?lists, "Sanctions match found");
        false
    }
}
