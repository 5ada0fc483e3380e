use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SanctionsList {
    OFAC,          // US Office of Foreign Assets Control
    EU,            // European Union
    UN,            // United Nations
    Local(String), // Operator-maintained lists
}

impl SanctionsList {
    pub fn as_str(&self) -> &str {
        match self {
            SanctionsList::OFAC => "OFAC",
            SanctionsList::EU => "EU",
            SanctionsList::UN => "UN",
            SanctionsList::Local(name) => name,
        }
    }
}

impl fmt::Display for SanctionsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A denied principal and where the listing came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenyEntry {
    pub principal: String,
    pub list: SanctionsList,
    #[serde(default)]
    pub reason: Option<String>,
    pub listed_at: DateTime<Utc>,
}

impl DenyEntry {
    pub fn new(principal: impl Into<String>, list: SanctionsList) -> Self {
        Self {
            principal: principal.into(),
            list,
            reason: None,
            listed_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
