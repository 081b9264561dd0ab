use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pagination::PageLimits;

fn default_page_size() -> usize {
    25
}

fn default_max_page_size() -> usize {
    200
}

fn default_projects_home() -> String {
    "/var/lib/conductor/projects".to_owned()
}

fn default_sync_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

/// Configuration for the automation module
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Parent directory of every project working directory.
    #[serde(default = "default_projects_home")]
    pub projects_home: String,
    #[serde(default = "default_sync_workers")]
    pub sync_workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub sync_queue_capacity: usize,
    #[serde(default = "default_queue_capacity")]
    pub cleanup_queue_capacity: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            projects_home: default_projects_home(),
            sync_workers: default_sync_workers(),
            sync_queue_capacity: default_queue_capacity(),
            cleanup_queue_capacity: default_queue_capacity(),
        }
    }
}

impl AutomationConfig {
    /// Reject settings the module cannot start with.
    ///
    /// # Errors
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_page_size == 0 {
            return Err("default_page_size must be at least 1".to_owned());
        }
        if self.max_page_size < self.default_page_size {
            return Err(format!(
                "max_page_size ({}) is smaller than default_page_size ({})",
                self.max_page_size, self.default_page_size
            ));
        }
        if self.projects_home.trim().is_empty() {
            return Err("projects_home must not be empty".to_owned());
        }
        if self.sync_workers == 0 {
            return Err("sync_workers must be at least 1".to_owned());
        }
        Ok(())
    }

    #[must_use]
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}

/// Records created at start-up so a fresh server has something to act on.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SeedConfig {
    pub users: Vec<SeedUser>,
    pub organizations: Vec<SeedOrganization>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOrganization {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Users granted `admin` on the organization record.
    #[serde(default)]
    pub admins: Vec<Uuid>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: AutomationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.default_page_size, 25);
        assert_eq!(cfg.max_page_size, 200);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<AutomationConfig, _> = serde_json::from_str(r#"{"page_sise": 10}"#);
        assert!(res.is_err());
    }

    #[test]
    fn max_below_default_is_invalid() {
        let cfg = AutomationConfig {
            default_page_size: 50,
            max_page_size: 10,
            ..AutomationConfig::default()
        };
        assert!(cfg.validate().unwrap_err().contains("max_page_size"));
    }
}
