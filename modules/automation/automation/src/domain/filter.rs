//! Whitelist-driven translation of request parameters into a [`ListQuery`].
//!
//! Every listable resource has a static [`FilterSpec`] naming the parameters
//! it accepts. Anything outside the whitelist is ignored. Authorization is
//! not consulted here.

use std::collections::HashSet;

use thiserror::Error;

use super::repo::{Condition, Filter, ListQuery, Sort};

pub const ORDER_BY: &str = "order_by";

/// Maps a caller-visible parameter to a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub param: &'static str,
    pub field: &'static str,
}

const fn same(name: &'static str) -> FieldMapping {
    FieldMapping {
        param: name,
        field: name,
    }
}

const fn mapped(param: &'static str, field: &'static str) -> FieldMapping {
    FieldMapping { param, field }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub resource: &'static str,
    pub exact: &'static [FieldMapping],
    pub substring: &'static [FieldMapping],
    pub order_by: &'static [FieldMapping],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterSpecError {
    #[error("{resource}: empty parameter or field name")]
    EmptyName { resource: &'static str },

    #[error("{resource}: parameter '{param}' declared twice")]
    DuplicateParam {
        resource: &'static str,
        param: &'static str,
    },
}

pub const ORGANIZATIONS: FilterSpec = FilterSpec {
    resource: "organizations",
    exact: &[],
    substring: &[same("name"), same("description")],
    order_by: &[same("name"), same("created"), same("modified")],
};

pub const TEAMS: FilterSpec = FilterSpec {
    resource: "teams",
    exact: &[mapped("organization", "organization_id")],
    substring: &const { [same("name")] },
    order_by: &[same("name"), same("created")],
};

pub const PROJECTS: FilterSpec = FilterSpec {
    resource: "projects",
    exact: &[mapped("type", "scm_type"), same("status")],
    substring: &const { [same("name")] },
    order_by: &[
        same("name"),
        same("created"),
        same("modified"),
        mapped("organization", "organization_id"),
    ],
};

pub const INVENTORIES: FilterSpec = FilterSpec {
    resource: "inventories",
    exact: &[
        mapped("organization", "organization_id"),
        same("has_active_failures"),
    ],
    substring: &const { [same("name")] },
    order_by: &[same("name"), same("created")],
};

pub const JOBS: FilterSpec = FilterSpec {
    resource: "jobs",
    exact: &[
        same("status"),
        mapped("type", "job_type"),
        same("failed"),
        mapped("project", "project_id"),
    ],
    substring: &[same("id"), same("name")],
    order_by: &[
        same("name"),
        same("created"),
        same("status"),
        same("started"),
        same("finished"),
    ],
};

/// Every table the module serves, checked once at start-up.
pub const ALL: [&FilterSpec; 5] = [&ORGANIZATIONS, &TEAMS, &PROJECTS, &INVENTORIES, &JOBS];

impl FilterSpec {
    /// Check the table is well formed.
    ///
    /// # Errors
    /// Returns [`FilterSpecError`] on an empty name or a parameter declared
    /// twice among the match fields or among the sort fields.
    pub fn validate(&self) -> Result<(), FilterSpecError> {
        let resource = self.resource;
        let empty_name = self
            .exact
            .iter()
            .chain(self.substring)
            .chain(self.order_by)
            .any(|m| m.param.is_empty() || m.field.is_empty());
        if resource.is_empty() || empty_name {
            return Err(FilterSpecError::EmptyName { resource });
        }

        let mut seen = HashSet::new();
        for m in self.exact.iter().chain(self.substring) {
            if !seen.insert(m.param) {
                return Err(FilterSpecError::DuplicateParam {
                    resource,
                    param: m.param,
                });
            }
        }

        let mut seen = HashSet::new();
        for m in self.order_by {
            if !seen.insert(m.param) {
                return Err(FilterSpecError::DuplicateParam {
                    resource,
                    param: m.param,
                });
            }
        }
        Ok(())
    }

    /// Translate request parameters. The first non-empty occurrence of a
    /// parameter wins.
    #[must_use]
    pub fn translate(&self, params: &[(String, String)]) -> ListQuery {
        let mut filter = Filter::new();

        for m in self.exact {
            if let Some(value) = first(params, m.param) {
                filter.push(Condition::Equals {
                    field: m.field,
                    value: value.to_owned(),
                });
            }
        }
        for m in self.substring {
            if let Some(value) = first(params, m.param) {
                filter.push(Condition::Contains {
                    field: m.field,
                    value: value.to_owned(),
                });
            }
        }

        let sort = first(params, ORDER_BY).and_then(|raw| self.sort_for(raw));
        ListQuery { filter, sort }
    }

    fn sort_for(&self, raw: &str) -> Option<Sort> {
        let (name, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        self.order_by
            .iter()
            .find(|m| m.param == name)
            .map(|m| Sort {
                field: m.field,
                descending,
            })
    }
}

fn first<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}
