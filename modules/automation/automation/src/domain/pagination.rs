//! Windowing of an already authorization-filtered result set.
//!
//! `count` is always the post-filter total. An out-of-range page on a
//! non-empty set is an error; any page of an empty set is an empty envelope.

use automation_sdk::models::Page;
use thiserror::Error;

use super::error::DomainError;

pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "page_size";

/// Configured page-size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Read `page` and `page_size` from request parameters.
    ///
    /// # Errors
    /// Returns a validation error when either value is not a non-negative
    /// integer or `page_size` is zero.
    pub fn parse(params: &[(String, String)], limits: PageLimits) -> Result<Self, DomainError> {
        let page = match value(params, PAGE) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| DomainError::validation(format!("Invalid page '{raw}'.")))?,
            None => 1,
        };
        let page_size = match value(params, PAGE_SIZE) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(DomainError::validation(format!(
                        "Invalid page_size '{raw}'."
                    )));
                }
                Ok(n) => n.min(limits.max_page_size),
            },
            None => limits.default_page_size,
        };
        Ok(Self { page, page_size })
    }
}

fn value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid page {page}: That page contains no results.")]
pub struct InvalidPage {
    pub page: usize,
}

/// Builds page windows and their `next` / `previous` links for one request.
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'a> {
    path: &'a str,
    params: &'a [(String, String)],
}

impl<'a> Paginator<'a> {
    /// `path` is the absolute request path; `params` the original query parameters.
    #[must_use]
    pub fn new(path: &'a str, params: &'a [(String, String)]) -> Self {
        Self { path, params }
    }

    /// Slice `items` to the requested page.
    ///
    /// # Errors
    /// Returns [`InvalidPage`] when the set is non-empty and `page` lies
    /// outside `1..=ceil(total / page_size)`.
    pub fn window<T>(&self, items: Vec<T>, req: PageRequest) -> Result<Page<T>, InvalidPage> {
        let total = items.len();
        if total == 0 {
            return Ok(Page::empty());
        }

        let last = total.div_ceil(req.page_size);
        if req.page == 0 || req.page > last {
            return Err(InvalidPage { page: req.page });
        }

        let start = (req.page - 1).saturating_mul(req.page_size);
        let results = items.into_iter().skip(start).take(req.page_size).collect();

        Ok(Page {
            count: total,
            next: (req.page < last).then(|| self.link(req.page + 1)),
            previous: (req.page > 1).then(|| self.link(req.page - 1)),
            results,
        })
    }

    fn link(&self, page: usize) -> String {
        let mut pairs: Vec<(&str, String)> = self
            .params
            .iter()
            .filter(|(k, _)| k != PAGE)
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        pairs.push((PAGE, page.to_string()));
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        match serde_urlencoded::to_string(&pairs) {
            Ok(query) => format!("{}?{query}", self.path),
            Err(_) => self.path.to_owned(),
        }
    }
}
