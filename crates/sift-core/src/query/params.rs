//! Request boundary normalization
//!
//! External callers page 1-based, may omit anything and may ask for huge
//! pages. [`SearchParams::normalize`] turns that into the validated,
//! zero-based tuple the query core works with.

use serde::{Deserialize, Serialize};

use super::SearchMode;
use super::sort::{SortDirective, SortRegistry};
use crate::error::{Error, Result};

/// Defaults and caps applied at the request boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDefaults {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Sort-type token used when the caller gives none (e.g. `ID`)
    pub default_sort: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            default_page_size: 5,
            max_page_size: 30,
            default_sort: "ID".to_string(),
        }
    }
}

/// Raw search input as received from an outer layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// 1-based page number
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub kw: Option<String>,
    pub kw_type: Option<String>,
    /// Sort-type tokens such as `ID` or `USERNAME_ASC`
    #[serde(default)]
    pub sort: Vec<String>,
}

/// Normalized search tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest<M> {
    pub mode: M,
    pub keyword: String,
    pub sort: Vec<SortDirective>,
    pub page_index: u32,
    pub page_size: u32,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn keyword(mut self, kw: impl Into<String>) -> Self {
        self.kw = Some(kw.into());
        self
    }

    pub fn kw_type(mut self, kw_type: impl Into<String>) -> Self {
        self.kw_type = Some(kw_type.into());
        self
    }

    pub fn sort(mut self, sort_type: impl Into<String>) -> Self {
        self.sort.push(sort_type.into());
        self
    }

    /// Apply defaults and clamps, parse the mode and sort-type tokens
    ///
    /// - `page` → `max(page, 1) - 1`
    /// - `page_size` → clamped to `1..=max_page_size`
    /// - an unknown `kw_type` is [`Error::InvalidSearchMode`]
    /// - unknown sort keys are kept; the registry drops them
    pub fn normalize<M: SearchMode>(
        &self,
        registry: &SortRegistry<M::Field>,
        defaults: &SearchDefaults,
    ) -> Result<SearchRequest<M>> {
        if defaults.max_page_size == 0 {
            return Err(Error::ConfigError(
                "search.max_page_size must be greater than zero".to_string(),
            ));
        }

        let mode = match self.kw_type.as_deref().map(str::trim) {
            None | Some("") => M::default(),
            Some(token) => token.parse::<M>()?,
        };

        let page = self.page.unwrap_or(1).max(1) - 1;
        let page_index = u32::try_from(page).unwrap_or(u32::MAX);

        let max = i64::from(defaults.max_page_size);
        let page_size = self
            .page_size
            .unwrap_or_else(|| i64::from(defaults.default_page_size))
            .clamp(1, max) as u32;

        let sort = if self.sort.is_empty() {
            vec![registry.parse_sort_type(&defaults.default_sort)]
        } else {
            self.sort
                .iter()
                .map(|token| registry.parse_sort_type(token))
                .collect()
        };

        Ok(SearchRequest {
            mode,
            keyword: self.kw.clone().unwrap_or_default(),
            sort,
            page_index,
            page_size,
        })
    }
}
