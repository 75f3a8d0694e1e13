//! Query parameters for list endpoints.

use pricing_core::filter::{parse_filters, FilterCriteria};
use pricing_core::query::{
    PageRequest, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, DEFAULT_SORT_ORDER,
};
use serde::Deserialize;

use crate::error::AppResult;

/// `?filters=&searchTerm=&pageNumber=&pageSize=&sortField=&sortOrder=`
///
/// `filters` is a JSON-encoded array of filter criteria.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub filters: Option<String>,
    pub search_term: Option<String>,
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub sort_field: Option<String>,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
}

fn default_page_number() -> i64 {
    DEFAULT_PAGE_NUMBER
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_sort_order() -> String {
    DEFAULT_SORT_ORDER.to_string()
}

impl ListParams {
    /// Validate the page bounds.
    pub fn page(&self) -> AppResult<PageRequest> {
        Ok(PageRequest::new(self.page_number, self.page_size)?)
    }

    /// Decode the `filters` parameter. Absent or blank means no filters.
    pub fn filter_criteria(&self) -> AppResult<Vec<FilterCriteria>> {
        Ok(parse_filters(self.filters.as_deref().unwrap_or_default())?)
    }
}
