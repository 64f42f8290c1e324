use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::db::query::SortField;
use crate::db::{Page, PageSpec, Pagination, SortSpec};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            pagination: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            pagination: None,
            error: Some(message.into()),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paginated(page: Page<T>) -> Self {
        Self {
            success: true,
            data: Some(page.items),
            pagination: Some(page.pagination),
            error: None,
        }
    }
}

/// Paging and sorting parameters shared by every list endpoint.
///
/// Values arrive as strings so that garbage (`?page=abc`) falls back to the
/// defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(alias = "sort_by")]
    pub sort_by: Option<String>,
    #[serde(alias = "sort_order")]
    pub sort_order: Option<String>,
}

impl ListParams {
    #[must_use]
    pub fn page_spec(&self, config: &PaginationConfig) -> PageSpec {
        PageSpec::from_params(self.page.as_deref(), self.limit.as_deref(), config)
    }

    #[must_use]
    pub fn sort_spec<F: SortField>(&self) -> SortSpec<F> {
        SortSpec::parse(self.sort_by.as_deref(), self.sort_order.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnimeListQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub genre: Option<String>,
    pub studio: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub role: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchlistQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub token: String,
}
