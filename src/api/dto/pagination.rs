//! Pagination query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

/// `?page=N` query parameter. Page size is fixed per resource.
///
/// Uses `serde_with` to parse page numbers from query strings as integers.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,
}

impl PageParams {
    /// Requested page, 1 when absent.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}
