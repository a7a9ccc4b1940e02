//! HTTP handlers, one module per platform area

pub mod assessments;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod emails;
pub mod health;
pub mod organizations;
pub mod pdi;
pub mod recruiting;
pub mod reports;
pub mod webhooks;
pub mod workforce;

use serde::Deserialize;

use tala_shared::constants::DEFAULT_PAGE_SIZE;
use tala_shared::types::Pagination;

/// Common `?page=&per_page=` listing parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1),
            per_page: self.per_page.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}
