//! Common types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EntityId = Uuid;

pub fn new_id() -> EntityId {
    Uuid::new_v4()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, per_page: super::constants::DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Clamps `per_page` to the allowed maximum and floors `page` at 1.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, super::constants::MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        ((self.page.max(1) - 1) * self.per_page) as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<EntityId>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<EntityId>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<EntityId>,
}

impl Default for AuditFields {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            created_by: None,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offset_starts_at_zero() {
        let p = Pagination { page: 1, per_page: 20 };
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn pagination_clamps_out_of_range_values() {
        let p = Pagination { page: 0, per_page: 5000 }.clamped();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, super::super::constants::MAX_PAGE_SIZE);
    }
}
