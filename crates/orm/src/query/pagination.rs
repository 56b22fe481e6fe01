//! Query Builder pagination operations

use serde_json::{json, Value};

use super::builder::QueryBuilder;
use crate::collection::Collection;
use crate::error::{ModelError, OrmResult};
use crate::model::{Entity, Record};

impl<M> QueryBuilder<M> {
    /// Add LIMIT clause
    pub fn limit(mut self, count: u64) -> Self {
        self.state.limit = Some(count);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, count: u64) -> Self {
        self.state.offset = Some(count);
        self
    }

    pub fn take(self, count: u64) -> Self {
        self.limit(count)
    }

    pub fn skip(self, count: u64) -> Self {
        self.offset(count)
    }

    /// LIMIT + OFFSET for a 1-based page; pages below 1 are treated as 1.
    /// An offset past `u64::MAX` saturates.
    pub fn for_page(self, page: i64, per_page: u64) -> Self {
        let page = page.max(1) as u64;
        self.limit(per_page).offset((page - 1).saturating_mul(per_page))
    }
}

/// One page of results plus the totals needed to render navigation
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator<M> {
    pub items: Collection<M>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
}

impl<M: AsRef<Record>> Paginator<M> {
    pub fn to_json(&self) -> Value {
        json!({
            "data": self.items.to_json(),
            "total": self.total,
            "per_page": self.per_page,
            "current_page": self.current_page,
            "last_page": self.last_page,
        })
    }
}

impl<M: Entity> QueryBuilder<M> {
    /// Count all matches, then fetch one page of them
    pub async fn paginate(&self, per_page: u64, page: i64) -> OrmResult<Paginator<M>> {
        if per_page == 0 {
            return Err(ModelError::Query("per_page must be at least 1".to_string()));
        }

        let current_page = page.max(1) as u64;
        if (current_page - 1).checked_mul(per_page).is_none() {
            return Err(ModelError::Query(format!(
                "page {} with {} per page is out of range",
                page, per_page
            )));
        }

        let total = self.count().await?;
        let items = self.clone().for_page(page, per_page).get().await?;

        Ok(Paginator {
            items,
            total,
            per_page,
            current_page,
            last_page: total.div_ceil(per_page),
        })
    }
}
