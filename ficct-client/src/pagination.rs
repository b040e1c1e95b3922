//! Pagination helpers
//!
//! List endpoints accept `page`, `per_page` and `search` and answer with
//! `{data, current_page, last_page, per_page, total}`. Small lists that the
//! backend returns whole are paged locally with [`paginate`].

use crate::envelope::PaginationMeta;
use serde::{Deserialize, Serialize};

/// Query parameters understood by paginated list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

impl PageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Search term; blank terms are dropped
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term.trim().to_string())
        };
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page".to_string(), per_page.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        pairs
    }
}

/// One page of a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

impl<T> Paginated<T> {
    /// A complete list presented as a single page
    pub fn single_page(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Self {
            per_page: data.len() as u32,
            data,
            current_page: 1,
            last_page: 1,
            total,
        }
    }

    pub fn from_meta(data: Vec<T>, meta: &PaginationMeta) -> Self {
        Self {
            data,
            current_page: meta.current_page.max(1),
            last_page: meta.last_page.max(1),
            per_page: meta.per_page,
            total: meta.total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

/// Slice a local list into a page; pages are 1-based and clamped into range
pub fn paginate<T: Clone>(items: &[T], page: u32, per_page: u32) -> Paginated<T> {
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let last_page = (items.len() as u32).div_ceil(per_page).max(1);
    let current_page = page.clamp(1, last_page);

    let start = ((current_page - 1) * per_page) as usize;
    let end = (start + per_page as usize).min(items.len());
    let data = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Paginated {
        data,
        current_page,
        last_page,
        per_page,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs() {
        let query = PageQuery::new().page(2).per_page(15).search("  garcía ");
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "15".to_string()),
                ("search".to_string(), "garcía".to_string()),
            ]
        );
        assert!(PageQuery::new().search("   ").to_pairs().is_empty());
    }

    #[test]
    fn test_paginate_middle_and_last_pages() {
        let items: Vec<u32> = (1..=23).collect();

        let page = paginate(&items, 2, 10);
        assert_eq!(page.data, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 23);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last = paginate(&items, 3, 10);
        assert_eq!(last.data, vec![21, 22, 23]);
        assert!(!last.has_next());
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let items = vec!["a", "b", "c"];
        assert_eq!(paginate(&items, 0, 2).current_page, 1);
        assert_eq!(paginate(&items, 9, 2).current_page, 2);
        assert_eq!(paginate(&items, 1, 0).per_page, 1);
    }

    #[test]
    fn test_paginate_empty_list() {
        let page = paginate::<u8>(&[], 4, 10);
        assert!(page.data.is_empty());
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_paginator_deserializes_with_missing_fields() {
        let page: Paginated<u8> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.data, vec![1, 2]);
    }
}
