//! Page envelope for query results.

use serde::{Deserialize, Serialize};

/// A page of records plus the totals a client needs to keep paging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub records: Vec<T>,
}

impl<T> Paginated<T> {
    /// Slice one page out of an already-sorted collection. Pages are
    /// 1-based; out-of-range pages yield an empty record list with the
    /// full total preserved.
    #[must_use]
    pub fn paginate(records: Vec<T>, page: usize, per_page: usize) -> Self {
        let total = records.len();
        let skip = page.saturating_sub(1).saturating_mul(per_page);
        let records = records.into_iter().skip(skip).take(per_page).collect();
        Self {
            total,
            page,
            per_page,
            records,
        }
    }

    /// Wrap records that were already cut to one page, with `total`
    /// counted over the whole collection.
    #[must_use]
    pub fn from_page(records: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        Self {
            total,
            page,
            per_page,
            records,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginates_one_based() {
        let page = Paginated::paginate((1..=5).collect::<Vec<_>>(), 2, 2);
        assert_eq!(page.records, vec![3, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
    }

    #[test]
    fn out_of_range_page_is_empty_with_total() {
        let page = Paginated::paginate(vec![1, 2, 3], 9, 10);
        assert!(page.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn page_zero_behaves_like_page_one() {
        let page = Paginated::paginate(vec![1, 2, 3], 0, 2);
        assert_eq!(page.records, vec![1, 2]);
    }

    #[test]
    fn serde_emits_camel_case() {
        let page = Paginated::paginate(vec![1], 1, 20);
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"perPage\":20"));
    }
}
