use crate::common::SortOrder;
use crate::store::FindOptions;

/// Skip and limit of one page of results.
///
/// Two page-index conventions exist side by side. [`Paging::one_based`] backs
/// `find_page`, where page 1 is the first page. [`Paging::zero_based`] backs
/// `find_all_page`, where page 0 is the first page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paging {
    skip: u64,
    limit: u64,
}

impl Paging {
    /// Page `page_index` counted from 1. Page 0 is treated as page 1.
    pub fn one_based(page_index: u64, page_size: u64) -> Paging {
        Paging {
            skip: page_index.saturating_sub(1).saturating_mul(page_size),
            limit: page_size,
        }
    }

    /// Page `page_index` counted from 0.
    pub fn zero_based(page_index: u64, page_size: u64) -> Paging {
        Paging {
            skip: page_index.saturating_mul(page_size),
            limit: page_size,
        }
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Find options for this page, sorted by `order_field`.
    pub fn find_options(&self, order_field: &str, is_descending: bool) -> FindOptions {
        FindOptions::new()
            .sort_by(order_field, SortOrder::from_descending(is_descending))
            .skip(self.skip)
            .limit(self.limit)
    }
}
