//! Page slicing shared by the rate table and the amortization schedule.

use serde::{Deserialize, Serialize};

use crate::error::FxLoanError;
use crate::FxLoanResult;

/// One page of an ordered row sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based page number that was requested.
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// `ceil(total_items / per_page)`; zero items means zero pages.
pub fn total_pages(total_items: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total_items.div_ceil(per_page)
}

/// Return rows `[(page - 1) * per_page, page * per_page)`, clipped to the slice.
///
/// Pages past the end yield an empty `items` vector rather than an error.
pub fn paginate<T: Clone>(rows: &[T], page: usize, per_page: usize) -> FxLoanResult<Page<T>> {
    if page == 0 {
        return Err(FxLoanError::InvalidInput {
            field: "page".into(),
            reason: "Page numbers start at 1".into(),
        });
    }
    if per_page == 0 {
        return Err(FxLoanError::InvalidInput {
            field: "per_page".into(),
            reason: "Page size must be at least 1".into(),
        });
    }

    let start = (page - 1).saturating_mul(per_page).min(rows.len());
    let end = page.saturating_mul(per_page).min(rows.len());

    Ok(Page {
        page,
        per_page,
        total_pages: total_pages(rows.len(), per_page),
        total_items: rows.len(),
        items: rows[start..end].to_vec(),
    })
}
