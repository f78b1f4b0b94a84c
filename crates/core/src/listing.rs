//! List operations over rows already fetched from the EMR.

use crate::constants::MAX_PAGE_SIZE;
use crate::{ClinicError, ClinicResult};
use serde::Serialize;

/// One page of a list, with enough context to render pagination controls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned (after clamping).
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into a page.
///
/// Pages are 1-based. A page beyond the end is clamped to the last page and page 0 is treated as
/// page 1. `page_size` is capped at [`MAX_PAGE_SIZE`]. An empty list yields a single empty page.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if `page_size` is zero.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> ClinicResult<Page<T>> {
    if page_size == 0 {
        return Err(ClinicError::InvalidInput(
            "page size must be at least 1".into(),
        ));
    }
    let page_size = page_size.min(MAX_PAGE_SIZE);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Ok(Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    })
}

/// Keep the items whose text contains `query`, ignoring case. A blank query keeps everything.
pub fn filter_text<T>(items: Vec<T>, query: &str, text_of: impl Fn(&T) -> String) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| text_of(item).to_lowercase().contains(&needle))
        .collect()
}
