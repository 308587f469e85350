//! Pagination of listings.

/// Page size used when the caller asks for zero or a negative size.
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Cut page `page` (1-based) of `per_page` items out of `items`.
///
/// Returns the total count alongside the window. Non-positive `page` means
/// the first page, non-positive `per_page` means [`DEFAULT_PER_PAGE`]; pages
/// past the end are empty. Item order is kept.
pub fn paginate<T>(items: Vec<T>, page: i64, per_page: i64) -> (usize, Vec<T>) {
    let page = if page <= 0 { 1 } else { page };
    let per_page = if per_page <= 0 {
        DEFAULT_PER_PAGE
    } else {
        per_page
    };

    let total = items.len();
    let start = (page - 1).saturating_mul(per_page);
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    if start > total {
        return (total, Vec::new());
    }
    let per_page = usize::try_from(per_page).unwrap_or(usize::MAX);
    let window = items.into_iter().skip(start).take(per_page).collect();
    (total, window)
}
