use scribe_core::DigestBudget;

/// Share of the total budget, in fifths, available for diff content. The
/// remaining fifth is reserved for headers, statistics and grouping text.
const CONTENT_FIFTHS: usize = 4;

/// Split `total_budget` evenly across `file_count` files.
///
/// 80% of the total is divided equally regardless of individual file size,
/// so no file can starve another. Division truncates toward zero; a
/// per-file budget of zero is valid and pushes every file onto the most
/// aggressive truncation path. A `file_count` of zero yields zero.
///
/// # Examples
///
/// ```
/// use scribe_digest::budget::allocate;
///
/// let budget = allocate(40, 10);
/// assert_eq!(budget.per_file, 3);
/// assert_eq!(budget.char_budget(), 12);
///
/// assert_eq!(allocate(1000, 1).per_file, 800);
/// ```
pub fn allocate(total_budget: usize, file_count: usize) -> DigestBudget {
    let per_file = content_budget(total_budget)
        .checked_div(file_count)
        .unwrap_or(0);

    DigestBudget {
        total: total_budget,
        file_count,
        per_file,
    }
}

/// `floor(total * 0.8)` without overflowing for large totals.
fn content_budget(total: usize) -> usize {
    total / 5 * CONTENT_FIFTHS + total % 5 * CONTENT_FIFTHS / 5
}
