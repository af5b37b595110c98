//! Partial selection of the most active users.
//!
//! Selecting the `k` largest totals out of `n` records only needs `k` passes
//! of a linear maximum search, which beats sorting the whole registry when
//! `k` is much smaller than `n` (the usual case: a handful of users out of
//! thousands).

use crate::model::UserRecord;

/// Index of the record with the largest total in `records[from..]`.
///
/// Ties are resolved in favor of the left-most record: the scan only moves
/// to a later record when its total is strictly greater.
///
/// # Panics
///
/// Panics if `from >= records.len()`.
pub fn index_of_max(records: &[UserRecord], from: usize) -> usize {
    let mut max_index = from;
    let mut max_total = records[from].total_count();
    for (index, record) in records.iter().enumerate().skip(from + 1) {
        let total = record.total_count();
        if total > max_total {
            max_index = index;
            max_total = total;
        }
    }
    max_index
}

/// Move the `min(k, records.len())` records with the largest totals to the
/// front of `records`, in decreasing order of total.
///
/// Slot `i` receives the left-most maximum of `records[i..]` as it stands
/// when the slot is filled; the displaced record takes the maximum's old
/// place. Records past the selected prefix end up in no particular order.
pub fn select_top(records: &mut [UserRecord], k: usize) {
    for i in 0..k.min(records.len()) {
        let max_index = index_of_max(records, i);
        records.swap(i, max_index);
    }
}

/// Run [`select_top`] and return the selected prefix.
pub fn top_k(records: &mut [UserRecord], k: usize) -> &[UserRecord] {
    select_top(records, k);
    &records[..k.min(records.len())]
}
