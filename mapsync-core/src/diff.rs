//! Sorted-merge set difference between two beatmap libraries.

use std::cmp::Ordering;

use mapsync_types::Beatmap;

/// Return the beatmaps present in `of_interest` but absent (by id) from
/// `other`, preserving `of_interest`'s order.
///
/// Both inputs must be sorted ascending by id; the walk is a single
/// two-cursor pass. Swapping the arguments computes the complementary
/// missing set. Filtering out ignored items is the caller's job, applied
/// to the inputs before calling.
pub fn missing(of_interest: &[Beatmap], other: &[Beatmap]) -> Vec<Beatmap> {
    let mut out = Vec::new();
    let mut l = 0;
    let mut r = 0;

    while l < of_interest.len() && r < other.len() {
        match of_interest[l].id.cmp(&other[r].id) {
            // Id only on the other side: skip it.
            Ordering::Greater => r += 1,
            // Id on both sides.
            Ordering::Equal => {
                l += 1;
                r += 1;
            }
            // Id only on our side: missing over there.
            Ordering::Less => {
                out.push(of_interest[l].clone());
                l += 1;
            }
        }
    }

    // Unmatched tail is missing in full.
    out.extend_from_slice(&of_interest[l..]);
    out
}
