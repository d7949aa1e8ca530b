use std::collections::{BTreeMap, BTreeSet};

/// Expands a score ballot into approval ballots (Kotze-Pereira transform).
///
/// There is one approval ballot per threshold between `min_rating` and `max_rating`,
/// in increasing order. The ballot for threshold `i` approves all the options rated
/// at least `i`. An option rated `r` is then approved by `r - min_rating + 1` of
/// them, and unrated options are never approved.
///
/// ```
/// use std::collections::BTreeMap;
/// use vote_tally::kotze_pereira::expand;
///
/// let ratings: BTreeMap<String, i64> = [("A".to_string(), 2), ("B".to_string(), 0)].into();
/// let vbs = expand(&ratings, 0, 2);
/// assert_eq!(vbs.len(), 3);
/// assert!(vbs[0].contains("A") && vbs[0].contains("B"));
/// assert!(vbs[2].contains("A") && !vbs[2].contains("B"));
/// ```
pub fn expand<K>(ratings: &BTreeMap<K, i64>, min_rating: i64, max_rating: i64) -> Vec<BTreeSet<K>>
where
    K: Ord + Clone,
{
    (min_rating..=max_rating)
        .map(|threshold| {
            ratings
                .iter()
                .filter(|&(_, &rating)| rating >= threshold)
                .map(|(option, _)| option.clone())
                .collect()
        })
        .collect()
}
