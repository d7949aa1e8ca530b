/// Selects the candidate with the highest score.
///
/// The candidates must be given in ascending identifier order. A candidate only
/// replaces the current best one if its score is strictly greater, so a tie is
/// always won by the smallest identifier. Scores are compared exactly, without
/// any tolerance.
///
/// Returns `None` if there is no candidate.
///
/// ```
/// use vote_tally::tiebreak::argmax_first;
///
/// let scores = vec![("a", 2.0), ("b", 3.5), ("c", 3.5)];
/// assert_eq!(argmax_first(scores), Some(("b", 3.5)));
/// ```
pub fn argmax_first<K, S, I>(scores: I) -> Option<(K, S)>
where
    S: PartialOrd + Copy,
    I: IntoIterator<Item = (K, S)>,
{
    let mut best: Option<(K, S)> = None;
    for (candidate, score) in scores {
        let is_better = match &best {
            Some((_, best_score)) => score > *best_score,
            None => true,
        };
        if is_better {
            best = Some((candidate, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let scores: Vec<(&str, u64)> = vec![];
        assert_eq!(argmax_first(scores), None);
    }

    #[test]
    fn all_tied() {
        assert_eq!(
            argmax_first(vec![("a", 0u64), ("b", 0), ("c", 0)]),
            Some(("a", 0))
        );
    }

    #[test]
    fn later_strictly_greater_wins() {
        assert_eq!(
            argmax_first(vec![("a", 1.0), ("b", 1.0), ("c", 1.5), ("d", 1.5)]),
            Some(("c", 1.5))
        );
    }

    #[test]
    fn exact_comparison() {
        // 0.1 + 0.2 is not exactly 0.3: the later candidate is strictly better.
        let near = 0.1 + 0.2;
        assert_eq!(argmax_first(vec![("a", 0.3), ("b", near)]), Some(("b", near)));
        assert_eq!(argmax_first(vec![("a", near), ("b", 0.3)]), Some(("a", near)));
    }
}
