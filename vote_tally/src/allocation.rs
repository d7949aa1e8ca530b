// Sequential proportional allocation of seats over approval ballots.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use crate::tiebreak::argmax_first;

/// The scores of the candidates in the running when one seat was filled.
#[derive(PartialEq, Debug, Clone)]
pub(crate) struct SeatRound<K> {
    /// Number of the seat, starting at 1. Seats held before the allocation count.
    pub(crate) seat: usize,
    /// Sorted by candidate.
    pub(crate) tally: Vec<(K, f64)>,
    pub(crate) elected: K,
}

/// Fills seats one at a time over approval ballots.
///
/// Each approval ballot weighs `1 / (1 + e)` where `e` is the number of candidates
/// it approves that are already elected. The candidate with the largest sum of
/// weights takes the next seat, ties going to the smallest candidate. The scores
/// are computed again from scratch for every seat.
///
/// Arguments:
/// * `virtual_ballots` the approval ballots, usually built with [crate::kotze_pereira::expand]
/// * `candidates` the candidates that may be elected
/// * `seats` the total number of seats, including the ones in `already_elected`
/// * `already_elected` candidates that hold a seat before the allocation starts. They
/// discount the ballots approving them.
///
/// Returns all the elected candidates, starting with `already_elected`, in the order
/// the seats were filled. There are fewer than `seats` if there are not enough
/// candidates.
pub fn allocate_seats<K>(
    virtual_ballots: &[BTreeSet<K>],
    candidates: &[K],
    seats: usize,
    already_elected: &[K],
) -> Vec<K>
where
    K: Ord + Clone + Debug,
{
    allocate_rounds(virtual_ballots, candidates, seats, already_elected).0
}

pub(crate) fn allocate_rounds<K>(
    virtual_ballots: &[BTreeSet<K>],
    candidates: &[K],
    seats: usize,
    already_elected: &[K],
) -> (Vec<K>, Vec<SeatRound<K>>)
where
    K: Ord + Clone + Debug,
{
    let mut elected: Vec<K> = already_elected.to_vec();
    let mut elected_set: BTreeSet<K> = elected.iter().cloned().collect();
    // Iterating over the pool goes through the candidates in ascending order.
    let mut pool: BTreeSet<K> = candidates
        .iter()
        .filter(|c| !elected_set.contains(*c))
        .cloned()
        .collect();
    let mut rounds: Vec<SeatRound<K>> = Vec::new();

    while elected.len() < seats {
        let tally = seat_tally(virtual_ballots, &pool, &elected_set);
        let winner = match argmax_first(tally.iter().map(|(c, score)| (c, *score))) {
            Some((c, _)) => c.clone(),
            None => {
                debug!(
                    "allocate_rounds: no candidate left for seat {}",
                    elected.len() + 1
                );
                break;
            }
        };
        debug!(
            "allocate_rounds: seat {}: tally: {:?} elected: {:?}",
            elected.len() + 1,
            tally,
            winner
        );
        pool.remove(&winner);
        elected_set.insert(winner.clone());
        elected.push(winner.clone());
        rounds.push(SeatRound {
            seat: elected.len(),
            tally,
            elected: winner,
        });
    }
    (elected, rounds)
}

fn seat_tally<K>(
    virtual_ballots: &[BTreeSet<K>],
    pool: &BTreeSet<K>,
    elected: &BTreeSet<K>,
) -> Vec<(K, f64)>
where
    K: Ord + Clone,
{
    let mut scores: BTreeMap<K, f64> = pool.iter().map(|c| (c.clone(), 0.0)).collect();
    for vb in virtual_ballots.iter() {
        let already_elected = vb.iter().filter(|c| elected.contains(*c)).count();
        let weight = 1.0 / (1.0 + already_elected as f64);
        for c in vb.iter() {
            if let Some(score) = scores.get_mut(c) {
                *score += weight;
            }
        }
    }
    scores.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vb(ids: &[&'static str]) -> BTreeSet<&'static str> {
        ids.iter().cloned().collect()
    }

    fn repeat(ids: &[&'static str], n: usize) -> Vec<BTreeSet<&'static str>> {
        (0..n).map(|_| vb(ids)).collect()
    }

    #[test]
    fn single_seat_is_plain_approval() {
        let mut vbs = repeat(&["a", "b"], 3);
        vbs.extend(repeat(&["b"], 1));
        assert_eq!(allocate_seats(&vbs, &["a", "b", "c"], 1, &[]), vec!["b"]);
    }

    #[test]
    fn second_seat_goes_to_the_minority() {
        // 6 voters approve a and b, 4 voters approve c.
        let mut vbs = repeat(&["a", "b"], 6);
        vbs.extend(repeat(&["c"], 4));
        // b: 6 / 2 = 3 < c: 4
        assert_eq!(
            allocate_seats(&vbs, &["a", "b", "c"], 2, &[]),
            vec!["a", "c"]
        );
    }

    #[test]
    fn weights_decay_harmonically() {
        let vbs = repeat(&["a", "b", "c"], 6);
        let (elected, rounds) = allocate_rounds(&vbs, &["a", "b", "c"], 3, &[]);
        assert_eq!(elected, vec!["a", "b", "c"]);
        assert_eq!(rounds[0].tally, vec![("a", 6.0), ("b", 6.0), ("c", 6.0)]);
        // Six halves add up exactly, six thirds do not.
        assert_eq!(rounds[1].tally, vec![("b", 3.0), ("c", 3.0)]);
        let third: f64 = 1.0 / 3.0;
        let c_score = (0..6).fold(0.0, |s, _| s + third);
        assert_eq!(rounds[2].tally, vec![("c", c_score)]);
        assert!((c_score - 2.0).abs() < 1e-12);
        assert_eq!(rounds[2].seat, 3);
    }

    #[test]
    fn already_elected_discount_the_ballots() {
        let mut vbs = repeat(&["a", "b"], 6);
        vbs.extend(repeat(&["c"], 4));
        // a holds a seat: b only gets 3.
        let (elected, rounds) = allocate_rounds(&vbs, &["b", "c"], 2, &["a"]);
        assert_eq!(elected, vec!["a", "c"]);
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].seat, 2);
        assert_eq!(rounds[0].tally, vec![("b", 3.0), ("c", 4.0)]);
    }

    #[test]
    fn candidates_are_sorted_before_tiebreak() {
        let vbs = repeat(&["x", "y"], 2);
        assert_eq!(allocate_seats(&vbs, &["y", "x"], 1, &[]), vec!["x"]);
    }

    #[test]
    fn runs_out_of_candidates() {
        let vbs = repeat(&["a"], 1);
        assert_eq!(allocate_seats(&vbs, &["a", "b"], 4, &[]), vec!["a", "b"]);
        assert_eq!(allocate_seats(&vbs, &[], 2, &[]), Vec::<&str>::new());
    }

    #[test]
    fn near_tie_is_not_a_tie() {
        // b collects 1/3 three times, which does not add up exactly to 1.
        let mut vbs = repeat(&["a"], 1);
        vbs.extend(repeat(&["b", "e1", "e2"], 3));
        let (_, rounds) = allocate_rounds(&vbs, &["a", "b"], 3, &["e1", "e2"]);
        let third: f64 = 1.0 / 3.0;
        let b_score = third + third + third;
        assert_eq!(rounds[0].tally, vec![("a", 1.0), ("b", b_score)]);
        let expected = if b_score > 1.0 { "b" } else { "a" };
        assert_eq!(rounds[0].elected, expected);
    }
}
