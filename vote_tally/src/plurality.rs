use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::ops::AddAssign;

use crate::allocation::SeatRound;
use crate::tiebreak::argmax_first;
use crate::{checks, CandidateId, CheckResult, CheckedBallots};
use crate::{Ballot, Vote, VotingErrors};

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

/// Counts one vote per ballot and returns the `seats` options with the most votes,
/// best first.
///
/// Ballots for an option listed in the resignations of the vote are not counted.
/// Ties go to the smallest identifier. If there are fewer options than seats, all
/// the options are returned.
pub fn tally_plurality(
    vote: &Vote,
    ballots: &[Ballot],
    seats: usize,
) -> Result<Vec<String>, VotingErrors> {
    let cr = checks(vote, ballots)?;
    let (elected, _) = plurality_rounds(&cr, seats);
    Ok(cr.candidates.names(&elected))
}

fn compute_tally(cr: &CheckResult) -> BTreeMap<CandidateId, VoteCount> {
    let mut tally: BTreeMap<CandidateId, VoteCount> = cr
        .candidates
        .ids()
        .into_iter()
        .map(|cid| (cid, VoteCount::EMPTY))
        .collect();
    let resigned: HashSet<CandidateId> = cr.resigned.iter().cloned().collect();
    if let CheckedBallots::Plurality(selections) = &cr.ballots {
        for cid in selections.iter().filter(|cid| !resigned.contains(*cid)) {
            if let Some(vc) = tally.get_mut(cid) {
                *vc += VoteCount(1);
            }
        }
    }
    tally
}

pub(crate) fn plurality_rounds(
    cr: &CheckResult,
    seats: usize,
) -> (Vec<CandidateId>, Vec<SeatRound<CandidateId>>) {
    // The counts do not change between seats, only the pool shrinks.
    let mut tally = compute_tally(cr);
    debug!("plurality_rounds: tally: {:?}", tally);

    let mut elected: Vec<CandidateId> = Vec::new();
    let mut rounds: Vec<SeatRound<CandidateId>> = Vec::new();
    while elected.len() < seats {
        let winner = match argmax_first(tally.iter().map(|(cid, vc)| (*cid, *vc))) {
            Some((cid, _)) => cid,
            None => break,
        };
        debug!(
            "plurality_rounds: seat {}: elected {}",
            elected.len() + 1,
            cr.name(winner)
        );
        let round_tally: Vec<(CandidateId, f64)> = tally
            .iter()
            .map(|(cid, vc)| (*cid, vc.0 as f64))
            .collect();
        tally.remove(&winner);
        elected.push(winner);
        rounds.push(SeatRound {
            seat: elected.len(),
            tally: round_tally,
            elected: winner,
        });
    }
    (elected, rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TallyMethod, VoteOption};

    fn vote(ids: &[&str], resigned: &[&str]) -> Vote {
        Vote {
            id: "plurality".to_string(),
            options: ids.iter().map(|id| VoteOption::new(id)).collect(),
            method: TallyMethod::SINGLE_SEAT_PLURALITY,
            resigned: resigned.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn ballots(selected: &[&str]) -> Vec<Ballot> {
        selected
            .iter()
            .map(|s| Ballot::Plurality {
                selected: s.to_string(),
            })
            .collect()
    }

    #[test]
    fn top_counts_in_order() {
        let v = vote(&["A", "B", "C", "D"], &[]);
        let bs = ballots(&["C", "B", "C", "A", "C", "B"]);
        assert_eq!(
            tally_plurality(&v, &bs, 3),
            Ok(vec!["C".to_string(), "B".to_string(), "A".to_string()])
        );
    }

    #[test]
    fn ties_use_identifier_order_not_vote_order() {
        let v = vote(&["d", "c", "b", "a"], &[]);
        let bs = ballots(&["d", "c", "d", "c"]);
        assert_eq!(
            tally_plurality(&v, &bs, 2),
            Ok(vec!["c".to_string(), "d".to_string()])
        );
    }

    #[test]
    fn no_ballots_gives_alphabetical_order() {
        let v = vote(&["b", "c", "a"], &[]);
        assert_eq!(
            tally_plurality(&v, &[], 2),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn resigned_candidates_are_not_credited() {
        let v = vote(&["A", "B", "C"], &["A"]);
        let bs = ballots(&["A", "A", "A", "B", "C", "C"]);
        assert_eq!(
            tally_plurality(&v, &bs, 2),
            Ok(vec!["C".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn counts_are_reported_per_seat() {
        let cr = checks(
            &vote(&["A", "B"], &[]),
            &ballots(&["B", "B", "A"]),
        )
        .unwrap();
        let (elected, rounds) = plurality_rounds(&cr, 2);
        assert_eq!(cr.candidates.names(&elected), vec!["B", "A"]);
        assert_eq!(rounds[0].tally.len(), 2);
        assert_eq!(rounds[0].tally[1].1, 2.0);
        assert_eq!(rounds[1].tally.len(), 1);
        assert_eq!(rounds[1].tally[0].1, 1.0);
    }
}
