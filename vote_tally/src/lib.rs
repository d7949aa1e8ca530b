mod config;
use log::{debug, info};
use snafu::{ensure, OptionExt};

use std::collections::{BTreeMap, BTreeSet};

pub mod allocation;
pub mod builder;
pub mod kotze_pereira;
pub mod manual;
pub mod plurality;
pub mod resignation;
pub mod tiebreak;

pub use crate::config::*;

use crate::allocation::SeatRound;

// **** Private structures ****

/// Position of an option in the list of identifiers sorted in ascending order.
/// Comparing two ids is the same as comparing the identifiers themselves.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) struct CandidateId(u32);

/// The options of a vote, sorted by identifier.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Candidates {
    names: Vec<String>,
}

impl Candidates {
    fn new(vote: &Vote) -> Result<Candidates, VotingErrors> {
        let mut names: Vec<String> = vote.options.iter().map(|o| o.id.clone()).collect();
        names.sort();
        if let Some(w) = names.windows(2).find(|w| w[0] == w[1]) {
            return DuplicateOptionSnafu {
                vote_id: vote.id.clone(),
                option: w[0].clone(),
            }
            .fail();
        }
        Ok(Candidates { names })
    }

    pub(crate) fn get(&self, name: &str) -> Option<CandidateId> {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .ok()
            .map(|idx| CandidateId(idx as u32))
    }

    pub(crate) fn name(&self, cid: CandidateId) -> &str {
        &self.names[cid.0 as usize]
    }

    pub(crate) fn names(&self, cids: &[CandidateId]) -> Vec<String> {
        cids.iter().map(|cid| self.name(*cid).to_string()).collect()
    }

    pub(crate) fn ids(&self) -> Vec<CandidateId> {
        (0..self.names.len()).map(|idx| CandidateId(idx as u32)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) enum CheckedBallots {
    Plurality(Vec<CandidateId>),
    Score(Vec<BTreeMap<CandidateId, i64>>),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct CheckResult {
    pub(crate) candidates: Candidates,
    pub(crate) ballots: CheckedBallots,
    /// In the order the resignations happened.
    pub(crate) resigned: Vec<CandidateId>,
}

impl CheckResult {
    /// The Kotze-Pereira expansion of all the score ballots, in ballot order.
    pub(crate) fn virtual_ballots(
        &self,
        min_rating: i64,
        max_rating: i64,
    ) -> Vec<BTreeSet<CandidateId>> {
        match &self.ballots {
            CheckedBallots::Score(ratings) => ratings
                .iter()
                .flat_map(|r| kotze_pereira::expand(r, min_rating, max_rating))
                // Empty approval ballots count for nobody.
                .filter(|vb| !vb.is_empty())
                .collect(),
            CheckedBallots::Plurality(_) => Vec::new(),
        }
    }

    pub(crate) fn seat_stats(&self, rounds: &[SeatRound<CandidateId>]) -> Vec<SeatStats> {
        rounds
            .iter()
            .map(|r| SeatStats {
                seat: r.seat as u32,
                tally: r
                    .tally
                    .iter()
                    .map(|(cid, score)| (self.name(*cid).to_string(), *score))
                    .collect(),
                elected: self.name(r.elected).to_string(),
            })
            .collect()
    }

    pub(crate) fn name(&self, cid: CandidateId) -> &str {
        self.candidates.name(cid)
    }
}

/// Runs the tally of the vote and returns the winners, in the order the seats were filled.
///
/// The counting method is the one declared in the vote. Resignations, if any, are
/// resolved in the order they happened.
pub fn run_tally(vote: &Vote, ballots: &[Ballot]) -> Result<Vec<String>, VotingErrors> {
    run_tally_stats(vote, ballots).map(|res| res.winners)
}

/// Same as [run_tally], with the scores of every seat and the trace of every
/// replacement election.
pub fn run_tally_stats(vote: &Vote, ballots: &[Ballot]) -> Result<TallyResult, VotingErrors> {
    info!(
        "Processing vote {}: {} ballots, {} options, method: {:?}, resigned: {:?}",
        vote.id,
        ballots.len(),
        vote.options.len(),
        vote.method,
        vote.resigned
    );
    let cr = checks(vote, ballots)?;

    let res = match vote.method {
        TallyMethod::Plurality { seats } => {
            let (elected, rounds) = plurality::plurality_rounds(&cr, seats as usize);
            TallyResult {
                winners: cr.candidates.names(&elected),
                seat_stats: cr.seat_stats(&rounds),
                resignations: Vec::new(),
            }
        }
        TallyMethod::ProportionalScore {
            seats,
            min_rating,
            max_rating,
        } => resignation::resolve(&cr, seats as usize, min_rating, max_rating)?,
    };
    info!("Vote {}: winners: {:?}", vote.id, res.winners);
    Ok(res)
}

/// A strict order over all the options of the vote, best first.
///
/// Resignations are not taken into account for proportional votes. If no ballot
/// has been cast, the options are returned in the order they were declared.
pub fn rank(vote: &Vote, ballots: &[Ballot]) -> Result<Vec<String>, VotingErrors> {
    let cr = checks(vote, ballots)?;
    if ballots.is_empty() {
        debug!("rank: no ballots for vote {}, using declared order", vote.id);
        return Ok(vote.options.iter().map(|o| o.id.clone()).collect());
    }

    let num_options = cr.candidates.len();
    let ranked = match vote.method {
        TallyMethod::Plurality { .. } => plurality::plurality_rounds(&cr, num_options).0,
        TallyMethod::ProportionalScore {
            min_rating,
            max_rating,
            ..
        } => {
            let vbs = cr.virtual_ballots(min_rating, max_rating);
            allocation::allocate_rounds(&vbs, &cr.candidates.ids(), num_options, &[]).0
        }
    };
    debug!("rank: vote {}: {:?}", vote.id, ranked);
    Ok(cr.candidates.names(&ranked))
}

fn check_method(vote_id: &str, method: &TallyMethod) -> Result<(), VotingErrors> {
    ensure!(
        method.seats() >= 1,
        InvalidSeatsSnafu {
            vote_id: vote_id.to_string()
        }
    );
    if let TallyMethod::ProportionalScore {
        min_rating,
        max_rating,
        ..
    } = *method
    {
        ensure!(
            min_rating <= max_rating,
            InvalidRatingRangeSnafu {
                vote_id: vote_id.to_string(),
                min_rating,
                max_rating,
            }
        );
        ensure!(
            max_rating
                .checked_sub(min_rating)
                .map_or(false, |width| width < MAX_RATING_LEVELS),
            RatingRangeTooWideSnafu {
                vote_id: vote_id.to_string(),
                min_rating,
                max_rating,
            }
        );
    }
    Ok(())
}

/// Checks that a ballot can be counted with the given method.
///
/// `is_declared` tells if an identifier is one of the options of the vote.
pub(crate) fn check_ballot<F>(
    index: usize,
    ballot: &Ballot,
    method: &TallyMethod,
    is_declared: F,
) -> Result<(), VotingErrors>
where
    F: Fn(&str) -> bool,
{
    match (method, ballot) {
        (TallyMethod::Plurality { .. }, Ballot::Plurality { selected }) => {
            ensure!(
                is_declared(selected.as_str()),
                UnknownOptionSnafu {
                    index,
                    option: selected.clone(),
                }
            );
        }
        (
            TallyMethod::ProportionalScore {
                min_rating,
                max_rating,
                ..
            },
            Ballot::Score { ratings },
        ) => {
            for (option, &rating) in ratings.iter() {
                ensure!(
                    is_declared(option.as_str()),
                    UnknownOptionSnafu {
                        index,
                        option: option.clone(),
                    }
                );
                ensure!(
                    *min_rating <= rating && rating <= *max_rating,
                    RatingOutOfRangeSnafu {
                        index,
                        option: option.clone(),
                        rating,
                        min_rating: *min_rating,
                        max_rating: *max_rating,
                    }
                );
            }
        }
        (TallyMethod::Plurality { .. }, Ballot::Score { .. }) => {
            return BallotMismatchSnafu {
                index,
                expected: "plurality",
            }
            .fail();
        }
        (TallyMethod::ProportionalScore { .. }, Ballot::Plurality { .. }) => {
            return BallotMismatchSnafu {
                index,
                expected: "score",
            }
            .fail();
        }
    }
    Ok(())
}

// Candidates are returned sorted by identifier.
pub(crate) fn checks(vote: &Vote, ballots: &[Ballot]) -> Result<CheckResult, VotingErrors> {
    debug!("checks: vote {}: {:?} ballots", vote.id, ballots.len());
    check_method(&vote.id, &vote.method)?;
    let candidates = Candidates::new(vote)?;

    let mut resigned: Vec<CandidateId> = Vec::new();
    for r in vote.resigned.iter() {
        let cid = candidates
            .get(r)
            .context(UnknownResignationSnafu { option: r.clone() })?;
        resigned.push(cid);
    }

    let checked = match vote.method {
        TallyMethod::Plurality { .. } => {
            let mut selections: Vec<CandidateId> = Vec::new();
            for (index, ballot) in ballots.iter().enumerate() {
                check_ballot(index, ballot, &vote.method, |o| candidates.get(o).is_some())?;
                if let Ballot::Plurality { selected } = ballot {
                    let cid = candidates.get(selected).context(UnknownOptionSnafu {
                        index,
                        option: selected.clone(),
                    })?;
                    selections.push(cid);
                }
            }
            CheckedBallots::Plurality(selections)
        }
        TallyMethod::ProportionalScore { .. } => {
            let mut all_ratings: Vec<BTreeMap<CandidateId, i64>> = Vec::new();
            for (index, ballot) in ballots.iter().enumerate() {
                check_ballot(index, ballot, &vote.method, |o| candidates.get(o).is_some())?;
                if let Ballot::Score { ratings } = ballot {
                    let mut converted: BTreeMap<CandidateId, i64> = BTreeMap::new();
                    for (option, rating) in ratings.iter() {
                        let cid = candidates.get(option).context(UnknownOptionSnafu {
                            index,
                            option: option.clone(),
                        })?;
                        converted.insert(cid, *rating);
                    }
                    all_ratings.push(converted);
                }
            }
            CheckedBallots::Score(all_ratings)
        }
    };

    debug!(
        "checks: {} candidates, resignations: {:?}",
        candidates.len(),
        resigned
    );
    Ok(CheckResult {
        candidates,
        ballots: checked,
        resigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn options(ids: &[&str]) -> Vec<VoteOption> {
        ids.iter().map(|id| VoteOption::new(id)).collect()
    }

    fn plurality_vote(ids: &[&str], seats: u32) -> Vote {
        Vote {
            id: "test".to_string(),
            options: options(ids),
            method: TallyMethod::Plurality { seats },
            resigned: Vec::new(),
        }
    }

    fn score_vote(ids: &[&str], seats: u32) -> Vote {
        Vote {
            id: "test".to_string(),
            options: options(ids),
            method: TallyMethod::ProportionalScore {
                seats,
                min_rating: 0,
                max_rating: 5,
            },
            resigned: Vec::new(),
        }
    }

    fn selected(id: &str) -> Ballot {
        Ballot::Plurality {
            selected: id.to_string(),
        }
    }

    fn scored(ratings: &[(&str, i64)]) -> Ballot {
        Ballot::Score {
            ratings: ratings.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn plurality_majority_wins() {
        init();
        let vote = plurality_vote(&["A", "B"], 1);
        let ballots = vec![selected("A"), selected("A"), selected("B")];
        assert_eq!(run_tally(&vote, &ballots), Ok(vec!["A".to_string()]));
    }

    #[test]
    fn plurality_tie_goes_to_smallest_identifier() {
        init();
        let vote = plurality_vote(&["B", "A"], 1);
        let ballots = vec![selected("B"), selected("A")];
        assert_eq!(run_tally(&vote, &ballots), Ok(vec!["A".to_string()]));
    }

    #[test]
    fn score_single_ballot() {
        init();
        let vote = score_vote(&["A", "B", "C"], 1);
        let ballots = vec![scored(&[("A", 5), ("B", 0), ("C", 0)])];
        assert_eq!(run_tally(&vote, &ballots), Ok(vec!["A".to_string()]));
    }

    #[test]
    fn score_stats_report_every_seat() {
        init();
        let vote = score_vote(&["A", "B", "C"], 2);
        let ballots = vec![scored(&[("A", 5), ("B", 2)]), scored(&[("C", 3)])];
        let res = run_tally_stats(&vote, &ballots).unwrap();
        assert_eq!(res.winners, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(res.seat_stats.len(), 2);
        assert_eq!(
            res.seat_stats[0].tally,
            vec![
                ("A".to_string(), 6.0),
                ("B".to_string(), 3.0),
                ("C".to_string(), 4.0)
            ]
        );
        // The 3 virtual ballots approving A and B are halved.
        assert_eq!(
            res.seat_stats[1].tally,
            vec![("B".to_string(), 1.5), ("C".to_string(), 4.0)]
        );
        assert_eq!(res.seat_stats[1].seat, 2);
        assert!(res.resignations.is_empty());
    }

    #[test]
    fn tally_is_deterministic() {
        init();
        let vote = score_vote(&["d", "a", "c", "b"], 3);
        let ballots = vec![
            scored(&[("a", 5), ("b", 1), ("c", 3)]),
            scored(&[("b", 4), ("d", 4)]),
            scored(&[("c", 2), ("d", 5), ("a", 1)]),
        ];
        let first = run_tally_stats(&vote, &ballots).unwrap();
        for _ in 0..10 {
            assert_eq!(run_tally_stats(&vote, &ballots).unwrap(), first);
        }
    }

    #[test]
    fn seats_form_a_prefix_chain() {
        init();
        let ids = ["a", "b", "c", "d", "e"];
        let ballots = vec![
            scored(&[("a", 5), ("b", 4), ("c", 1)]),
            scored(&[("c", 5), ("d", 5)]),
            scored(&[("e", 3), ("a", 2)]),
            scored(&[("b", 5), ("e", 5)]),
        ];
        let mut previous: Vec<String> = Vec::new();
        for seats in 1..=5 {
            let res = run_tally(&score_vote(&ids, seats), &ballots).unwrap();
            assert_eq!(res.len(), seats as usize);
            assert_eq!(&res[..previous.len()], previous.as_slice());
            previous = res;
        }
    }

    #[test]
    fn more_seats_than_candidates() {
        init();
        let vote = score_vote(&["A", "B"], 3);
        let ballots = vec![scored(&[("B", 1)])];
        assert_eq!(
            run_tally(&vote, &ballots),
            Ok(vec!["B".to_string(), "A".to_string()])
        );
        let vote = plurality_vote(&["A", "B"], 3);
        assert_eq!(
            run_tally(&vote, &[]),
            Ok(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn no_options() {
        init();
        assert_eq!(run_tally(&score_vote(&[], 2), &[]), Ok(vec![]));
        assert_eq!(rank(&plurality_vote(&[], 1), &[]), Ok(vec![]));
    }

    #[test]
    fn rank_without_ballots_keeps_declared_order() {
        init();
        let vote = score_vote(&["z", "b", "m"], 1);
        assert_eq!(
            rank(&vote, &[]),
            Ok(vec!["z".to_string(), "b".to_string(), "m".to_string()])
        );
    }

    #[test]
    fn rank_orders_all_options() {
        init();
        let vote = plurality_vote(&["c", "b", "a"], 1);
        let ballots = vec![selected("c"), selected("b"), selected("c")];
        assert_eq!(
            rank(&vote, &ballots),
            Ok(vec!["c".to_string(), "b".to_string(), "a".to_string()])
        );

        let vote = score_vote(&["c", "b", "a"], 1);
        let ballots = vec![scored(&[("b", 5), ("a", 4)])];
        assert_eq!(
            rank(&vote, &ballots),
            Ok(vec!["b".to_string(), "a".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn rank_ignores_resignations_for_score_votes() {
        init();
        let mut vote = score_vote(&["A", "B", "C"], 1);
        vote.resigned = vec!["A".to_string()];
        let ballots = vec![scored(&[("A", 5), ("B", 3)])];
        assert_eq!(
            rank(&vote, &ballots),
            Ok(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
    }

    #[test]
    fn rejects_zero_seats() {
        let vote = plurality_vote(&["A"], 0);
        assert_eq!(
            run_tally(&vote, &[]),
            Err(VotingErrors::InvalidSeats {
                vote_id: "test".to_string()
            })
        );
    }

    #[test]
    fn rejects_inverted_rating_range() {
        let mut vote = score_vote(&["A"], 1);
        vote.method = TallyMethod::ProportionalScore {
            seats: 1,
            min_rating: 3,
            max_rating: 1,
        };
        assert!(matches!(
            run_tally(&vote, &[]),
            Err(VotingErrors::InvalidRatingRange { .. })
        ));
    }

    #[test]
    fn rejects_wide_rating_range() {
        let mut vote = score_vote(&["A"], 1);
        vote.method = TallyMethod::ProportionalScore {
            seats: 1,
            min_rating: 0,
            max_rating: 20_000_000,
        };
        let ballots = vec![scored(&[("A", 1)])];
        assert!(matches!(
            run_tally(&vote, &ballots),
            Err(VotingErrors::RatingRangeTooWide { .. })
        ));
        vote.method = TallyMethod::ProportionalScore {
            seats: 1,
            min_rating: i64::MIN,
            max_rating: i64::MAX,
        };
        assert!(matches!(
            run_tally(&vote, &ballots),
            Err(VotingErrors::RatingRangeTooWide { .. })
        ));
    }

    #[test]
    fn widest_rating_range_is_accepted() {
        let mut vote = score_vote(&["A", "B"], 1);
        vote.method = TallyMethod::ProportionalScore {
            seats: 1,
            min_rating: 1,
            max_rating: MAX_RATING_LEVELS,
        };
        let ballots = vec![scored(&[("A", 2)]), scored(&[("B", 3)])];
        assert_eq!(run_tally(&vote, &ballots), Ok(vec!["B".to_string()]));
    }

    #[test]
    fn rejects_duplicate_options() {
        let vote = plurality_vote(&["A", "B", "A"], 1);
        assert_eq!(
            run_tally(&vote, &[]),
            Err(VotingErrors::DuplicateOption {
                vote_id: "test".to_string(),
                option: "A".to_string()
            })
        );
    }

    #[test]
    fn rejects_mismatched_ballot() {
        let vote = plurality_vote(&["A", "B"], 1);
        let ballots = vec![selected("A"), scored(&[("A", 1)])];
        assert_eq!(
            run_tally(&vote, &ballots),
            Err(VotingErrors::BallotMismatch {
                index: 1,
                expected: "plurality".to_string()
            })
        );
        let vote = score_vote(&["A", "B"], 1);
        assert!(matches!(
            rank(&vote, &[selected("A")]),
            Err(VotingErrors::BallotMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_unknown_option() {
        let vote = plurality_vote(&["A", "B"], 1);
        assert_eq!(
            run_tally(&vote, &[selected("Z")]),
            Err(VotingErrors::UnknownOption {
                index: 0,
                option: "Z".to_string()
            })
        );
    }

    #[test]
    fn rejects_rating_out_of_range() {
        let vote = score_vote(&["A", "B"], 1);
        let ballots = vec![scored(&[("A", 2)]), scored(&[("B", 6)])];
        assert_eq!(
            run_tally(&vote, &ballots),
            Err(VotingErrors::RatingOutOfRange {
                index: 1,
                option: "B".to_string(),
                rating: 6,
                min_rating: 0,
                max_rating: 5
            })
        );
    }

    #[test]
    fn rejects_unknown_resignation() {
        let mut vote = plurality_vote(&["A", "B"], 1);
        vote.resigned = vec!["Q".to_string()];
        assert_eq!(
            run_tally(&vote, &[]),
            Err(VotingErrors::UnknownResignation {
                option: "Q".to_string()
            })
        );
    }
}
