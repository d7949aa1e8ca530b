use log::info;
use snafu::ensure;
use std::collections::HashSet;

use crate::allocation::allocate_rounds;
use crate::{checks, plurality, CandidateId, CheckResult};
use crate::{
    Ballot, ResignationStats, ResignedNonWinnerSnafu, TallyMethod, TallyResult, Vote,
    VotingErrors,
};

/// Returns the winners of the vote once all its resignations have been resolved.
///
/// Every resignation triggers a replacement election in which the winners still in
/// office keep their seats, and the ballots that approve them stay discounted.
/// Resignations are replayed one at a time in the order they happened: the outcome
/// of each replacement election is the starting point of the next one. A candidate
/// who resigned is never elected again.
///
/// Each resignation must name a candidate holding a seat at that point, otherwise
/// [VotingErrors::ResignedNonWinner] is returned.
///
/// Plurality votes have no replacement elections: the ballots for resigned
/// candidates are simply not counted.
pub fn tally_with_resignations(
    vote: &Vote,
    ballots: &[Ballot],
) -> Result<Vec<String>, VotingErrors> {
    let cr = checks(vote, ballots)?;
    match vote.method {
        TallyMethod::Plurality { seats } => {
            let (elected, _) = plurality::plurality_rounds(&cr, seats as usize);
            Ok(cr.candidates.names(&elected))
        }
        TallyMethod::ProportionalScore {
            seats,
            min_rating,
            max_rating,
        } => resolve(&cr, seats as usize, min_rating, max_rating).map(|res| res.winners),
    }
}

// Every replacement election is recomputed in full from the virtual ballots. Only the
// set of winners in office is carried over from one resignation to the next.
pub(crate) fn resolve(
    cr: &CheckResult,
    seats: usize,
    min_rating: i64,
    max_rating: i64,
) -> Result<TallyResult, VotingErrors> {
    let vbs = cr.virtual_ballots(min_rating, max_rating);
    let all_candidates = cr.candidates.ids();

    let (initial, initial_rounds) = allocate_rounds(&vbs, &all_candidates, seats, &[]);
    if !cr.resigned.is_empty() {
        info!(
            "resolve: initial winners: {:?}",
            cr.candidates.names(&initial)
        );
    }

    let mut current: Vec<CandidateId> = initial;
    let mut resignations: Vec<ResignationStats> = Vec::new();
    for (idx, resigned) in cr.resigned.iter().enumerate() {
        ensure!(
            current.contains(resigned),
            ResignedNonWinnerSnafu {
                option: cr.name(*resigned)
            }
        );
        let gone: HashSet<CandidateId> = cr.resigned[..=idx].iter().cloned().collect();
        let held: Vec<CandidateId> = current
            .iter()
            .filter(|cid| !gone.contains(*cid))
            .cloned()
            .collect();
        let pool: Vec<CandidateId> = all_candidates
            .iter()
            .filter(|cid| !gone.contains(*cid))
            .cloned()
            .collect();

        let (winners, rounds) = allocate_rounds(&vbs, &pool, seats, &held);
        info!(
            "resolve: {} resigned, winners: {:?}",
            cr.name(*resigned),
            cr.candidates.names(&winners)
        );
        resignations.push(ResignationStats {
            resigned: cr.name(*resigned).to_string(),
            held: cr.candidates.names(&held),
            seat_stats: cr.seat_stats(&rounds),
            winners: cr.candidates.names(&winners),
        });
        current = winners;
    }

    Ok(TallyResult {
        winners: cr.candidates.names(&current),
        seat_stats: cr.seat_stats(&initial_rounds),
        resignations,
    })
}
