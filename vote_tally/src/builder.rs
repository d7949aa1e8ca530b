pub use crate::config::*;

use snafu::ensure;

use crate::{check_ballot, DuplicateOptionSnafu, UnknownResignationSnafu};

/// A builder for a vote and its ballots.
///
/// Every ballot is checked as soon as it is added, so that a malformed ballot is
/// reported with its position in the input.
///
/// ```
/// pub use vote_tally::builder::Builder;
/// pub use vote_tally::TallyMethod;
/// # use vote_tally::VotingErrors;
///
/// let method = TallyMethod::ProportionalScore { seats: 2, min_rating: 0, max_rating: 5 };
/// let mut builder = Builder::new("council", &method)?
///     .options(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_score_ballot(&[("Anna".to_string(), 5), ("Bob".to_string(), 4)])?;
/// builder.add_score_ballot(&[("Clara".to_string(), 3)])?;
///
/// assert_eq!(builder.tally()?, vec!["Anna".to_string(), "Clara".to_string()]);
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _vote: Vote,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(vote_id: &str, method: &TallyMethod) -> Result<Builder, VotingErrors> {
        crate::check_method(vote_id, method)?;
        Ok(Builder {
            _vote: Vote {
                id: vote_id.to_string(),
                options: Vec::new(),
                method: *method,
                resigned: Vec::new(),
            },
            _ballots: Vec::new(),
        })
    }

    /// Sets the options of the vote, replacing the previous ones. The ballots and
    /// the resignations added so far are dropped.
    pub fn options(self, ids: &[String]) -> Result<Builder, VotingErrors> {
        let mut builder = Builder {
            _vote: Vote {
                options: Vec::new(),
                resigned: Vec::new(),
                ..self._vote
            },
            _ballots: Vec::new(),
        };
        for id in ids {
            builder.add_option(&VoteOption::new(id))?;
        }
        Ok(builder)
    }

    pub fn add_option(&mut self, option: &VoteOption) -> Result<(), VotingErrors> {
        ensure!(
            !self.is_declared(&option.id),
            DuplicateOptionSnafu {
                vote_id: self._vote.id.clone(),
                option: option.id.clone(),
            }
        );
        self._vote.options.push(option.clone());
        Ok(())
    }

    /// Adds a ballot for a plurality vote.
    pub fn add_plurality_ballot(&mut self, selected: &str) -> Result<(), VotingErrors> {
        self.add_ballot(&Ballot::Plurality {
            selected: selected.to_string(),
        })
    }

    /// Adds a ballot for a proportional score vote.
    ///
    /// ratings: the rating of each option. The options that are not listed are unrated.
    /// If an option is listed several times, the last rating is kept.
    pub fn add_score_ballot(&mut self, ratings: &[(String, i64)]) -> Result<(), VotingErrors> {
        self.add_ballot(&Ballot::Score {
            ratings: ratings.iter().cloned().collect(),
        })
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), VotingErrors> {
        check_ballot(self._ballots.len(), ballot, &self._vote.method, |o| {
            self.is_declared(o)
        })?;
        self._ballots.push(ballot.clone());
        Ok(())
    }

    /// Records that a winner left their seat. Resignations must be added in the
    /// order they happened.
    pub fn resign(&mut self, option_id: &str) -> Result<(), VotingErrors> {
        ensure!(
            self.is_declared(option_id),
            UnknownResignationSnafu { option: option_id }
        );
        self._vote.resigned.push(option_id.to_string());
        Ok(())
    }

    pub fn vote(&self) -> &Vote {
        &self._vote
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self._ballots
    }

    pub fn tally(&self) -> Result<Vec<String>, VotingErrors> {
        crate::run_tally(&self._vote, &self._ballots)
    }

    pub fn tally_stats(&self) -> Result<TallyResult, VotingErrors> {
        crate::run_tally_stats(&self._vote, &self._ballots)
    }

    pub fn rank(&self) -> Result<Vec<String>, VotingErrors> {
        crate::rank(&self._vote, &self._ballots)
    }

    fn is_declared(&self, option_id: &str) -> bool {
        self._vote.options.iter().any(|o| o.id == option_id)
    }
}
