// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};

use snafu::Snafu;

/// An option that can be elected.
///
/// Only the identifier matters for tallying. The name and the description are carried
/// along for display.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct VoteOption {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl VoteOption {
    pub fn new(id: &str) -> VoteOption {
        VoteOption {
            id: id.to_string(),
            name: None,
            description: None,
        }
    }
}

/// The method used to count the ballots of a vote.
///
/// Each method expects its own kind of [Ballot].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TallyMethod {
    /// First-past-the-post. The `seats` options with the most ballots win.
    Plurality { seats: u32 },
    /// Sequential proportional score voting. Ballots rate options between
    /// `min_rating` and `max_rating` (both included).
    ProportionalScore {
        seats: u32,
        min_rating: i64,
        max_rating: i64,
    },
}

impl TallyMethod {
    pub const SINGLE_SEAT_PLURALITY: TallyMethod = TallyMethod::Plurality { seats: 1 };

    pub fn seats(&self) -> u32 {
        match self {
            TallyMethod::Plurality { seats } => *seats,
            TallyMethod::ProportionalScore { seats, .. } => *seats,
        }
    }
}

/// A vote: the options, the counting method and the resignations that happened
/// after the election, in the order they happened.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Vote {
    pub id: String,
    pub options: Vec<VoteOption>,
    pub method: TallyMethod,
    pub resigned: Vec<String>,
}

/// A cast ballot. The variant must match the [TallyMethod] of the vote.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Ballot {
    Plurality {
        selected: String,
    },
    /// Options missing from the ratings are unrated. They are not treated as
    /// having the minimum rating.
    Score {
        ratings: BTreeMap<String, i64>,
    },
}

/// An approval ballot derived from a score ballot by the Kotze-Pereira transform.
pub type VirtualBallot = BTreeSet<String>;

// ******** Output data structures *********

/// The scores when one seat was filled.
#[derive(PartialEq, Debug, Clone)]
pub struct SeatStats {
    /// Starts at 1.
    pub seat: u32,
    /// The candidates still in the running, sorted by identifier.
    pub tally: Vec<(String, f64)>,
    pub elected: String,
}

/// One replacement election, run after a resignation.
#[derive(PartialEq, Debug, Clone)]
pub struct ResignationStats {
    pub resigned: String,
    /// The winners who kept their seats.
    pub held: Vec<String>,
    pub seat_stats: Vec<SeatStats>,
    pub winners: Vec<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TallyResult {
    /// The winners, in the order the seats were filled.
    pub winners: Vec<String>,
    pub seat_stats: Vec<SeatStats>,
    pub resignations: Vec<ResignationStats>,
}

/// The largest number of rating levels a proportional score vote can have, that is
/// `max_rating - min_rating + 1`.
pub const MAX_RATING_LEVELS: i64 = 1_000;

/// Errors that prevent the algorithm from completing successfully.
///
/// All of them are caused by malformed input. Degenerate inputs such as no ballots
/// or fewer candidates than seats are not errors.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VotingErrors {
    #[snafu(display("vote {vote_id}: the number of seats must be at least 1"))]
    InvalidSeats { vote_id: String },

    #[snafu(display(
        "vote {vote_id}: the minimum rating {min_rating} is larger than the maximum rating {max_rating}"
    ))]
    InvalidRatingRange {
        vote_id: String,
        min_rating: i64,
        max_rating: i64,
    },

    #[snafu(display(
        "vote {vote_id}: the rating scale {min_rating}..={max_rating} has more than {} levels",
        MAX_RATING_LEVELS
    ))]
    RatingRangeTooWide {
        vote_id: String,
        min_rating: i64,
        max_rating: i64,
    },

    #[snafu(display("vote {vote_id}: option {option} is declared more than once"))]
    DuplicateOption { vote_id: String, option: String },

    #[snafu(display("ballot #{index}: expected a {expected} ballot"))]
    BallotMismatch { index: usize, expected: String },

    #[snafu(display("ballot #{index}: option {option} is not part of the vote"))]
    UnknownOption { index: usize, option: String },

    #[snafu(display(
        "ballot #{index}: rating {rating} for option {option} is outside of [{min_rating}, {max_rating}]"
    ))]
    RatingOutOfRange {
        index: usize,
        option: String,
        rating: i64,
        min_rating: i64,
        max_rating: i64,
    },

    #[snafu(display("resignation of {option}: option is not part of the vote"))]
    UnknownResignation { option: String },

    #[snafu(display("resignation of {option}: this candidate does not hold a seat"))]
    ResignedNonWinner { option: String },
}
