// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::Display;

/// Identifier of a poll option.
///
/// Identifiers are assigned by the caller (typically the poll store) and only
/// need to be unique within one poll. The total order on identifiers is used
/// as the deterministic tie-break when a whole field of options is level.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct OptionId(pub u64);

/// One of the choices offered by a poll. Immutable for the duration of a tally.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct PollOption {
    pub id: OptionId,
    pub text: String,
}

/// A reference to an option inside a ballot ranking.
///
/// Ballots coming off the wire may carry either the bare option id or the full
/// option record. Both forms resolve to the same id and are normalized away
/// before the first round is counted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OptionRef {
    Id(OptionId),
    Embedded(PollOption),
}

impl OptionRef {
    pub fn option_id(&self) -> OptionId {
        match self {
            OptionRef::Id(id) => *id,
            OptionRef::Embedded(opt) => opt.id,
        }
    }
}

/// One voter's placement of a single option.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ranking {
    pub option: OptionRef,
    pub rank: u32,
}

/// A complete ballot: one voter's ranking over the options of a poll.
///
/// The rankings do not have to be sorted. A well-formed ballot references every
/// option exactly once with ranks 1..N; enforcing this is the intake layer's
/// job, not the engine's. The engine reads ballots and never mutates them.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub id: String,
    pub rankings: Vec<Ranking>,
}

// ******** Output data structures *********

/// Statistics for one elimination cycle.
#[derive(PartialEq, Debug, Clone)]
pub struct Round {
    pub round: u32,
    /// First-preference votes among the remaining options. Every remaining
    /// option has an entry, including those at zero.
    pub vote_counts: BTreeMap<OptionId, u64>,
    /// Counts as a share of the total number of ballots, in [0, 100].
    pub percentages: BTreeMap<OptionId, f64>,
    /// Options still standing at the start of this round.
    pub remaining: BTreeSet<OptionId>,
    /// Options removed at the end of this round: empty for a majority round,
    /// several entries when the lowest count is shared.
    pub eliminated: Vec<OptionId>,
    pub majority_winner: Option<OptionId>,
    /// Set on the final round of a two-option dead heat.
    pub tie: bool,
}

/// The outcome of a tally.
#[derive(PartialEq, Debug, Clone)]
pub struct TallyResult {
    pub rounds: Vec<Round>,
    pub winner: Option<PollOption>,
    pub tie: bool,
    /// Populated only when `tie` is set.
    pub tied_options: Vec<PollOption>,
    pub total_votes: u64,
    pub majority_threshold: u64,
    pub error: Option<TallyError>,
}

impl TallyResult {
    /// A result that carries nothing but an error outcome.
    pub(crate) fn failed(error: TallyError, total_votes: u64) -> TallyResult {
        TallyResult {
            rounds: Vec::new(),
            winner: None,
            tie: false,
            tied_options: Vec::new(),
            total_votes,
            majority_threshold: 0,
            error: Some(error),
        }
    }
}

/// Conditions under which no winner can be computed.
///
/// These are data, not exceptions: the engine reports them through
/// [TallyResult] and never panics on its inputs. A tie is not an error, it is
/// a legitimate terminal outcome carried by [TallyResult::tie].
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TallyError {
    NoOptions,
    NoBallots,
    /// Every remaining option was removed in one step. Unreachable under the
    /// minimum-count elimination rule but guarded nonetheless.
    AllEliminated,
}

impl Error for TallyError {}

impl Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            TallyError::NoOptions => "No options available",
            TallyError::NoBallots => "No ballots available",
            TallyError::AllEliminated => "All options eliminated - no winner",
        };
        write!(f, "{}", msg)
    }
}
