pub use crate::config::*;

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;

/// Ballot intake failures.
///
/// These come out of the submission checks that run before a ballot reaches
/// the tally engine. The engine itself never produces them: it assumes
/// validated input and merely tolerates what slips through.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotError {
    UnknownOption(OptionId),
    DuplicateOption(OptionId),
    /// The ballot does not rank every option exactly once.
    IncompleteRanking,
}

impl Error for BallotError {}

impl Display for BallotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotError::UnknownOption(id) => write!(f, "unknown option {}", id.0),
            BallotError::DuplicateOption(id) => write!(f, "option {} ranked twice", id.0),
            BallotError::IncompleteRanking => write!(f, "ballot does not rank every option"),
        }
    }
}

/// Assembles the options and ballots of a poll before handing them to
/// [crate::run_tally].
///
/// ```
/// use instant_runoff::builder::Builder;
/// # use instant_runoff::builder::BallotError;
///
/// let mut builder = Builder::new().options(&["Coffee", "Tea", "Cocoa"]);
/// builder.add_ranked_ballot("b-1", &[1, 3, 2])?;
/// builder.add_ranked_ballot("b-2", &[2, 1, 3])?;
///
/// let result = builder.tally();
/// assert_eq!(result.total_votes, 2);
/// # Ok::<(), BallotError>(())
/// ```
#[derive(Default)]
pub struct Builder {
    options: Vec<PollOption>,
    ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            options: Vec::new(),
            ballots: Vec::new(),
        }
    }

    /// Registers the poll options; identifiers are assigned in order,
    /// starting at 1.
    pub fn options(self, texts: &[&str]) -> Builder {
        let options = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| PollOption {
                id: OptionId(idx as u64 + 1),
                text: text.to_string(),
            })
            .collect();
        Builder {
            options,
            ballots: self.ballots,
        }
    }

    /// Adds a ballot given option ids in descending preference order.
    ///
    /// The ballot must reference every registered option exactly once; this
    /// is the submission validation that the engine contract leaves to the
    /// intake layer.
    pub fn add_ranked_ballot(&mut self, id: &str, prefs: &[u64]) -> Result<(), BallotError> {
        let known: BTreeSet<OptionId> = self.options.iter().map(|o| o.id).collect();
        let mut seen: BTreeSet<OptionId> = BTreeSet::new();
        let mut rankings: Vec<Ranking> = Vec::new();
        for (idx, raw) in prefs.iter().enumerate() {
            let oid = OptionId(*raw);
            if !known.contains(&oid) {
                return Err(BallotError::UnknownOption(oid));
            }
            if !seen.insert(oid) {
                return Err(BallotError::DuplicateOption(oid));
            }
            rankings.push(Ranking {
                option: OptionRef::Id(oid),
                rank: idx as u32 + 1,
            });
        }
        if seen.len() != self.options.len() {
            return Err(BallotError::IncompleteRanking);
        }
        self.ballots.push(Ballot {
            id: id.to_string(),
            rankings,
        });
        Ok(())
    }

    pub fn tally(&self) -> TallyResult {
        crate::run_tally(&self.options, &self.ballots)
    }
}
