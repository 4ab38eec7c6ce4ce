mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;

// **** Private structures ****

/// A ballot reduced to its option ids in ascending rank order.
type NormalizedBallot = Vec<OptionId>;

/// Runs the instant-runoff tally for the given options and ballots.
///
/// Arguments:
/// * `options` the options of the poll, in any order
/// * `ballots` the ballots cast, in any order
///
/// The computation is pure: identical inputs produce identical results, row
/// order notwithstanding, and no input is mutated. Failure conditions are
/// surfaced through [TallyResult::error] rather than a `Result`, so that the
/// round-by-round record stays available to the caller in every case.
pub fn run_tally(options: &[PollOption], ballots: &[Ballot]) -> TallyResult {
    info!(
        "run_tally: processing {} ballots over {} options",
        ballots.len(),
        options.len()
    );

    if options.is_empty() {
        return TallyResult::failed(TallyError::NoOptions, ballots.len() as u64);
    }
    if ballots.is_empty() {
        return TallyResult::failed(TallyError::NoBallots, 0);
    }

    let total_votes = ballots.len() as u64;
    // Fixed before the first round: strictly more than half of all ballots.
    let majority_threshold = total_votes / 2 + 1;

    let options_by_id: BTreeMap<OptionId, PollOption> =
        options.iter().map(|o| (o.id, o.clone())).collect();
    for opt in options_by_id.values() {
        info!("Option {}: {}", opt.id.0, opt.text);
    }

    // A single option wins outright, there is nothing to tally.
    if options_by_id.len() == 1 {
        let winner = options_by_id.values().next().cloned();
        return TallyResult {
            rounds: Vec::new(),
            winner,
            tie: false,
            tied_options: Vec::new(),
            total_votes,
            majority_threshold,
            error: None,
        };
    }

    let normalized: Vec<NormalizedBallot> = ballots.iter().map(normalize_ballot).collect();

    let mut remaining: BTreeSet<OptionId> = options_by_id.keys().copied().collect();
    let mut rounds: Vec<Round> = Vec::new();

    while remaining.len() > 1 {
        let round_number = rounds.len() as u32 + 1;
        let vote_counts = count_first_preferences(&normalized, &remaining);
        let percentages = as_percentages(&vote_counts, total_votes);
        debug!("round {}: counts {:?}", round_number, vote_counts);

        // With more than two options standing, an outright majority ends the
        // poll without any elimination in that round.
        if remaining.len() > 2 {
            if let Some(winner_id) = find_majority(&vote_counts, majority_threshold) {
                info!(
                    "round {}: option {} reached the majority threshold {}",
                    round_number, winner_id.0, majority_threshold
                );
                rounds.push(Round {
                    round: round_number,
                    vote_counts,
                    percentages,
                    remaining: remaining.clone(),
                    eliminated: Vec::new(),
                    majority_winner: Some(winner_id),
                    tie: false,
                });
                return TallyResult {
                    rounds,
                    winner: options_by_id.get(&winner_id).cloned(),
                    tie: false,
                    tied_options: Vec::new(),
                    total_votes,
                    majority_threshold,
                    error: None,
                };
            }
        }

        if remaining.len() == 2 {
            // Head to head: the two counts are compared directly.
            let pair: Vec<(OptionId, u64)> =
                vote_counts.iter().map(|(id, c)| (*id, *c)).collect();
            let (id_a, count_a) = pair[0];
            let (id_b, count_b) = pair[1];
            if count_a == count_b {
                info!(
                    "round {}: dead heat between options {} and {} at {} votes",
                    round_number, id_a.0, id_b.0, count_a
                );
                rounds.push(Round {
                    round: round_number,
                    vote_counts,
                    percentages,
                    remaining: remaining.clone(),
                    eliminated: Vec::new(),
                    majority_winner: None,
                    tie: true,
                });
                return TallyResult {
                    rounds,
                    winner: None,
                    tie: true,
                    tied_options: [id_a, id_b]
                        .iter()
                        .filter_map(|id| options_by_id.get(id).cloned())
                        .collect(),
                    total_votes,
                    majority_threshold,
                    error: None,
                };
            }
            let loser = if count_a < count_b { id_a } else { id_b };
            rounds.push(Round {
                round: round_number,
                vote_counts,
                percentages,
                remaining: remaining.clone(),
                eliminated: vec![loser],
                majority_winner: None,
                tie: false,
            });
            remaining.remove(&loser);
            continue;
        }

        // Three or more options and no majority: drop the bottom of the field.
        let eliminated = select_eliminated(&vote_counts, remaining.len());
        debug!("round {}: eliminating {:?}", round_number, eliminated);
        rounds.push(Round {
            round: round_number,
            vote_counts,
            percentages,
            remaining: remaining.clone(),
            eliminated: eliminated.clone(),
            majority_winner: None,
            tie: false,
        });
        for id in eliminated.iter() {
            remaining.remove(id);
        }
        if remaining.is_empty() {
            return TallyResult {
                rounds,
                winner: None,
                tie: false,
                tied_options: Vec::new(),
                total_votes,
                majority_threshold,
                error: Some(TallyError::AllEliminated),
            };
        }
    }

    // The loop left a single survivor; it wins without a further round.
    let winner = remaining
        .iter()
        .next()
        .and_then(|id| options_by_id.get(id))
        .cloned();
    match winner {
        Some(w) => {
            info!("winner: {} ({})", w.text, w.id.0);
            TallyResult {
                rounds,
                winner: Some(w),
                tie: false,
                tied_options: Vec::new(),
                total_votes,
                majority_threshold,
                error: None,
            }
        }
        // Unreachable through the elimination rules above.
        None => TallyResult {
            rounds,
            winner: None,
            tie: false,
            tied_options: Vec::new(),
            total_votes,
            majority_threshold,
            error: Some(TallyError::AllEliminated),
        },
    }
}

/// Sorts the rankings of a ballot by ascending rank and strips them down to
/// bare option ids.
///
/// The sort is stable: duplicate ranks keep their input order, and the scan
/// rule in [count_first_preferences] then credits whichever valid option comes
/// first. This is the whole extent of the engine's tolerance for malformed
/// ballots.
fn normalize_ballot(ballot: &Ballot) -> NormalizedBallot {
    let mut pairs: Vec<(u32, OptionId)> = ballot
        .rankings
        .iter()
        .map(|r| (r.rank, r.option.option_id()))
        .collect();
    pairs.sort_by_key(|(rank, _)| *rank);
    pairs.into_iter().map(|(_, id)| id).collect()
}

/// Credits each ballot's vote to its highest-ranked option that is still
/// standing. Ballots with no surviving option sit the round out.
fn count_first_preferences(
    ballots: &[NormalizedBallot],
    remaining: &BTreeSet<OptionId>,
) -> BTreeMap<OptionId, u64> {
    // Every remaining option starts at zero so that options without a single
    // vote still show up in the round record.
    let mut tally: BTreeMap<OptionId, u64> = remaining.iter().map(|id| (*id, 0)).collect();
    for choices in ballots.iter() {
        if let Some(id) = choices.iter().find(|id| remaining.contains(id)) {
            *tally.entry(*id).or_insert(0) += 1;
        }
    }
    tally
}

fn as_percentages(tally: &BTreeMap<OptionId, u64>, total_votes: u64) -> BTreeMap<OptionId, f64> {
    tally
        .iter()
        .map(|(id, count)| {
            let pct = if total_votes == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / total_votes as f64
            };
            (*id, pct)
        })
        .collect()
}

/// At most one option can hold strictly more than half of the ballots, so the
/// scan order does not matter here.
fn find_majority(tally: &BTreeMap<OptionId, u64>, threshold: u64) -> Option<OptionId> {
    tally
        .iter()
        .find(|(_, count)| **count >= threshold)
        .map(|(id, _)| *id)
}

/// Picks the options to remove in a round with three or more left.
///
/// Every option at the minimum count goes. The exception is a field that is
/// completely level: eliminating everyone would end the poll with no winner,
/// so only the tied option with the lowest identifier is removed and the next
/// round runs on the rest.
fn select_eliminated(tally: &BTreeMap<OptionId, u64>, field_size: usize) -> Vec<OptionId> {
    let min_count = tally.values().min().copied().unwrap_or(0);
    let lowest: Vec<OptionId> = tally
        .iter()
        .filter(|(_, count)| **count == min_count)
        .map(|(id, _)| *id)
        .collect();
    if lowest.len() == field_size {
        // BTreeMap iteration is ascending, the head is the lowest id.
        lowest.into_iter().take(1).collect()
    } else {
        lowest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(id: u64, text: &str) -> PollOption {
        PollOption {
            id: OptionId(id),
            text: text.to_string(),
        }
    }

    fn ballot(id: &str, prefs: &[u64]) -> Ballot {
        Ballot {
            id: id.to_string(),
            rankings: prefs
                .iter()
                .enumerate()
                .map(|(idx, oid)| Ranking {
                    option: OptionRef::Id(OptionId(*oid)),
                    rank: idx as u32 + 1,
                })
                .collect(),
        }
    }

    #[test]
    fn two_options_majority() {
        let options = vec![opt(1, "A"), opt(2, "B")];
        let ballots = vec![
            ballot("b1", &[1, 2]),
            ballot("b2", &[1, 2]),
            ballot("b3", &[2, 1]),
        ];
        let res = run_tally(&options, &ballots);
        assert_eq!(res.total_votes, 3);
        assert_eq!(res.majority_threshold, 2);
        assert_eq!(res.rounds.len(), 1);
        let round = &res.rounds[0];
        assert_eq!(round.vote_counts[&OptionId(1)], 2);
        assert_eq!(round.vote_counts[&OptionId(2)], 1);
        assert_eq!(round.eliminated, vec![OptionId(2)]);
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(1)));
        assert!(!res.tie);
        assert!(res.error.is_none());
    }

    #[test]
    fn majority_ends_first_round() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let ballots = vec![
            ballot("b1", &[1, 2, 3]),
            ballot("b2", &[1, 2, 3]),
            ballot("b3", &[1, 3, 2]),
            ballot("b4", &[2, 1, 3]),
            ballot("b5", &[3, 1, 2]),
        ];
        let res = run_tally(&options, &ballots);
        assert_eq!(res.majority_threshold, 3);
        assert_eq!(res.rounds.len(), 1);
        let round = &res.rounds[0];
        assert_eq!(round.majority_winner, Some(OptionId(1)));
        assert!(round.eliminated.is_empty());
        assert!(round.vote_counts[&OptionId(1)] >= res.majority_threshold);
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(1)));
    }

    #[test]
    fn batch_elimination_of_shared_minimum() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let ballots = vec![
            ballot("b1", &[1, 2, 3]),
            ballot("b2", &[1, 3, 2]),
            ballot("b3", &[2, 1, 3]),
            ballot("b4", &[3, 1, 2]),
        ];
        let res = run_tally(&options, &ballots);
        assert_eq!(res.rounds.len(), 1);
        let round = &res.rounds[0];
        assert_eq!(round.eliminated, vec![OptionId(2), OptionId(3)]);
        assert_eq!(round.remaining.len(), 3);
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(1)));
    }

    #[test]
    fn two_option_dead_heat() {
        let options = vec![opt(1, "A"), opt(2, "B")];
        let ballots = vec![ballot("b1", &[1, 2]), ballot("b2", &[2, 1])];
        let res = run_tally(&options, &ballots);
        assert!(res.tie);
        assert!(res.winner.is_none());
        assert_eq!(res.rounds.len(), 1);
        assert!(res.rounds[0].tie);
        let tied: Vec<OptionId> = res.tied_options.iter().map(|o| o.id).collect();
        assert_eq!(tied, vec![OptionId(1), OptionId(2)]);
        assert_eq!(res.rounds[0].percentages[&OptionId(1)], 50.0);
    }

    #[test]
    fn no_options() {
        let res = run_tally(&[], &[ballot("b1", &[1])]);
        assert_eq!(res.error, Some(TallyError::NoOptions));
        assert_eq!(res.error.unwrap().to_string(), "No options available");
        assert!(res.winner.is_none());
        assert!(res.rounds.is_empty());
    }

    #[test]
    fn no_ballots() {
        let res = run_tally(&[opt(1, "A")], &[]);
        assert_eq!(res.error, Some(TallyError::NoBallots));
        assert_eq!(res.error.unwrap().to_string(), "No ballots available");
        assert!(res.winner.is_none());
        assert!(res.rounds.is_empty());
    }

    #[test]
    fn single_option_wins_without_rounds() {
        let options = vec![opt(7, "Solo")];
        let ballots = vec![ballot("b1", &[7]), ballot("b2", &[7])];
        let res = run_tally(&options, &ballots);
        assert!(res.rounds.is_empty());
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(7)));
        assert_eq!(res.total_votes, 2);
        assert_eq!(res.majority_threshold, 2);
    }

    #[test]
    fn redistribution_follows_next_preference() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let ballots = vec![
            ballot("b1", &[1, 2, 3]),
            ballot("b2", &[1, 3, 2]),
            ballot("b3", &[2, 1, 3]),
            ballot("b4", &[2, 3, 1]),
            ballot("b5", &[3, 2, 1]),
        ];
        let res = run_tally(&options, &ballots);
        assert_eq!(res.rounds.len(), 2);
        assert_eq!(res.rounds[0].eliminated, vec![OptionId(3)]);
        // b5 moves from C to its second preference B.
        assert_eq!(res.rounds[1].vote_counts[&OptionId(2)], 3);
        assert_eq!(res.rounds[1].vote_counts[&OptionId(1)], 2);
        assert_eq!(res.rounds[1].eliminated, vec![OptionId(1)]);
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(2)));
    }

    #[test]
    fn complete_tie_drops_lowest_identifier() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let ballots = vec![
            ballot("b1", &[1, 2, 3]),
            ballot("b2", &[2, 3, 1]),
            ballot("b3", &[3, 1, 2]),
        ];
        let res = run_tally(&options, &ballots);
        // Everyone at one vote: only the lowest identifier goes.
        assert_eq!(res.rounds[0].eliminated, vec![OptionId(1)]);
        assert_eq!(res.rounds.len(), 2);
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(2)));
    }

    #[test]
    fn exhausted_ballots_sit_out() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C"), opt(4, "D")];
        let ballots = vec![
            ballot("b1", &[1]),
            ballot("b2", &[1]),
            ballot("b3", &[2]),
            ballot("b4", &[2]),
            ballot("b5", &[3]),
            ballot("b6", &[4, 3]),
        ];
        let res = run_tally(&options, &ballots);
        assert_eq!(res.rounds.len(), 2);
        assert_eq!(res.rounds[0].eliminated, vec![OptionId(3), OptionId(4)]);
        // b5 and b6 only ranked eliminated options and contribute nothing.
        let second: u64 = res.rounds[1].vote_counts.values().sum();
        assert_eq!(second, 4);
        assert!(res.tie);
        assert!(res.winner.is_none());
    }

    #[test]
    fn counts_never_exceed_ballots() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let ballots = vec![
            ballot("b1", &[1, 2, 3]),
            ballot("b2", &[2, 1, 3]),
            ballot("b3", &[3]),
            ballot("b4", &[1, 3, 2]),
            ballot("b5", &[2]),
        ];
        let res = run_tally(&options, &ballots);
        for round in res.rounds.iter() {
            let total: u64 = round.vote_counts.values().sum();
            assert!(total <= res.total_votes, "round {}: {}", round.round, total);
        }
    }

    #[test]
    fn unsorted_rankings_are_normalized() {
        let options = vec![opt(1, "A"), opt(2, "B")];
        let shuffled = Ballot {
            id: "b1".to_string(),
            rankings: vec![
                Ranking {
                    option: OptionRef::Id(OptionId(2)),
                    rank: 2,
                },
                Ranking {
                    option: OptionRef::Id(OptionId(1)),
                    rank: 1,
                },
            ],
        };
        let res1 = run_tally(&options, &[shuffled, ballot("b2", &[1, 2])]);
        let res2 = run_tally(&options, &[ballot("b1", &[1, 2]), ballot("b2", &[1, 2])]);
        assert_eq!(res1, res2);
        assert_eq!(res1.winner.as_ref().map(|o| o.id), Some(OptionId(1)));
    }

    #[test]
    fn embedded_option_references_resolve() {
        let options = vec![opt(1, "A"), opt(2, "B")];
        let embedded = Ballot {
            id: "b1".to_string(),
            rankings: vec![
                Ranking {
                    option: OptionRef::Embedded(opt(2, "B")),
                    rank: 1,
                },
                Ranking {
                    option: OptionRef::Id(OptionId(1)),
                    rank: 2,
                },
            ],
        };
        let res = run_tally(&options, &[embedded, ballot("b2", &[2, 1])]);
        assert_eq!(res.winner.as_ref().map(|o| o.id), Some(OptionId(2)));
    }

    #[test]
    fn duplicate_references_credit_first_valid() {
        let options = vec![opt(1, "A"), opt(2, "B")];
        // Malformed on purpose: option 1 ranked twice. The first valid
        // reference wins the ballot's vote; nothing crashes.
        let res = run_tally(
            &options,
            &[ballot("b1", &[1, 1, 2]), ballot("b2", &[2, 1])],
        );
        assert_eq!(res.rounds[0].vote_counts[&OptionId(1)], 1);
        assert_eq!(res.rounds[0].vote_counts[&OptionId(2)], 1);
    }

    #[test]
    fn determinism_over_input_order() {
        let options = vec![opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let ballots = vec![
            ballot("b1", &[1, 2, 3]),
            ballot("b2", &[2, 1, 3]),
            ballot("b3", &[3, 2, 1]),
            ballot("b4", &[1, 3, 2]),
        ];
        let mut reversed = ballots.clone();
        reversed.reverse();
        let mut options_reversed = options.clone();
        options_reversed.reverse();
        let res1 = run_tally(&options, &ballots);
        let res2 = run_tally(&options_reversed, &reversed);
        assert_eq!(res1, res2);
    }
}
