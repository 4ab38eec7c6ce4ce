use log::{info, warn};

use instant_runoff::*;
use snafu::{prelude::*, Snafu};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::poll::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;

#[derive(Debug, Snafu)]
pub enum PollError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Unknown option {name:?} on CSV line {lineno}"))]
    UnknownOptionName { name: String, lineno: usize },
    #[snafu(display("The tally failed: {message}"))]
    TallyFailed { message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollResult<T> = Result<T, PollError>;

fn name_of(names: &BTreeMap<OptionId, String>, id: &OptionId) -> String {
    names
        .get(id)
        .cloned()
        .unwrap_or_else(|| format!("option-{}", id.0))
}

fn result_to_json(rs: &TallyResult, names: &BTreeMap<OptionId, String>) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round in rs.rounds.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (oid, count) in round.vote_counts.iter() {
            tally.insert(name_of(names, oid), json!(count));
        }
        let mut percentages: JSMap<String, JSValue> = JSMap::new();
        for (oid, pct) in round.percentages.iter() {
            percentages.insert(name_of(names, oid), json!(pct));
        }
        let remaining: Vec<JSValue> = round
            .remaining
            .iter()
            .map(|oid| json!(name_of(names, oid)))
            .collect();
        let eliminated: Vec<JSValue> = round
            .eliminated
            .iter()
            .map(|oid| json!(name_of(names, oid)))
            .collect();
        let mut js = json!({
            "round": round.round,
            "tally": tally,
            "percentages": percentages,
            "remaining": remaining,
            "eliminated": eliminated,
        });
        // Majority and tie markers only appear on the rounds they apply to.
        if let Some(w) = round.majority_winner {
            js["majorityWinner"] = json!(name_of(names, &w));
        }
        if round.tie {
            js["tie"] = json!(true);
        }
        l.push(js);
    }
    l
}

fn build_summary_js(config: &PollConfig, rs: &TallyResult) -> JSValue {
    let names: BTreeMap<OptionId, String> = config
        .options
        .iter()
        .map(|o| (OptionId(o.id), o.text.clone()))
        .collect();
    json!({
        "poll": { "title": config.poll.title },
        "totalVotes": rs.total_votes,
        "majorityThreshold": rs.majority_threshold,
        "winner": rs.winner.as_ref().map(|o| o.text.clone()),
        "tie": rs.tie,
        "tiedOptions": rs.tied_options.iter().map(|o| o.text.clone()).collect::<Vec<String>>(),
        "error": rs.error.map(|e| e.to_string()),
        "results": result_to_json(rs, &names),
    })
}

/// Submission checks: a well-formed ballot ranks every option exactly once
/// with contiguous ranks starting at 1. The engine tolerates anything (first
/// valid preference wins the vote), so offending ballots are logged and kept.
fn check_ballots(ballots: &[Ballot], options: &[PollOption]) {
    let expected: BTreeSet<OptionId> = options.iter().map(|o| o.id).collect();
    for b in ballots.iter() {
        let ids: BTreeSet<OptionId> = b.rankings.iter().map(|r| r.option.option_id()).collect();
        let mut ranks: Vec<u32> = b.rankings.iter().map(|r| r.rank).collect();
        ranks.sort_unstable();
        let sequential = ranks.iter().enumerate().all(|(idx, r)| *r == idx as u32 + 1);
        let complete = ids == expected && ids.len() == b.rankings.len();
        if !(sequential && complete) {
            warn!(
                "ballot {}: not a complete ranking of every option, tallying first valid preferences",
                b.id
            );
        }
    }
}

pub fn run_poll(args: &Args) -> PollResult<()> {
    let config = read_poll_config(&args.poll)?;
    info!("poll: {}", config.poll.title);

    let options = assemble_options(&config.options);
    let mut ballots = assemble_ballots(&config.ballots)?;
    if let Some(csv_path) = &args.ballots {
        let mut extra = io_csv::read_csv_ballots(csv_path, &options)?;
        info!("read {} ballots from {}", extra.len(), csv_path);
        ballots.append(&mut extra);
    }

    check_ballots(&ballots, &options);

    let result = run_tally(&options, &ballots);

    let summary = build_summary_js(&config, &result);
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty),
        Some(path) => {
            fs::write(path, &pretty).context(OpeningFileSnafu { path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        let reference = read_summary(reference_path)?;
        let pretty_ref = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_ref != pretty {
            warn!("Found differences with the reference summary");
            print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
            whatever!("Difference detected between calculated summary and reference summary");
        }
    }

    if let Some(e) = &result.error {
        return TallyFailedSnafu {
            message: e.to_string(),
        }
        .fail();
    }

    Ok(())
}
