use log::debug;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use std::fs;

use instant_runoff::{Ballot, OptionId, OptionRef, PollOption, Ranking};

use crate::poll::{OpeningFileSnafu, ParsingJsonSnafu, PollResult};

/// Top-level settings of a poll description file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OptionRecord {
    pub id: u64,
    pub text: String,
}

impl OptionRecord {
    pub fn to_option(&self) -> PollOption {
        PollOption {
            id: OptionId(self.id),
            text: self.text.clone(),
        }
    }
}

/// One ranking inside a ballot. The wire format accepts either a bare
/// `optionId` or an embedded `option` record; when both are present the bare
/// id takes precedence.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankingRecord {
    #[serde(rename = "optionId")]
    pub option_id: Option<u64>,
    pub option: Option<OptionRecord>,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotRecord {
    pub id: String,
    pub rankings: Vec<RankingRecord>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub poll: PollSettings,
    pub options: Vec<OptionRecord>,
    pub ballots: Vec<BallotRecord>,
}

pub fn read_poll_config(path: &str) -> PollResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_poll_config: read {} bytes from {}", contents.len(), path);
    let config: PollConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> PollResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn assemble_options(records: &[OptionRecord]) -> Vec<PollOption> {
    records.iter().map(|r| r.to_option()).collect()
}

pub fn assemble_ballots(records: &[BallotRecord]) -> PollResult<Vec<Ballot>> {
    let mut res: Vec<Ballot> = Vec::new();
    for record in records.iter() {
        let mut rankings: Vec<Ranking> = Vec::new();
        for r in record.rankings.iter() {
            let option = match (&r.option_id, &r.option) {
                (Some(id), _) => OptionRef::Id(OptionId(*id)),
                (None, Some(rec)) => OptionRef::Embedded(rec.to_option()),
                (None, None) => {
                    whatever!(
                        "Ballot {}: ranking at rank {} has neither an option id nor an option",
                        record.id,
                        r.rank
                    );
                }
            };
            rankings.push(Ranking {
                option,
                rank: r.rank,
            });
        }
        res.push(Ballot {
            id: record.id.clone(),
            rankings,
        });
    }
    Ok(res)
}
