// Primitives for reading CSV ballot files.

use log::debug;
use snafu::prelude::*;

use instant_runoff::{Ballot, OptionRef, PollOption, Ranking};

use crate::poll::io_common::{make_default_id, option_index};
use crate::poll::{CsvLineParseSnafu, CsvOpenSnafu, PollResult, UnknownOptionNameSnafu};

/// Reads ballots from a CSV file. Each row is one ballot: option texts in
/// descending preference order, blank cells skipped. Ballot ids are
/// synthesized from the file name and the line number.
pub fn read_csv_ballots(path: &str, options: &[PollOption]) -> PollResult<Vec<Ballot>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    parse_records(rdr.into_records(), options, make_default_id(path))
}

fn parse_records<R: std::io::Read>(
    records: csv::StringRecordsIntoIter<R>,
    options: &[PollOption],
    default_id: impl Fn(usize) -> String,
) -> PollResult<Vec<Ballot>> {
    let by_text = option_index(options);
    let mut res: Vec<Ballot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_ballots: lineno: {:?} row: {:?}", lineno, line);
        let mut rankings: Vec<Ranking> = Vec::new();
        for cell in line.iter() {
            let text = cell.trim();
            if text.is_empty() {
                continue;
            }
            let oid = by_text
                .get(text)
                .copied()
                .context(UnknownOptionNameSnafu { name: text, lineno })?;
            rankings.push(Ranking {
                option: OptionRef::Id(oid),
                rank: rankings.len() as u32 + 1,
            });
        }
        res.push(Ballot {
            id: default_id(lineno),
            rankings,
        });
    }
    Ok(res)
}
