use std::collections::BTreeMap;
use std::path::Path;

use instant_runoff::{OptionId, PollOption};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Maps option texts to their ids, for resolving the cells of ballot files.
pub fn option_index(options: &[PollOption]) -> BTreeMap<String, OptionId> {
    options.iter().map(|o| (o.text.clone(), o.id)).collect()
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
