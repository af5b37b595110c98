//! Conversion of raw usage records into [`UsageEvent`]s.
//!
//! A usage log is delimited text whose first line is a header. Only three
//! columns are of interest:
//!
//! ```text
//! user_id ; <unused> ; pickup_station ; <unused> ; return_station ; ...
//! ```

use crate::{error::IngestError, model::UsageEvent};
use csv::StringRecord;
use std::str::FromStr;

/// Delimiter used by the published usage logs.
pub const DEFAULT_DELIMITER: u8 = b';';

/// Column holding the user identifier.
pub const USER_FIELD: usize = 0;
/// Column holding the station the bike was taken from.
pub const PICKUP_FIELD: usize = 2;
/// Column holding the station the bike was returned to.
pub const RETURN_FIELD: usize = 4;

/// Minimum number of columns a usage record must have.
pub const MIN_FIELDS: usize = RETURN_FIELD + 1;

/// Options controlling how raw usage logs are split into fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    pub delimiter: u8,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl ParseOptions {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

/// Parse one usage record.
///
/// `line` is the 1-based line number of the record in its source and is
/// only used for error reporting.
pub fn parse_record(
    record: &StringRecord,
    line: u64,
    options: &ParseOptions,
) -> Result<UsageEvent, IngestError> {
    if record.len() < MIN_FIELDS {
        return Err(IngestError::format(
            line,
            join_record(record, options),
            format!("expected at least {MIN_FIELDS} fields, found {}", record.len()),
        ));
    }

    let field = |index: usize, name: &str| -> Result<u64, IngestError> {
        parse_field(&record[index]).map_err(|error| {
            IngestError::format(
                line,
                join_record(record, options),
                format!("invalid {name} '{}': {error}", &record[index]),
            )
        })
    };

    Ok(UsageEvent {
        user_id: field(USER_FIELD, "user id")?,
        pickup_station: field(PICKUP_FIELD, "pickup station")?,
        return_station: field(RETURN_FIELD, "return station")?,
    })
}

/// Parse a single line of a usage log.
///
/// The line is split on every occurrence of the delimiter: there is no
/// quoting, so a quoted delimiter still separates fields. A blank line has a
/// single empty field and is therefore malformed.
pub fn parse_line(
    line: &str,
    line_number: u64,
    options: &ParseOptions,
) -> Result<UsageEvent, IngestError> {
    let record = StringRecord::from(
        line.trim_end_matches(['\r', '\n'])
            .split(char::from(options.delimiter))
            .collect::<Vec<_>>(),
    );
    parse_record(&record, line_number, options)
}

fn parse_field(field: &str) -> Result<u64, <u64 as FromStr>::Err> {
    field.trim().parse()
}

fn join_record(record: &StringRecord, options: &ParseOptions) -> String {
    let delimiter = char::from(options.delimiter).to_string();
    record.iter().collect::<Vec<_>>().join(&delimiter)
}
