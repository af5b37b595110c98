//! Aggregation of a usage log into per-user counters.

use crate::{
    error::IngestError,
    model::{UsageEvent, UserRecord},
    parser::{ParseOptions, parse_line},
    registry::{RegistryKind, SortedRegistry, TreeRegistry, UsageRegistry},
};
use log::{debug, info, warn};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
    str,
};

/// Feeds usage events, in arrival order, into a [`UsageRegistry`].
#[derive(Debug, Default)]
pub struct StreamAggregator<R = SortedRegistry> {
    registry: R,
    events: u64,
}

impl<R> StreamAggregator<R>
where
    R: UsageRegistry + Default,
{
    pub fn new() -> Self {
        Self::with_registry(R::default())
    }
}

impl<R> StreamAggregator<R>
where
    R: UsageRegistry,
{
    pub fn with_registry(registry: R) -> Self {
        Self {
            registry,
            events: 0,
        }
    }

    pub fn ingest(&mut self, event: UsageEvent) {
        self.registry.entry(event.user_id).record(&event);
        self.events += 1;
    }

    /// Number of events ingested so far.
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Number of distinct users seen so far.
    pub fn users(&self) -> usize {
        self.registry.len()
    }

    /// Consume the aggregator, returning the records in increasing
    /// `user_id` order.
    pub fn finish(self) -> Vec<UserRecord> {
        self.registry.into_records()
    }
}

impl<R> Extend<UsageEvent> for StreamAggregator<R>
where
    R: UsageRegistry,
{
    fn extend<I: IntoIterator<Item = UsageEvent>>(&mut self, events: I) {
        for event in events {
            self.ingest(event);
        }
    }
}

/// Result of a complete aggregation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// One record per distinct user, ordered by `user_id`.
    pub records: Vec<UserRecord>,
    /// Number of usage events consumed.
    pub events: u64,
}

impl Aggregation {
    pub fn distinct_users(&self) -> usize {
        self.records.len()
    }
}

impl<R> From<StreamAggregator<R>> for Aggregation
where
    R: UsageRegistry,
{
    fn from(aggregator: StreamAggregator<R>) -> Self {
        let events = aggregator.events();
        Self {
            records: aggregator.finish(),
            events,
        }
    }
}

/// Aggregate already parsed events with the default registry.
pub fn aggregate_events<I>(events: I) -> Vec<UserRecord>
where
    I: IntoIterator<Item = UsageEvent>,
{
    let mut aggregator = StreamAggregator::<SortedRegistry>::new();
    aggregator.extend(events);
    aggregator.finish()
}

/// Aggregate a usage log read from `reader`.
///
/// The first line is treated as a header and skipped. `source` names the
/// reader in error messages. Aggregation stops at the first malformed record
/// or read failure; nothing aggregated up to that point is returned.
pub fn aggregate_reader<T>(
    reader: T,
    source: &str,
    options: &ParseOptions,
    kind: RegistryKind,
) -> Result<Aggregation, IngestError>
where
    T: Read,
{
    match kind {
        RegistryKind::Sorted => {
            aggregate_into(reader, source, options, StreamAggregator::<SortedRegistry>::new())
        }
        RegistryKind::Tree => {
            aggregate_into(reader, source, options, StreamAggregator::<TreeRegistry>::new())
        }
    }
}

/// Open `path` and aggregate its contents, see [`aggregate_reader`].
pub fn aggregate_file(
    path: &Path,
    options: &ParseOptions,
    kind: RegistryKind,
) -> Result<Aggregation, IngestError> {
    let source = path.display().to_string();
    let file =
        File::open(path).map_err(|error| IngestError::source_unavailable(&source, error))?;
    aggregate_reader(file, &source, options, kind)
}

fn aggregate_into<T, R>(
    reader: T,
    source: &str,
    options: &ParseOptions,
    mut aggregator: StreamAggregator<R>,
) -> Result<Aggregation, IngestError>
where
    T: Read,
    R: UsageRegistry,
{
    debug!("aggregating usage data from {source}");
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    let mut line = 0;

    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|error| IngestError::source_unavailable(source, error))?;
        if read == 0 {
            break;
        }
        line += 1;
        // Header.
        if line == 1 {
            continue;
        }

        let event = str::from_utf8(&buffer)
            .map_err(|error| {
                let record = String::from_utf8_lossy(&buffer);
                IngestError::format(
                    line,
                    record.trim_end_matches(['\r', '\n']),
                    error.to_string(),
                )
            })
            .and_then(|text| parse_line(text, line, options))
            .inspect_err(|error| warn!("aborting aggregation of {source}: {error}"))?;
        aggregator.ingest(event);
    }

    info!(
        "aggregated {} events from {source} into {} users",
        aggregator.events(),
        aggregator.users()
    );
    Ok(aggregator.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::{collection::vec, prelude::*};
    use rstest::rstest;
    use std::io::{self, Write};

    const HEADER: &str = "Usuario;Retiro;Estacion retiro;Devolucion;Estacion devolucion\n";

    fn aggregate_str(input: &str, kind: RegistryKind) -> Result<Aggregation, IngestError> {
        aggregate_reader(input.as_bytes(), "test", &ParseOptions::default(), kind)
    }

    fn record(user_id: u64, transit_count: u64, circular_count: u64) -> UserRecord {
        UserRecord {
            user_id,
            transit_count,
            circular_count,
        }
    }

    #[rstest]
    fn header_only(#[values(RegistryKind::Sorted, RegistryKind::Tree)] kind: RegistryKind) {
        let aggregation = aggregate_str(HEADER, kind).unwrap();
        assert_eq!(aggregation, Aggregation::default());
        assert_eq!(aggregation.distinct_users(), 0);
    }

    #[rstest]
    fn transit_and_circular(#[values(RegistryKind::Sorted, RegistryKind::Tree)] kind: RegistryKind) {
        let input = format!("{HEADER}10;x;5;y;5\n10;x;5;y;9\n20;x;1;y;1\n");
        let aggregation = aggregate_str(&input, kind).unwrap();

        assert_eq!(aggregation.events, 3);
        assert_eq!(aggregation.records, vec![record(10, 1, 1), record(20, 0, 1)]);
        assert_eq!(aggregation.records[0].total_count(), 2);
        assert_eq!(aggregation.records[1].total_count(), 1);
    }

    #[test]
    fn records_are_ordered_by_id() {
        let input = format!("{HEADER}5;a;1;b;2\n3;a;1;b;2\n9;a;1;b;2\n3;a;4;b;4\n");
        let aggregation = aggregate_str(&input, RegistryKind::Sorted).unwrap();
        let ids: Vec<u64> = aggregation.records.iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![3, 5, 9]);
        assert_eq!(aggregation.records[0], record(3, 1, 1));
    }

    #[test]
    fn malformed_record_aborts() {
        let input = format!("{HEADER}10;x;5;y;5\n10;x\n20;x;1;y;1\n");
        let error = aggregate_str(&input, RegistryKind::Sorted).unwrap_err();
        assert_eq!(
            error,
            IngestError::Format {
                line: 3,
                record: "10;x".to_string(),
                reason: "expected at least 5 fields, found 2".to_string(),
            }
        );
    }

    #[test]
    fn non_integer_station_aborts() {
        let input = format!("{HEADER}10;x;5;y;nine\n");
        let error = aggregate_str(&input, RegistryKind::Tree).unwrap_err();
        assert!(error.is_format());
    }

    #[test]
    fn invalid_utf8_is_a_format_error() {
        let mut input = HEADER.as_bytes().to_vec();
        input.extend_from_slice(b"10;x;5;y;\xff\n");
        let error =
            aggregate_reader(&input[..], "test", &ParseOptions::default(), RegistryKind::Sorted)
                .unwrap_err();
        assert!(error.is_format());
    }

    #[test]
    fn invalid_utf8_keeps_the_record() {
        let mut input = HEADER.as_bytes().to_vec();
        input.extend_from_slice(b"10;x;5;y;\xff\r\n");
        let error =
            aggregate_reader(&input[..], "test", &ParseOptions::default(), RegistryKind::Tree)
                .unwrap_err();
        match error {
            IngestError::Format { line, record, .. } => {
                assert_eq!(line, 2);
                assert_eq!(record, "10;x;5;y;\u{fffd}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    #[case::between_records("10;x;5;y;5\n\n20;x;1;y;1\n", 3)]
    #[case::trailing("10;x;5;y;5\n\n", 3)]
    #[case::crlf("10;x;5;y;5\r\n\r\n20;x;1;y;1\r\n", 3)]
    #[case::first_record("\n10;x;5;y;5\n", 2)]
    fn blank_line_aborts(
        #[case] body: &str,
        #[case] line: u64,
        #[values(RegistryKind::Sorted, RegistryKind::Tree)] kind: RegistryKind,
    ) {
        let error = aggregate_str(&format!("{HEADER}{body}"), kind).unwrap_err();
        assert_eq!(
            error,
            IngestError::Format {
                line,
                record: String::new(),
                reason: "expected at least 5 fields, found 1".to_string(),
            }
        );
    }

    #[test]
    fn quoted_delimiter_is_not_an_escape() {
        let input = format!("{HEADER}10;\"a;b\";5;y;5\n");
        let error = aggregate_str(&input, RegistryKind::Sorted).unwrap_err();
        assert_eq!(
            error,
            IngestError::Format {
                line: 2,
                record: "10;\"a;b\";5;y;5".to_string(),
                reason: "invalid pickup station 'b\"': invalid digit found in string".to_string(),
            }
        );
    }

    /// Yields `data`, then fails every later read.
    struct FailingReader<'a> {
        data: &'a [u8],
    }

    impl Read for FailingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("device went away"));
            }
            let read = self.data.read(buf)?;
            Ok(read)
        }
    }

    #[rstest]
    fn read_failure_is_source_unavailable(
        #[values(RegistryKind::Sorted, RegistryKind::Tree)] kind: RegistryKind,
    ) {
        let input = format!("{HEADER}10;x;5;y;5\n");
        let reader = FailingReader {
            data: input.as_bytes(),
        };
        let error = aggregate_reader(reader, "usos.csv", &ParseOptions::default(), kind)
            .unwrap_err();
        assert!(!error.is_format());
        assert_eq!(
            error,
            IngestError::SourceUnavailable {
                path: "usos.csv".to_string(),
                error: "device went away".to_string(),
            }
        );
    }

    #[test]
    fn missing_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing.csv");
        let error = aggregate_file(&path, &ParseOptions::default(), RegistryKind::Sorted)
            .unwrap_err();
        assert!(matches!(error, IngestError::SourceUnavailable { .. }));
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}7,a,1,b,1").unwrap();
        let aggregation = aggregate_file(
            file.path(),
            &ParseOptions::with_delimiter(b';'),
            RegistryKind::Sorted,
        );
        // The file uses commas, so with ';' every record has a single field.
        assert!(aggregation.unwrap_err().is_format());

        let aggregation = aggregate_file(
            file.path(),
            &ParseOptions::with_delimiter(b','),
            RegistryKind::Sorted,
        )
        .unwrap();
        assert_eq!(aggregation.records, vec![record(7, 0, 1)]);
    }

    proptest! {
        #[test]
        fn conservation(events in vec((0u64..50, 0u64..5, 0u64..5), 0..400)) {
            let events: Vec<UsageEvent> = events
                .into_iter()
                .map(|(user, from, to)| UsageEvent::new(user, from, to))
                .collect();
            let circular = events.iter().filter(|e| e.is_circular()).count() as u64;

            let records = aggregate_events(events.iter().copied());

            prop_assert_eq!(
                records.iter().map(UserRecord::total_count).sum::<u64>(),
                events.len() as u64
            );
            prop_assert_eq!(records.iter().map(|r| r.circular_count).sum::<u64>(), circular);
            prop_assert!(records.windows(2).all(|w| w[0].user_id < w[1].user_id));
        }
    }
}
