//! Per-user usage statistics for bike-sharing rental logs.
//!
//! A usage log is aggregated into one [`UserRecord`] per distinct user, kept
//! in a registry ordered by user id ([`registry`]). Once the whole log has
//! been consumed, the most active users are moved to the front of the
//! records by partial selection ([`topk`]) and presented as a [`Report`].
//!
//! ```
//! use bizi::{Report, RegistryKind, aggregator::aggregate_reader, parser::ParseOptions};
//!
//! let log = "user;taken;from;returned;to\n10;x;5;y;5\n10;x;5;y;9\n20;x;1;y;1\n";
//! let aggregation =
//!     aggregate_reader(log.as_bytes(), "log", &ParseOptions::default(), RegistryKind::Sorted)
//!         .unwrap();
//! let report = Report::new(aggregation.records, 1);
//!
//! assert_eq!(report.distinct_users, 2);
//! assert_eq!(report.top[0].user_id, 10);
//! assert_eq!(report.top[0].total_count(), 2);
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod registry;
pub mod report;
pub mod topk;

pub use aggregator::{Aggregation, StreamAggregator};
pub use config::Config;
pub use error::IngestError;
pub use model::{UsageEvent, UserRecord};
pub use registry::{RegistryKind, SortedRegistry, TreeRegistry, UsageRegistry};
pub use report::Report;
pub use topk::select_top;
