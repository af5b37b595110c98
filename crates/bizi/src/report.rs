//! Presentation of the most active users.

use crate::{model::UserRecord, topk::select_top};
use std::{fmt, io::Write};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

/// Column titles of the report table.
pub const COLUMNS: [&str; 4] = ["User", "Transit", "Circular", "Total"];

/// The top of the usage ranking together with the number of users it was
/// selected from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub distinct_users: usize,
    pub top: Vec<UserRecord>,
}

impl Report {
    /// Select the `k` most active users out of `records`.
    pub fn new(mut records: Vec<UserRecord>, k: usize) -> Self {
        let distinct_users = records.len();
        select_top(&mut records, k);
        records.truncate(k);
        Self {
            distinct_users,
            top: records,
        }
    }

    /// Render the ranking as a right-aligned text table.
    pub fn table(&self) -> String {
        let mut rows = Vec::with_capacity(self.top.len() + 1);
        rows.push(COLUMNS.map(String::from));
        for user in &self.top {
            rows.push([
                user.user_id.to_string(),
                user.transit_count.to_string(),
                user.circular_count.to_string(),
                user.total_count().to_string(),
            ]);
        }

        Builder::from_iter(rows)
            .build()
            .with(Style::blank())
            .modify(Columns::new(..), Alignment::right())
            .to_string()
    }

    /// Write the ranking as csv, one row per user with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for user in &self.top {
            writer.serialize(user)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Distinct users: {}", self.distinct_users)?;
        writeln!(f)?;
        writeln!(f, "{}", self.table())
    }
}
