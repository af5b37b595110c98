//! Model structs for bike-sharing usage logs.

use serde::{Serialize, Serializer, ser::SerializeStruct};

/// A single rental: a user picked up a bike at one station and returned it
/// at another (or the same) one.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct UsageEvent {
    pub user_id: u64,
    pub pickup_station: u64,
    pub return_station: u64,
}

impl UsageEvent {
    pub fn new(user_id: u64, pickup_station: u64, return_station: u64) -> Self {
        Self {
            user_id,
            pickup_station,
            return_station,
        }
    }

    /// A circular trip returns the bike to the station it was taken from.
    pub fn is_circular(&self) -> bool {
        self.pickup_station == self.return_station
    }
}

/// Aggregated usage of one user.
///
/// The total number of trips is derived from the two counters and is never
/// stored, so the counters are the only state that needs updating.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct UserRecord {
    pub user_id: u64,
    /// Trips between two different stations.
    pub transit_count: u64,
    /// Trips that started and ended at the same station.
    pub circular_count: u64,
}

impl UserRecord {
    /// A record for `user_id` with no trips yet.
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            transit_count: 0,
            circular_count: 0,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.transit_count + self.circular_count
    }

    /// Account for one more trip of this user.
    pub fn record(&mut self, event: &UsageEvent) {
        debug_assert_eq!(event.user_id, self.user_id);
        if event.is_circular() {
            self.circular_count += 1;
        } else {
            self.transit_count += 1;
        }
    }
}

// Hand-written so that the derived total ends up in exported rows.
impl Serialize for UserRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut row = serializer.serialize_struct("UserRecord", 4)?;
        row.serialize_field("user_id", &self.user_id)?;
        row.serialize_field("transit_count", &self.transit_count)?;
        row.serialize_field("circular_count", &self.circular_count)?;
        row.serialize_field("total_count", &self.total_count())?;
        row.end()
    }
}
