//! Ordered, duplicate-free collections of per-user counters.
//!
//! The aggregator only needs "give me the record of this user, creating it if
//! needed" and, once the input is exhausted, "give me every record ordered by
//! user id". [`UsageRegistry`] captures exactly that, so that the vector-backed
//! [`SortedRegistry`] can be swapped for the tree-backed [`TreeRegistry`] when
//! the number of distinct users makes shifting inserts too expensive.

use crate::model::UserRecord;
use clap::ValueEnum;
use log::trace;
use std::collections::{BTreeMap, btree_map::Entry};

/// Ordered mapping from user id to that user's counters.
pub trait UsageRegistry {
    /// Return the record of `user_id`, inserting an empty one if the user has
    /// not been seen before.
    fn entry(&mut self, user_id: u64) -> &mut UserRecord;

    /// Number of distinct users.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, in strictly increasing `user_id` order.
    fn into_records(self) -> Vec<UserRecord>
    where
        Self: Sized;
}

/// Registry implementations selectable at run time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum RegistryKind {
    /// Sorted vector: binary-search lookup, O(n) shifting insert.
    #[default]
    Sorted,
    /// B-tree: O(log n) lookup and insert.
    Tree,
}

/// A vector of [`UserRecord`]s kept in strictly increasing `user_id` order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortedRegistry {
    records: Vec<UserRecord>,
}

impl SortedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binary search for `user_id`.
    ///
    /// Returns `(true, index)` if the user is present at `index`. Otherwise
    /// returns `(false, index)` where `index` is the position at which the
    /// user would have to be inserted to keep the records ordered: the
    /// position of the first record with a greater id, or `len()` if every
    /// id is smaller.
    pub fn find(&self, user_id: u64) -> (bool, usize) {
        match self
            .records
            .binary_search_by_key(&user_id, |record| record.user_id)
        {
            Ok(index) => (true, index),
            Err(index) => (false, index),
        }
    }

    /// Return the index of `user_id`, inserting an empty record at its
    /// ordered position first if the user is not present.
    pub fn locate_or_insert(&mut self, user_id: u64) -> usize {
        let (found, index) = self.find(user_id);
        if !found {
            trace!("inserting user {user_id} at position {index}");
            self.records.insert(index, UserRecord::new(user_id));
        }
        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UserRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut UserRecord> {
        self.records.get_mut(index)
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<UserRecord> {
        self.records
    }
}

impl UsageRegistry for SortedRegistry {
    fn entry(&mut self, user_id: u64) -> &mut UserRecord {
        let index = self.locate_or_insert(user_id);
        &mut self.records[index]
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn into_records(self) -> Vec<UserRecord> {
        self.records
    }
}

/// Registry backed by a [`BTreeMap`], for inputs with many distinct users.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeRegistry {
    records: BTreeMap<u64, UserRecord>,
}

impl TreeRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageRegistry for TreeRegistry {
    fn entry(&mut self, user_id: u64) -> &mut UserRecord {
        match self.records.entry(user_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!("inserting user {user_id}");
                entry.insert(UserRecord::new(user_id))
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn into_records(self) -> Vec<UserRecord> {
        self.records.into_values().collect()
    }
}
