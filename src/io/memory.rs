use super::EntrySource;
use crate::error::Result;
use crate::request::Entry;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Entries already held in memory
pub struct MemorySource {
    entries: VecDeque<Entry>,
}

impl MemorySource {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }
}

impl From<Vec<Entry>> for MemorySource {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries)
    }
}

#[async_trait]
impl EntrySource for MemorySource {
    async fn next_entry(&mut self) -> Result<Option<Entry>> {
        Ok(self.entries.pop_front())
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
