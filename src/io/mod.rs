mod http;
mod local;
mod memory;
mod sink;

pub use http::HttpSource;
pub use local::LocalSource;
pub use memory::MemorySource;
pub use sink::{DirectorySink, SaveSink};

use crate::error::Result;
use crate::request::Entry;
use async_trait::async_trait;

/// Trait for an asynchronous stream of archive entries
///
/// Every way of picking files (explicit paths, folder traversal, remote
/// URLs) yields the same [`Entry`] shape, so the encoders never depend on
/// where entries came from.
#[async_trait]
pub trait EntrySource: Send {
    /// Read the next entry, or `None` once the source is exhausted
    async fn next_entry(&mut self) -> Result<Option<Entry>>;

    /// Number of entries still to come, if known up front
    fn remaining(&self) -> Option<usize> {
        None
    }
}

/// Entries from several sources, one source after another
pub struct ChainSource {
    sources: Vec<Box<dyn EntrySource>>,
    current: usize,
}

impl ChainSource {
    pub fn new(sources: Vec<Box<dyn EntrySource>>) -> Self {
        Self {
            sources,
            current: 0,
        }
    }
}

#[async_trait]
impl EntrySource for ChainSource {
    async fn next_entry(&mut self) -> Result<Option<Entry>> {
        while let Some(source) = self.sources.get_mut(self.current) {
            if let Some(entry) = source.next_entry().await? {
                return Ok(Some(entry));
            }
            self.current += 1;
        }
        Ok(None)
    }

    fn remaining(&self) -> Option<usize> {
        self.sources
            .iter()
            .skip(self.current)
            .map(|s| s.remaining())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(path: &str) -> Entry {
        Entry::new(path, Vec::new(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn chain_yields_sources_in_order() {
        let mut chain = ChainSource::new(vec![
            Box::new(MemorySource::new(vec![entry("a"), entry("b")])),
            Box::new(MemorySource::new(Vec::new())),
            Box::new(MemorySource::new(vec![entry("c")])),
        ]);
        assert_eq!(chain.remaining(), Some(3));

        let mut paths = Vec::new();
        while let Some(e) = chain.next_entry().await.unwrap() {
            paths.push(e.path().to_string());
        }
        assert_eq!(paths, ["a", "b", "c"]);
        assert_eq!(chain.remaining(), Some(0));
    }
}
