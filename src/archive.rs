//! The archive orchestrator.
//!
//! [`Archiver`] drives one build end to end: it drains an [`EntrySource`],
//! validates the resulting [`ArchiveRequest`], runs the encoder for the
//! requested format (and the gzip codec when needed), and hands the finished
//! [`ArchiveBuffer`] to a [`SaveSink`], falling back to a second sink when the
//! first one rejects it.
//!
//! Every step is awaited strictly in sequence. A failure anywhere aborts the
//! build, discards partial output and resets progress to zero.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

use crate::codec::{Compressor, default_compressor};
use crate::error::{ArchiveError, Result};
use crate::io::{EntrySource, SaveSink};
use crate::progress::{NoProgress, Phase, ProgressObserver, ProgressTracker};
use crate::request::{ArchiveBuffer, ArchiveFormat, ArchiveOptions, ArchiveRequest, Entry};
use crate::tar::TarWriter;
use crate::zip::ZipWriter;

/// Where a finished archive was delivered.
#[derive(Debug)]
pub struct SaveReport {
    pub file_name: String,
    pub location: PathBuf,
    pub size: u64,
    pub mime_type: &'static str,
    /// Why the primary sink was bypassed, if it was
    pub fallback_cause: Option<ArchiveError>,
}

impl SaveReport {
    pub fn used_fallback(&self) -> bool {
        self.fallback_cause.is_some()
    }
}

/// Builds archives from entries.
///
/// ## Example
///
/// ```no_run
/// use autozip::{Archiver, ArchiveFormat, ArchiveOptions, DirectorySink, LocalSource};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut source = LocalSource::new(["./photos"])?;
///     let options = ArchiveOptions::new(ArchiveFormat::TarGz).append_timestamp(true);
///
///     let report = Archiver::new()
///         .run(&mut source, options, &DirectorySink::new("."), Some(&DirectorySink::temp()))
///         .await?;
///     println!("saved {}", report.location.display());
///     Ok(())
/// }
/// ```
pub struct Archiver {
    compressor: Arc<dyn Compressor>,
    observer: Arc<dyn ProgressObserver>,
}

impl Archiver {
    /// Archiver using this build's default gzip codec and no progress output.
    pub fn new() -> Self {
        Self {
            compressor: Arc::from(default_compressor()),
            observer: Arc::new(NoProgress),
        }
    }

    pub fn with_compressor(mut self, compressor: impl Compressor + 'static) -> Self {
        self.compressor = Arc::new(compressor);
        self
    }

    pub fn with_progress(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Read every entry from `source` and validate them against `options`.
    pub async fn collect(
        &self,
        source: &mut dyn EntrySource,
        options: ArchiveOptions,
    ) -> Result<ArchiveRequest> {
        let mut tracker = ProgressTracker::new(self.observer.as_ref());
        self.collect_inner(source, options, &mut tracker)
            .await
            .inspect_err(|e| abort(&mut tracker, e))
    }

    /// Encode a validated request into a finished buffer.
    pub async fn build(&self, request: ArchiveRequest) -> Result<ArchiveBuffer> {
        let mut tracker = ProgressTracker::new(self.observer.as_ref());
        self.build_inner(request, Local::now(), &mut tracker)
            .await
            .inspect_err(|e| abort(&mut tracker, e))
    }

    /// Read, encode, compress and save in one go.
    ///
    /// When `primary` rejects the archive and a `fallback` sink is given, the
    /// archive is delivered through the fallback and the primary's error is
    /// kept in [`SaveReport::fallback_cause`].
    pub async fn run(
        &self,
        source: &mut dyn EntrySource,
        options: ArchiveOptions,
        primary: &dyn SaveSink,
        fallback: Option<&dyn SaveSink>,
    ) -> Result<SaveReport> {
        let mut tracker = ProgressTracker::new(self.observer.as_ref());
        let result = async {
            let request = self.collect_inner(source, options, &mut tracker).await?;
            let buffer = self.build_inner(request, Local::now(), &mut tracker).await?;
            let report = deliver(buffer, primary, fallback, &mut tracker).await?;
            tracker.done();
            Ok::<_, ArchiveError>(report)
        }
        .await;

        result.inspect_err(|e| abort(&mut tracker, e))
    }

    async fn collect_inner(
        &self,
        source: &mut dyn EntrySource,
        options: ArchiveOptions,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<ArchiveRequest> {
        // Only emptiness is final before duplicates are removed
        if source.remaining() == Some(0) {
            options.format.check_entry_count(0)?;
        }

        let mut entries: Vec<Entry> = Vec::new();
        let mut seen: HashSet<(String, u64, DateTime<Utc>)> = HashSet::new();
        tracker.report(Phase::Read, 0, 1);

        while let Some(entry) = source.next_entry().await? {
            let key = (entry.path().to_string(), entry.size(), entry.modified_at());
            if seen.insert(key) {
                debug!(path = entry.path(), size = entry.size(), "read");
                entries.push(entry);
            } else {
                debug!(path = entry.path(), "skipping duplicate");
            }

            let total = entries.len() + source.remaining().unwrap_or(0);
            tracker.report(Phase::Read, entries.len(), total);
        }

        ArchiveRequest::new(entries, options)
    }

    async fn build_inner(
        &self,
        request: ArchiveRequest,
        now: DateTime<Local>,
        tracker: &mut ProgressTracker<'_>,
    ) -> Result<ArchiveBuffer> {
        let format = request.format();
        let file_name = request.output_name(now);
        info!(
            format = %format,
            gzip = format.needs_codec(),
            entries = request.entries().len(),
            file_name = %file_name,
            "building archive"
        );

        let entries = request.into_entries();
        let bytes = match format {
            ArchiveFormat::Zip => encode_zip(&entries, tracker)?,
            ArchiveFormat::Tar => encode_tar(&entries, tracker)?,
            ArchiveFormat::TarGz => {
                let tar = encode_tar(&entries, tracker)?;
                drop(entries);
                self.compress(tar, tracker).await?
            }
            ArchiveFormat::Gzip => {
                let content = entries
                    .into_iter()
                    .next()
                    .ok_or(ArchiveError::EmptySelection)?
                    .into_content();
                tracker.report(Phase::Encode, 1, 1);
                self.compress(content, tracker).await?
            }
        };

        Ok(ArchiveBuffer::new(bytes, file_name, format))
    }

    async fn compress(&self, data: Vec<u8>, tracker: &mut ProgressTracker<'_>) -> Result<Vec<u8>> {
        tracker.report(Phase::Compress, 0, 1);
        let compressed = self.compressor.gzip(data).await?;
        tracker.report(Phase::Compress, 1, 1);
        Ok(compressed)
    }
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_zip(entries: &[Entry], tracker: &mut ProgressTracker<'_>) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::for_entries(entries);
    for (i, entry) in entries.iter().enumerate() {
        writer.add(entry)?;
        tracker.report(Phase::Encode, i + 1, entries.len());
    }
    writer.finish()
}

fn encode_tar(entries: &[Entry], tracker: &mut ProgressTracker<'_>) -> Result<Vec<u8>> {
    let mut writer = TarWriter::for_entries(entries);
    for (i, entry) in entries.iter().enumerate() {
        writer.add(entry)?;
        tracker.report(Phase::Encode, i + 1, entries.len());
    }
    Ok(writer.finish())
}

async fn deliver(
    buffer: ArchiveBuffer,
    primary: &dyn SaveSink,
    fallback: Option<&dyn SaveSink>,
    tracker: &mut ProgressTracker<'_>,
) -> Result<SaveReport> {
    tracker.report(Phase::Save, 0, 1);

    let mime_type = buffer.mime_type();
    let (location, fallback_cause) =
        match primary.save(buffer.bytes(), buffer.file_name(), mime_type).await {
            Ok(location) => (location, None),
            Err(cause) => {
                let Some(fallback) = fallback else {
                    return Err(cause);
                };
                warn!(error = %cause, "primary save failed, using fallback");
                let location = fallback
                    .save(buffer.bytes(), buffer.file_name(), mime_type)
                    .await?;
                (location, Some(cause))
            }
        };

    tracker.report(Phase::Save, 1, 1);
    info!(path = %location.display(), size = buffer.len(), "archive saved");

    Ok(SaveReport {
        file_name: buffer.file_name().to_string(),
        location,
        size: buffer.len() as u64,
        mime_type,
        fallback_cause,
    })
}

fn abort(tracker: &mut ProgressTracker<'_>, error: &ArchiveError) {
    warn!(%error, "archive build failed");
    tracker.fail();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NoCodec;
    use crate::io::MemorySource;
    use chrono::TimeZone;

    fn entry(path: &str, content: &[u8]) -> Entry {
        Entry::new(path, content.to_vec(), Utc.timestamp_opt(1_700_000_000, 0).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn duplicates_are_collected_once() {
        let mut source = MemorySource::new(vec![
            entry("a.txt", b"1"),
            entry("a.txt", b"1"),
            entry("a.txt", b"22"),
        ]);
        let request = Archiver::new()
            .collect(&mut source, ArchiveOptions::new(ArchiveFormat::Zip))
            .await
            .unwrap();
        assert_eq!(request.entries().len(), 2);
    }

    #[tokio::test]
    async fn gzip_single_accepts_a_repeated_file() {
        let same = entry("notes.txt", b"hello");
        let mut source = MemorySource::new(vec![same.clone(), same]);
        let request = Archiver::new()
            .collect(&mut source, ArchiveOptions::new(ArchiveFormat::Gzip))
            .await
            .unwrap();
        assert_eq!(request.entries().len(), 1);
        assert_eq!(request.entries()[0].path(), "notes.txt");
    }

    #[tokio::test]
    async fn gzip_single_rejects_distinct_files() {
        let mut source = MemorySource::new(vec![entry("a", b"1"), entry("b", b"2")]);
        let err = Archiver::new()
            .collect(&mut source, ArchiveOptions::new(ArchiveFormat::Gzip))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::SingleFileRequired(2)));
    }

    #[tokio::test]
    async fn empty_source_fails_before_reading() {
        let mut source = MemorySource::new(Vec::new());
        let err = Archiver::new()
            .collect(&mut source, ArchiveOptions::new(ArchiveFormat::Zip))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::EmptySelection));
    }

    #[tokio::test]
    async fn missing_codec_is_an_error_not_a_fallback() {
        let request = ArchiveRequest::new(
            vec![entry("a", b"1")],
            ArchiveOptions::new(ArchiveFormat::TarGz),
        )
        .unwrap();
        let err = Archiver::new()
            .with_compressor(NoCodec)
            .build(request)
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::CodecUnavailable));
    }

    #[tokio::test]
    async fn buffer_carries_name_and_labels() {
        let request = ArchiveRequest::new(
            vec![entry("docs/a.txt", b"1")],
            ArchiveOptions::new(ArchiveFormat::Tar),
        )
        .unwrap();
        let buffer = Archiver::new().build(request).await.unwrap();
        assert_eq!(buffer.file_name(), "docs.tar");
        assert_eq!(buffer.mime_type(), "application/x-tar");
        assert_eq!(buffer.len() % 512, 0);
    }
}
