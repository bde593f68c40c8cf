//! End-to-end builds through the orchestrator.

use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use autozip::{
    ArchiveError, ArchiveFormat, ArchiveOptions, Archiver, DirectorySink, Entry, LocalSource,
    MemorySource, Phase, Progress, SaveSink,
};
use chrono::{TimeZone, Utc};
use flate2::read::GzDecoder;

fn entry(path: &str, content: &[u8]) -> Entry {
    let mtime = Utc.with_ymd_and_hms(2023, 6, 1, 8, 0, 0).unwrap();
    Entry::new(path, content.to_vec(), mtime).unwrap()
}

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
    out
}

/// Sink that rejects everything
struct BrokenSink;

#[async_trait]
impl SaveSink for BrokenSink {
    async fn save(&self, _: &[u8], file_name: &str, _: &str) -> autozip::Result<PathBuf> {
        Err(ArchiveError::SaveFailure {
            file_name: file_name.to_string(),
            source: "disk full".into(),
        })
    }
}

#[tokio::test]
async fn zip_of_folder_is_named_after_it() {
    let tmp = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![
        entry("photos/a.jpg", b"aaa"),
        entry("photos/2023/b.jpg", b"bbb"),
    ]);

    let report = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::Zip),
            &DirectorySink::new(tmp.path()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.file_name, "photos.zip");
    assert_eq!(report.location, tmp.path().join("photos.zip"));
    assert_eq!(report.mime_type, "application/zip");
    assert!(!report.used_fallback());

    let bytes = std::fs::read(&report.location).unwrap();
    assert_eq!(bytes.len() as u64, report.size);
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive
        .by_name("photos/2023/b.jpg")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content, "bbb");
}

#[tokio::test]
async fn tar_gz_decompresses_to_a_valid_tar() {
    let tmp = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![entry("dir/x.txt", b"x"), entry("dir/y.txt", b"y")]);

    let report = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::TarGz).base_name("bundle"),
            &DirectorySink::new(tmp.path()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(report.file_name, "bundle.tar.gz");
    assert_eq!(report.mime_type, "application/gzip");

    let tar_bytes = gunzip(&std::fs::read(&report.location).unwrap());
    let mut archive = tar::Archive::new(tar_bytes.as_slice());
    let paths: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(paths, ["dir/", "dir/x.txt", "dir/y.txt"]);
}

#[tokio::test]
async fn gzip_single_keeps_the_stem() {
    let tmp = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![entry("notes.txt", b"remember the milk")]);

    let report = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::Gzip),
            &DirectorySink::new(tmp.path()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.file_name, "notes.gz");
    let bytes = std::fs::read(&report.location).unwrap();
    assert_eq!(gunzip(&bytes), b"remember the milk");
}

#[tokio::test]
async fn timestamp_suffix_is_applied() {
    let tmp = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new(vec![entry("a.txt", b"a"), entry("b.txt", b"b")]);

    let report = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::Tar).append_timestamp(true),
            &DirectorySink::new(tmp.path()),
            None,
        )
        .await
        .unwrap();

    // archive_YYYYMMDD_HHMMSS.tar
    let name = &report.file_name;
    assert!(name.starts_with("archive_"), "{name}");
    assert!(name.ends_with(".tar"), "{name}");
    assert_eq!(name.len(), "archive_".len() + 15 + ".tar".len());
}

#[tokio::test]
async fn failed_primary_falls_back() {
    let tmp = tempfile::tempdir().unwrap();
    let fallback = DirectorySink::new(tmp.path());
    let mut source = MemorySource::new(vec![entry("a.txt", b"a")]);

    let report = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::Zip),
            &BrokenSink,
            Some(&fallback),
        )
        .await
        .unwrap();

    assert!(report.used_fallback());
    assert!(matches!(
        report.fallback_cause,
        Some(ArchiveError::SaveFailure { .. })
    ));
    assert_eq!(report.location, tmp.path().join("a.zip"));
    assert!(report.location.exists());
}

#[tokio::test]
async fn failed_primary_without_fallback_is_an_error() {
    let mut source = MemorySource::new(vec![entry("a.txt", b"a")]);
    let err = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::Zip),
            &BrokenSink,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::SaveFailure { .. }));
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_100() {
    let tmp = tempfile::tempdir().unwrap();
    let events = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = events.clone();
    let archiver = Archiver::new().with_progress(move |p: Progress| sink.lock().unwrap().push(p));

    let mut source = MemorySource::new(vec![
        entry("a/1.txt", b"1"),
        entry("a/2.txt", b"2"),
        entry("a/3.txt", b"3"),
    ]);
    archiver
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::TarGz),
            &DirectorySink::new(tmp.path()),
            None,
        )
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
    let last = events.last().unwrap();
    assert_eq!((last.phase, last.percent), (Phase::Done, 100));
    for phase in [Phase::Read, Phase::Encode, Phase::Compress, Phase::Save] {
        assert!(events.iter().any(|p| p.phase == phase), "{phase:?} missing");
    }
}

#[tokio::test]
async fn empty_selection_fails_and_resets_progress() {
    let events = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = events.clone();
    let archiver = Archiver::new().with_progress(move |p: Progress| sink.lock().unwrap().push(p));

    let err = archiver
        .run(
            &mut MemorySource::new(Vec::new()),
            ArchiveOptions::new(ArchiveFormat::Zip),
            &BrokenSink,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::EmptySelection));

    let last = *events.lock().unwrap().last().unwrap();
    assert_eq!((last.phase, last.percent), (Phase::Failed, 0));
}

#[tokio::test]
async fn gzip_with_two_entries_is_rejected() {
    let err = Archiver::new()
        .run(
            &mut MemorySource::new(vec![entry("a", b"1"), entry("b", b"2")]),
            ArchiveOptions::new(ArchiveFormat::Gzip),
            &BrokenSink,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::SingleFileRequired(2)));
}

#[tokio::test]
async fn local_folder_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("project");
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("Cargo.toml"), "[package]").unwrap();
    std::fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();

    let out = tmp.path().join("out");
    let mut source = LocalSource::new([&root]).unwrap();
    let report = Archiver::new()
        .run(
            &mut source,
            ArchiveOptions::new(ArchiveFormat::Tar),
            &DirectorySink::new(&out),
            None,
        )
        .await
        .unwrap();
    assert_eq!(report.file_name, "project.tar");

    let bytes = std::fs::read(out.join("project.tar")).unwrap();
    let mut archive = tar::Archive::new(bytes.as_slice());
    let paths: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        paths,
        ["project/", "project/Cargo.toml", "project/src/", "project/src/main.rs"]
    );
}
