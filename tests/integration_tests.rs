//! Integration tests for tree-walker
//!
//! These walk real directory trees created under a temp dir.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;
use tree_walker::config::{CliArgs, WalkConfig};
use tree_walker::{EntryType, WalkBuilder, WalkEvent, WalkEvents, WalkSummary, Walker};

const TIMEOUT: Duration = Duration::from_secs(30);

async fn drain(events: WalkEvents) -> Vec<WalkEvent> {
    tokio::time::timeout(TIMEOUT, events.collect_until_end())
        .await
        .expect("walk did not finish")
}

fn kinds(events: &[WalkEvent]) -> HashMap<PathBuf, EntryType> {
    events
        .iter()
        .filter_map(|e| e.entry().map(|entry| (entry.path.clone(), entry.kind)))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_walk_sample_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("r");
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("b").join("c.txt"), b"charlie!").unwrap();

    let (_walker, events) = Walker::new(&root);
    let events = drain(events).await;

    let kinds = kinds(&events);
    assert_eq!(kinds.len(), 4);
    assert_eq!(kinds[&root], EntryType::Directory);
    assert_eq!(kinds[&root.join("a.txt")], EntryType::File);
    assert_eq!(kinds[&root.join("b")], EntryType::Directory);
    assert_eq!(kinds[&root.join("b").join("c.txt")], EntryType::File);

    assert_eq!(events.iter().filter(|e| e.is_end()).count(), 1);
    assert!(events.last().unwrap().is_end());

    let summary = WalkSummary::from_events(&events);
    assert_eq!(summary.dirs, 2);
    assert_eq!(summary.files, 2);
    assert_eq!(summary.bytes, 13);
    assert_eq!(summary.errors(), 0);
    assert!(summary.completed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_walk_single_file_root() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("only.txt");
    fs::write(&file, b"x").unwrap();

    let (_walker, events) = Walker::new(&file);
    let events = drain(events).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), Some(EntryType::File));
    assert!(events[1].is_end());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_root_reports_error_then_end() {
    let dir = tempdir().unwrap();
    let (_walker, events) = Walker::new(dir.path().join("missing"));
    let events = drain(events).await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        WalkEvent::Error { error, stat, .. } => {
            assert!(error.is_not_found());
            assert!(stat.is_none());
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(events[1].is_end());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_prune_with_config_filter() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    fs::create_dir_all(root.join("src/nested")).unwrap();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::write(root.join("src/lib.rs"), b"").unwrap();
    fs::write(root.join("src/nested/deep.rs"), b"").unwrap();
    fs::write(root.join("target/debug/out"), b"").unwrap();

    let args = CliArgs {
        roots: vec![root.clone()],
        exclude_patterns: vec!["/target$".to_string()],
        max_depth: Some(1),
        max_in_flight: Some(4),
        format: tree_walker::OutputFormat::Text,
        summary_only: true,
        quiet: true,
        verbose: false,
    };
    let config = std::sync::Arc::new(WalkConfig::from_args(args).unwrap());
    let filter_config = std::sync::Arc::clone(&config);

    let mut builder = WalkBuilder::new()
        .directory_filter(move |path, _| filter_config.should_descend(path))
        .max_in_flight(4);
    let events = builder.subscribe();
    let _walker = builder.start(&root);
    let events = drain(events).await;

    let paths: Vec<&Path> = events.iter().filter_map(WalkEvent::path).collect();
    assert!(paths.contains(&root.join("src/lib.rs").as_path()));
    assert!(!paths.iter().any(|p| p.starts_with(root.join("target"))));
    // depth 2 directory is pruned together with its contents
    assert!(!paths.iter().any(|p| p.starts_with(root.join("src/nested"))));
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("r");
    fs::create_dir_all(root.join("real")).unwrap();
    fs::write(root.join("real/file"), b"1").unwrap();
    // A loop back to the root would never end if links were followed
    std::os::unix::fs::symlink(&root, root.join("real/loop")).unwrap();
    std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling")).unwrap();

    let (_walker, events) = Walker::new(&root);
    let events = drain(events).await;

    let kinds = kinds(&events);
    assert_eq!(kinds.len(), 5);
    assert_eq!(kinds[&root.join("real/loop")], EntryType::Symlink);
    assert_eq!(kinds[&root.join("dangling")], EntryType::Symlink);
    assert!(!events.iter().any(WalkEvent::is_error));
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_socket_classified() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("listener.sock");
    let _listener = std::os::unix::net::UnixListener::bind(&socket_path).unwrap();

    let (_walker, events) = Walker::new(dir.path());
    let events = drain(events).await;

    assert_eq!(kinds(&events)[&socket_path], EntryType::Socket);
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_character_device_classified() {
    let (_walker, events) = Walker::new("/dev/null");
    let events = drain(events).await;

    assert_eq!(events[0].kind(), Some(EntryType::CharDevice));
    assert!(events[1].is_end());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multiple_roots_one_walker() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    for i in 0..10 {
        fs::write(first.path().join(format!("a{i}")), b"").unwrap();
        fs::write(second.path().join(format!("b{i}")), b"").unwrap();
    }

    let mut builder = WalkBuilder::new();
    let events = builder.subscribe();
    let walker = builder.build();
    walker.walk(first.path()).walk(second.path());
    let events = drain(events).await;

    let summary = WalkSummary::from_events(&events);
    assert_eq!(summary.dirs, 2);
    assert_eq!(summary.files, 20);
    assert!(walker.is_finished());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_large_tree_exact_counts() {
    let dir = tempdir().unwrap();
    let mut expected_files = 0;
    for a in 0..8 {
        for b in 0..8 {
            let sub = dir.path().join(format!("a{a}/b{b}"));
            fs::create_dir_all(&sub).unwrap();
            for f in 0..4 {
                fs::write(sub.join(format!("f{f}")), b"0123").unwrap();
                expected_files += 1;
            }
        }
    }

    let (_walker, events) = Walker::new(dir.path());
    let events = drain(events).await;
    let summary = WalkSummary::from_events(&events);

    assert_eq!(summary.files, expected_files);
    assert_eq!(summary.dirs, 1 + 8 + 64);
    assert_eq!(summary.bytes, expected_files * 4);
    assert_eq!(events.iter().filter(|e| e.is_end()).count(), 1);
}
