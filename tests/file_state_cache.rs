// tests/file_state_cache.rs

mod common;
use crate::common::{init_tracing, mock_project, p, root};

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use proptest::prelude::*;
use xrun::fs::{FileSystem, RealFileSystem};
use xrun::watch::FileStateCache;

fn cache_over(fs: &xrun::fs::mock::MockFileSystem) -> FileStateCache {
    FileStateCache::new(root(), Arc::new(fs.clone()))
}

#[test]
fn never_added_path_is_modified_and_not_found() {
    init_tracing();
    let fs = mock_project(&[("main.go", "package main")]);
    let cache = cache_over(&fs);

    assert!(cache.get("main.go").is_none());
    assert!(cache.is_modified("main.go"));
    // Also for paths that do not exist at all.
    assert!(cache.is_modified("nope.go"));
}

#[test]
fn add_records_baseline_until_mtime_changes() {
    let fs = mock_project(&[("main.go", "package main")]);
    let cache = cache_over(&fs);

    let record = cache.add("main.go").unwrap();
    assert_eq!(record.path, "main.go");
    assert_eq!(record.size, "package main".len() as u64);
    assert!(!record.is_dir);
    assert!(!cache.is_modified("main.go"));

    let later = record.modified + Duration::from_secs(5);
    fs.set_modified(p("main.go"), later);
    assert!(cache.is_modified("main.go"));
}

#[test]
fn size_change_alone_counts_as_modified() {
    let fs = mock_project(&[("main.go", "package main")]);
    let cache = cache_over(&fs);
    let record = cache.add("main.go").unwrap();

    fs.add_file(p("main.go"), "package main\n\nfunc main() {}\n");
    fs.set_modified(p("main.go"), record.modified);

    assert!(cache.is_modified("main.go"));
}

#[test]
fn is_modified_never_refreshes_the_baseline() {
    let fs = mock_project(&[("main.go", "package main")]);
    let cache = cache_over(&fs);
    let before = cache.add("main.go").unwrap();

    fs.add_file(p("main.go"), "package main // edited");
    assert!(cache.is_modified("main.go"));
    assert!(cache.is_modified("main.go"));
    assert_eq!(cache.get("main.go"), Some(before));

    cache.add("main.go").unwrap();
    assert!(!cache.is_modified("main.go"));
}

#[test]
fn remove_then_get_is_not_found() {
    let fs = mock_project(&[("main.go", "package main")]);
    let cache = cache_over(&fs);
    cache.add("main.go").unwrap();

    assert!(cache.remove("main.go").is_some());
    assert!(cache.get("main.go").is_none());
    assert!(cache.is_modified("main.go"));

    // Absent keys are not an error.
    assert!(cache.remove("main.go").is_none());
    assert!(cache.remove("never/seen.go").is_none());
}

#[test]
fn add_fails_for_missing_path_and_stores_nothing() {
    let fs = mock_project(&[]);
    let cache = cache_over(&fs);

    assert!(cache.add("ghost.go").is_err());
    assert!(cache.get("ghost.go").is_none());
    assert!(cache.is_empty());
}

#[test]
fn recorded_path_that_vanished_reads_as_modified() {
    let fs = mock_project(&[("main.go", "package main")]);
    let cache = cache_over(&fs);
    cache.add("main.go").unwrap();

    fs.remove(p("main.go"));
    assert!(cache.is_modified("main.go"));
}

#[test]
fn remove_tree_only_touches_nested_records() {
    let fs = mock_project(&[
        ("vendor/a.go", "a"),
        ("vendor/deep/b.go", "b"),
        ("vendor2/c.go", "c"),
    ]);
    let cache = cache_over(&fs);
    for key in ["vendor", "vendor/a.go", "vendor/deep", "vendor/deep/b.go", "vendor2/c.go"] {
        cache.add(key).unwrap();
    }

    assert_eq!(cache.remove_tree("vendor"), 4);
    assert_eq!(cache.len(), 1);
    assert!(cache.get("vendor2/c.go").is_some());
}

#[test]
fn directories_are_recorded_as_directories() {
    let fs = mock_project(&[("pkg/util.go", "package pkg")]);
    let cache = cache_over(&fs);

    let record = cache.add("pkg").unwrap();
    assert!(record.is_dir);
}

#[test]
fn concurrent_adds_and_reads_serialize() {
    let fs = mock_project(&[]);
    for i in 0..64 {
        fs.add_file(p(&format!("f{i}.go")), "x");
    }
    let cache = Arc::new(cache_over(&fs));

    std::thread::scope(|scope| {
        for t in 0..8 {
            let cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in (t..64).step_by(8) {
                    let key = format!("f{i}.go");
                    cache.add(&key).unwrap();
                    assert!(!cache.is_modified(&key));
                    assert!(cache.get(&key).is_some());
                }
            });
        }
    });

    assert_eq!(cache.len(), 64);
}

#[test]
fn real_filesystem_baseline_tracks_content_changes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let file = root.join("main.go");
    std::fs::write(&file, "package main").unwrap();

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cache = FileStateCache::new(root.clone(), fs);
    let key = cache.key_for(&file);
    assert_eq!(key, "main.go");

    cache.add(&key).unwrap();
    assert!(!cache.is_modified(&key));

    std::fs::write(&file, "package main\n\nfunc main() {}\n").unwrap();
    assert!(cache.is_modified(&key));
}

#[test]
fn mock_mtimes_only_move_forward() {
    let fs = mock_project(&[("a.go", "a")]);
    let first = fs.stat(&p("a.go")).unwrap().modified;
    fs.add_file(p("a.go"), "a");
    let second = fs.stat(&p("a.go")).unwrap().modified;
    assert!(second > first);
    assert!(first > SystemTime::UNIX_EPOCH);
}

proptest! {
    #[test]
    fn unknown_keys_are_always_modified(key in "[a-z]{1,8}(/[a-z]{1,8}){0,3}\\.go") {
        let fs = mock_project(&[("main.go", "package main")]);
        let cache = cache_over(&fs);
        cache.add("main.go").unwrap();

        if key != "main.go" {
            prop_assert!(cache.get(&key).is_none());
            prop_assert!(cache.is_modified(&key));
        }
    }
}
