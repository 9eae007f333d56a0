// tests/watch_set.rs

mod common;
use crate::common::{default_config, init_tracing, mock_project, p, root, ConfigBuilder, FakeRegistry};

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind as NotifyKind};
use xrun::fs::mock::MockFileSystem;
use xrun::types::{EventKind, FsEvent};
use xrun::watch::{translate, FileStateCache, WatchSet};

fn notify_event(kind: NotifyKind, paths: &[&str]) -> Event {
    paths
        .iter()
        .fold(Event::new(kind), |ev, rel| ev.add_path(p(rel)))
}

fn watch_set(fs: &MockFileSystem) -> (WatchSet<FakeRegistry>, FakeRegistry, FileStateCache) {
    let registry = FakeRegistry::new();
    let set = WatchSet::new(registry.clone(), Arc::new(fs.clone()));
    let cache = FileStateCache::new(root(), Arc::new(fs.clone()));
    (set, registry, cache)
}

#[test]
fn translate_maps_notify_kinds() {
    let cases = vec![
        (NotifyKind::Create(CreateKind::File), EventKind::Create),
        (
            NotifyKind::Modify(ModifyKind::Data(DataChange::Content)),
            EventKind::Modify,
        ),
        (NotifyKind::Modify(ModifyKind::Any), EventKind::Modify),
        (NotifyKind::Remove(RemoveKind::File), EventKind::Delete),
        (
            NotifyKind::Modify(ModifyKind::Name(RenameMode::From)),
            EventKind::Rename,
        ),
        (
            NotifyKind::Modify(ModifyKind::Name(RenameMode::To)),
            EventKind::Create,
        ),
    ];

    for (raw, expected) in cases {
        let label = format!("{raw:?}");
        assert_eq!(
            translate(notify_event(raw, &["main.go"])),
            vec![FsEvent::new(p("main.go"), expected)],
            "{label}"
        );
    }
}

#[test]
fn translate_splits_two_sided_renames() {
    let ev = notify_event(
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)),
        &["old.go", "new.go"],
    );
    assert_eq!(
        translate(ev),
        vec![
            FsEvent::new(p("old.go"), EventKind::Rename),
            FsEvent::new(p("new.go"), EventKind::Create),
        ]
    );
}

#[test]
fn translate_drops_access_and_unknown_events() {
    assert!(translate(notify_event(NotifyKind::Access(AccessKind::Any), &["main.go"])).is_empty());
    assert!(translate(notify_event(NotifyKind::Other, &["main.go"])).is_empty());
    assert!(translate(notify_event(NotifyKind::Any, &["main.go"])).is_empty());
}

#[test]
fn translate_fans_out_over_all_paths() {
    let ev = notify_event(NotifyKind::Remove(RemoveKind::Any), &["a.go", "b.go"]);
    assert_eq!(translate(ev).len(), 2);
}

#[test]
fn initial_registration_includes_excluded_trees() {
    init_tracing();
    let fs = mock_project(&[("main.go", "m"), (".git/HEAD", "ref"), ("vendor/x/x.go", "x")]);
    let (mut set, registry, cache) = watch_set(&fs);

    set.register_initial(&root(), &default_config(), &cache).unwrap();

    let expected: Vec<PathBuf> = ["", ".git", "vendor", "vendor/x"].iter().map(|r| p(r)).collect();
    for dir in &expected {
        assert!(registry.is_watched(dir), "{} not watched", dir.display());
    }
    assert_eq!(set.len(), expected.len());
    assert!(cache.get("vendor/x").is_some_and(|r| r.is_dir));
    assert!(cache.get("main.go").is_some_and(|r| !r.is_dir));
}

#[test]
fn excluded_trees_are_watched_but_not_recorded() {
    let fs = mock_project(&[
        ("main.go", "m"),
        (".git/HEAD", "ref"),
        (".git/objects/ab/cdef", "blob"),
        ("vendor/x/x.go", "x"),
    ]);
    let (mut set, registry, cache) = watch_set(&fs);
    let config = ConfigBuilder::new().exclude_dir("vendor").build(&root());

    set.register_initial(&root(), &config, &cache).unwrap();

    assert!(registry.is_watched(p(".git/objects/ab")));
    assert!(registry.is_watched(p("vendor/x")));
    for key in [".git", ".git/HEAD", ".git/objects/ab/cdef", "vendor", "vendor/x/x.go"] {
        assert!(cache.get(key).is_none(), "{key} should not be recorded");
    }
    // Root and main.go.
    assert_eq!(cache.len(), 2);
}

#[test]
fn include_dirs_outside_root_are_watched_too() {
    let fs = mock_project(&[("main.go", "m")]);
    fs.add_file("/shared/lib/lib.go", "package lib");
    let (mut set, registry, cache) = watch_set(&fs);

    let config = ConfigBuilder::new()
        .include_dir("/shared")
        .include_dir("internal")
        .build(&root());
    set.register_initial(&root(), &config, &cache).unwrap();

    assert!(registry.is_watched("/shared"));
    assert!(registry.is_watched("/shared/lib"));
    assert!(cache.get("/shared/lib/lib.go").is_some());
    assert_eq!(set.len(), 3);
}

#[test]
fn initial_registration_failure_is_fatal() {
    let fs = mock_project(&[("pkg/a.go", "a")]);
    let (mut set, registry, cache) = watch_set(&fs);
    registry.fail_on(p("pkg"));
    assert!(set.register_initial(&root(), &default_config(), &cache).is_err());

    let fs = mock_project(&[("pkg/a.go", "a")]);
    fs.make_unreadable(p("pkg"));
    let (mut set, _registry, cache) = watch_set(&fs);
    assert!(set.register_initial(&root(), &default_config(), &cache).is_err());

    let fs = mock_project(&[]);
    let (mut set, _registry, cache) = watch_set(&fs);
    let config = ConfigBuilder::new().include_dir("/missing").build(&root());
    assert!(set.register_initial(&root(), &config, &cache).is_err());
}

#[test]
fn register_tree_failures_are_not_fatal() {
    init_tracing();
    let fs = mock_project(&[("main.go", "m")]);
    let (mut set, registry, cache) = watch_set(&fs);
    set.register_initial(&root(), &default_config(), &cache).unwrap();

    fs.add_dir(p("api/v1"));
    fs.add_dir(p("api/v2"));
    registry.fail_on(p("api/v1"));

    assert_eq!(set.register_tree(&p("api"), &cache), 2);
    assert!(registry.is_watched(p("api")));
    assert!(!registry.is_watched(p("api/v1")));
    assert!(registry.is_watched(p("api/v2")));
    assert!(cache.get("api/v2").is_some());
    assert!(cache.get("api/v1").is_none());

    // A directory that vanished before it could be walked.
    assert_eq!(set.register_tree(&p("gone"), &cache), 0);
}

#[test]
fn register_is_idempotent() {
    let fs = mock_project(&[]);
    let (mut set, _registry, _cache) = watch_set(&fs);

    set.register(&p("")).unwrap();
    set.register(&p("")).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn deregister_removes_nested_watches() {
    let fs = mock_project(&[("a/b/c/x.go", "x"), ("ab/y.go", "y")]);
    let (mut set, registry, cache) = watch_set(&fs);
    set.register_initial(&root(), &default_config(), &cache).unwrap();
    assert_eq!(set.len(), 5);

    assert_eq!(set.deregister(&p("a")), 3);
    assert!(!set.contains(&p("a/b/c")));
    assert!(set.contains(&p("ab")));
    assert!(registry.is_watched(p("ab")));
    assert_eq!(registry.unwatched().len(), 3);

    assert_eq!(set.deregister(&p("a")), 0);
}
