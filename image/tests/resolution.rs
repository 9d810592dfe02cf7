//! Integration tests: resolve names against a store-backed snapshot.
//!
//! Exercises the public API the way the CLI does: open a store, add
//! images, look names up, and derive save names for the result.

use repotag_core::{AmbiguityKind, ImageConfig, ImageError, TagMatching};
use repotag_image::oci::Resolver;
use repotag_image::{resolve, save_destination_name, ImageStore, LocalImage};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("repotag_image=debug")
        .try_init();
}

fn image(id: &str, names: &[&str], read_only: bool) -> LocalImage {
    LocalImage::new(id, names.iter().map(|n| n.to_string()).collect(), read_only)
}

/// Rotations of `images`, each also reversed.
fn orderings(images: &[LocalImage]) -> Vec<Vec<LocalImage>> {
    let mut out = Vec::new();
    for shift in 0..images.len() {
        let mut rotated = images.to_vec();
        rotated.rotate_left(shift);
        out.push(rotated.clone());
        rotated.reverse();
        out.push(rotated);
    }
    out
}

#[test]
fn resolution_is_order_independent() {
    init_tracing();
    let images = vec![
        image("ro-a", &["localhost/app:latest"], true),
        image("rw", &["localhost/app:latest", "quay.io/org/tool:1"], false),
        image("ro-b", &["localhost/app:latest"], true),
        image("other", &["quay.io/org/other:1", "Broken Name"], false),
    ];

    for ordering in orderings(&images) {
        let r = resolve("app", &ordering).unwrap();
        assert_eq!(r.image.id, "rw");
        assert_eq!(r.name, "localhost/app:latest");

        let id = resolve("org/other:1", &ordering)
            .map(|r| r.image.id.clone())
            .unwrap();
        assert_eq!(id, "other");
    }
}

#[test]
fn ambiguity_classification_is_order_independent() {
    let images = vec![
        image("ro", &["docker.io/library/x:1"], true),
        image("rw", &["myreg/x:1"], false),
    ];
    for ordering in orderings(&images) {
        match resolve("x:1", &ordering) {
            Err(ImageError::Ambiguous { kind, names }) => {
                assert_eq!(kind, AmbiguityKind::ReadOnly);
                assert_eq!(names, vec!["docker.io/library/x:1", "myreg/x:1"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

#[tokio::test]
async fn store_lookup_and_save_name() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let config = ImageConfig {
        store_dir: tmp.path().join("images"),
        ..Default::default()
    };
    let store = ImageStore::open(&config).unwrap();

    store
        .add(image("abc123def456", &["foo"], false))
        .await
        .unwrap();
    store
        .add(image("fff000111222", &["quay.io/org/bar:v1"], false))
        .await
        .unwrap();

    let foo = store.lookup("foo").await.unwrap();
    assert_eq!(foo.names, vec!["localhost/foo:latest"]);
    assert_eq!(
        save_destination_name(&foo, "foo", &config.default_local_registry).as_deref(),
        Some("localhost/foo")
    );
    assert_eq!(
        save_destination_name(&foo, "abc1", &config.default_local_registry),
        None
    );

    let bar = store.lookup("bar").await.unwrap();
    assert_eq!(bar.id, "fff000111222");
    assert_eq!(
        save_destination_name(&bar, "bar", &config.default_local_registry).as_deref(),
        Some("bar")
    );
}

#[tokio::test]
async fn read_only_twin_does_not_shadow_writable_image() {
    let tmp = TempDir::new().unwrap();
    let config = ImageConfig {
        store_dir: tmp.path().to_path_buf(),
        ..Default::default()
    };
    let store = ImageStore::open(&config).unwrap();

    store.add(image("base-ro", &["app:1"], true)).await.unwrap();
    store.add(image("local-rw", &["app:1"], false)).await.unwrap();

    assert_eq!(store.resolve("app:1").await.unwrap().id, "local-rw");

    store.add(image("second-rw", &["quay.io/x/app:1"], false)).await.unwrap();
    assert!(matches!(
        store.resolve("app:1").await,
        Err(ImageError::Ambiguous {
            kind: AmbiguityKind::ReadWrite,
            ..
        })
    ));
}

#[tokio::test]
async fn exact_tag_matching_from_config() {
    let tmp = TempDir::new().unwrap();
    let config = ImageConfig {
        store_dir: tmp.path().to_path_buf(),
        tag_matching: TagMatching::Exact,
        ..Default::default()
    };
    let store = ImageStore::open(&config).unwrap();
    store.add(image("v1", &["app:v1"], false)).await.unwrap();
    store.add(image("v2", &["app:v2"], false)).await.unwrap();

    assert_eq!(store.resolve("app:v2").await.unwrap().id, "v2");
    assert!(matches!(
        Resolver::default().resolve("app", &store.list().await),
        Err(ImageError::Ambiguous { .. })
    ));
}
