//! Attributed content store tests
//!
//! End-to-end behaviour of attribution, resolution, integrity checks, copy,
//! delete, and directory discovery against a real filesystem.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Once;

use attrib_store::{
    digest_of_bytes, enumerate, resolve, resolve_all, AttribError, Attribution,
    AttributedContent, AttributedContentPointer, AttributionStore, ErrorKind, SidecarKind,
    StoreConfig,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use tempfile::TempDir;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn sample_attributions() -> Vec<Attribution> {
    vec![
        Attribution::builder("https://example.org/essay")
            .collected_at(Utc.with_ymd_and_hms(2023, 5, 1, 9, 30, 0).unwrap())
            .original_title("On Provenance")
            .author("Ada", "https://example.org/ada")
            .license("CC-BY-4.0", "https://creativecommons.org/licenses/by/4.0/")
            .created_at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
            .context("front page")
            .context("archived copy")
            .scraping_methodology("http GET, readability extraction")
            .build(),
        Attribution::builder("https://mirror.example.net/essay")
            .collected_at(Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap())
            .build(),
        Attribution::default(),
    ]
}

fn write_file(path: &Path, contents: &[u8]) {
    fs::write(path, contents).unwrap();
}

// =============================================================================
// Local content
// =============================================================================

#[test]
fn test_local_round_trip_preserves_bytes_and_attribution_order() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let data = dir.path().join("essay.html");
    write_file(&data, b"<p>hello</p>");

    let attributions = sample_attributions();
    let pointer = store.attribute_local(&data, attributions.clone()).unwrap();

    let content = pointer.resolve().unwrap();
    assert_eq!(content.kind(), SidecarKind::Local);
    assert_eq!(content.read().unwrap(), b"<p>hello</p>");
    assert_eq!(content.read_as_text().unwrap(), "<p>hello</p>");
    assert_eq!(content.attributions(), attributions.as_slice());
    assert_eq!(content.digest(), digest_of_bytes(b"<p>hello</p>"));
}

#[test]
fn test_overwritten_local_file_fails_integrity_check() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let data = dir.path().join("essay.html");
    write_file(&data, b"original");

    let pointer = store.attribute_local(&data, sample_attributions()).unwrap();
    write_file(&data, b"rewritten");

    let content = pointer.resolve().unwrap();
    let err = content.read().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    match err {
        AttribError::Integrity {
            path,
            expected,
            actual,
        } => {
            assert_eq!(path, data);
            assert_eq!(expected, digest_of_bytes(b"original"));
            assert_eq!(actual, digest_of_bytes(b"rewritten"));
        }
        other => panic!("expected integrity error, got {}", other),
    }
    assert!(content.read_as_text().unwrap_err().is_integrity());

    // The recorded digest is unchanged
    assert_eq!(content.digest(), digest_of_bytes(b"original"));
}

#[test]
fn test_local_sidecar_on_disk_shape() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let data = dir.path().join("a.txt");
    write_file(&data, b"hello");

    let pointer = store.attribute_local(&data, sample_attributions()).unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(pointer.path()).unwrap()).unwrap();

    assert_eq!(json["dataPath"], data.to_str().unwrap());
    assert_eq!(json["sha256Checksum"], digest_of_bytes(b"hello"));
    assert_eq!(json["attributions"][0]["origin_url"], "https://example.org/essay");
    assert_eq!(json["attributions"][0]["collected_at"], "2023-05-01T09:30:00Z");
    assert_eq!(json["attributions"][0]["context"][1], "archived copy");
}

#[test]
fn test_cached_digest_recorded_for_reattributed_path() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let data = dir.path().join("a.txt");
    write_file(&data, b"first");
    store.attribute_local(&data, Vec::new()).unwrap();

    // Cache is not revalidated: re-attributing records the first digest
    write_file(&data, b"second");
    let stale = store.attribute_local(&data, Vec::new()).unwrap();
    assert!(stale.resolve().unwrap().read().unwrap_err().is_integrity());

    // Forgetting the path routes around the stale entry
    store.cache().forget(&data);
    let fresh = store.attribute_local(&data, Vec::new()).unwrap();
    assert_eq!(fresh.resolve().unwrap().read().unwrap(), b"second");
}

#[test]
fn test_bypass_config_avoids_stale_digest() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::from_toml_str(
        r#"
        [digest_cache]
        bypass = ["**/*.log"]
        "#,
    )
    .unwrap();
    let store = AttributionStore::with_config(config).unwrap();
    let data = dir.path().join("run.log");

    write_file(&data, b"line 1\n");
    store.attribute_local(&data, Vec::new()).unwrap();
    write_file(&data, b"line 1\nline 2\n");
    let pointer = store.attribute_local(&data, Vec::new()).unwrap();

    assert_eq!(pointer.resolve().unwrap().read().unwrap(), b"line 1\nline 2\n");
    assert!(store.cache().is_empty());
}

// =============================================================================
// Embedded content
// =============================================================================

#[test]
fn test_embedded_round_trip() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let attributions = sample_attributions();

    let pointer = store
        .attribute_raw(&dir.path().join("greeting"), b"hello", attributions.clone())
        .unwrap();
    assert_eq!(pointer.path(), dir.path().join("greeting.raw.attrib"));

    let content = pointer.resolve().unwrap();
    assert_eq!(content.kind(), SidecarKind::Embedded);
    assert_eq!(content.read().unwrap(), b"hello");
    assert_eq!(content.read_as_text().unwrap(), "hello");
    assert_eq!(content.attributions(), attributions.as_slice());
    assert_eq!(content.digest(), digest_of_bytes(b"hello"));
}

#[test]
fn test_embedded_unaffected_by_same_named_file() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let label = dir.path().join("greeting");

    let pointer = store.attribute_raw(&label, b"hello", Vec::new()).unwrap();
    write_file(&label, b"something else entirely");

    assert_eq!(pointer.resolve().unwrap().read().unwrap(), b"hello");
}

#[test]
fn test_embedded_binary_payload() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let payload: Vec<u8> = (0..=255u8).collect();

    let pointer = store
        .attribute_raw(&dir.path().join("bytes"), &payload, Vec::new())
        .unwrap();
    let content = pointer.resolve().unwrap();

    assert_eq!(content.read().unwrap(), payload);
    assert_eq!(content.read_as_text().unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_embedded_text_payload_is_stored_as_plain_string() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();

    let pointer = store
        .attribute_raw(&dir.path().join("word"), b"test", Vec::new())
        .unwrap();

    let on_disk: serde_json::Value =
        serde_json::from_slice(&fs::read(pointer.path()).unwrap()).unwrap();
    assert_eq!(on_disk["data"], "test");
    assert!(on_disk.get("encoding").is_none());

    let content = pointer.resolve().unwrap();
    assert_eq!(content.read().unwrap(), b"test");
    assert_eq!(content.read_as_text().unwrap(), "test");
}

#[test]
fn test_hand_written_embedded_sidecar_reads_verbatim() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.raw.attrib");
    fs::write(&path, r#"{"attributions":[],"data":"test"}"#).unwrap();

    let content = resolve(&path).unwrap();
    assert_eq!(content.read().unwrap(), b"test");
}

// =============================================================================
// Copy
// =============================================================================

#[test]
fn test_copy_preserves_attributions_verbatim() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let data = dir.path().join("src/essay.html");
    fs::create_dir_all(data.parent().unwrap()).unwrap();
    write_file(&data, b"<p>hello</p>");
    let attributions = sample_attributions();
    let source = store.attribute_local(&data, attributions.clone()).unwrap();

    let dest = dir.path().join("dst/a/b/essay-copy.html");
    let copy = source.copy_to(&store, &dest).unwrap();

    let copied = copy.resolve().unwrap();
    assert_eq!(copied.kind(), SidecarKind::Local);
    assert_eq!(copied.attributions(), attributions.as_slice());
    assert_eq!(copied.read().unwrap(), source.resolve().unwrap().read().unwrap());
    assert_eq!(copied.data_path().unwrap(), dest);

    // Source is untouched
    assert_eq!(fs::read(&data).unwrap(), b"<p>hello</p>");
}

#[test]
fn test_copy_embedded_becomes_local() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let source = store
        .attribute_raw(&dir.path().join("quote"), b"to be", sample_attributions())
        .unwrap();

    let copy = source.copy_to_dir(&store, &dir.path().join("exported")).unwrap();

    assert_eq!(copy.base_name(), "quote");
    assert_eq!(copy.kind().unwrap(), SidecarKind::Local);
    assert_eq!(
        fs::read(dir.path().join("exported/quote")).unwrap(),
        b"to be"
    );
}

#[test]
fn test_copy_over_previously_hashed_path_records_new_digest() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let dest = dir.path().join("out.txt");
    write_file(&dest, b"old");
    store.cache().digest_of_file(&dest).unwrap();

    let source = store
        .attribute_raw(&dir.path().join("new"), b"new", Vec::new())
        .unwrap();
    let copy = source.copy_to(&store, &dest).unwrap();

    assert_eq!(copy.resolve().unwrap().read().unwrap(), b"new");
}

// =============================================================================
// Discovery and delete
// =============================================================================

#[test]
fn test_enumerate_finds_both_variants_and_ignores_other_files() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    write_file(&dir.path().join("a"), b"alpha");
    store.attribute_local(&dir.path().join("a"), Vec::new()).unwrap();
    store
        .attribute_raw(&dir.path().join("b"), b"beta", Vec::new())
        .unwrap();
    write_file(&dir.path().join("c.txt"), b"not attributed");

    let pointers = enumerate(dir.path()).unwrap();
    assert_eq!(pointers.len(), 2);

    let kinds: BTreeSet<_> = pointers
        .iter()
        .map(|p| (p.base_name(), p.resolve().unwrap().kind()))
        .collect();
    assert_eq!(
        kinds,
        BTreeSet::from([
            ("a".to_string(), SidecarKind::Local),
            ("b".to_string(), SidecarKind::Embedded),
        ])
    );
}

#[test]
fn test_single_record_files_are_not_discovered() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let record = sample_attributions().remove(0);

    let written = record.write_to(&dir.path().join("poem")).unwrap();
    assert!(written.exists());
    store
        .attribute_raw(&dir.path().join("quote"), b"q", Vec::new())
        .unwrap();

    let pointers = enumerate(dir.path()).unwrap();
    assert_eq!(pointers.len(), 1);
    assert_eq!(resolve_all(dir.path()).unwrap().len(), 1);
    assert_eq!(Attribution::read_from(&dir.path().join("poem")).unwrap(), record);
}

#[test]
fn test_resolve_all_across_nested_directories() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    for (i, sub) in ["x", "x/y", "z"].iter().enumerate() {
        let sub_dir = dir.path().join(sub);
        fs::create_dir_all(&sub_dir).unwrap();
        store
            .attribute_raw(&sub_dir.join(format!("item{}", i)), b"data", Vec::new())
            .unwrap();
    }

    let all = resolve_all(dir.path()).unwrap();
    assert_eq!(all.len(), 3);
    assert!(all
        .iter()
        .all(|c| matches!(c, AttributedContent::Embedded(_))));
}

#[test]
fn test_resolve_all_fails_on_corrupt_sidecar() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    store
        .attribute_raw(&dir.path().join("fine"), b"ok", Vec::new())
        .unwrap();
    write_file(&dir.path().join("broken.local.attrib"), b"<xml/>");

    let err = resolve_all(dir.path()).unwrap_err();
    assert!(matches!(err, AttribError::Parse { .. }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_delete_removes_from_enumeration() {
    let dir = TempDir::new().unwrap();
    let store = AttributionStore::new();
    let data = dir.path().join("a.txt");
    write_file(&data, b"alpha");
    let local = store.attribute_local(&data, Vec::new()).unwrap();
    let raw = store
        .attribute_raw(&dir.path().join("b"), b"beta", Vec::new())
        .unwrap();

    local.delete().unwrap();
    assert!(!data.exists());
    assert_eq!(enumerate(dir.path()).unwrap(), vec![raw.clone()]);

    raw.delete().unwrap();
    assert!(enumerate(dir.path()).unwrap().is_empty());
}

#[test]
fn test_resolve_unknown_suffix_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.attrib");
    write_file(&path, b"{}");

    let err = resolve(&path).unwrap_err();
    assert!(matches!(err, AttribError::UnknownFormat { .. }));
    let err = AttributedContentPointer::new(&path).resolve().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

// =============================================================================
// Digest properties
// =============================================================================

proptest! {
    #[test]
    fn prop_digest_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(digest_of_bytes(&data), digest_of_bytes(&data.clone()));
        prop_assert_eq!(digest_of_bytes(&data).len(), 64);
    }

    #[test]
    fn prop_single_bit_flip_changes_digest(
        data in proptest::collection::vec(any::<u8>(), 1..512),
        index in any::<proptest::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut flipped = data.clone();
        let i = index.index(flipped.len());
        flipped[i] ^= 1 << bit;
        prop_assert_ne!(digest_of_bytes(&data), digest_of_bytes(&flipped));
    }
}
