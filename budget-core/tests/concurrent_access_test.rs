//! Concurrent storage access tests
//!
//! These tests verify that the filesystem storage and the state store
//! handle concurrent access safely: separate storage instances serialize
//! through the directory lock, and readers never observe a half-written
//! document.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use tempfile::TempDir;
use uuid::Uuid;

use budget_core::adapters::FileStorage;
use budget_core::domain::{BudgetState, Tag};
use budget_core::ports::KeyValueStorage;
use budget_core::store::{BudgetStore, STATE_KEY};

/// Number of concurrent threads for stress tests.
/// Keep this realistic - at most a few processes (app + CLI) compete.
const THREAD_COUNT: usize = 6;

/// Number of iterations per thread
const ITERATIONS_PER_THREAD: usize = 5;

/// Test: Multiple threads creating separate FileStorage instances and
/// writing distinct keys in the same directory simultaneously.
///
/// This simulates several CLI invocations running side by side.
#[test]
fn test_concurrent_storage_instances_writing() {
    let temp_dir = TempDir::new().unwrap();
    let root = Arc::new(temp_dir.path().to_path_buf());

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let error_count = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            let root = Arc::clone(&root);
            let error_count = Arc::clone(&error_count);

            thread::spawn(move || {
                barrier.wait();
                let start = Instant::now();

                // Each thread opens its OWN storage instance
                let storage = FileStorage::new(&root).unwrap();
                for i in 0..ITERATIONS_PER_THREAD {
                    let key = format!("test:t{}:i{}", thread_id, i);
                    if storage.set(&key, &format!("\"{}\"", key)).is_err() {
                        error_count.fetch_add(1, Ordering::SeqCst);
                    }
                }

                println!("Thread {} finished in {:?}", thread_id, start.elapsed());
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(error_count.load(Ordering::SeqCst), 0);

    let storage = FileStorage::new(&root).unwrap();
    let keys = storage.keys("test:").unwrap();
    assert_eq!(keys.len(), THREAD_COUNT * ITERATIONS_PER_THREAD);
    for key in keys {
        assert_eq!(storage.get(&key).unwrap(), Some(format!("\"{}\"", key)));
    }
}

/// Test: Interleaved reads and writes of the same state document
///
/// One side keeps rewriting the document while the other reads it. Every
/// read must be a complete document.
#[test]
fn test_concurrent_read_write_same_key() {
    let temp_dir = TempDir::new().unwrap();
    let root = Arc::new(temp_dir.path().to_path_buf());

    let writer_storage = FileStorage::new(&root).unwrap();
    writer_storage
        .set(STATE_KEY, &BudgetState::default().to_document().unwrap())
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let partial_reads = Arc::new(AtomicUsize::new(0));

    let writer = {
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let mut state = BudgetState::default();
            for i in 0..ITERATIONS_PER_THREAD * 4 {
                let tag = Tag::new(Uuid::new_v4(), format!("tag-{}", i));
                state.tags.insert(tag.id, tag);
                writer_storage.set(STATE_KEY, &state.to_document().unwrap()).unwrap();
            }
        })
    };

    let reader = {
        let barrier = Arc::clone(&barrier);
        let root = Arc::clone(&root);
        let partial_reads = Arc::clone(&partial_reads);
        thread::spawn(move || {
            let storage = FileStorage::new(&root).unwrap();
            barrier.wait();
            for _ in 0..ITERATIONS_PER_THREAD * 4 {
                let raw = storage.get(STATE_KEY).unwrap().unwrap_or_default();
                if BudgetState::from_document(&raw).is_none() {
                    partial_reads.fetch_add(1, Ordering::SeqCst);
                }
            }
        })
    };

    writer.join().expect("Writer panicked");
    reader.join().expect("Reader panicked");

    assert_eq!(partial_reads.load(Ordering::SeqCst), 0, "Reader saw a partial document");
}

/// Test: High-contention updates through one shared store
///
/// All threads mutate the same state document; no update may be lost.
#[test]
fn test_high_contention_store_updates() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new(temp_dir.path()).unwrap());
    let store = Arc::new(BudgetStore::open(storage.clone(), STATE_KEY).unwrap());

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let barrier = Arc::clone(&barrier);
            let store = Arc::clone(&store);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..ITERATIONS_PER_THREAD {
                    let tag = Tag::new(Uuid::new_v4(), format!("t{}-{}", thread_id, i));
                    store
                        .update(|state| {
                            state.tags.insert(tag.id, tag);
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let expected = THREAD_COUNT * ITERATIONS_PER_THREAD;
    assert_eq!(store.get().tags.len(), expected);

    // And the persisted document agrees
    let reopened = BudgetStore::open(storage, STATE_KEY).unwrap();
    assert_eq!(reopened.get().tags.len(), expected);
}
