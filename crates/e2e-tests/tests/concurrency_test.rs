//! Thread affinity E2E tests for solr-sync.
//!
//! One manager and one processor are shared by several threads; each thread
//! must talk to the engine over its own connection only.

use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;

use e2e_tests::{product_document, schema_response, TestHarness};
use solr_client::mock::{fake, update_success};
use solr_client::ConnectionError;

#[test]
fn test_threads_use_distinct_connections() {
    let harness = Arc::new(TestHarness::new());
    let main_conn = harness.manager.get_connection().unwrap().unwrap();

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let harness = Arc::clone(&harness);
            thread::spawn(move || {
                let conn = harness.manager.get_connection().unwrap().unwrap();
                let log = fake(&conn, vec![update_success()]).unwrap();

                harness.processor.commit().unwrap();
                assert_eq!(log.len(), 1);
                assert_eq!(conn.request_count(), 1);

                harness.manager.close_connection();
                assert!(conn.is_closed());
                conn.id()
            })
        })
        .collect();
    let ids: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_ne!(ids[0], ids[1]);
    assert!(!ids.contains(&main_conn.id()));
    assert_eq!(main_conn.request_count(), 0);
    assert!(!main_conn.is_closed());
    assert_eq!(harness.manager.connection_count(), 1);
    assert_eq!(harness.factory.created(), 3);
}

#[test]
fn test_shared_processor_indexes_from_many_threads() {
    let harness = Arc::new(TestHarness::new());
    harness.load_schema();

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let harness = Arc::clone(&harness);
            thread::spawn(move || {
                let log = harness.script(vec![update_success()]);
                let id = format!("doc-{}", i);
                harness
                    .processor
                    .index(&product_document(&id), Some(&["id"][..]))
                    .unwrap();
                harness.manager.close_connection();
                (id, log.requests())
            })
        })
        .collect();

    for worker in workers {
        let (id, requests) = worker.join().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].body.as_deref(),
            Some(format!("<add><doc><field name=\"id\">{}</field></doc></add>", id).as_str())
        );
    }
    // Only the main thread's connection, which fetched the schema, remains.
    assert_eq!(harness.manager.connection_count(), 1);
}

#[test]
fn test_handle_rejects_foreign_thread() {
    let harness = TestHarness::new();
    let main_conn = harness.manager.get_connection().unwrap().unwrap();
    fake(&main_conn, vec![update_success()]).unwrap();

    let err = thread::spawn(move || {
        main_conn
            .send(&solr_client::SolrRequest::get("/solr/admin/ping"))
            .unwrap_err()
    })
    .join()
    .unwrap();

    assert!(matches!(err, ConnectionError::ForeignThread { .. }));
}

#[test]
fn test_closed_handle_is_not_reused() {
    let harness = TestHarness::new();
    let stale = harness.manager.get_connection().unwrap().unwrap();
    harness.manager.close_connection();

    let err = stale
        .send(&solr_client::SolrRequest::get("/solr/admin/ping"))
        .unwrap_err();
    assert!(matches!(err, ConnectionError::Closed(_)));

    let fresh = harness.manager.get_connection().unwrap().unwrap();
    assert_ne!(stale.id(), fresh.id());
}

#[test]
fn test_concurrent_first_schema_fetch_happens_once() {
    const WORKERS: usize = 6;
    let harness = Arc::new(TestHarness::new());
    let barrier = Arc::new(Barrier::new(WORKERS));

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let harness = Arc::clone(&harness);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = harness.manager.get_connection().unwrap().unwrap();
                let log = fake(&conn, vec![schema_response()]).unwrap();
                barrier.wait();
                let schema = harness.manager.get_schema().unwrap().unwrap();
                (schema, log.len())
            })
        })
        .collect();
    let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let fetches: usize = results.iter().map(|(_, sent)| sent).sum();
    assert_eq!(fetches, 1);
    let first = &results[0].0;
    assert!(results.iter().all(|(schema, _)| Arc::ptr_eq(schema, first)));
    assert_eq!(first.unique_key(), Some("id"));
}

#[test]
fn test_exited_worker_releases_its_connection() {
    let harness = Arc::new(TestHarness::new());
    harness.load_schema();

    let worker = {
        let harness = Arc::clone(&harness);
        thread::spawn(move || {
            harness.script(vec![update_success()]);
            harness.processor.commit().unwrap();
            harness.manager.connection().unwrap()
        })
    };
    let abandoned = worker.join().unwrap();

    assert!(abandoned.is_closed());
    assert_eq!(abandoned.request_count(), 1);
    // Only the main thread's connection, which fetched the schema, remains.
    assert_eq!(harness.manager.connection_count(), 1);
    assert_eq!(harness.factory.created(), 2);
}
