// tests/monitor_e2e.rs
//
// Poll-cycle scenarios driven through mock feeds, resolver, enricher and notifier.

mod common;

use common::*;
use embassy_alert::ingest::types::FeedSource;

fn single_feed(items: Vec<embassy_alert::ingest::types::NewsItem>) -> Vec<Box<dyn FeedSource>> {
    vec![Box::new(StaticFeed {
        label: "rss:en".into(),
        items,
    })]
}

#[tokio::test]
async fn foreign_item_with_marker_is_dispatched_once_and_marked_seen() {
    let mut h = harness(
        single_feed(vec![item("Korean Embassy evacuation ordered", "L1")]),
        MapResolver::with(&[("L1", "서울 주재 대사관")]),
        RecordingNotifier::default(),
        5,
    );

    let report = h.monitor.run_cycle().await;

    assert_eq!(report.dispatched, 1);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("L1"), "alert must reference the link: {}", sent[0]);
    assert!(sent[0].contains("Korean 대사관 철수 감지"));
    assert!(sent[0].starts_with("@everyone\n"));
    assert!(h.monitor.registry().contains("L1"));
    assert_eq!(h.sink.records.lock().unwrap().len(), 1);
    assert_eq!(h.enricher.total_calls(), 2, "summarize + translate");
}

#[tokio::test]
async fn same_link_in_a_later_cycle_is_not_sent_again() {
    let mut h = harness(
        single_feed(vec![item("Korean Embassy evacuation ordered", "L1")]),
        MapResolver::with(&[("L1", "서울 주재 대사관")]),
        RecordingNotifier::default(),
        5,
    );

    let first = h.monitor.run_cycle().await;
    let second = h.monitor.run_cycle().await;

    assert_eq!(first.dispatched, 1);
    assert_eq!(second.dispatched, 0);
    assert_eq!(second.skipped_seen, 1);
    assert_eq!(h.notifier.sent().len(), 1);
    // Seen links are skipped before resolution.
    assert_eq!(h.resolver.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn duplicate_link_within_one_cycle_sends_once() {
    let mut h = harness(
        single_feed(vec![
            item("Korean Embassy evacuation ordered", "L1"),
            item("Korean Embassy evacuation ordered (update)", "L1"),
        ]),
        MapResolver::with(&[("L1", "서울 주재 대사관")]),
        RecordingNotifier::default(),
        5,
    );

    let report = h.monitor.run_cycle().await;
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.skipped_seen, 1);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn unrelated_article_is_filtered_and_left_unseen() {
    let mut h = harness(
        single_feed(vec![item("Japan Embassy staff relocate", "L1")]),
        MapResolver::with(&[("L1", "Staff moved to Osaka consulate.")]),
        RecordingNotifier::default(),
        5,
    );

    let report = h.monitor.run_cycle().await;

    assert_eq!(report.filtered, 1);
    assert_eq!(report.dispatched, 0);
    assert!(h.notifier.sent().is_empty());
    assert!(!h.monitor.registry().contains("L1"));

    // Still re-evaluated on the next cycle.
    let again = h.monitor.run_cycle().await;
    assert_eq!(again.filtered, 1);
    assert_eq!(h.resolver.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn resolve_failure_does_not_stop_the_cycle() {
    let mut h = harness(
        single_feed(vec![
            item("Korean Embassy evacuation ordered", "L2"),
            item("주한 러시아 대사관 철수", "L3"),
        ]),
        // L2 has no body -> network error
        MapResolver::with(&[("L3", "2025년 4월 5일 러시아 대사관 직원 철수")]),
        RecordingNotifier::default(),
        5,
    );

    let report = h.monitor.run_cycle().await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.dispatched, 1);
    assert!(!h.monitor.registry().contains("L2"));
    assert!(h.monitor.registry().contains("L3"));

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("러시아 대사관 철수 감지"));
    assert!(sent[0].contains("2025년 4월 5일"));
}

#[tokio::test]
async fn failed_send_leaves_link_unseen_and_retries_next_cycle() {
    let mut h = harness(
        single_feed(vec![item("주한 미국 대사관 철수", "L4")]),
        MapResolver::with(&[("L4", "미국 대사관 4월 9일 철수 결정")]),
        RecordingNotifier::failing_first(1),
        5,
    );

    let first = h.monitor.run_cycle().await;
    assert_eq!(first.failed, 1);
    assert!(!h.monitor.registry().contains("L4"));
    assert!(h.sink.records.lock().unwrap().is_empty(), "no log before a successful send");

    let second = h.monitor.run_cycle().await;
    assert_eq!(second.dispatched, 1);
    assert!(h.monitor.registry().contains("L4"));
    assert_eq!(h.notifier.sent().len(), 1);

    let records = h.sink.records.lock().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].country, "미국");
    assert_eq!(records[0].reported_time, "4월 9일");
    assert_eq!(records[0].localized_summary, "주한 미국 대사관 철수");
}

#[tokio::test]
async fn only_the_first_n_candidates_are_processed() {
    let items = (0..8)
        .map(|i| item(&format!("주한 대사관 소식 {i}"), &format!("L{i}")))
        .collect();
    let bodies: Vec<(String, String)> = (0..8).map(|i| (format!("L{i}"), "본문".to_string())).collect();
    let pairs: Vec<(&str, &str)> = bodies.iter().map(|(l, b)| (l.as_str(), b.as_str())).collect();

    let mut h = harness(
        single_feed(items),
        MapResolver::with(&pairs),
        RecordingNotifier::default(),
        5,
    );

    let report = h.monitor.run_cycle().await;
    assert_eq!(report.fetched, 8);
    assert_eq!(report.candidates, 5);
    assert_eq!(report.dispatched, 5);
    assert!(h.monitor.registry().contains("L4"));
    assert!(!h.monitor.registry().contains("L5"));
}

#[tokio::test]
async fn failing_feed_does_not_hide_other_feeds() {
    let feeds: Vec<Box<dyn FeedSource>> = vec![
        Box::new(FailingFeed),
        Box::new(StaticFeed {
            label: "rss:ko".into(),
            items: vec![item("주한 프랑스 대사관 철수", "L7")],
        }),
    ];
    let mut h = harness(
        feeds,
        MapResolver::with(&[("L7", "프랑스 대사관")]),
        RecordingNotifier::default(),
        5,
    );

    let report = h.monitor.run_cycle().await;
    assert_eq!(report.fetched, 1);
    assert_eq!(report.dispatched, 1);
}
