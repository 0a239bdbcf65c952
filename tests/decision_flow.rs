//! End-to-end decision flow over mock collaborators: gate order, the three
//! terminal branches and their side effects.

mod common;

use common::build_harness;
use pool_sentinel::types::{RejectReason, ReputationReport, RiskFlag, Verdict};

fn report(score: i64, risks: Vec<&str>) -> ReputationReport {
    ReputationReport {
        score,
        risks: risks
            .into_iter()
            .map(|name| RiskFlag {
                name: name.to_string(),
                ..Default::default()
            })
            .collect(),
    }
}

#[tokio::test]
async fn thin_pool_is_rejected_before_reputation() {
    // 10 quote units at 100 USD: 2000 USD total, under the 3000 floor.
    let h = build_harness(10.0, 100.0, report(0, vec![])).await;
    let outcome = h.pipeline.process_discovery(h.candidate.clone()).await.unwrap();

    assert_eq!(
        outcome.verdict,
        Verdict::Rejected(RejectReason::InsufficientLiquidity)
    );
    assert!(outcome.reputation.is_none());
    assert_eq!(h.reputation.call_count(), 0);
    assert!(h.notifier.sent().is_empty());
    assert!(h.store.all_candidates().await.unwrap().is_empty());
}

#[tokio::test]
async fn liquidity_exactly_at_floor_passes() {
    // 15 quote units at 100 USD: exactly 3000 USD total.
    let h = build_harness(15.0, 100.0, report(0, vec![])).await;
    let outcome = h.pipeline.process_discovery(h.candidate.clone()).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::AlertedOnly);
    assert_eq!(h.reputation.call_count(), 1);
}

#[tokio::test]
async fn low_score_alerts_without_persisting() {
    let h = build_harness(50.0, 100.0, report(123, vec!["Low amount of LP Providers"])).await;
    let outcome = h.pipeline.process_discovery(h.candidate.clone()).await.unwrap();

    assert_eq!(outcome.verdict, Verdict::AlertedOnly);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains(&format!("Address: {}", h.candidate.mint)));
    assert!(sent[0].contains("Score: 123"));
    assert!(sent[0].contains("- Low amount of LP Providers"));
    assert!(h.store.all_candidates().await.unwrap().is_empty());
}

#[tokio::test]
async fn high_score_persists_without_alerting() {
    let h = build_harness(50.0, 100.0, report(500, vec![])).await;
    let outcome = h.pipeline.process_discovery(h.candidate.clone()).await.unwrap();

    assert_eq!(outcome.verdict, Verdict::Stored);
    assert!(h.notifier.sent().is_empty());

    let stored = h.store.all_candidates().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].mint, h.candidate.mint);
    assert_eq!(stored[0].pool, h.candidate.pool);
    assert_eq!(stored[0].score, 500);
    assert!((stored[0].liquidity_usd - 10_000.0).abs() < 1e-6);
}

#[tokio::test]
async fn copycat_flag_rejects_even_with_high_score() {
    let h = build_harness(50.0, 100.0, report(500, vec!["Copycat token"])).await;
    let outcome = h.pipeline.process_discovery(h.candidate.clone()).await.unwrap();

    assert_eq!(outcome.verdict, Verdict::Rejected(RejectReason::CopycatFlag));
    assert!(h.notifier.sent().is_empty());
    assert!(h.store.all_candidates().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_reputation_lookup_lands_in_alert_branch() {
    let h = build_harness(50.0, 100.0, ReputationReport::unavailable()).await;
    let outcome = h.pipeline.process_discovery(h.candidate.clone()).await.unwrap();

    assert_eq!(outcome.verdict, Verdict::AlertedOnly);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Score: -1"));
}
