//! Lifecycle sweep behavior: rows move through fresh, recheck and expiry, and
//! only an alert-only recheck produces the delayed graduation alert.

mod common;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use common::{build_harness, Harness};
use pool_sentinel::pipeline::{CandidateStore, LifecycleManager};
use pool_sentinel::types::{ReputationReport, StoredCandidate};
use std::sync::Arc;
use std::time::Duration;

fn manager(h: &Harness) -> LifecycleManager {
    LifecycleManager::new(
        Arc::clone(&h.pipeline),
        Arc::clone(&h.store),
        60,
        120,
        Duration::from_secs(60),
    )
}

async fn insert_aged(h: &Harness, age_secs: i64, score: i64) -> i64 {
    let candidate = StoredCandidate {
        id: None,
        dex: "Raydium".into(),
        name: "Sample".into(),
        symbol: "SMPL".into(),
        mint: h.candidate.mint,
        pool: h.candidate.pool,
        price_usd: 0.01,
        liquidity_usd: 10_000.0,
        telegram: String::new(),
        website: String::new(),
        twitter: String::new(),
        risk_flags: Vec::new(),
        score,
        created_at: Utc::now() - TimeDelta::seconds(age_secs),
    };
    h.store.insert_candidate(&candidate).await.unwrap()
}

#[tokio::test]
async fn fresh_row_is_left_alone() {
    let h = build_harness(50.0, 100.0, ReputationReport::unavailable()).await;
    insert_aged(&h, 10, 500).await;

    manager(&h).sweep_once(Utc::now()).await.unwrap();

    assert_eq!(h.store.all_candidates().await.unwrap().len(), 1);
    assert_eq!(h.reputation.call_count(), 0);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn expired_candidate_deleted_without_recheck() {
    let h = build_harness(50.0, 100.0, ReputationReport::unavailable()).await;
    insert_aged(&h, 130, 500).await;

    manager(&h).sweep_once(Utc::now()).await.unwrap();

    assert!(h.store.all_candidates().await.unwrap().is_empty());
    // No re-evaluation happened on the way out.
    assert_eq!(h.reputation.call_count(), 0);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn graduated_candidate_alerts_and_keeps_its_row() {
    // Recheck scores low now: the candidate graduates to the delayed alert.
    let h = build_harness(50.0, 100.0, ReputationReport { risks: Vec::new(), score: 50 }).await;
    insert_aged(&h, 90, 500).await;

    manager(&h).sweep_once(Utc::now()).await.unwrap();

    assert_eq!(h.reputation.call_count(), 1);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Token held up after recheck"));
    // The row stays until the expiry boundary removes it.
    assert_eq!(h.store.all_candidates().await.unwrap().len(), 1);
}

#[tokio::test]
async fn graduation_alert_carries_the_recheck_score_not_the_stored_one() {
    // Stored at score 500; the recheck now scores 50 and graduates.
    let h = build_harness(50.0, 100.0, ReputationReport { risks: Vec::new(), score: 50 }).await;
    insert_aged(&h, 90, 500).await;

    manager(&h).sweep_once(Utc::now()).await.unwrap();

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Score: 50"));
    assert!(!sent[0].contains("Score: 500"));
}

#[tokio::test]
async fn still_high_score_on_recheck_deletes_the_row() {
    let h = build_harness(50.0, 100.0, ReputationReport { risks: Vec::new(), score: 600 }).await;
    insert_aged(&h, 90, 500).await;

    manager(&h).sweep_once(Utc::now()).await.unwrap();

    assert_eq!(h.reputation.call_count(), 1);
    assert!(h.store.all_candidates().await.unwrap().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn recheck_rejection_deletes_before_reputation() {
    // The pool thinned out below the floor since storage.
    let h = build_harness(10.0, 100.0, ReputationReport::unavailable()).await;
    insert_aged(&h, 90, 500).await;

    manager(&h).sweep_once(Utc::now()).await.unwrap();

    assert!(h.store.all_candidates().await.unwrap().is_empty());
    assert_eq!(h.reputation.call_count(), 0);
    assert!(h.notifier.sent().is_empty());
}

/// Delegating store whose delete fails for one chosen row id.
struct FlakyDeleteStore {
    inner: Arc<dyn CandidateStore>,
    fail_id: i64,
}

#[async_trait]
impl CandidateStore for FlakyDeleteStore {
    async fn insert_candidate(&self, candidate: &StoredCandidate) -> Result<i64> {
        self.inner.insert_candidate(candidate).await
    }

    async fn all_candidates(&self) -> Result<Vec<StoredCandidate>> {
        self.inner.all_candidates().await
    }

    async fn delete_candidate(&self, id: i64) -> Result<()> {
        if id == self.fail_id {
            return Err(anyhow!("delete unavailable for row {id}"));
        }
        self.inner.delete_candidate(id).await
    }

    async fn upsert_sol_price(&self, price_usd: f64) -> Result<()> {
        self.inner.upsert_sol_price(price_usd).await
    }

    async fn sol_price(&self) -> Result<Option<f64>> {
        self.inner.sol_price().await
    }
}

#[tokio::test]
async fn one_failing_row_does_not_abort_the_sweep() {
    let h = build_harness(50.0, 100.0, ReputationReport::unavailable()).await;
    // Both rows are expired; the older one is processed first and its
    // delete fails.
    let failing_id = insert_aged(&h, 200, 500).await;
    let ok_id = insert_aged(&h, 150, 500).await;

    let flaky: Arc<dyn CandidateStore> = Arc::new(FlakyDeleteStore {
        inner: Arc::clone(&h.store),
        fail_id: failing_id,
    });
    let manager = LifecycleManager::new(
        Arc::clone(&h.pipeline),
        flaky,
        60,
        120,
        Duration::from_secs(60),
    );

    manager.sweep_once(Utc::now()).await.unwrap();

    let remaining = h.store.all_candidates().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, Some(failing_id));
    assert!(remaining.iter().all(|row| row.id != Some(ok_id)));
}

#[tokio::test]
async fn graduated_row_expires_on_a_later_sweep() {
    let h = build_harness(50.0, 100.0, ReputationReport { risks: Vec::new(), score: 50 }).await;
    insert_aged(&h, 90, 500).await;
    let mgr = manager(&h);

    mgr.sweep_once(Utc::now()).await.unwrap();
    assert_eq!(h.store.all_candidates().await.unwrap().len(), 1);

    // 60 seconds later the row is past the 120s boundary.
    mgr.sweep_once(Utc::now() + TimeDelta::seconds(60)).await.unwrap();
    assert!(h.store.all_candidates().await.unwrap().is_empty());
    // Exactly one graduation alert was ever sent.
    assert_eq!(h.notifier.sent().len(), 1);
}
