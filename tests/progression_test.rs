//! Hunt progression integration tests
//!
//! Exercises the progression engine against the in-memory store:
//! - Walking a full sequence checkpoint by checkpoint
//! - Geofence rejection leaving the history untouched
//! - Ordering policies (enforce-order vs flexible)
//! - Completed hunts rejecting further claims
//! - State survival across engine restarts

use std::sync::Arc;

use waymark::db::schemas::{CheckpointDoc, ClassCoords, GroupDoc, SequenceDoc};
use waymark::db::{HuntStore, MemoryHuntStore};
use waymark::geo::GeoPoint;
use waymark::ident::{CheckpointId, GroupClass};
use waymark::progress::{ClaimOutcome, ClaimPolicy, CurrentCheckpoint, ProgressionEngine};

// A short city trail. Checkpoints sit roughly a kilometer apart, far
// beyond the 0.1 km admission radius used throughout these tests.
const CKPT_1: (f64, f64) = (48.2082, 16.3738);
const CKPT_2: (f64, f64) = (48.2100, 16.3600);
const CKPT_3: (f64, f64) = (48.2150, 16.3500);
const CKPT_10: (f64, f64) = (48.2200, 16.3400);

const RADIUS_KM: f64 = 0.1;

fn trail_ckpt(no: &str, at: (f64, f64)) -> CheckpointDoc {
    CheckpointDoc::new(
        CheckpointId::from(no),
        ClassCoords::shared(GeoPoint::new(at.0, at.1)),
        format!("clue for {no}"),
        format!("task at {no}"),
        None,
    )
}

fn at(coords: (f64, f64)) -> GeoPoint {
    GeoPoint::new(coords.0, coords.1)
}

/// Seed a store with the trail catalog, the sequence ["1", "2", "3"]
/// and one group assigned to it. Checkpoint "10" exists in the catalog
/// but not in the sequence.
async fn seeded(policy: ClaimPolicy) -> (ProgressionEngine, Arc<MemoryHuntStore>) {
    let store = Arc::new(MemoryHuntStore::new());

    store
        .insert_checkpoints(vec![
            trail_ckpt("1", CKPT_1),
            trail_ckpt("2", CKPT_2),
            trail_ckpt("3", CKPT_3),
            trail_ckpt("10", CKPT_10),
        ])
        .await
        .unwrap();

    store
        .insert_sequences(vec![SequenceDoc::new(
            "S1".to_string(),
            vec!["1".into(), "2".into(), "3".into()],
        )])
        .await
        .unwrap();

    store
        .insert_groups(vec![GroupDoc::new(
            "G1".to_string(),
            "unused-hash".to_string(),
            GroupClass::Y,
            vec!["kai".to_string(), "mira".to_string()],
            "S1".to_string(),
        )])
        .await
        .unwrap();

    let engine = ProgressionEngine::new(store.clone(), RADIUS_KM, policy);
    (engine, store)
}

// =============================================================================
// Ordered Progression
// =============================================================================

#[tokio::test]
async fn test_group_walks_the_trail_in_order() {
    let (engine, store) = seeded(ClaimPolicy::EnforceOrder).await;

    assert_eq!(
        engine.current_for_group("G1").await.unwrap(),
        CurrentCheckpoint::Next("1".into())
    );

    let outcome = engine.commit_claim("G1", &"1".into(), at(CKPT_1)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Committed);
    assert_eq!(
        engine.current_for_group("G1").await.unwrap(),
        CurrentCheckpoint::Next("2".into())
    );

    let outcome = engine.commit_claim("G1", &"2".into(), at(CKPT_2)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Committed);

    let outcome = engine.commit_claim("G1", &"3".into(), at(CKPT_3)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Committed);

    assert!(engine.current_for_group("G1").await.unwrap().is_complete());

    let group = store.get_group("G1").await.unwrap();
    let visited: Vec<&str> = group.visited_ckpts.iter().map(|c| c.as_str()).collect();
    assert_eq!(visited, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_rejected_claim_leaves_history_untouched() {
    let (engine, store) = seeded(ClaimPolicy::EnforceOrder).await;
    engine.commit_claim("G1", &"1".into(), at(CKPT_1)).await.unwrap();

    // Claims checkpoint 2 while still standing at checkpoint 1
    let outcome = engine.commit_claim("G1", &"2".into(), at(CKPT_1)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::OutOfRange);

    let group = store.get_group("G1").await.unwrap();
    assert_eq!(group.visited_ckpts, vec![CheckpointId::from("1")]);
    assert_eq!(
        engine.current_for_group("G1").await.unwrap(),
        CurrentCheckpoint::Next("2".into())
    );
}

#[tokio::test]
async fn test_order_policy_rejects_skipping_ahead() {
    let (engine, store) = seeded(ClaimPolicy::EnforceOrder).await;

    // Standing at checkpoint 2, but checkpoint 1 has not been visited
    let outcome = engine.commit_claim("G1", &"2".into(), at(CKPT_2)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::OutOfOrder);

    let group = store.get_group("G1").await.unwrap();
    assert!(group.visited_ckpts.is_empty());
}

// =============================================================================
// Flexible Policy
// =============================================================================

#[tokio::test]
async fn test_flexible_policy_commits_checkpoints_in_any_order() {
    let (engine, store) = seeded(ClaimPolicy::Flexible).await;

    let outcome = engine.commit_claim("G1", &"2".into(), at(CKPT_2)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Committed);

    let outcome = engine.commit_claim("G1", &"1".into(), at(CKPT_1)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Committed);

    let group = store.get_group("G1").await.unwrap();
    let visited: Vec<&str> = group.visited_ckpts.iter().map(|c| c.as_str()).collect();
    assert_eq!(visited, vec!["2", "1"], "visit order is preserved, not sequence order");
}

#[tokio::test]
async fn test_flexible_policy_still_rejects_foreign_checkpoints() {
    let (engine, store) = seeded(ClaimPolicy::Flexible).await;

    // Checkpoint 10 is in the catalog but not in this group's sequence
    let outcome = engine
        .commit_claim("G1", &"10".into(), at(CKPT_10))
        .await
        .unwrap();
    assert_eq!(outcome, ClaimOutcome::OutOfOrder);

    let group = store.get_group("G1").await.unwrap();
    assert!(group.visited_ckpts.is_empty());
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_completed_hunt_accepts_no_further_claims() {
    let (engine, _store) = seeded(ClaimPolicy::EnforceOrder).await;
    engine.commit_claim("G1", &"1".into(), at(CKPT_1)).await.unwrap();
    engine.commit_claim("G1", &"2".into(), at(CKPT_2)).await.unwrap();
    engine.commit_claim("G1", &"3".into(), at(CKPT_3)).await.unwrap();

    // An unvisited catalog checkpoint is still rejected once complete
    let outcome = engine
        .commit_claim("G1", &"10".into(), at(CKPT_10))
        .await
        .unwrap();
    assert_eq!(outcome, ClaimOutcome::HuntComplete);

    // Revisiting is reported as the repeat it is
    let outcome = engine.commit_claim("G1", &"2".into(), at(CKPT_2)).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::AlreadyVisited);
}

// =============================================================================
// Persistence Semantics
// =============================================================================

#[tokio::test]
async fn test_current_checkpoint_survives_engine_restart() {
    let (engine, store) = seeded(ClaimPolicy::EnforceOrder).await;
    engine.commit_claim("G1", &"1".into(), at(CKPT_1)).await.unwrap();
    drop(engine);

    // A fresh engine over the same store recomputes the same position
    let restarted = ProgressionEngine::new(store, RADIUS_KM, ClaimPolicy::EnforceOrder);
    assert_eq!(
        restarted.current_for_group("G1").await.unwrap(),
        CurrentCheckpoint::Next("2".into())
    );
}

#[tokio::test]
async fn test_catalog_lists_in_numeric_order() {
    let (_engine, store) = seeded(ClaimPolicy::EnforceOrder).await;

    let listed = store.list_checkpoints_ordered().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|c| c.ckpt_no.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "10"]);
}
