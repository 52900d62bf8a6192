// Integration tests for ArtConnect matching

use artconnect_match::core::{ManualClock, Matcher, SessionConfig, SessionStore, TOP_K};
use artconnect_match::models::{
    DesignCategory, DesignStyle, DesignerCandidate, Proposal, RecommendedDesigner, ScoredDesigner,
};
use artconnect_match::services::{CandidateSource, InMemoryCandidateSource, SourceError};
use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;

fn create_scored(id: i64, score: u32) -> ScoredDesigner {
    ScoredDesigner {
        designer: RecommendedDesigner::from(&DesignerCandidate {
            user_id: id,
            nickname: format!("designer{}", id),
            ..Default::default()
        }),
        matching_score: score,
        matched_keywords: vec![],
    }
}

fn ranked(n: i64) -> Vec<ScoredDesigner> {
    (1..=n).map(|id| create_scored(id, (n - id) as u32)).collect()
}

fn ids(page: &[ScoredDesigner]) -> Vec<i64> {
    page.iter().map(ScoredDesigner::user_id).collect()
}

fn seeded_store(seed: u64) -> (SessionStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let config = SessionConfig {
        shuffle_seed: Some(seed),
        ..SessionConfig::default()
    };
    (SessionStore::with_clock(config, clock.clone()), clock)
}

fn fixture_source() -> InMemoryCandidateSource {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/designers.json");
    InMemoryCandidateSource::from_json_file(path).expect("fixture should load")
}

struct UnavailableSource;

#[async_trait]
impl CandidateSource for UnavailableSource {
    async fn find_candidates(&self, _keywords: &[String]) -> Result<Vec<DesignerCandidate>, SourceError> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_integration_end_to_end_recommendation() {
    let source = fixture_source();
    let proposal = Proposal::new("모던하고 미니멀한", "카페 사장님", "로고, 명함");

    let scored = Matcher::default()
        .find_scored_matching_designers(&proposal, &source)
        .await
        .unwrap();

    // designer 103 mentions none of the keywords
    assert_eq!(ids(&scored), vec![101, 105, 102, 104]);
    assert_eq!(scored[0].matching_score, 14);
    assert!(scored[0].matched_keywords.contains(&"minimal".to_string()));

    let (store, _) = seeded_store(3);
    let session_id = store.create_session(proposal.clone(), scored);

    let initial = store.get_initial_recommendations(&session_id);
    assert_eq!(ids(&initial), vec![101, 105]);

    let mut refreshed = ids(&store.get_refreshed_recommendations(&session_id));
    refreshed.sort_unstable();
    assert_eq!(refreshed, vec![102, 104]);

    // everything shown, the next page comes from the full list
    let wrapped = store.get_refreshed_recommendations(&session_id);
    assert_eq!(wrapped.len(), 2);

    let session = store.get_session(&session_id).unwrap();
    assert_eq!(session.proposal(), &proposal);
    assert_eq!(session.returned_ids().len(), 4);
}

#[tokio::test]
async fn test_integration_top_k_bound() {
    let designers: Vec<DesignerCandidate> = (0..30)
        .map(|id| DesignerCandidate {
            user_id: id,
            nickname: format!("designer{}", id),
            categories: vec![DesignCategory::Package],
            styles: if id % 3 == 0 { vec![DesignStyle::Illustration] } else { vec![] },
            ..Default::default()
        })
        .collect();
    let source = InMemoryCandidateSource::new(designers);

    let scored = Matcher::default()
        .find_scored_matching_designers(&Proposal::new("일러스트", "", "패키지"), &source)
        .await
        .unwrap();

    assert_eq!(scored.len(), TOP_K);
    assert!(scored.iter().all(|s| s.user_id() % 3 == 0));
    for pair in scored.windows(2) {
        assert!(pair[0].matching_score >= pair[1].matching_score);
    }
}

#[tokio::test]
async fn test_integration_source_failure_propagates() {
    let result = Matcher::default()
        .find_scored_matching_designers(&Proposal::new("", "", "로고"), &UnavailableSource)
        .await;

    assert!(matches!(result, Err(SourceError::Unavailable(_))));
}

#[test]
fn test_integration_spec_ranking_example() {
    let (store, _) = seeded_store(9);
    let designers = vec![
        create_scored(1, 9),
        create_scored(2, 7),
        create_scored(3, 7),
        create_scored(4, 2),
    ];
    let session_id = store.create_session(Proposal::default(), designers);

    assert_eq!(ids(&store.get_initial_recommendations(&session_id)), vec![1, 2]);

    let refreshed: HashSet<i64> = ids(&store.get_refreshed_recommendations(&session_id))
        .into_iter()
        .collect();
    assert_eq!(refreshed, HashSet::from([3, 4]));
}

#[test]
fn test_integration_no_repeat_until_exhausted() {
    for n in 4..=12 {
        for seed in 0..8 {
            let (store, _) = seeded_store(seed);
            let session_id = store.create_session(Proposal::default(), ranked(n));
            store.get_initial_recommendations(&session_id);

            for _ in 0..n {
                let before: HashSet<i64> = store
                    .get_session(&session_id)
                    .unwrap()
                    .returned_ids()
                    .into_iter()
                    .collect();

                let page = store.get_refreshed_recommendations(&session_id);
                assert_eq!(page.len(), 2);

                if (before.len() as i64) < n - 1 {
                    for id in ids(&page) {
                        assert!(!before.contains(&id), "n={} seed={} repeated {}", n, seed, id);
                    }
                }
            }
        }
    }
}

#[test]
fn test_integration_session_expiry() {
    let (store, clock) = seeded_store(1);
    let session_id = store.create_session(Proposal::default(), ranked(4));

    clock.advance(Duration::minutes(30) - Duration::seconds(1));
    assert!(store.get_session(&session_id).is_some());
    assert_eq!(store.get_initial_recommendations(&session_id).len(), 2);

    clock.advance(Duration::seconds(2));
    assert!(store.get_session(&session_id).is_none());
    assert!(store.get_refreshed_recommendations(&session_id).is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_integration_creation_sweeps_expired_sessions() {
    let (store, clock) = seeded_store(1);
    store.create_session(Proposal::default(), ranked(3));
    store.create_session(Proposal::default(), ranked(3));

    clock.advance(Duration::minutes(31));
    let fresh = store.create_session(Proposal::default(), ranked(3));

    assert_eq!(store.len(), 1);
    assert_eq!(store.active_session_count(), 1);
    assert!(store.get_session(&fresh).is_some());
}

#[test]
fn test_integration_get_session_is_idempotent() {
    let (store, _) = seeded_store(5);
    let session_id = store.create_session(Proposal::new("a", "b", "c"), ranked(5));

    let first = store.get_session(&session_id).unwrap().snapshot();
    let second = store.get_session(&session_id).unwrap().snapshot();

    assert_eq!(first, second);
    assert!(first.returned_designer_ids.is_empty());
}

#[test]
fn test_integration_empty_and_unknown_sessions() {
    let (store, _) = seeded_store(5);
    let empty = store.create_session(Proposal::default(), Vec::new());

    assert!(store.get_session(&empty).is_some());
    assert!(store.get_initial_recommendations(&empty).is_empty());
    assert!(store.get_refreshed_recommendations(&empty).is_empty());

    assert!(store.get_session("session_0_deadbeef").is_none());
    assert!(store.get_session("   ").is_none());
    assert!(store.get_initial_recommendations("").is_empty());
}

#[test]
fn test_integration_single_designer_session() {
    let (store, _) = seeded_store(5);
    let session_id = store.create_session(Proposal::default(), ranked(1));

    assert_eq!(ids(&store.get_initial_recommendations(&session_id)), vec![1]);
    assert_eq!(ids(&store.get_refreshed_recommendations(&session_id)), vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_integration_concurrent_refresh_never_duplicates() {
    let store = Arc::new(SessionStore::new(SessionConfig::default()));
    let session_id = store.create_session(Proposal::default(), ranked(20));
    store.get_initial_recommendations(&session_id);

    let handles: Vec<_> = (0..9)
        .map(|_| {
            let store = Arc::clone(&store);
            let session_id = session_id.clone();
            tokio::spawn(async move { store.get_refreshed_recommendations(&session_id) })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in ids(&handle.await.unwrap()) {
            assert!(seen.insert(id), "designer {} returned twice", id);
        }
    }

    assert_eq!(seen.len(), 18);
    assert!(!seen.contains(&1) && !seen.contains(&2));
}
