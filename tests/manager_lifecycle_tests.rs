//! Integration tests for the cache manager façade: foreground operations,
//! expiration visibility, and configuration validation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use permacache::{
    CacheConfig, CacheError, CacheManager, ExpirationPolicy, Priority, RemovalListener,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "permacache=debug".into()),
        )
        .try_init();
}

fn config() -> CacheConfig {
    CacheConfig {
        max_items: 100,
        scavenge_interval: Duration::from_millis(100),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn add_get_remove_contains() {
    init_tracing();
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache.add("k1", "v1".to_string()).await.unwrap();
    assert_eq!(cache.get("k1").await, Some("v1".to_string()));
    assert!(cache.contains("k1").await);
    assert_eq!(cache.count().await, 1);

    assert!(cache.remove("k1").await.unwrap());
    assert_eq!(cache.get("k1").await, None);
    assert!(!cache.contains("k1").await);
    assert_eq!(cache.count().await, 0);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn item_without_policies_stays_until_removed() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache.add("stable", "value".to_string()).await.unwrap();

    // Several scavenger passes later the item is still there
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(cache.get("stable").await, Some("value".to_string()));

    assert!(cache.remove("stable").await.unwrap());
    assert_eq!(cache.get("stable").await, None);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn remove_absent_key_is_not_an_error() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    assert!(!cache.remove("never-added").await.unwrap());

    cache.add("k", "v".to_string()).await.unwrap();
    assert!(cache.remove("k").await.unwrap());
    assert!(!cache.remove("k").await.unwrap());

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn overwrite_replaces_value() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache.add("k", "v1".to_string()).await.unwrap();
    cache.add("k", "v2".to_string()).await.unwrap();

    assert_eq!(cache.get("k").await, Some("v2".to_string()));
    assert_eq!(cache.count().await, 1);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn expired_item_reads_as_miss_immediately() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    let already_past = Utc::now() - chrono::Duration::seconds(1);
    cache
        .add_with(
            "gone",
            "v".to_string(),
            Priority::Normal,
            vec![ExpirationPolicy::absolute(already_past)],
            None,
        )
        .await
        .unwrap();

    // No scavenger pass needed: the read path itself treats it as absent
    assert_eq!(cache.get("gone").await, None);
    assert!(!cache.contains("gone").await);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn sliding_expiration_resets_on_access() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache
        .add_with(
            "sliding",
            "v".to_string(),
            Priority::Normal,
            vec![ExpirationPolicy::sliding(Duration::from_millis(500))],
            None,
        )
        .await
        .unwrap();

    // Accesses spaced well inside the window keep the item alive
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get("sliding").await, Some("v".to_string()));
    }

    // A gap past the window expires it
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(cache.get("sliding").await, None);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn file_change_expires_item_through_the_manager() {
    let dir = tempfile::tempdir().unwrap();
    let watched = dir.path().join("watched.txt");
    std::fs::write(&watched, b"v1").unwrap();

    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();
    cache
        .add_with(
            "dependent",
            "v".to_string(),
            Priority::Normal,
            vec![ExpirationPolicy::file_change(&watched)],
            None,
        )
        .await
        .unwrap();
    assert_eq!(cache.get("dependent").await, Some("v".to_string()));

    std::fs::remove_file(&watched).unwrap();

    // The read path sees the divergence immediately
    assert_eq!(cache.get("dependent").await, None);

    // And a scavenger pass physically removes the item
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cache.count().await, 0);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn overwrite_does_not_fire_replaced_callback() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    let fired = Arc::new(AtomicBool::new(false));
    let fired_clone = fired.clone();
    let listener: RemovalListener<String> = Arc::new(move |_key, _value, _cause| {
        fired_clone.store(true, Ordering::SeqCst);
    });

    cache
        .add_with("k", "v1".to_string(), Priority::Normal, Vec::new(), Some(listener))
        .await
        .unwrap();
    cache.add("k", "v2".to_string()).await.unwrap();

    // Replacement is not a removal: the old item's callback never runs
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!fired.load(Ordering::SeqCst));
    assert_eq!(cache.get("k").await, Some("v2".to_string()));

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn keys_returns_snapshot() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache.add("a", "1".to_string()).await.unwrap();
    cache.add("b", "2".to_string()).await.unwrap();

    let mut keys = cache.keys().await;
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn clear_empties_the_cache() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache.add("a", "1".to_string()).await.unwrap();
    cache.add("b", "2".to_string()).await.unwrap();

    cache.clear().await.unwrap();
    assert_eq!(cache.count().await, 0);
    assert_eq!(cache.get("a").await, None);

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_keys_are_rejected() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    let result = cache.add("", "v".to_string()).await;
    assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

    let long_key = "x".repeat(300);
    let result = cache.add(long_key, "v".to_string()).await;
    assert!(matches!(result, Err(CacheError::InvalidRequest(_))));

    cache.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalid_configuration_fails_initialize() {
    let bad = CacheConfig {
        max_items: 0,
        ..CacheConfig::default()
    };
    let result: Result<CacheManager<String>, _> = CacheManager::in_memory(bad).await;
    assert!(matches!(result, Err(CacheError::Configuration(_))));
}

#[tokio::test]
async fn stats_track_hits_and_misses() {
    let cache: CacheManager<String> = CacheManager::in_memory(config()).await.unwrap();

    cache.add("k", "v".to_string()).await.unwrap();
    cache.get("k").await.unwrap();
    assert!(cache.get("absent").await.is_none());

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_items, 1);
    assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);

    cache.shutdown().await.unwrap();
}
