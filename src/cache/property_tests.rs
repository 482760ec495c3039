//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key derivation, TTL resolution and invalidation.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{cache_key, ApiCache, ManualClock, RequestOptions, TtlTable};

// == Strategies ==
/// Generates storefront-like resource paths
fn path_strategy() -> impl Strategy<Value = String> {
    "/api/[a-z]{3,10}(/[a-z0-9-]{1,12}){0,2}".prop_map(|s| s)
}

fn method_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("GET".to_string())),
        Just(Some("POST".to_string())),
        Just(Some("PUT".to_string())),
        Just(Some("DELETE".to_string())),
    ]
}

fn body_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("\\{\"[a-z]{1,6}\":[0-9]{1,4}\\}")
}

fn product_id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,11}"
        .prop_filter("not a collection or taxonomy segment", |id| {
            !["featured", "top-selling", "types", "categories", "brands", "concerns"]
                .iter()
                .any(|segment| id.starts_with(segment))
        })
}

fn options(method: Option<String>, body: Option<String>) -> RequestOptions {
    RequestOptions {
        method,
        body,
        ..RequestOptions::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Identical (method, url, body) always produce the same key.
    #[test]
    fn prop_key_is_deterministic(
        url in path_strategy(),
        method in method_strategy(),
        body in body_strategy()
    ) {
        let a = cache_key(&url, &options(method.clone(), body.clone()));
        let b = cache_key(&url, &options(method, body));
        prop_assert_eq!(a, b);
    }

    // Different bodies never collide for the same method and URL.
    #[test]
    fn prop_body_changes_key(
        url in path_strategy(),
        body1 in "[a-z]{1,8}",
        body2 in "[a-z]{1,8}"
    ) {
        prop_assume!(body1 != body2);
        let a = cache_key(&url, &options(None, Some(body1)));
        let b = cache_key(&url, &options(None, Some(body2)));
        prop_assert_ne!(a, b);
    }

    // Any product id resolves to the single-product TTL, while the
    // collection endpoints keep their own TTL.
    #[test]
    fn prop_single_product_rule(id in product_id_strategy(), page in 1u32..50) {
        let table = TtlTable::storefront();
        prop_assert_eq!(
            table.ttl_for(&format!("/api/products/{}", id)),
            Duration::from_secs(180)
        );
        prop_assert_eq!(
            table.ttl_for(&format!("/api/products/featured?page={}", page)),
            Duration::from_secs(300)
        );
        prop_assert_eq!(
            table.ttl_for(&format!("/api/products?page={}", page)),
            Duration::from_secs(120)
        );
    }

    // Entries are readable strictly before their TTL and gone at or after it.
    #[test]
    fn prop_validity_window(url in path_strategy(), offset in 0u64..3600) {
        let clock = Arc::new(ManualClock::new());
        let cache: ApiCache<String> = ApiCache::new().with_clock(clock.clone());
        let opts = RequestOptions::new();
        let ttl = cache.ttl_for(&url);

        cache.set(&url, "value".to_string(), &opts);
        clock.advance(Duration::from_secs(offset));

        let expected_valid = Duration::from_secs(offset) < ttl;
        prop_assert_eq!(cache.get(&url, &opts).is_some(), expected_valid);
    }

    // Substring invalidation removes exactly the keys containing the pattern.
    #[test]
    fn prop_invalidate_removes_exact_matches(
        urls in prop::collection::hash_set(path_strategy(), 1..20),
        needle in "[a-z]{3}"
    ) {
        let cache: ApiCache<String> = ApiCache::new();
        let opts = RequestOptions::new();
        for url in &urls {
            cache.set(url, url.clone(), &opts);
        }

        let expected_removed: HashSet<&String> = urls
            .iter()
            .filter(|url| cache_key(url, &opts).contains(needle.as_str()))
            .collect();

        let removed = cache.invalidate(needle.as_str());
        prop_assert_eq!(removed, expected_removed.len());

        for url in &urls {
            prop_assert_eq!(
                cache.get(url, &opts).is_none(),
                expected_removed.contains(url)
            );
        }
    }

    // Cleanup never removes a fresh entry and always removes expired ones.
    #[test]
    fn prop_cleanup_matches_validity(
        urls in prop::collection::hash_set(path_strategy(), 1..20),
        offset in 0u64..1200
    ) {
        let clock = Arc::new(ManualClock::new());
        let cache: ApiCache<String> = ApiCache::new().with_clock(clock.clone());
        let opts = RequestOptions::new();
        for url in &urls {
            cache.set(url, url.clone(), &opts);
        }
        clock.advance(Duration::from_secs(offset));

        let expired = urls
            .iter()
            .filter(|url| Duration::from_secs(offset) >= cache.ttl_for(url))
            .count();

        prop_assert_eq!(cache.cleanup(), expired);
        prop_assert_eq!(cache.len(), urls.len() - expired);
    }
}
