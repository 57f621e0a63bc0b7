//! Integration tests for [`memory::ContextStore`]: correction handling and referent resolution.

use chrono::{Duration, Utc};
use memory::{ContextConfig, ContextStore, MemoryRole};

/// **Test: A correction retires the stale product and the correction wins resolution.**
///
/// **Setup:** "iPhone 15" mentioned, then "It's not an iPhone 15, it's a Pixel 8".
/// **Action:** Inspect mentions; `resolve_referent_at`.
/// **Expected:** iPhone 15 `corrected`, not re-counted; Pixel 8 `is_correction` with count 1 + 2;
/// referent is Pixel 8.
#[test]
fn test_correction_replaces_stale_product() {
    let mut store = ContextStore::default();
    let t0 = Utc::now();
    store.update_at("chat", "I'm looking at the iPhone 15", t0);
    store.update_at(
        "chat",
        "It's not an iPhone 15, it's a Pixel 8",
        t0 + Duration::seconds(10),
    );

    let ctx = store.get("chat").unwrap();
    let iphone = ctx.product("iphone_15").unwrap();
    assert!(iphone.corrected);
    assert_eq!(iphone.mention_count, 1);

    let pixel = ctx.product("pixel_8").unwrap();
    assert!(pixel.is_correction);
    assert!(!pixel.corrected);
    assert_eq!(pixel.mention_count, 3);

    let referent = store
        .resolve_referent_at("chat", t0 + Duration::seconds(20))
        .unwrap();
    assert_eq!(referent.full_name, "Pixel 8");
}

/// **Test: A heavily mentioned product stays excluded once corrected.**
///
/// **Setup:** "iPhone 15" mentioned five times, then corrected to "Galaxy S24"; then an
/// unrelated follow-up that names neither.
/// **Action:** `resolve_referent_at` after the follow-up.
/// **Expected:** Galaxy S24, even though the iPhone has the higher raw count.
#[test]
fn test_corrected_product_excluded_despite_count() {
    let mut store = ContextStore::default();
    let t0 = Utc::now();
    for i in 0..5 {
        store.update_at("chat", "the iPhone 15 is nice", t0 + Duration::seconds(i));
    }
    store.update_at(
        "chat",
        "sorry I meant the Galaxy S24",
        t0 + Duration::seconds(10),
    );
    store.update_at("chat", "how much does it cost?", t0 + Duration::seconds(15));

    let ctx = store.get("chat").unwrap();
    assert_eq!(ctx.product("iphone_15").unwrap().mention_count, 5);
    assert!(ctx.product("iphone_15").unwrap().corrected);

    let referent = store
        .resolve_referent_at("chat", t0 + Duration::seconds(16))
        .unwrap();
    assert_eq!(referent.key, "galaxy_s24");
}

/// **Test: Corrections stay within one product category.**
///
/// **Setup:** "Pixel 8 and AirPods Pro", then "actually it's the AirPods Max".
/// **Action:** Inspect mentions and resolve.
/// **Expected:** AirPods Pro corrected; Pixel 8 untouched; AirPods Max is the referent.
#[test]
fn test_correction_scoped_to_category() {
    let mut store = ContextStore::default();
    let t0 = Utc::now();
    store.update_at("chat", "I have a Pixel 8 and AirPods Pro", t0);
    store.update_at("chat", "actually it's the AirPods Max", t0 + Duration::seconds(5));

    let ctx = store.get("chat").unwrap();
    assert!(ctx.product("airpods_pro").unwrap().corrected);
    assert!(!ctx.product("pixel_8").unwrap().corrected);
    assert!(ctx.product("airpods_max").unwrap().is_correction);

    let referent = store
        .resolve_referent_at("chat", t0 + Duration::seconds(6))
        .unwrap();
    assert_eq!(referent.key, "airpods_max");
}

/// **Test: Recent-message bonus favours the product named most recently.**
///
/// **Setup:** Pixel 8 mentioned twice at t0, AirPods Pro once at t0; newest message names the AirPods.
/// **Action:** `resolve_referent_at` at t0.
/// **Expected:** AirPods Pro (20 bonus beats the Pixel's extra mention and older bonus).
#[test]
fn test_recent_message_bonus() {
    let mut store = ContextStore::default();
    let t0 = Utc::now();
    store.update_at("chat", "Pixel 8 camera", t0);
    store.update_at("chat", "Pixel 8 battery", t0);
    store.update_at("chat", "and the AirPods Pro?", t0);

    let referent = store.resolve_referent_at("chat", t0).unwrap();
    assert_eq!(referent.key, "airpods_pro");
}

/// **Test: Conversations are isolated and empty ones resolve to nothing.**
///
/// **Setup:** Product mention in chat A only; assistant reply in chat B.
/// **Action:** Resolve in both and in an unknown chat.
/// **Expected:** A resolves; B and unknown return `None`.
#[test]
fn test_conversations_are_isolated() {
    let mut store = ContextStore::new(ContextConfig::default());
    store.update("a", "what about the OnePlus 12?");
    store.record("b", MemoryRole::Assistant, "the OnePlus 12 is fast");

    assert_eq!(store.resolve_referent("a").unwrap().key, "oneplus_12");
    assert!(store.resolve_referent("b").is_none());
    assert!(store.resolve_referent("nobody").is_none());
    assert_eq!(store.len(), 2);
}

/// **Test: A plain re-mention revives a corrected product.**
///
/// **Setup:** iPhone 15 corrected to Pixel 8, then "ok the iPhone 15 it is".
/// **Action:** Inspect the iPhone entry.
/// **Expected:** `corrected` cleared and count incremented.
#[test]
fn test_plain_remention_revives() {
    let mut store = ContextStore::default();
    let t0 = Utc::now();
    store.update_at("chat", "iPhone 15?", t0);
    store.update_at("chat", "no wait, not the iPhone 15, the Pixel 8", t0);
    store.update_at("chat", "ok the iPhone 15 it is", t0);

    let iphone = store.get("chat").unwrap().product("iphone_15").unwrap();
    assert!(!iphone.corrected);
    assert_eq!(iphone.mention_count, 2);
}
