//! Integration tests for parlance-i18n.
//!
//! These exercise the translation pipeline end to end: bundle, pool, cache,
//! fallback chain, reload and locale files on disk.

use parlance_common::test_utils::{init_test_logging, locale_fixtures, write_locale_file};
use parlance_config::{Config, LocaleMode};
use parlance_i18n::{
    BundleHandle, Fingerprint, I18nService, LanguageHints, LanguageTag, LocaleSource,
    LocalizerFactory, LocalizerPool, TemplateData,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn tag(s: &str) -> LanguageTag {
    LanguageTag::parse(s).unwrap()
}

fn fixture_sources() -> Vec<LocaleSource> {
    vec![
        LocaleSource::from_json_str("en", locale_fixtures::english_json()).unwrap(),
        LocaleSource::from_json_str("zh-CN", locale_fixtures::simplified_chinese_json()).unwrap(),
    ]
}

fn metered_config() -> Config {
    let mut config = Config::default();
    config.enable_metrics = true;
    config
}

proptest! {
    #[test]
    fn fingerprint_ignores_insertion_order(entries in prop::collection::hash_map("[a-z]{1,8}", any::<i64>(), 1..8)) {
        let pairs: Vec<(String, i64)> = entries.into_iter().collect();
        let forward: TemplateData = pairs.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let backward: TemplateData = pairs.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();

        prop_assert_eq!(
            Fingerprint::compute(&tag("en"), "MSG", &forward),
            Fingerprint::compute(&tag("en"), "MSG", &backward)
        );
    }

    #[test]
    fn fingerprint_changes_with_values(entries in prop::collection::hash_map("[a-z]{1,8}", any::<i64>(), 1..8)) {
        let data: TemplateData = entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let (key, value) = entries.iter().next().unwrap();
        let mut changed = data.clone();
        changed.insert(key.clone(), json!(value.wrapping_add(1)));

        prop_assert_ne!(
            Fingerprint::compute(&tag("en"), "MSG", &data),
            Fingerprint::compute(&tag("en"), "MSG", &changed)
        );
    }

    #[test]
    fn pool_never_exceeds_idle_bound(
        max_idle in 1usize..6,
        ops in prop::collection::vec((any::<bool>(), 0usize..3), 0..64),
    ) {
        let languages = [tag("en"), tag("zh-CN"), tag("fr")];
        let pool = LocalizerPool::pooled(LocalizerFactory::new(BundleHandle::default(), tag("en")), max_idle);
        let mut checked_out = Vec::new();

        for (acquire, index) in ops {
            if acquire {
                checked_out.push(pool.acquire(&languages[index]));
            } else if let Some(localizer) = checked_out.pop() {
                pool.release(localizer);
            }
            for language in &languages {
                prop_assert!(pool.idle_count(language) <= max_idle);
            }
        }

        let stats = pool.stats();
        prop_assert_eq!(stats.gets, stats.puts + stats.discards + checked_out.len() as u64);
    }
}

#[test]
fn test_empty_bundle_yields_readable_default() {
    init_test_logging();
    let service = I18nService::with_sources(Config::default(), &[]).unwrap();

    assert_eq!(
        service.translate("en-scratch", "USER_NOT_FOUND", &TemplateData::new()),
        "User not found"
    );
    assert_eq!(service.translate("en", "", &TemplateData::new()), "Unknown message");
    assert_eq!(service.stats().cache.entries, 0);
}

#[test]
fn test_fallback_to_english_is_cached() {
    let service = I18nService::with_sources(metered_config(), &fixture_sources()).unwrap();

    assert_eq!(service.translate("zh-CN", "WELCOME", &TemplateData::new()), "Hello");
    assert_eq!(service.translate("zh-CN", "WELCOME", &TemplateData::new()), "Hello");

    let metrics = service.metrics();
    assert_eq!(metrics.cache_hits, 1);
    assert_eq!(metrics.fallbacks, 1);
    assert_eq!(service.stats().cache.hits, 1);
}

#[test]
fn test_named_placeholder_substitution() {
    let service = I18nService::with_sources(Config::default(), &fixture_sources()).unwrap();
    let mut data = TemplateData::new();
    data.insert("name".to_string(), json!("Ada"));

    assert_eq!(service.translate("en", "HELLO_USER", &data), "Hello, Ada!");

    let mut other = TemplateData::new();
    other.insert("name".to_string(), json!("Grace"));
    assert_eq!(service.translate("en", "HELLO_USER", &other), "Hello, Grace!");
    assert_eq!(service.stats().cache.entries, 2);
}

#[test]
fn test_plural_selection() {
    let service = I18nService::with_sources(Config::default(), &fixture_sources()).unwrap();
    let none = TemplateData::new();

    assert_eq!(
        service.translate_plural("en", "UNREAD_MESSAGES", 1, &none),
        "You have 1 unread message"
    );
    assert_eq!(
        service.translate_plural("en", "UNREAD_MESSAGES", 3, &none),
        "You have 3 unread messages"
    );
    assert_eq!(
        service.translate_plural("zh-CN", "UNREAD_MESSAGES", 1, &none),
        "您有 1 条未读消息"
    );
}

#[test]
fn test_reload_invalidates_cache() {
    let service = I18nService::with_sources(Config::default(), &fixture_sources()).unwrap();
    assert_eq!(service.translate("en", "SUCCESS", &TemplateData::new()), "Success");

    service
        .reload(&[LocaleSource::from_pairs("en", [("SUCCESS", "Done")])])
        .unwrap();

    assert_eq!(service.translate("en", "SUCCESS", &TemplateData::new()), "Done");
    assert_eq!(service.stats().num_locales, 1);
}

#[test]
fn test_failed_reload_keeps_previous_state() {
    let service = I18nService::with_sources(Config::default(), &fixture_sources()).unwrap();
    service.translate("en", "SUCCESS", &TemplateData::new());

    let broken = LocaleSource::from_json_str("en", r#"{"SUCCESS": {"one": "Done once"}}"#).unwrap();
    assert!(service.reload(&[broken]).is_err());

    assert_eq!(service.stats().cache.entries, 1);
    assert_eq!(service.bundle().language_count(), 2);
}

#[test]
fn test_snapshot_survives_reload() {
    let service = I18nService::with_sources(Config::default(), &fixture_sources()).unwrap();
    let before = service.bundle();

    service
        .reload(&[LocaleSource::from_pairs("en", [("SUCCESS", "Done")])])
        .unwrap();

    assert!(before.lookup(&tag("zh-CN"), "SUCCESS").is_some());
    assert!(service.bundle().lookup(&tag("zh-CN"), "SUCCESS").is_none());
}

async fn wait_for(counter: &AtomicUsize, target: usize) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while counter.load(Ordering::SeqCst) < target {
        assert!(Instant::now() < deadline, "workers stopped making progress");
        tokio::task::yield_now().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_translation_during_reload() {
    let service = Arc::new(I18nService::with_sources(Config::default(), &fixture_sources()).unwrap());
    let completed = Arc::new(AtomicUsize::new(0));
    let reloaded = Arc::new(AtomicBool::new(false));
    let stop = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::new();
    for _ in 0..4 {
        let service = Arc::clone(&service);
        let completed = Arc::clone(&completed);
        let reloaded = Arc::clone(&reloaded);
        let stop = Arc::clone(&stop);
        workers.push(tokio::task::spawn_blocking(move || {
            let (mut old, mut new) = (0usize, 0usize);
            while !stop.load(Ordering::SeqCst) {
                let after_reload = reloaded.load(Ordering::SeqCst);
                let text = service.translate("en", "SUCCESS", &TemplateData::new());
                match text.as_str() {
                    "Success" => {
                        assert!(!after_reload, "old catalog served after reload returned");
                        old += 1;
                    }
                    "Done" => new += 1,
                    other => panic!("unexpected translation {other}"),
                }
                completed.fetch_add(1, Ordering::SeqCst);
            }
            (old, new)
        }));
    }

    wait_for(&completed, 400).await;
    service
        .reload(&[LocaleSource::from_pairs("en", [("SUCCESS", "Done")])])
        .unwrap();
    reloaded.store(true, Ordering::SeqCst);
    let target = completed.load(Ordering::SeqCst) + 400;
    wait_for(&completed, target).await;
    stop.store(true, Ordering::SeqCst);

    let (mut old, mut new) = (0, 0);
    for worker in workers {
        let (o, n) = worker.await.unwrap();
        old += o;
        new += n;
    }
    assert!(old > 0, "no translation ran before the reload");
    assert!(new > 0, "no translation ran after the reload");
    assert_eq!(service.translate("en", "SUCCESS", &TemplateData::new()), "Done");
}

#[test]
fn test_reload_leaves_no_stale_cache_entries() {
    let initial = [LocaleSource::from_pairs("en", [("MSG", "v0")])];
    let service = Arc::new(I18nService::with_sources(Config::default(), &initial).unwrap());
    let stop = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..6)
        .map(|_| {
            let service = Arc::clone(&service);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    service.translate("en", "MSG", &TemplateData::new());
                }
            })
        })
        .collect();

    let mut stale = Vec::new();
    for i in 1..=300 {
        let expected = format!("v{i}");
        service
            .reload(&[LocaleSource::from_pairs("en", [("MSG", expected.as_str())])])
            .unwrap();
        thread::sleep(Duration::from_millis(1));
        let served = service.translate("en", "MSG", &TemplateData::new());
        if served != expected {
            stale.push((expected, served));
        }
    }

    stop.store(true, Ordering::SeqCst);
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(stale.is_empty(), "stale translations after reload: {stale:?}");
}

#[test]
fn test_service_from_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_locale_file(dir.path(), "en/common.json", r#"{"SUCCESS": "Success"}"#);
    write_locale_file(dir.path(), "en/errors.json", r#"{"errors": {"NOT_FOUND": "Not found"}}"#);
    write_locale_file(dir.path(), "zh-CN/common.json", r#"{"SUCCESS": "成功"}"#);

    let mut config = Config::default();
    config.locales.path = dir.path().to_path_buf();
    config.locales.mode = LocaleMode::Auto;
    config.locales.languages = vec!["en".to_string(), "zh-CN".to_string()];

    let service = I18nService::new(config).unwrap();
    assert_eq!(service.translate("zh-CN", "SUCCESS", &TemplateData::new()), "成功");
    assert_eq!(
        service.translate("zh-CN", "errors.NOT_FOUND", &TemplateData::new()),
        "Not found"
    );

    write_locale_file(dir.path(), "zh-CN/errors.json", r#"{"errors": {"NOT_FOUND": "未找到"}}"#);
    service.reload_from_disk().unwrap();
    assert_eq!(
        service.translate("zh-CN", "errors.NOT_FOUND", &TemplateData::new()),
        "未找到"
    );
}

#[test]
fn test_resolved_locale_drives_translation() {
    let service = I18nService::with_sources(Config::default(), &fixture_sources()).unwrap();
    let hints = LanguageHints::new()
        .with_query("zh_cn")
        .with_accept_language("en;q=0.9");

    let locale = service.resolver().resolve(&hints);
    assert_eq!(locale.language, tag("zh-CN"));
    assert_eq!(service.translate_for(&locale, "SUCCESS", &TemplateData::new()), "成功");

    let default_locale = service.resolver().resolve(&LanguageHints::new());
    assert_eq!(default_locale.language, tag("en"));
    assert_eq!(
        service.translate_for(&default_locale, "SUCCESS", &TemplateData::new()),
        "Success"
    );
}
