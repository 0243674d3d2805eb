use std::time::Duration;

use super::*;

fn raw() -> RawSettings {
    RawSettings::default()
}

#[test]
fn defaults_resolve() {
    let settings = Settings::from_raw(raw()).expect("defaults are valid");

    assert_eq!(settings.server.public_addr.port(), 8000);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(settings.cache.url, None);
    assert_eq!(settings.cache.key_prefix, "vetrina");
    assert_eq!(settings.cache.anon_ttl, Duration::from_secs(60));
    assert_eq!(settings.cache.identity_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.connect_timeout, Duration::from_millis(2_000));
    assert!(!settings.blog.seed_on_startup);
    assert_eq!(settings.blog.default_page_size.get(), 20);
    assert_eq!(settings.blog.max_page_size.get(), 50);
}

#[test]
fn zero_port_is_rejected() {
    let mut settings = raw();
    settings.server.port = Some(0);
    let err = Settings::from_raw(settings).expect_err("port 0 must fail");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn zero_ttl_is_rejected() {
    let mut settings = raw();
    settings.cache.anon_ttl_seconds = Some(0);
    let err = Settings::from_raw(settings).expect_err("ttl 0 must fail");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.anon_ttl_seconds",
            ..
        }
    ));
}

#[test]
fn blank_urls_are_treated_as_unset() {
    let mut settings = raw();
    settings.database.url = Some("   ".to_string());
    settings.cache.url = Some("".to_string());
    let settings = Settings::from_raw(settings).expect("blank urls are fine");
    assert_eq!(settings.database.url, None);
    assert_eq!(settings.cache.url, None);
}

#[test]
fn default_page_size_must_fit_under_max() {
    let mut settings = raw();
    settings.blog.default_page_size = Some(100);
    settings.blog.max_page_size = Some(50);
    let err = Settings::from_raw(settings).expect_err("default above max must fail");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "blog.default_page_size",
            ..
        }
    ));
}

#[test]
fn serve_overrides_take_precedence() {
    let mut settings = raw();
    settings.server.port = Some(9000);
    settings.apply_serve_overrides(&ServeOverrides {
        server_port: Some(9100),
        database_url: Some("postgres://localhost/vetrina".to_string()),
        cache_url: Some("redis://localhost:6379".to_string()),
        ..ServeOverrides::default()
    });

    let settings = Settings::from_raw(settings).expect("valid");
    assert_eq!(settings.server.public_addr.port(), 9100);
    assert_eq!(
        settings.database.url.as_deref(),
        Some("postgres://localhost/vetrina")
    );
    assert_eq!(settings.cache.url.as_deref(), Some("redis://localhost:6379"));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut settings = raw();
    settings.logging.level = Some("loud".to_string());
    assert!(Settings::from_raw(settings).is_err());
}
