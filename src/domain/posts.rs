//! Post-specific domain helpers.

/// Derive a URL slug from a post title.
///
/// Lowercase with single hyphens; repeated separators collapse and
/// leading/trailing separators are stripped.
pub fn derive_slug(title: &str) -> String {
    slug::slugify(title)
}

/// Demo posts inserted when seeding is enabled and the collection is empty.
/// Tuples are `(slug, title, summary, body)`.
pub fn seed_posts() -> Vec<(&'static str, &'static str, &'static str, &'static str)> {
    vec![
        (
            "hello-world",
            "Hello, world",
            "Welcome to my blog — first post seeded for demo.",
            "This is a sample post created during initial seeding.",
        ),
        (
            "real-time-ads-metrics-pipeline",
            "A Minimal Real-Time Ads Metrics Pipeline",
            "Kafka, Flink, Iceberg, Superset: a pragmatic baseline.",
            "Notes on design trade-offs, checkpoints, and dashboarding.",
        ),
    ]
}
