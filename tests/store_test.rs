use chrono::{Duration, Utc};
use news_aggregator::store::{article_id, slugify, ArticleStore};
use news_aggregator::types::{Article, NewsDocument, Provider, QueryFilters};
use tempfile::TempDir;

fn article(n: usize, country: &str) -> Article {
    let title = format!("Story Number {n} Happens");
    let url = format!("https://example.com/story/{n}");
    let id = article_id(&title, &url);
    let now = Utc::now() - Duration::minutes((100 - n) as i64);
    Article {
        slug: slugify(Some(&title), Some(&id)),
        id,
        rewritten_title: format!("Story Number {n} Takes Place"),
        title,
        description: format!("Description for story {n}"),
        rewritten_body: format!("Body text for story number {n} with plenty of detail."),
        summary: format!("Summary {n}"),
        image_url: None,
        source_name: "Test Wire".to_string(),
        source_url: url,
        published_at: now,
        country: country.to_string(),
        category: "general".to_string(),
        provider: Provider::Rss,
        reading_time_minutes: 1,
        views: 0,
        featured: false,
        created_at: now,
        updated_at: now,
        first_seen_at: now,
        merge_rank: n,
    }
}

fn store_in(dir: &TempDir, cap: usize) -> ArticleStore {
    ArticleStore::open(dir.path().join("news.json"), cap)
}

#[test]
fn article_id_is_stable_across_refetches() {
    let a = article_id("Kenya Launches Digital Payment System", "https://example.com/1");
    let b = article_id("  kenya  launches DIGITAL payment system ", "https://example.com/1");
    assert_eq!(a, b);

    // Different canonical URL means a different story identity.
    let c = article_id("Kenya Launches Digital Payment System", "https://example.com/2");
    assert_ne!(a, c);
    assert_eq!(a.len(), 16);
}

#[test]
fn slug_never_fails() {
    let fallback = slugify(None, None);
    assert!(!fallback.is_empty());
    assert!(fallback.starts_with("untitled-article-"));

    let slug = slugify(Some("A!!B  C"), Some("id1234567"));
    assert_eq!(slug, "ab-c-id123456");
    let suffix = slug.rsplit('-').next().unwrap();
    assert_eq!(suffix.len(), 8);
    assert!(!slug.contains(' ') && !slug.contains('!'));
}

#[test]
fn slug_truncates_long_titles() {
    let title = "word ".repeat(40);
    let slug = slugify(Some(&title), Some("abcdef0123456789"));
    assert!(slug.ends_with("-abcdef01"));
    // 60-char base plus hyphen plus 8-char suffix.
    assert!(slug.len() <= 69);
}

#[test]
fn upsert_then_lookup_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    let a = article(1, "Kenya");
    store.upsert(a.clone()).unwrap();

    let by_id = store.get_by_id(&a.id).unwrap().unwrap();
    assert_eq!(by_id.slug, a.slug);
    assert_eq!(by_id.views, 0);

    assert!(store.get_by_id("missing-id").unwrap().is_none());
    assert!(store.get_by_slug("missing-slug").unwrap().is_none());
}

#[test]
fn slug_lookup_counts_views_monotonically() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    let a = article(1, "Kenya");
    store.upsert(a.clone()).unwrap();

    assert_eq!(store.get_by_slug(&a.slug).unwrap().unwrap().views, 1);
    assert_eq!(store.get_by_slug(&a.slug).unwrap().unwrap().views, 2);
    // Views survive a content update.
    store.upsert(article(1, "Kenya")).unwrap();
    assert_eq!(store.get_by_id(&a.id).unwrap().unwrap().views, 2);
}

#[test]
fn update_preserves_identity_and_replaces_content() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    let original = article(1, "Kenya");
    store.upsert(original.clone()).unwrap();

    let mut updated = article(1, "Kenya");
    updated.rewritten_body = "Fresh body after a later cycle merged new content.".to_string();
    updated.slug = "this-slug-must-not-win".to_string();
    store.upsert(updated).unwrap();

    let stored = store.get_by_id(&original.id).unwrap().unwrap();
    assert_eq!(stored.slug, original.slug, "slug regenerated on update");
    assert_eq!(stored.created_at, original.created_at);
    assert!(stored.rewritten_body.starts_with("Fresh body"));

    let page = store.query(&QueryFilters::default(), 1, 50).unwrap();
    assert_eq!(page.total, 1, "update must not duplicate the article");
}

#[test]
fn retention_evicts_oldest_inserted_first() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 3);

    for n in 1..=4 {
        store.upsert(article(n, "Kenya")).unwrap();
    }

    let page = store.query(&QueryFilters::default(), 1, 50).unwrap();
    assert_eq!(page.total, 3);
    let first = article(1, "Kenya");
    assert!(store.get_by_id(&first.id).unwrap().is_none(), "oldest survived");
}

#[test]
fn query_filters_and_paginates() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    let mut batch = Vec::new();
    for n in 1..=3 {
        batch.push(article(n, "Kenya"));
    }
    batch.push(article(4, "Nigeria"));
    batch.push(article(5, "Ghana"));
    store.upsert_cycle(batch).unwrap();

    let filters = QueryFilters {
        country: Some("Kenya".to_string()),
        ..Default::default()
    };
    let page = store.query(&filters, 1, 2).unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);

    let page2 = store.query(&filters, 2, 2).unwrap();
    assert_eq!(page2.items.len(), 1);

    // Country match is substring and case-insensitive.
    let loose = QueryFilters {
        country: Some("ken".to_string()),
        ..Default::default()
    };
    assert_eq!(store.query(&loose, 1, 50).unwrap().total, 3);

    // Page numbers clamp to one instead of failing.
    assert_eq!(store.query(&filters, 0, 2).unwrap().page, 1);

    // No match is an empty page, not an error.
    let none = QueryFilters {
        country: Some("Morocco".to_string()),
        ..Default::default()
    };
    let empty = store.query(&none, 1, 10).unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.items.is_empty());
}

#[test]
fn free_text_search_spans_title_summary_body() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    let mut a = article(1, "Kenya");
    a.rewritten_body = "The harbor modernization includes dredging work.".to_string();
    let b = article(2, "Kenya");
    store.upsert_cycle(vec![a, b]).unwrap();

    let filters = QueryFilters {
        search: Some("DREDGING".to_string()),
        ..Default::default()
    };
    let page = store.query(&filters, 1, 10).unwrap();
    assert_eq!(page.total, 1);
}

#[test]
fn newest_published_sorts_first() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    // Higher n gets a more recent published_at in the fixture helper.
    store.upsert_cycle(vec![article(1, "Kenya"), article(3, "Kenya"), article(2, "Kenya")]).unwrap();

    let page = store.query(&QueryFilters::default(), 1, 10).unwrap();
    let ranks: Vec<usize> = page.items.iter().map(|a| a.merge_rank).collect();
    assert_eq!(ranks, vec![3, 2, 1]);
}

#[test]
fn stats_aggregate_by_country_and_category() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);

    let mut a = article(1, "Kenya");
    a.category = "business".to_string();
    a.image_url = Some("https://example.com/a.jpg".to_string());
    let b = article(2, "Kenya");
    let c = article(3, "Nigeria");
    store.upsert_cycle(vec![a.clone(), b, c]).unwrap();
    store.get_by_slug(&a.slug).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_country.get("Kenya"), Some(&2));
    assert_eq!(stats.by_country.get("Nigeria"), Some(&1));
    assert_eq!(stats.by_category.get("business"), Some(&1));
    assert_eq!(stats.by_category.get("general"), Some(&2));
    assert_eq!(stats.total_views, 1);
    assert!((stats.average_views - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.articles_with_images, 1);
    assert_eq!(stats.image_percentage, 33);
    assert!(stats.last_updated.is_some());
}

#[test]
fn persisted_document_is_clean_json_with_no_temp_leftover() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 100);
    store.upsert(article(1, "Kenya")).unwrap();

    let raw = std::fs::read_to_string(dir.path().join("news.json")).unwrap();
    let doc: NewsDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc.count, 1);
    assert_eq!(doc.articles.len(), 1);
    assert!(doc.last_updated.is_some());

    assert!(!dir.path().join("news.json.tmp").exists());
}
