use chrono::{Duration, TimeZone, Utc};
use news_aggregator::merge::{merge, quality_score};
use news_aggregator::similarity::{same_story, similarity};
use news_aggregator::types::{ArticleCandidate, Provider};

fn candidate(title: &str, description: &str, url: &str) -> ArticleCandidate {
    ArticleCandidate {
        title: title.to_string(),
        description: description.to_string(),
        body: None,
        image_url: None,
        source_name: "Test Wire".to_string(),
        source_url: url.to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
        country: "Kenya".to_string(),
        category: "general".to_string(),
        provider: Provider::Rss,
    }
}

#[test]
fn jaccard_similarity_basics() {
    assert_eq!(similarity("", "anything at all"), 0.0);
    assert_eq!(similarity("one two three", ""), 0.0);

    // Identical word sets regardless of order.
    let s = similarity(
        "Kenya Launches Digital Payment System",
        "digital payment system launches kenya",
    );
    assert!((s - 1.0).abs() < f64::EPSILON);

    // Stop words and short tokens never count.
    let s = similarity("the cabinet is in session", "cabinet session");
    assert!((s - 1.0).abs() < f64::EPSILON);
}

#[test]
fn identical_canonical_url_is_unconditional_duplicate() {
    let a = candidate(
        "Drought Relief Program Expands",
        "Food aid reaches northern counties",
        "https://example.com/story/123",
    );
    let b = candidate(
        "Completely Unrelated Headline About Football",
        "Match report from the weekend fixtures",
        "https://example.com/story/123",
    );

    assert!(same_story(&a, &b));
    assert_eq!(merge(vec![a, b]).len(), 1);
}

#[test]
fn high_title_overlap_merges_regardless_of_description() {
    // Title sets: {kenya, launches, digital, payment, system} vs the same
    // plus {new}: 5/6 = 0.83, above the high threshold.
    let a = candidate(
        "Kenya Launches Digital Payment System",
        "Mobile money transfers expand rapidly nationwide",
        "https://feed-a.example.com/kenya-payments",
    );
    let b = candidate(
        "Kenya Launches New Digital Payment System",
        "Banking sector reforms continue despite setbacks",
        "https://feed-b.example.com/payments-platform",
    );

    assert!(similarity(&a.title, &b.title) >= 0.8);
    assert!(same_story(&a, &b));
    assert_eq!(merge(vec![a, b]).len(), 1);
}

#[test]
fn medium_title_overlap_needs_description_agreement() {
    // Title sets share 4 of 6 distinct words: 4/6 = 0.67, between the
    // medium and high thresholds.
    let title_a = "Kenya Launches Digital Payment System";
    let title_b = "Kenya Launches Digital Payment Platform";
    let t = similarity(title_a, title_b);
    assert!(t >= 0.6 && t < 0.8);

    // Similar descriptions: 5 shared of 7 distinct = 0.71.
    let a = candidate(
        title_a,
        "Mobile money transfers expand rapidly nationwide",
        "https://feed-a.example.com/1",
    );
    let b = candidate(
        title_b,
        "Mobile money transfers expand rapidly countrywide",
        "https://feed-b.example.com/2",
    );
    assert!(similarity(&a.description, &b.description) >= 0.6);
    assert!(same_story(&a, &b));
    assert_eq!(merge(vec![a, b]).len(), 1);

    // Same titles, unrelated descriptions: no merge.
    let c = candidate(
        title_a,
        "Mobile money transfers expand rapidly nationwide",
        "https://feed-a.example.com/1",
    );
    let d = candidate(
        title_b,
        "Banking sector reforms continue slowly",
        "https://feed-b.example.com/2",
    );
    assert!(similarity(&c.description, &d.description) < 0.6);
    assert!(!same_story(&c, &d));
    assert_eq!(merge(vec![c, d]).len(), 2);
}

#[test]
fn richer_candidate_wins_its_group() {
    let thin = candidate(
        "Kenya Launches Digital Payment System",
        "Mobile money transfers expand rapidly nationwide",
        "https://feed-a.example.com/thin",
    );
    let mut rich = candidate(
        "Kenya Launches New Digital Payment System",
        "Mobile money transfers expand rapidly nationwide with full interoperability",
        "https://feed-b.example.com/rich",
    );
    rich.body = Some(
        "The central bank confirmed the rollout covers all licensed operators. \
         Merchants gain settlement within minutes instead of days."
            .to_string(),
    );
    rich.image_url = Some("https://feed-b.example.com/img.jpg".to_string());

    assert!(quality_score(&rich) > quality_score(&thin));

    let merged = merge(vec![thin, rich]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].source_url, "https://feed-b.example.com/rich");
}

#[test]
fn equal_score_keeps_first_seen() {
    let first = candidate(
        "Kenya Launches Digital Payment System",
        "Mobile money transfers expand rapidly nationwide",
        "https://feed-a.example.com/first",
    );
    let second = candidate(
        "Kenya Launches Digital Payment System B",
        "Mobile money transfers expand rapidly nationwide",
        "https://feed-b.example.com/second",
    );

    let merged = merge(vec![first, second]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].source_url, "https://feed-a.example.com/first");
}

#[test]
fn output_sorted_newest_first() {
    let mut old = candidate(
        "Port Expansion Project Breaks Ground",
        "Construction begins on the second container terminal",
        "https://example.com/port",
    );
    old.published_at = Utc::now() - Duration::hours(10);
    let mut recent = candidate(
        "Election Commission Publishes Final Register",
        "Voter roll audit complete ahead of the deadline",
        "https://example.com/register",
    );
    recent.published_at = Utc::now() - Duration::hours(1);

    let merged = merge(vec![old, recent]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].source_url, "https://example.com/register");
    assert_eq!(merged[1].source_url, "https://example.com/port");
}

#[test]
fn exact_title_duplicates_collapse_without_pairwise_pass() {
    let a = candidate(
        "Fuel Subsidy Review Announced",
        "Treasury outlines a phased subsidy reduction",
        "https://example.com/a",
    );
    let b = candidate(
        "fuel subsidy review announced",
        "Treasury outlines a phased subsidy reduction",
        "https://example.com/b",
    );

    assert_eq!(merge(vec![a, b]).len(), 1);
}
