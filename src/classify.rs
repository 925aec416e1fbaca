//! Heuristic country/category classification for sources that supply no
//! structured metadata. Tables are ordered: the first matching entry wins,
//! so more specific labels must come before broader ones.

pub const DEFAULT_COUNTRY: &str = "Africa";
pub const DEFAULT_CATEGORY: &str = "general";

/// (label, keywords) pairs evaluated in priority order against
/// lowercased title+description text.
const COUNTRY_TABLE: &[(&str, &[&str])] = &[
    ("Nigeria", &["nigeria", "lagos", "abuja", "nigerian"]),
    ("Kenya", &["kenya", "nairobi", "mombasa", "kenyan"]),
    (
        "South Africa",
        &["south africa", "cape town", "johannesburg", "durban", "south african"],
    ),
    ("Ghana", &["ghana", "accra", "ghanaian"]),
    ("Egypt", &["egypt", "cairo", "egyptian"]),
    ("Morocco", &["morocco", "casablanca", "rabat", "moroccan"]),
    ("Ethiopia", &["ethiopia", "addis ababa", "ethiopian"]),
    ("Tanzania", &["tanzania", "dar es salaam", "tanzanian"]),
    ("Uganda", &["uganda", "kampala", "ugandan"]),
    ("Rwanda", &["rwanda", "kigali", "rwandan"]),
];

const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    (
        "business",
        &[
            "business", "economy", "economic", "market", "finance", "financial", "trade",
            "investment", "bank", "company",
        ],
    ),
    (
        "technology",
        &[
            "technology", "tech", "digital", "internet", "software", "app", "startup",
            "innovation", "artificial intelligence",
        ],
    ),
    (
        "sports",
        &[
            "sport", "football", "soccer", "basketball", "cricket", "rugby", "athletics",
            "olympic", "champion", "tournament",
        ],
    ),
    (
        "health",
        &[
            "health", "medical", "hospital", "doctor", "disease", "medicine", "vaccine",
            "pandemic", "healthcare",
        ],
    ),
    (
        "politics",
        &[
            "politics", "political", "government", "president", "minister", "election",
            "parliament", "policy", "vote", "democracy",
        ],
    ),
    (
        "entertainment",
        &[
            "entertainment", "music", "movie", "film", "celebrity", "artist", "concert",
            "festival", "culture", "art",
        ],
    ),
];

fn first_match(table: &[(&'static str, &[&str])], text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    for &(label, keywords) in table {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(label);
        }
    }
    None
}

/// Detect the most likely country from free text, defaulting to the
/// continent-wide label.
pub fn detect_country(text: &str) -> String {
    first_match(COUNTRY_TABLE, text)
        .unwrap_or(DEFAULT_COUNTRY)
        .to_string()
}

/// Detect the article category from free text.
pub fn detect_category(text: &str) -> String {
    first_match(CATEGORY_TABLE, text)
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

/// Country hint from a feed URL path, e.g. `/kenya/headlines.rdf`.
/// Takes precedence over text detection for per-country feeds.
pub fn country_from_feed_url(feed_url: &str) -> Option<&'static str> {
    let lower = feed_url.to_lowercase();
    for &(label, _) in COUNTRY_TABLE {
        let path_key = label.to_lowercase().replace(' ', "");
        if lower.contains(&format!("/{path_key}/")) {
            return Some(label);
        }
    }
    None
}

/// Category hint from a per-topic feed URL path, e.g. `/business/headlines.rdf`.
pub fn category_from_feed_url(feed_url: &str) -> Option<&'static str> {
    let lower = feed_url.to_lowercase();
    for &(label, _) in CATEGORY_TABLE {
        if lower.contains(&format!("/{label}/")) {
            return Some(label);
        }
    }
    // AllAfrica path segments that abbreviate the label.
    if lower.contains("/sport/") {
        return Some("sports");
    }
    if lower.contains("/tech/") {
        return Some("technology");
    }
    None
}
