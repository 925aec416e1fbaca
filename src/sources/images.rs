//! Image-location normalization. Sources hide images in wildly different
//! places: enclosure/media metadata, inline markup in the description, or
//! only on the article page itself as an og:image tag. Everything funnels
//! into one validated absolute http(s) URL or nothing.

use crate::fetcher::Fetcher;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]*?src=["']?([^"'\s>]+)"#).expect("static pattern"));

static OG_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*?(?:property|name)=["']og:image["'][^>]*?content=["']([^"']+)["']"#,
    )
    .expect("static pattern")
});

static OG_IMAGE_REVERSED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]*?content=["']([^"']+)["'][^>]*?(?:property|name)=["']og:image["']"#,
    )
    .expect("static pattern")
});

/// Accept only absolute http(s) URLs; everything else (relative paths,
/// data: URIs, ftp, garbage) is rejected.
pub fn validated_image_url(raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace("&amp;", "&");
    let parsed = Url::parse(&cleaned).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(cleaned),
        _ => None,
    }
}

/// Pull the first usable image URL out of feed media metadata
/// (media:content, enclosures, thumbnails).
pub fn image_from_media(media: &[feed_rs::model::MediaObject]) -> Option<String> {
    for object in media {
        for content in &object.content {
            if let Some(url) = &content.url {
                if let Some(valid) = validated_image_url(url.as_str()) {
                    return Some(valid);
                }
            }
        }
        for thumbnail in &object.thumbnails {
            if let Some(valid) = validated_image_url(&thumbnail.image.uri) {
                return Some(valid);
            }
        }
    }
    None
}

/// Pull the first inline `<img src=...>` out of an HTML fragment.
pub fn image_from_html(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| validated_image_url(&caps[1]))
}

/// Last resort: fetch the article page itself and look for an og:image
/// meta tag. Single attempt, no retries; a miss just means no image.
pub async fn page_preview_image(fetcher: &Fetcher, article_url: &str) -> Option<String> {
    let page = match fetcher.fetch_page(article_url).await {
        Ok(page) => page,
        Err(e) => {
            debug!("Preview-image fetch failed for {}: {}", article_url, e);
            return None;
        }
    };

    OG_IMAGE
        .captures(&page)
        .or_else(|| OG_IMAGE_REVERSED.captures(&page))
        .and_then(|caps| validated_image_url(&caps[1]))
}
