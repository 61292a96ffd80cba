use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::models::ImageCandidate;
use crate::urls::to_absolute;

// ── Constants ────────────────────────────────────────────────────────────────

/// Substrings marking tracking pixels; checked against both the raw and the
/// normalized src.
const TRACKING_MARKERS: &[&str] = &["data:", "1x1", "pixel"];

// ── Lazy static regexes ──────────────────────────────────────────────────────
//
// Pattern-matching over raw text on purpose: candidate pages are arbitrary
// third-party markup, frequently malformed, and a strict parser would reject
// exactly the pages we most need to tolerate.

static IMG_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());

static SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\ssrc\s*=\s*["']([^"']*)["']"#).unwrap());

static ALT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\salt\s*=\s*["']([^"']*)["']"#).unwrap());

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\stitle\s*=\s*["']([^"']*)["']"#).unwrap());

static WIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\swidth\s*=\s*["']?(\d+)"#).unwrap());

static HEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\sheight\s*=\s*["']?(\d+)"#).unwrap());

static SRCSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\ssrcset\s*=\s*["']([^"']+)["']"#).unwrap());

// ── Public API ───────────────────────────────────────────────────────────────

/// Pull image candidates out of raw markup.
///
/// Candidates come back unscored, in document order: `<img>` tag matches
/// first, then srcset-derived extras. Duplicates between the two groups are
/// left in; the pipeline deduplicates after scoring so the highest-scored
/// occurrence wins.
pub fn extract_images(html: &str, page_url: &str) -> Vec<ImageCandidate> {
    let base = match Url::parse(page_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let mut candidates = Vec::new();

    for tag_match in IMG_TAG_RE.find_iter(html) {
        let tag = tag_match.as_str();
        let raw_src = match attr(&SRC_RE, tag) {
            Some(s) => s,
            None => continue,
        };
        let src = match to_absolute(&base, &raw_src) {
            Some(s) => s,
            None => continue,
        };
        if is_tracking_pixel(&raw_src) || is_tracking_pixel(&src) {
            continue;
        }

        let width = attr(&WIDTH_RE, tag).and_then(|v| v.parse::<u32>().ok());
        let height = attr(&HEIGHT_RE, tag).and_then(|v| v.parse::<u32>().ok());
        let aspect_ratio = match (width, height) {
            (Some(w), Some(h)) if h > 0 => Some(format!("{:.2}", w as f64 / h as f64)),
            _ => None,
        };

        candidates.push(ImageCandidate {
            source_url: src,
            alt_text: attr(&ALT_RE, tag).unwrap_or_default(),
            title_text: attr(&TITLE_RE, tag).unwrap_or_default(),
            width,
            height,
            aspect_ratio,
            is_likely_press: false,
            relevance_score: 0,
        });
    }

    // srcset attributes anywhere in the markup (picture/source tags, lazy
    // loaders). Bare candidates, deduplicated among themselves only.
    let mut seen_srcset: Vec<String> = Vec::new();
    for cap in SRCSET_RE.captures_iter(html) {
        for entry in cap[1].split(',') {
            let url_part = match entry.split_whitespace().next() {
                Some(u) => u,
                None => continue,
            };
            let src = match to_absolute(&base, url_part) {
                Some(s) => s,
                None => continue,
            };
            if is_tracking_pixel(url_part) || is_tracking_pixel(&src) {
                continue;
            }
            if seen_srcset.iter().any(|s| s == &src) {
                continue;
            }
            seen_srcset.push(src.clone());
            candidates.push(ImageCandidate::bare(src));
        }
    }

    candidates
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn attr(re: &Regex, tag: &str) -> Option<String> {
    re.captures(tag).map(|cap| cap[1].trim().to_string())
}

fn is_tracking_pixel(url: &str) -> bool {
    let lower = url.to_lowercase();
    TRACKING_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.se/press";

    #[test]
    fn extracts_attributes_and_aspect_ratio() {
        let html = r#"<img src="/photo-team.jpg" width="800" height="600" alt="our team" title="Team photo">"#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.source_url, "https://example.se/photo-team.jpg");
        assert_eq!(c.alt_text, "our team");
        assert_eq!(c.title_text, "Team photo");
        assert_eq!(c.width, Some(800));
        assert_eq!(c.height, Some(600));
        assert_eq!(c.aspect_ratio.as_deref(), Some("1.33"));
        assert_eq!(c.relevance_score, 0);
        assert!(!c.is_likely_press);
    }

    #[test]
    fn tolerates_malformed_markup_and_attribute_order() {
        let html = r#"
            <div><p>unclosed
            <IMG HEIGHT='300' ALT="ceo portrait" SRC='/a.png' WIDTH='400'>
            <img src="/b.jpg"
        "#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.source_url, "https://example.se/a.png");
        assert_eq!(c.alt_text, "ceo portrait");
        assert_eq!(c.width, Some(400));
        assert_eq!(c.height, Some(300));
    }

    #[test]
    fn tag_without_src_is_discarded() {
        let html = r#"<img alt="decorative" width="500"><img src="/ok.jpg">"#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_url, "https://example.se/ok.jpg");
    }

    #[test]
    fn data_uris_never_surface() {
        let html = r#"
            <img src="data:image/png;base64,iVBORw0KGgo=" alt="inline">
            <img srcset="data:image/gif;base64 1x, /real.jpg 2x">
        "#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_url, "https://example.se/real.jpg");
    }

    #[test]
    fn tracking_pixels_are_discarded() {
        let html = r#"
            <img src="/track/1x1.gif">
            <img src="/assets/pixel.png">
            <img src="/photo.jpg">
        "#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_url, "https://example.se/photo.jpg");
    }

    #[test]
    fn unparsable_dimensions_are_left_unset() {
        let html = r#"<img src="/c.jpg" width="100%" height="auto">"#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 1);
        // "100%" still yields the leading digits; "auto" does not parse.
        assert_eq!(out[0].width, Some(100));
        assert_eq!(out[0].height, None);
        assert_eq!(out[0].aspect_ratio, None);
    }

    #[test]
    fn srcset_entries_become_bare_candidates() {
        let html = r#"
            <img src="/main.jpg" alt="main">
            <source srcset="/small.jpg 480w, /large.jpg 1200w, //cdn.example.se/hero.jpg 2x">
        "#;
        let out = extract_images(html, PAGE);
        let urls: Vec<&str> = out.iter().map(|c| c.source_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.se/main.jpg",
                "https://example.se/small.jpg",
                "https://example.se/large.jpg",
                "https://cdn.example.se/hero.jpg",
            ]
        );
        // srcset extras carry no metadata
        assert_eq!(out[1].alt_text, "");
        assert_eq!(out[1].width, None);
    }

    #[test]
    fn srcset_extras_do_not_duplicate_each_other() {
        let html = r#"
            <source srcset="/a.jpg 1x, /a.jpg 2x">
            <source srcset="/a.jpg 480w, /b.jpg 800w">
        "#;
        let out = extract_images(html, PAGE);
        let urls: Vec<&str> = out.iter().map(|c| c.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.se/a.jpg", "https://example.se/b.jpg"]);
    }

    #[test]
    fn duplicates_across_tag_and_srcset_are_kept() {
        let html = r#"<img src="/a.jpg" srcset="/a.jpg 1x">"#;
        let out = extract_images(html, PAGE);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source_url, out[1].source_url);
    }

    #[test]
    fn data_src_is_not_mistaken_for_src() {
        let html = r#"<img data-src="/lazy.jpg" alt="lazy">"#;
        let out = extract_images(html, PAGE);
        assert!(out.is_empty());
    }
}
