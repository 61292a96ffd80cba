use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ImageCandidate;

// ── Keyword sets ─────────────────────────────────────────────────────────────

/// +2 per matching keyword. Substring matches over url + alt + title +
/// page url, so compound words like "pressbilder" count too. Swedish
/// equivalents included since a large share of probed sites are Swedish.
const RELEVANCE_KEYWORDS: &[&str] = &[
    "press",
    "media",
    "portrait",
    "headshot",
    "team",
    "ceo",
    "founder",
    "board",
    "leadership",
    "profile",
    "about",
    "staff",
    "people",
    "styrelse",
    "ledning",
    "grundare",
    "medarbetare",
];

/// -5 per matching keyword. Chrome, ads, social badges and shop plumbing.
const EXCLUSION_KEYWORDS: &[&str] = &[
    "logo",
    "icon",
    "button",
    "banner",
    "advert",
    "sprite",
    "pixel",
    "1x1",
    "tracking",
    "facebook",
    "twitter",
    "instagram",
    "linkedin",
    "youtube",
    "cart",
    "checkout",
    "payment",
];

const PRESS_PAGE_MARKERS: &[&str] = &["/press", "/media", "/newsroom"];

static PHOTO_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png)(\?.*)?$").unwrap());

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Heuristic relevance score for one candidate on one page.
///
/// Pure function of its inputs; the pipeline applies the result exactly once
/// per candidate.
pub fn relevance_score(candidate: &ImageCandidate, page_url: &str) -> i32 {
    let mut score = 0i32;

    if let (Some(w), Some(h)) = (candidate.width, candidate.height) {
        let area = u64::from(w) * u64::from(h);
        if area > 500_000 {
            score += 3;
        } else if area > 200_000 {
            score += 2;
        } else if area > 100_000 {
            score += 1;
        }
    }

    let blob = format!(
        "{} {} {} {}",
        candidate.source_url, candidate.alt_text, candidate.title_text, page_url
    )
    .to_lowercase();

    for keyword in RELEVANCE_KEYWORDS {
        if blob.contains(keyword) {
            score += 2;
        }
    }
    for keyword in EXCLUSION_KEYWORDS {
        if blob.contains(keyword) {
            score -= 5;
        }
    }

    let page_lower = page_url.to_lowercase();
    if PRESS_PAGE_MARKERS.iter().any(|m| page_lower.contains(m)) {
        score += 3;
    }

    if PHOTO_EXT_RE.is_match(&candidate.source_url) {
        score += 1;
    }

    if matches!(candidate.width, Some(w) if w < 200) {
        score -= 3;
    }
    if matches!(candidate.height, Some(h) if h < 150) {
        score -= 3;
    }

    score
}
