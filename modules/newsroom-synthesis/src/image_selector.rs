/// Host prefixes dropped outright regardless of score — tracking pixels and
/// ad-network thumbnails, never legitimate editorial images.
const BLOCKED_HOST_PREFIXES: &[&str] = &[
    "ads.",
    "adservice.",
    "doubleclick.",
    "googlesyndication.",
    "pixel.",
    "track.",
    "analytics.",
];

const BLOCKED_EXTENSIONS: &[&str] = &["gif", "svg", "ico", "bmp"];

const MIN_WIDTH: u32 = 400;
const MIN_HEIGHT: u32 = 300;
const MIN_ASPECT: f64 = 1.0 / 3.0;
const MAX_ASPECT: f64 = 3.0;
const TARGET_ASPECT: f64 = 16.0 / 9.0;

#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub url: String,
    pub source_name: String,
    pub credibility: u8,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// The source article's admission score, normalized to `[0, 1]` so this
    /// component stays agnostic to which scoring contract is configured.
    pub normalized_article_score: f64,
}

/// Image Selector (C7). Filters out tracking pixels, unusable formats and
/// ill-shaped images, then scores the remainder and picks the best.
pub struct ImageSelector;

impl ImageSelector {
    pub fn select(&self, candidates: &[ImageCandidate]) -> Option<ImageCandidate> {
        let mut scored: Vec<(f64, &ImageCandidate)> = candidates
            .iter()
            .filter(|c| passes_filters(c))
            .map(|c| (score(c), c))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.source_name.cmp(&b.1.source_name))
        });

        scored.into_iter().next().map(|(_, c)| c.clone())
    }
}

fn passes_filters(candidate: &ImageCandidate) -> bool {
    if let Some(host) = host_of(&candidate.url) {
        if BLOCKED_HOST_PREFIXES.iter().any(|p| host.starts_with(p)) {
            return false;
        }
    }

    if let Some(ext) = extension_of(&candidate.url) {
        if BLOCKED_EXTENSIONS.contains(&ext.as_str()) {
            return false;
        }
    }

    if let (Some(w), Some(h)) = (candidate.width, candidate.height) {
        if w < MIN_WIDTH || h < MIN_HEIGHT {
            return false;
        }
        let aspect = w as f64 / h as f64;
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
            return false;
        }
    }

    true
}

fn score(candidate: &ImageCandidate) -> f64 {
    let reputation = if candidate.credibility >= 8 {
        30.0
    } else if candidate.credibility >= 6 {
        15.0
    } else {
        0.0
    };

    let article_score = candidate.normalized_article_score.clamp(0.0, 1.0) * 20.0;

    let width_tier = match candidate.width {
        Some(w) if w >= 1200 => 30.0,
        Some(w) if w >= 800 => 20.0,
        Some(w) if w >= 400 => 10.0,
        _ => 0.0,
    };

    let aspect_score = match (candidate.width, candidate.height) {
        (Some(w), Some(h)) if h > 0 => {
            let aspect = w as f64 / h as f64;
            let closeness = 1.0 - ((aspect - TARGET_ASPECT).abs() / TARGET_ASPECT).min(1.0);
            closeness * 20.0
        }
        _ => 0.0,
    };

    let format_bonus = match extension_of(&candidate.url).as_deref() {
        Some("webp") | Some("jpg") | Some("jpeg") => 5.0,
        Some("png") => 3.0,
        _ => 0.0,
    };

    reputation + article_score + width_tier + aspect_score + format_bonus
}

fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

fn extension_of(url: &str) -> Option<String> {
    let path = url::Url::parse(url)
        .ok()
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| url.to_string());
    path.rsplit('.').next().map(|ext| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, credibility: u8, w: u32, h: u32, score: f64) -> ImageCandidate {
        ImageCandidate {
            url: url.to_string(),
            source_name: "Wire".to_string(),
            credibility,
            width: Some(w),
            height: Some(h),
            normalized_article_score: score,
        }
    }

    #[test]
    fn drops_gif_and_tiny_images() {
        let selector = ImageSelector;
        let candidates = vec![
            candidate("https://cdn.example/a.gif", 8, 1200, 800, 0.9),
            candidate("https://cdn.example/b.jpg", 8, 100, 100, 0.9),
        ];
        assert!(selector.select(&candidates).is_none());
    }

    #[test]
    fn picks_highest_scoring_candidate() {
        let selector = ImageSelector;
        let candidates = vec![
            candidate("https://cdn.example/a.jpg", 5, 500, 375, 0.3),
            candidate("https://cdn.example/b.webp", 9, 1600, 900, 0.9),
        ];
        let chosen = selector.select(&candidates).unwrap();
        assert_eq!(chosen.url, "https://cdn.example/b.webp");
    }

    #[test]
    fn drops_tracking_pixel_hosts() {
        let selector = ImageSelector;
        let candidates = vec![candidate("https://pixel.example.com/t.jpg", 9, 1200, 800, 0.9)];
        assert!(selector.select(&candidates).is_none());
    }
}
