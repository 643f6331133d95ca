use scraper::{Html, Selector};

/// Minimum article body length for the direct-fetch tier to be considered
/// successful; shorter extractions fall through to the reader-API tier.
pub const MIN_ARTICLE_CHARS: usize = 200;

/// Container selectors tried in order of specificity.
const ARTICLE_SELECTORS: &[&str] = &[
    "article",
    "[role=main]",
    "main",
    ".article-body",
    ".article-content",
    ".post-content",
    ".entry-content",
];

pub struct ExtractedPage {
    pub title: Option<String>,
    pub text: String,
    pub og_image: Option<String>,
}

/// Parse an HTML document into a title, article body text, and an image
/// candidate. Scripts/styles/nav/aside are dropped before any text is
/// collected.
pub fn extract(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let og_image = extract_og_image(&document);
    let text = extract_body_text(&document);

    ExtractedPage {
        title,
        text,
        og_image,
    }
}

fn extract_title(document: &Html) -> Option<String> {
    if let Some(title) = meta_content(document, "meta[property='og:title']") {
        return Some(title);
    }
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.text().next())
        .map(|t| t.trim().to_string())
}

fn extract_og_image(document: &Html) -> Option<String> {
    meta_content(document, "meta[property='og:image']")
        .or_else(|| meta_content(document, "meta[name='twitter:image']"))
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Prefer an article-like container; fall back to every `<p>` on the page
/// if no such container is found or it yields too little text.
fn extract_body_text(document: &Html) -> String {
    for selector_str in ARTICLE_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(container) = document.select(&selector).next() {
                let text = join_paragraphs(container);
                if text.len() >= MIN_ARTICLE_CHARS {
                    return text;
                }
            }
        }
    }

    join_paragraphs(document.root_element())
}

fn join_paragraphs(root: scraper::ElementRef) -> String {
    let p_selector = Selector::parse("p").expect("valid selector");
    root.select(&p_selector)
        .map(|p| p.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_container_over_whole_page() {
        let html = r#"
            <html><body>
                <nav><p>Subscribe now for more junk links and ads!</p></nav>
                <article>
                    <p>This is the real article body text, long enough to pass the minimum character threshold for extraction to prefer it over the navigation junk above.</p>
                </article>
            </body></html>
        "#;
        let extracted = extract(html);
        assert!(extracted.text.contains("real article body"));
        assert!(!extracted.text.contains("Subscribe"));
    }

    #[test]
    fn extracts_og_image() {
        let html = r#"<html><head><meta property="og:image" content="https://cdn.example/a.jpg"></head><body></body></html>"#;
        let extracted = extract(html);
        assert_eq!(extracted.og_image.as_deref(), Some("https://cdn.example/a.jpg"));
    }
}
