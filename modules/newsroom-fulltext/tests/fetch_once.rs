use std::time::Duration;

use newsroom_fulltext::FullTextFetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn long_paragraph(word: &str, count: usize) -> String {
    std::iter::repeat(word).take(count).collect::<Vec<_>>().join(" ")
}

#[tokio::test]
async fn direct_fetch_succeeds_when_article_is_long_enough() {
    let server = MockServer::start().await;
    let body = format!(
        "<html><head><title>Direct Article</title></head><body><article><p>{}</p></article></body></html>",
        long_paragraph("word", 100)
    );
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let fetcher = FullTextFetcher::new(Duration::from_secs(5), 2, None, None);
    let result = fetcher
        .fetch_once(&format!("{}/article", server.uri()))
        .await
        .expect("first fetch of a URL returns Some")
        .expect("direct fetch should succeed");

    assert!(result.text.len() >= 200);
}

#[tokio::test]
async fn falls_back_to_reader_api_when_direct_fetch_is_too_short() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>too short</p></body></html>"))
        .mount(&site)
        .await;

    let reader = MockServer::start().await;
    let reader_text = long_paragraph("reader", 100);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(reader_text.clone()))
        .mount(&reader)
        .await;

    let fetcher = FullTextFetcher::new(Duration::from_secs(5), 2, Some(reader.uri()), None);
    let result = fetcher
        .fetch_once(&format!("{}/thin", site.uri()))
        .await
        .expect("first fetch of a URL returns Some")
        .expect("reader fallback should succeed");

    assert_eq!(result.text, reader_text);
}

#[tokio::test]
async fn second_fetch_of_same_url_is_a_no_op() {
    let server = MockServer::start().await;
    let body = format!(
        "<html><body><article><p>{}</p></article></body></html>",
        long_paragraph("word", 100)
    );
    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let fetcher = FullTextFetcher::new(Duration::from_secs(5), 2, None, None);
    let url = format!("{}/once", server.uri());

    assert!(fetcher.fetch_once(&url).await.is_some());
    assert!(fetcher.fetch_once(&url).await.is_none());
}
