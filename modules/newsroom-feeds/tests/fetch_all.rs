use std::time::Duration;

use newsroom_common::Source;
use newsroom_feeds::FeedFetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <item>
      <title>First story</title>
      <link>https://news.example/first</link>
      <guid>first-guid</guid>
      <description>&lt;p&gt;lead text&lt;/p&gt;</description>
    </item>
    <item>
      <title>Second story</title>
      <link>https://news.example/second</link>
      <guid>second-guid</guid>
      <description>older item</description>
    </item>
  </channel>
</rss>"#;

#[tokio::test]
async fn fetches_and_normalizes_feed_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_BODY))
        .mount(&server)
        .await;

    let source = Source {
        name: "Example".to_string(),
        feed_url: format!("{}/feed.xml", server.uri()),
        category: "general".to_string(),
        credibility: 8,
    };

    let fetcher = FeedFetcher::new(4, Duration::from_secs(5));
    let articles = fetcher.fetch_all(&[source], |_| false).await;

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "First story");
    assert_eq!(articles[0].link, "https://news.example/first");
    assert_eq!(articles[0].source_name, "Example");
}

#[tokio::test]
async fn stops_at_first_known_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_BODY))
        .mount(&server)
        .await;

    let source = Source {
        name: "Example".to_string(),
        feed_url: format!("{}/feed.xml", server.uri()),
        category: "general".to_string(),
        credibility: 8,
    };

    let fetcher = FeedFetcher::new(4, Duration::from_secs(5));
    let articles = fetcher
        .fetch_all(&[source], |link| link == "https://news.example/first")
        .await;

    assert!(articles.is_empty());
}

#[tokio::test]
async fn unreachable_source_yields_no_articles_and_does_not_panic() {
    let source = Source {
        name: "Broken".to_string(),
        feed_url: "http://127.0.0.1:1/feed.xml".to_string(),
        category: "general".to_string(),
        credibility: 5,
    };

    let fetcher = FeedFetcher::new(2, Duration::from_millis(200));
    let articles = fetcher.fetch_all(&[source], |_| false).await;

    assert!(articles.is_empty());
}
