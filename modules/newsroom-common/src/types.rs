use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable catalogue record (C1). The set of sources is fixed at process
/// start — there is no mutation path for this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub feed_url: String,
    pub category: String,
    pub credibility: u8,
}

/// Default credibility for a source not found in the catalogue lookup.
pub const DEFAULT_CREDIBILITY: u8 = 6;

/// A single fetched-but-not-yet-normalized feed entry (C2 output). Identity
/// is the normalized URL, with a fallback hash of link+title for feeds that
/// omit a stable link. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub source_name: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub guid: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
}

impl RawArticle {
    /// Fallback identity for feeds whose link is missing or unstable.
    pub fn fallback_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.link.as_bytes());
        hasher.update(self.title.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceArticleStatus {
    Pending,
    Clustered,
    Rejected,
}

impl std::fmt::Display for SourceArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceArticleStatus::Pending => write!(f, "pending"),
            SourceArticleStatus::Clustered => write!(f, "clustered"),
            SourceArticleStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for SourceArticleStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "clustered" => Ok(Self::Clustered),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown SourceArticleStatus: {other}")),
        }
    }
}

/// A persisted, normalized, (possibly) scored article row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceArticle {
    pub id: Uuid,
    pub normalized_url: String,
    pub original_url: String,
    pub source_name: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub score: Option<f64>,
    pub category: String,
    pub cluster_id: Option<Uuid>,
    pub status: SourceArticleStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    Active,
    Closed,
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterStatus::Active => write!(f, "active"),
            ClusterStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for ClusterStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown ClusterStatus: {other}")),
        }
    }
}

/// A set of source articles judged to describe the same real-world event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub title: String,
    pub keywords: Vec<String>,
    pub centroid_embedding: Vec<f32>,
    pub status: ClusterStatus,
    pub source_count: i64,
    pub first_seen_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub category: String,
}

impl Cluster {
    /// Whether the cluster should be closed under the 24h-idle / 48h-total
    /// lifecycle rules (C12), evaluated against `now`.
    pub fn is_aged_out(&self, now: DateTime<Utc>, idle_hours: i64, max_hours: i64) -> bool {
        let idle = now - self.last_updated_at > chrono::Duration::hours(idle_hours);
        let total = now - self.first_seen_at > chrono::Duration::hours(max_hours);
        idle || total
    }
}

/// One dated entry in a `PublishedArticle.timeline`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEvent {
    pub date: String,
    pub description: String,
}

/// One `label:value` entry in a `PublishedArticle.details`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

/// A verified numeric data series backing a `PublishedArticle.graph`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphComponent {
    pub title: String,
    pub source: String,
    pub points: Vec<GraphPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GraphPoint {
    pub label: String,
    pub value: f64,
}

/// A specific newsworthy location backing a `PublishedArticle.map`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MapAnchor {
    pub name: String,
    pub city: Option<String>,
    pub country: String,
    pub reason: String,
    pub lat: f64,
    pub lng: f64,
}

/// The synthesized, enriched, tagged article published for one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedArticle {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub title: String,
    pub summary_bullets: Vec<String>,
    pub content_standard: String,
    pub content_b2: String,
    pub image_url: Option<String>,
    pub timeline: Option<Vec<TimelineEvent>>,
    pub details: Option<Vec<DetailEntry>>,
    pub graph: Option<GraphComponent>,
    pub map: Option<MapAnchor>,
    pub countries: Vec<String>,
    pub topics: Vec<String>,
    pub display_score: f64,
    /// The cluster's `source_count` as of the last publish/revision, used by
    /// the Publisher (C11) to detect the "+4 sources" revision trigger.
    pub source_count_at_publish: i64,
    pub published_at: DateTime<Utc>,
    pub last_revised_at: DateTime<Utc>,
}

/// Single-writer advisory lock persisted in the store (C12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLock {
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_ages_out_on_idle() {
        let now = Utc::now();
        let c = Cluster {
            id: Uuid::new_v4(),
            title: "t".into(),
            keywords: vec![],
            centroid_embedding: vec![],
            status: ClusterStatus::Active,
            source_count: 1,
            first_seen_at: now - chrono::Duration::hours(1),
            last_updated_at: now - chrono::Duration::hours(25),
            category: "general".into(),
        };
        assert!(c.is_aged_out(now, 24, 48));
    }

    #[test]
    fn cluster_ages_out_on_total_lifetime() {
        let now = Utc::now();
        let c = Cluster {
            id: Uuid::new_v4(),
            title: "t".into(),
            keywords: vec![],
            centroid_embedding: vec![],
            status: ClusterStatus::Active,
            source_count: 1,
            first_seen_at: now - chrono::Duration::hours(49),
            last_updated_at: now - chrono::Duration::hours(1),
            category: "general".into(),
        };
        assert!(c.is_aged_out(now, 24, 48));
    }

    #[test]
    fn cluster_stays_active_within_window() {
        let now = Utc::now();
        let c = Cluster {
            id: Uuid::new_v4(),
            title: "t".into(),
            keywords: vec![],
            centroid_embedding: vec![],
            status: ClusterStatus::Active,
            source_count: 1,
            first_seen_at: now - chrono::Duration::hours(2),
            last_updated_at: now - chrono::Duration::hours(1),
            category: "general".into(),
        };
        assert!(!c.is_aged_out(now, 24, 48));
    }
}
