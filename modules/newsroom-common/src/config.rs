use std::time::Duration;

use tracing::info;

/// Which admission-score contract the Scorer (C4) applies for this
/// deployment. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionContract {
    /// 0-100, default threshold 70.
    A,
    /// 0-1000, default threshold 700.
    B,
}

impl AdmissionContract {
    fn default_threshold(self) -> f64 {
        match self {
            AdmissionContract::A => 70.0,
            AdmissionContract::B => 700.0,
        }
    }

    /// Top of this contract's numeric scale, for interpolating into the
    /// Scorer's prompt so the model knows what range to emit.
    pub fn max_score(self) -> f64 {
        match self {
            AdmissionContract::A => 100.0,
            AdmissionContract::B => 1000.0,
        }
    }
}

/// Process-wide configuration, loaded once from the environment at startup.
///
/// Required variables cause a panic with a named message if absent; optional
/// variables fall back to the defaults documented alongside each field.
#[derive(Debug, Clone)]
pub struct Config {
    // Vendor credentials / endpoints
    pub database_url: String,
    pub anthropic_api_key: String,
    pub embedding_api_key: String,
    pub fulltext_proxy_key: Option<String>,
    pub fulltext_reader_base: Option<String>,
    pub fulltext_reader_key: Option<String>,

    // C2 Feed Fetcher
    pub feed_workers: usize,
    pub fetch_timeout_s: u64,

    // C4 Scorer
    pub score_batch_size: usize,
    pub score_threshold: f64,
    pub admission_contract: AdmissionContract,

    // C5 Clustering Engine
    pub cluster_t_high: f64,
    pub cluster_t_mid: f64,
    pub cluster_jaccard: f64,
    pub cluster_idle_hours: i64,
    pub cluster_max_hours: i64,

    // C11 Publisher
    pub update_high_score: f64,
    pub update_source_delta: i64,
    pub update_cooldown_min: i64,

    // C12 Run Lock
    pub run_lock_timeout_min: i64,

    // C13 Cycle Orchestrator
    pub cycle_deadline_min: u64,
}

impl Config {
    /// Load configuration for the pipeline (CLI and server binaries share
    /// this constructor; there is only one deployment shape for the core).
    pub fn from_env() -> Self {
        let admission_contract = match std::env::var("ADMISSION_CONTRACT")
            .unwrap_or_else(|_| "A".to_string())
            .to_uppercase()
            .as_str()
        {
            "B" => AdmissionContract::B,
            _ => AdmissionContract::A,
        };

        let score_threshold = env_f64("SCORE_THRESHOLD", admission_contract.default_threshold());

        Self {
            database_url: required_env("DATABASE_URL"),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            embedding_api_key: required_env("EMBEDDING_API_KEY"),
            fulltext_proxy_key: std::env::var("FULLTEXT_PROXY_KEY").ok(),
            fulltext_reader_base: std::env::var("FULLTEXT_READER_BASE").ok(),
            fulltext_reader_key: std::env::var("FULLTEXT_READER_KEY").ok(),

            feed_workers: env_usize("FEED_WORKERS", 30),
            fetch_timeout_s: env_u64("FETCH_TIMEOUT_S", 10),

            score_batch_size: env_usize("SCORE_BATCH_SIZE", 30),
            score_threshold,
            admission_contract,

            cluster_t_high: env_f64("CLUSTER_T_HIGH", 0.87),
            cluster_t_mid: env_f64("CLUSTER_T_MID", 0.78),
            cluster_jaccard: env_f64("CLUSTER_JACCARD", 0.35),
            cluster_idle_hours: env_i64("CLUSTER_IDLE_HOURS", 24),
            cluster_max_hours: env_i64("CLUSTER_MAX_HOURS", 48),

            update_high_score: env_f64("UPDATE_HIGH_SCORE", 850.0),
            update_source_delta: env_i64("UPDATE_SOURCE_DELTA", 4),
            update_cooldown_min: env_i64("UPDATE_COOLDOWN_MIN", 30),

            run_lock_timeout_min: env_i64("RUN_LOCK_TIMEOUT_MIN", 30),

            cycle_deadline_min: env_u64("CYCLE_DEADLINE_MIN", 30),
        }
    }

    pub fn cycle_deadline(&self) -> Duration {
        Duration::from_secs(self.cycle_deadline_min * 60)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_s)
    }

    /// Log configuration at startup without leaking secret values.
    pub fn log_redacted(&self) {
        info!(
            database_url_len = self.database_url.len(),
            anthropic_key_len = self.anthropic_api_key.len(),
            embedding_key_len = self.embedding_api_key.len(),
            fulltext_proxy_key = %presence(&self.fulltext_proxy_key),
            fulltext_reader_base = %presence(&self.fulltext_reader_base),
            fulltext_reader_key = %presence(&self.fulltext_reader_key),
            feed_workers = self.feed_workers,
            fetch_timeout_s = self.fetch_timeout_s,
            score_batch_size = self.score_batch_size,
            score_threshold = self.score_threshold,
            admission_contract = ?self.admission_contract,
            cluster_t_high = self.cluster_t_high,
            cluster_t_mid = self.cluster_t_mid,
            cluster_jaccard = self.cluster_jaccard,
            cluster_idle_hours = self.cluster_idle_hours,
            cluster_max_hours = self.cluster_max_hours,
            update_high_score = self.update_high_score,
            update_source_delta = self.update_source_delta,
            update_cooldown_min = self.update_cooldown_min,
            run_lock_timeout_min = self.run_lock_timeout_min,
            cycle_deadline_min = self.cycle_deadline_min,
            "loaded configuration"
        );
    }
}

fn presence(value: &Option<String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "(set)",
        _ => "(empty)",
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_contract_defaults_threshold() {
        assert_eq!(AdmissionContract::A.default_threshold(), 70.0);
        assert_eq!(AdmissionContract::B.default_threshold(), 700.0);
    }
}
