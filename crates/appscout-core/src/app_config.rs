use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub keywords_path: PathBuf,
    pub judge_api_key: Option<String>,
    pub judge_base_url: String,
    pub judge_model: String,
    pub judge_max_attempts: u32,
    pub judge_backoff_base_secs: u64,
    pub judge_cooldown_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub store_request_timeout_secs: u64,
    pub store_user_agent: String,
    pub store_max_retries: u32,
    pub store_retry_backoff_base_secs: u64,
    pub collector_pool_cap: usize,
    pub collector_search_limit: u32,
    pub collector_keyword_sample: usize,
    pub default_country: String,
    pub harvester_review_cap: usize,
    pub harvester_max_pages: u32,
    pub run_cron: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("keywords_path", &self.keywords_path)
            .field("database_url", &"[redacted]")
            .field(
                "judge_api_key",
                &self.judge_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("judge_base_url", &self.judge_base_url)
            .field("judge_model", &self.judge_model)
            .field("judge_max_attempts", &self.judge_max_attempts)
            .field("judge_backoff_base_secs", &self.judge_backoff_base_secs)
            .field("judge_cooldown_secs", &self.judge_cooldown_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "store_request_timeout_secs",
                &self.store_request_timeout_secs,
            )
            .field("store_user_agent", &self.store_user_agent)
            .field("store_max_retries", &self.store_max_retries)
            .field(
                "store_retry_backoff_base_secs",
                &self.store_retry_backoff_base_secs,
            )
            .field("collector_pool_cap", &self.collector_pool_cap)
            .field("collector_search_limit", &self.collector_search_limit)
            .field("collector_keyword_sample", &self.collector_keyword_sample)
            .field("default_country", &self.default_country)
            .field("harvester_review_cap", &self.harvester_review_cap)
            .field("harvester_max_pages", &self.harvester_max_pages)
            .field("run_cron", &self.run_cron)
            .finish()
    }
}
