use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Authentication of the callers of the command surface.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    /// Required (non-empty) when method = "allow_list".
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    None,
    AllowList,
}

/// Remote storage service (Alist-compatible API).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base URL (e.g., "http://localhost:5244")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Directory offline downloads are queued into.
    pub offline_dir: String,
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u32,
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u32,
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u32,
    #[serde(default = "default_remove_timeout")]
    pub remove_timeout_secs: u32,
}

fn default_login_timeout() -> u32 {
    15
}

fn default_list_timeout() -> u32 {
    20
}

fn default_submit_timeout() -> u32 {
    30
}

fn default_remove_timeout() -> u32 {
    15
}

/// Magnet search service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Base URL; the catalog code is appended as the last path segment.
    pub url: String,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u32,
}

fn default_search_timeout() -> u32 {
    20
}

/// Junk detection and small-file sweep settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    #[serde(default = "default_ad_keywords")]
    pub ad_keywords: Vec<String>,
    #[serde(default = "default_ad_domains")]
    pub ad_domains: Vec<String>,
    #[serde(default = "default_ad_extensions")]
    pub ad_extensions: Vec<String>,
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,
    /// Files strictly below this size are swept. 0 disables the sweep.
    #[serde(default)]
    pub small_file_threshold_bytes: u64,
    /// Scheduled sweep of the offline dir. 0 disables the scheduler.
    #[serde(default)]
    pub sweep_interval_secs: u64,
    /// Maximum failure details kept in a cleanup report.
    #[serde(default = "default_failure_detail_limit")]
    pub failure_detail_limit: usize,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            ad_keywords: default_ad_keywords(),
            ad_domains: default_ad_domains(),
            ad_extensions: default_ad_extensions(),
            media_extensions: default_media_extensions(),
            small_file_threshold_bytes: 0,
            sweep_interval_secs: 0,
            failure_detail_limit: default_failure_detail_limit(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_ad_keywords() -> Vec<String> {
    strings(&[
        "直播",
        "聚合",
        "社区",
        "情报",
        "最新地址",
        "獲取",
        "花式表演",
        "大全",
        "群淫傳",
        "三國志H版",
        "七龍珠H版",
    ])
}

fn default_ad_domains() -> Vec<String> {
    strings(&["996gg.cc"])
}

fn default_ad_extensions() -> Vec<String> {
    strings(&[".txt", ".html", ".htm", ".url", ".lnk", ".apk", ".exe"])
}

fn default_media_extensions() -> Vec<String> {
    strings(&[".mp4", ".mkv", ".avi", ".wmv", ".mov", ".flv", ".rmvb"])
}

fn default_failure_detail_limit() -> usize {
    10
}

/// Batch submission pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Delay between consecutive items of a multi-line batch.
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,
    /// Delay before the post-submission refresh listing.
    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,
    /// Per-item outcomes shown in a batch summary.
    #[serde(default = "default_summary_limit")]
    pub summary_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: default_item_delay(),
            refresh_delay_ms: default_refresh_delay(),
            summary_limit: default_summary_limit(),
        }
    }
}

fn default_item_delay() -> u64 {
    3000
}

fn default_refresh_delay() -> u64 {
    2000
}

/// Most per-item outcomes a batch summary may show.
pub const MAX_SUMMARY_LIMIT: usize = 10;

fn default_summary_limit() -> usize {
    MAX_SUMMARY_LIMIT
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub search: SearchConfig,
    pub cleanup: CleanupConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub allowed_users: usize,
}

/// Storage config with the password hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub offline_dir: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::AllowList => "allow_list".to_string(),
                },
                allowed_users: config.auth.allowed_user_ids.len(),
            },
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                url: config.storage.url.clone(),
                username: config.storage.username.clone(),
                password_configured: !config.storage.password.is_empty(),
                offline_dir: config.storage.offline_dir.clone(),
            },
            search: config.search.clone(),
            cleanup: config.cleanup.clone(),
            batch: config.batch.clone(),
        }
    }
}
