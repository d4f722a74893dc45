//! Runtime settings loaded from environment variables.
//!
//! Required:
//! - `OPENAI_API_KEY`: API key for the completion provider.
//! - `WP_BASE_URL`: base URL of the WordPress site, e.g. `https://example.com`.
//! - `WP_USER`: WordPress username the application password belongs to.
//! - `WP_APP_PASSWORD`: WordPress application password.
//!
//! Optional:
//! - `OPENAI_MODEL` (default `gpt-4o-mini`)
//! - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
//! - `KEYWORDS_FILE` (default `./data/keywords.xlsx`)
//! - `IMAGES_DIR` (default `./images`)
//! - `SCHEDULER_ENABLED` (default `false`)
//! - `SCHEDULE_CRON` (default `0 10 * * *`, local time)
//! - `POST_STATUS` (default `publish`; `publish` or `draft`)
//! - `KEYWORD_SELECTION` (default `random`; `random` or `sequential`)
//! - `REQUIRE_FEATURED_IMAGE` (default `true`)
//! - `BRAND_NAME` (default `NNRoad`)
//! - `BRAND_SITE_URL` (default `https://nnroad.com`)
//! - `CONTACT_EMAIL` (default `contact@nnroad.com`)

use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::core::error::{AgentError, Result};

/// Status assigned to newly created posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Publish,
    Draft,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Publish => "publish",
            PostStatus::Draft => "draft",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "publish" => Ok(PostStatus::Publish),
            "draft" => Ok(PostStatus::Draft),
            other => Err(format!("expected 'publish' or 'draft', got: {}", other)),
        }
    }
}

/// How the next keyword is picked from the keyword file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    Random,
    Sequential,
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "random" => Ok(SelectionPolicy::Random),
            "sequential" => Ok(SelectionPolicy::Sequential),
            other => Err(format!("expected 'random' or 'sequential', got: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub wp_base_url: String,
    pub wp_user: String,
    pub wp_app_password: String,
    pub keywords_file: PathBuf,
    pub images_dir: PathBuf,
    pub scheduler_enabled: bool,
    pub schedule_cron: String,
    pub post_status: PostStatus,
    pub keyword_selection: SelectionPolicy,
    pub require_featured_image: bool,
    pub brand_name: String,
    pub brand_site_url: String,
    pub contact_email: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let post_status = env_or("POST_STATUS", "publish")
            .parse::<PostStatus>()
            .map_err(|e| AgentError::config(format!("POST_STATUS: {}", e)))?;
        let keyword_selection = env_or("KEYWORD_SELECTION", "random")
            .parse::<SelectionPolicy>()
            .map_err(|e| AgentError::config(format!("KEYWORD_SELECTION: {}", e)))?;

        Ok(Settings {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: validate_base_url(
                "OPENAI_BASE_URL",
                &env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            )?,
            wp_base_url: validate_base_url("WP_BASE_URL", &require_env("WP_BASE_URL")?)?,
            wp_user: require_env("WP_USER")?,
            wp_app_password: require_env("WP_APP_PASSWORD")?,
            keywords_file: PathBuf::from(env_or("KEYWORDS_FILE", "./data/keywords.xlsx")),
            images_dir: PathBuf::from(env_or("IMAGES_DIR", "./images")),
            scheduler_enabled: env_bool("SCHEDULER_ENABLED", false)?,
            schedule_cron: env_or("SCHEDULE_CRON", "0 10 * * *"),
            post_status,
            keyword_selection,
            require_featured_image: env_bool("REQUIRE_FEATURED_IMAGE", true)?,
            brand_name: env_or("BRAND_NAME", "NNRoad"),
            brand_site_url: validate_base_url(
                "BRAND_SITE_URL",
                &env_or("BRAND_SITE_URL", "https://nnroad.com"),
            )?,
            contact_email: env_or("CONTACT_EMAIL", "contact@nnroad.com"),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AgentError::config(format!("missing required environment variable: {}", name)))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_bool(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            parse_bool(&raw).map_err(|e| AgentError::config(format!("{}: {}", name, e)))
        }
        _ => Ok(default),
    }
}

pub(crate) fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

/// Parses the URL to catch typos early, then strips any trailing slash so
/// endpoint paths can be joined with a plain format string.
fn validate_base_url(name: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    Url::parse(trimmed)
        .map_err(|e| AgentError::config(format!("{} is not a valid URL: {}", name, e)))?;
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_forms() {
        for v in ["1", "true", "T", "yes", "Y", "on", " ON "] {
            assert_eq!(parse_bool(v), Ok(true), "value: {}", v);
        }
        for v in ["0", "false", "F", "no", "N", "off"] {
            assert_eq!(parse_bool(v), Ok(false), "value: {}", v);
        }
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn post_status_from_str() {
        assert_eq!("publish".parse::<PostStatus>(), Ok(PostStatus::Publish));
        assert_eq!(" Draft ".parse::<PostStatus>(), Ok(PostStatus::Draft));
        assert!("pending".parse::<PostStatus>().is_err());
    }

    #[test]
    fn selection_policy_from_str() {
        assert_eq!("random".parse::<SelectionPolicy>(), Ok(SelectionPolicy::Random));
        assert_eq!(
            "SEQUENTIAL".parse::<SelectionPolicy>(),
            Ok(SelectionPolicy::Sequential)
        );
        assert!("shuffled".parse::<SelectionPolicy>().is_err());
    }

    #[test]
    fn validate_base_url_strips_trailing_slash() {
        let cleaned = validate_base_url("WP_BASE_URL", "https://example.com/").unwrap();
        assert_eq!(cleaned, "https://example.com");
    }

    #[test]
    fn validate_base_url_rejects_garbage() {
        assert!(validate_base_url("WP_BASE_URL", "not a url").is_err());
    }
}
