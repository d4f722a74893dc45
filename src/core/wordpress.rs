use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::config::{PostStatus, Settings};
use crate::core::error::{AgentError, Result};
use crate::core::media;
use crate::core::pipeline::{MediaUploader, Publisher};
use crate::core::types::{BlogDraft, MediaReference, PublishResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct PostPayload<'a> {
    title: &'a str,
    content: &'a str,
    status: &'a str,
    meta: RankMathMeta<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    featured_media: Option<u64>,
}

#[derive(Serialize)]
struct RankMathMeta<'a> {
    rank_math_focus_keyword: &'a str,
    rank_math_description: &'a str,
    rank_math_title: &'a str,
}

#[derive(Serialize)]
struct AltTextPayload<'a> {
    alt_text: &'a str,
}

#[derive(Deserialize)]
struct MediaResponse {
    id: u64,
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Deserialize)]
struct PostResponse {
    id: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// REST client for a WordPress site using application-password auth.
/// Serves as both the media uploader and the post publisher.
pub struct WordPressClient {
    client: Client,
    base_url: String,
    user: String,
    app_password: String,
    status: PostStatus,
}

impl WordPressClient {
    pub fn new(base_url: &str, user: &str, app_password: &str, status: PostStatus) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("inkpress/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::publish(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            app_password: app_password.to_string(),
            status,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.wp_base_url,
            &settings.wp_user,
            &settings.wp_app_password,
            settings.post_status,
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2/{}", self.base_url, path)
    }

    async fn set_alt_text(&self, media_id: u64, alt_text: &str) -> Result<()> {
        let res = self
            .client
            .post(self.endpoint(&format!("media/{}", media_id)))
            .basic_auth(&self.user, Some(&self.app_password))
            .json(&AltTextPayload { alt_text })
            .send()
            .await
            .map_err(|e| AgentError::publish(format!("alt text request failed: {}", e)))?;
        if !res.status().is_success() {
            return Err(AgentError::publish(format!(
                "alt text update failed with {}",
                res.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaUploader for WordPressClient {
    async fn upload(&self, local_path: &Path) -> Result<MediaReference> {
        let payload = media::prepare_image(local_path)?;
        let part = Part::bytes(payload.bytes)
            .file_name(payload.file_name.clone())
            .mime_str(&payload.content_type)
            .map_err(|e| AgentError::upload(format!("invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let res = self
            .client
            .post(self.endpoint("media"))
            .basic_auth(&self.user, Some(&self.app_password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AgentError::upload(format!("media upload request failed: {}", e)))?;

        let status = res.status();
        if status != reqwest::StatusCode::CREATED {
            return Err(AgentError::upload(format!(
                "media upload failed {}: {}",
                status,
                res.text().await.unwrap_or_default()
            )));
        }
        let parsed: MediaResponse = res
            .json()
            .await
            .map_err(|e| AgentError::upload(format!("malformed media response: {}", e)))?;
        info!("uploaded media {} ({})", parsed.id, payload.file_name);

        Ok(MediaReference {
            id: parsed.id,
            source_url: parsed.source_url,
        })
    }
}

#[async_trait]
impl Publisher for WordPressClient {
    async fn publish(
        &self,
        draft: &BlogDraft,
        media: Option<&MediaReference>,
    ) -> Result<PublishResult> {
        // Alt text failures should not block the post itself.
        if let Some(media) = media {
            let alt = if draft.meta_description.is_empty() {
                draft.title.as_str()
            } else {
                draft.meta_description.as_str()
            };
            if let Err(e) = self.set_alt_text(media.id, alt).await {
                warn!("could not set alt text on media {}: {}", media.id, e);
            }
        }

        let payload = PostPayload {
            title: &draft.title,
            content: &draft.html,
            status: self.status.as_str(),
            meta: RankMathMeta {
                rank_math_focus_keyword: draft.focus_keyword(),
                rank_math_description: &draft.meta_description,
                rank_math_title: &draft.title,
            },
            featured_media: media.map(|m| m.id),
        };

        let res = self
            .client
            .post(self.endpoint("posts"))
            .basic_auth(&self.user, Some(&self.app_password))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::publish(format!("publish request failed: {}", e)))?;

        let status = res.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
            return Err(AgentError::publish(format!(
                "post publish failed {}: {}",
                status,
                res.text().await.unwrap_or_default()
            )));
        }
        let parsed: PostResponse = res
            .json()
            .await
            .map_err(|e| AgentError::publish(format!("malformed publish response: {}", e)))?;
        info!(
            "created post {} with status {}",
            parsed.id,
            parsed.status.as_deref().unwrap_or(self.status.as_str())
        );

        Ok(PublishResult {
            post_id: parsed.id,
            status: parsed
                .status
                .unwrap_or_else(|| self.status.as_str().to_string()),
            link: parsed.link,
        })
    }
}
