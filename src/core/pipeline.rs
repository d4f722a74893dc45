use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::error::Result;
use crate::core::types::{BlogDraft, KeywordRecord, MediaReference, PublishResult};

/// Picks the next keyword, or validates an explicit override.
#[async_trait]
pub trait KeywordSource: Send + Sync {
    async fn next_keyword(&self, explicit: Option<&str>) -> Result<KeywordRecord>;
}

/// Turns a keyword into a finished draft.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, primary: &str, secondary: Option<&str>) -> Result<BlogDraft>;
}

/// Pushes a local image to the CMS media library.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<MediaReference>;
}

/// Creates the post in the CMS.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        draft: &BlogDraft,
        media: Option<&MediaReference>,
    ) -> Result<PublishResult>;
}

/// Runs the stages strictly in order: keyword, draft, optional media
/// upload, publish. An upload failure aborts the run unless
/// `require_featured_image` is off, in which case the post goes out bare.
pub struct Pipeline {
    keywords: Arc<dyn KeywordSource>,
    generator: Arc<dyn ContentGenerator>,
    uploader: Arc<dyn MediaUploader>,
    publisher: Arc<dyn Publisher>,
    require_featured_image: bool,
}

impl Pipeline {
    pub fn new(
        keywords: Arc<dyn KeywordSource>,
        generator: Arc<dyn ContentGenerator>,
        uploader: Arc<dyn MediaUploader>,
        publisher: Arc<dyn Publisher>,
        require_featured_image: bool,
    ) -> Self {
        Self {
            keywords,
            generator,
            uploader,
            publisher,
            require_featured_image,
        }
    }

    pub async fn run_once(
        &self,
        keyword: Option<&str>,
        secondary: Option<&str>,
        image: Option<&Path>,
    ) -> Result<PublishResult> {
        let started = Instant::now();

        let record = self.keywords.next_keyword(keyword).await?;
        info!("keyword selected: {:?} (row {:?})", record.text, record.row);

        let draft = self.generator.generate(&record.text, secondary).await?;
        info!(
            "draft ready: {:?} ({} words)",
            draft.title,
            crate::core::content::html::word_count(&draft.html)
        );

        let media = match image {
            None => None,
            Some(path) => match self.uploader.upload(path).await {
                Ok(media) => {
                    info!("featured image uploaded as media {}", media.id);
                    Some(media)
                }
                Err(e) if !self.require_featured_image => {
                    warn!("continuing without featured image: {}", e);
                    None
                }
                Err(e) => return Err(e),
            },
        };

        let result = self.publisher.publish(&draft, media.as_ref()).await?;
        info!(
            "published post {} ({}) in {:?}",
            result.post_id,
            result.status,
            started.elapsed()
        );
        Ok(result)
    }
}
