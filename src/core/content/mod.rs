pub mod html;
pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::config::Settings;
use crate::core::error::{AgentError, Result};
use crate::core::llm::{ChatMessage, GenerationParams, LlmProvider};
use crate::core::pipeline::ContentGenerator;
use crate::core::types::BlogDraft;

const MAX_ATTEMPTS: usize = 3;
const RETRY_PAUSE: Duration = Duration::from_millis(1200);
/// Articles below this word count get one expansion pass.
const MIN_WORDS: usize = 1150;
const EXPAND_MIN: usize = 1200;
const EXPAND_MAX: usize = 1600;
const MAX_LINKS: usize = 4;

/// Stable suffixes appended when the title would collapse into the bare
/// keyword. Picked by keyword hash so reruns stay deterministic.
const TITLE_SUFFIXES: [&str; 16] = [
    "- Key Insights for Leaders",
    "- Compliance & Hiring Guide",
    "- What You Need to Know",
    "- Quick Guide",
    "- Essentials",
    "- Executive Brief",
    "- Best Practices",
    "- Compliance Basics",
    "- Hiring Guide",
    "- For CEOs & CFOs",
    "- Action Checklist",
    "- Step-by-Step",
    "- Key Considerations",
    "- Practical Guide",
    "- At a Glance",
    "- Deep Dive",
];

#[derive(Debug, Default, Deserialize)]
struct OutlinePlan {
    #[serde(default)]
    chapters: Vec<ChapterPlan>,
    #[serde(default)]
    refined_keywords: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChapterPlan {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    highlights: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticlePayload {
    #[serde(default)]
    html: String,
    #[serde(default)]
    meta_title: String,
    #[serde(default)]
    meta_description: String,
}

/// Brand identity woven into prompts and deterministic fixups.
#[derive(Debug, Clone)]
pub struct EditorialProfile {
    pub brand_name: String,
    pub site_url: String,
    pub contact_email: String,
}

impl From<&Settings> for EditorialProfile {
    fn from(settings: &Settings) -> Self {
        EditorialProfile {
            brand_name: settings.brand_name.clone(),
            site_url: settings.brand_site_url.clone(),
            contact_email: settings.contact_email.clone(),
        }
    }
}

/// Two-phase generator: an outline pass plans chapters and refines keywords,
/// an article pass writes the HTML, then deterministic post-processing
/// guarantees the SEO invariants regardless of what the model returned.
pub struct LlmContentGenerator {
    llm: Arc<dyn LlmProvider>,
    profile: EditorialProfile,
}

impl LlmContentGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, profile: EditorialProfile) -> Self {
        Self { llm, profile }
    }

    async fn complete(&self, prompt: String, temperature: f32) -> Result<String> {
        let messages = [ChatMessage::user(prompt)];
        let params = GenerationParams {
            temperature,
            ..GenerationParams::default()
        };
        self.llm.generate(&messages, params).await
    }

    async fn outline(&self, primary: &str, secondary: &str) -> Result<OutlinePlan> {
        let prompt = prompts::outline_prompt(
            primary,
            secondary,
            &self.profile.brand_name,
            &self.profile.site_url,
        );

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self
                .complete(prompt.clone(), 0.4)
                .await
                .and_then(|raw| parse_outline(&raw))
            {
                Ok(plan) => return Ok(plan),
                Err(e) => {
                    warn!("outline attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    last_err = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_PAUSE).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AgentError::generation("outline generation failed")))
    }

    async fn article(&self, primary: &str, plan: &OutlinePlan, keywords_line: &str) -> Result<ArticlePayload> {
        let chapters_json =
            serde_json::to_string(&plan.chapters).unwrap_or_else(|_| "[]".to_string());
        let prompt = prompts::article_prompt(
            primary,
            &chapters_json,
            keywords_line,
            &self.profile.brand_name,
            &self.profile.site_url,
            &self.profile.contact_email,
        );

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.article_attempt(&prompt, keywords_line).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    warn!("article attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
                    last_err = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_PAUSE).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AgentError::generation("article generation failed")))
    }

    async fn article_attempt(&self, prompt: &str, keywords_line: &str) -> Result<ArticlePayload> {
        let raw = self.complete(prompt.to_string(), 0.4).await?;
        let mut payload = parse_article(&raw)?;
        payload.html = html::strip_code_fences(&payload.html);
        if payload.html.is_empty() {
            return Err(AgentError::generation("article response contained no HTML"));
        }

        if html::word_count(&payload.html) < MIN_WORDS {
            debug!("article below {} words, requesting an expansion", MIN_WORDS);
            let expanded = self
                .complete(
                    prompts::expand_prompt(&payload.html, keywords_line, EXPAND_MIN, EXPAND_MAX),
                    0.2,
                )
                .await?;
            let expanded = html::strip_code_fences(&expanded);
            if !expanded.is_empty() {
                payload.html = expanded;
            }
        }
        Ok(payload)
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, primary: &str, secondary: Option<&str>) -> Result<BlogDraft> {
        let primary = primary.trim();
        if primary.is_empty() {
            return Err(AgentError::generation("primary keyword is empty"));
        }
        let secondary = secondary.unwrap_or("").trim();

        let plan = self.outline(primary, secondary).await?;
        let refined = plan.refined_keywords.trim();
        let keywords_line = if refined.is_empty() {
            primary.to_string()
        } else {
            refined.to_string()
        };
        info!(
            "outline ready: {} chapters, keywords: {}",
            plan.chapters.len(),
            keywords_line
        );

        let payload = self.article(primary, &plan, &keywords_line).await?;

        let title = finalize_title(&payload.meta_title, primary, &self.profile.brand_name);
        let meta_description =
            finalize_meta_description(&payload.meta_description, &payload.html, primary);

        let chapter_titles: Vec<String> = plan
            .chapters
            .iter()
            .map(|chapter| chapter.heading.trim().to_string())
            .collect();
        let body = html::ensure_headings_and_ids(&payload.html, &chapter_titles);
        let body = html::add_internal_links(&body, primary, &self.profile.site_url, MAX_LINKS);

        Ok(BlogDraft {
            title,
            html: body,
            meta_description,
            keywords: keywords_line,
            primary_keyword: primary.to_string(),
        })
    }
}

fn parse_outline(raw: &str) -> Result<OutlinePlan> {
    let cleaned = html::strip_code_fences(raw);
    let plan: OutlinePlan = serde_json::from_str(&cleaned)
        .map_err(|e| AgentError::generation(format!("outline is not valid JSON: {}", e)))?;
    if plan.chapters.is_empty() {
        return Err(AgentError::generation("outline contained no chapters"));
    }
    Ok(plan)
}

fn parse_article(raw: &str) -> Result<ArticlePayload> {
    let cleaned = html::strip_code_fences(raw);
    serde_json::from_str(&cleaned)
        .map_err(|e| AgentError::generation(format!("article is not valid JSON: {}", e)))
}

/// The returned title always contains the primary keyword and never collapses
/// into the bare keyword itself.
fn finalize_title(raw: &str, primary: &str, brand: &str) -> String {
    let mut title = html::strip_code_fences(raw);
    if title.is_empty() {
        title = primary.to_string();
    }
    if !primary.is_empty() && !title.to_lowercase().contains(&primary.to_lowercase()) {
        title = format!("{} | {}", primary, brand);
    }
    diversify_title(title, primary)
}

fn diversify_title(title: String, primary: &str) -> String {
    if primary.is_empty() {
        return title;
    }
    let norm_title = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let norm_primary = primary.trim().to_lowercase();
    if !title.is_empty() && norm_title != norm_primary && title.chars().count() >= 25 {
        return title;
    }

    let digest = Sha256::digest(primary.as_bytes());
    let suffix = TITLE_SUFFIXES[digest[0] as usize % TITLE_SUFFIXES.len()];
    format!("{} {}", primary, suffix)
}

fn finalize_meta_description(raw: &str, body_html: &str, primary: &str) -> String {
    let mut desc = html::strip_code_fences(raw);
    if desc.is_empty() {
        desc = html::first_paragraph_text(body_html);
    }
    if !primary.is_empty() && !desc.to_lowercase().contains(&primary.to_lowercase()) {
        desc = if desc.is_empty() {
            primary.to_string()
        } else {
            format!("{} - {}", primary, desc)
        };
    }
    desc.chars().take(160).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    struct StubProvider {
        responses: AsyncMutex<VecDeque<String>>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(responses: Vec<String>) -> Arc<Self> {
            Arc::new(Self {
                responses: AsyncMutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn generate(
            &self,
            _messages: &[ChatMessage],
            _params: GenerationParams,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| AgentError::generation("stub exhausted"))
        }
    }

    fn profile() -> EditorialProfile {
        EditorialProfile {
            brand_name: "NNRoad".to_string(),
            site_url: "https://nnroad.com".to_string(),
            contact_email: "contact@nnroad.com".to_string(),
        }
    }

    fn outline_json() -> String {
        serde_json::json!({
            "long_tail_keywords": ["eor services for startups"],
            "title": "Employer of Record (EOR) Guide",
            "chapters": [
                {"heading": "What Is an Employer of Record (EOR)", "keywords": ["eor"], "highlights": ["definition"]},
                {"heading": "US Compliance Basics", "keywords": ["compliance"], "highlights": ["laws"]},
                {"heading": "How NNRoad Helps", "keywords": ["nnroad"], "highlights": ["services"]},
                {"heading": "FAQs", "keywords": ["faq"], "highlights": ["answers"]}
            ],
            "refined_keywords": "Employer of Record (EOR), eor services for startups"
        })
        .to_string()
    }

    fn long_article_json() -> String {
        let body = format!(
            "<p>Employer of Record (EOR) partners handle global payroll for expanding teams.</p><p>{}</p>",
            "global hiring compliance onboarding support ".repeat(300)
        );
        serde_json::json!({
            "html": body,
            "meta_title": "Employer of Record (EOR) - Key Insights for Growing Teams",
            "meta_description": "Employer of Record (EOR) explained for leaders."
        })
        .to_string()
    }

    #[tokio::test]
    async fn generates_a_complete_draft() {
        let provider = StubProvider::new(vec![outline_json(), long_article_json()]);
        let generator = LlmContentGenerator::new(provider.clone(), profile());

        let draft = generator
            .generate("Employer of Record (EOR)", Some("startups"))
            .await
            .unwrap();

        assert!(draft.title.to_lowercase().contains("employer of record (eor)"));
        assert_eq!(
            draft.keywords,
            "Employer of Record (EOR), eor services for startups"
        );
        assert!(draft.html.contains("id=\""));
        assert!(draft
            .html
            .contains("href=\"https://nnroad.com/services/employer-of-record/\""));
        assert!(draft.meta_description.chars().count() <= 160);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn short_articles_get_one_expansion_pass() {
        let short_article = serde_json::json!({
            "html": "<p>Employer of Record (EOR) overview.</p>",
            "meta_title": "Employer of Record (EOR) - Quick Compliance Notes",
            "meta_description": "Employer of Record (EOR) notes."
        })
        .to_string();
        let expansion = format!(
            "<h2>Employer of Record (EOR) expanded guidance</h2><p>{}</p>",
            "added depth for every chapter ".repeat(20)
        );
        let provider = StubProvider::new(vec![outline_json(), short_article, expansion]);
        let generator = LlmContentGenerator::new(provider.clone(), profile());

        let draft = generator
            .generate("Employer of Record (EOR)", None)
            .await
            .unwrap();

        assert!(draft.html.contains("expanded guidance"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_outline_attempts() {
        let provider = StubProvider::new(vec![
            "not json".to_string(),
            "still not json".to_string(),
            "nope".to_string(),
        ]);
        let generator = LlmContentGenerator::new(provider.clone(), profile());

        let err = generator.generate("work visa", None).await.unwrap_err();
        assert!(err.to_string().contains("JSON"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn outline_without_chapters_is_retried() {
        let empty = serde_json::json!({"chapters": [], "refined_keywords": "work visa"}).to_string();
        let provider = StubProvider::new(vec![empty.clone(), empty.clone(), empty]);
        let generator = LlmContentGenerator::new(provider.clone(), profile());

        let err = generator.generate("work visa", None).await.unwrap_err();
        assert!(err.to_string().contains("no chapters"));
        assert_eq!(provider.calls(), 3);
    }

    #[test]
    fn title_falls_back_to_keyword_with_suffix() {
        let title = finalize_title("", "eor germany", "NNRoad");
        assert!(title.starts_with("eor germany -"));
    }

    #[test]
    fn title_missing_the_keyword_is_rebuilt_with_the_brand() {
        let title = finalize_title(
            "Great Hiring Advice for Everyone Everywhere",
            "Employer of Record (EOR)",
            "NNRoad",
        );
        assert_eq!(title, "Employer of Record (EOR) | NNRoad");
    }

    #[test]
    fn long_titles_containing_the_keyword_are_kept() {
        let raw = "Employer of Record (EOR) Hiring Guide for Global Leaders";
        assert_eq!(
            finalize_title(raw, "Employer of Record (EOR)", "NNRoad"),
            raw
        );
    }

    #[test]
    fn diversified_titles_are_stable_per_keyword() {
        let a = finalize_title("", "global payroll", "NNRoad");
        let b = finalize_title("", "global payroll", "NNRoad");
        assert_eq!(a, b);
    }

    #[test]
    fn meta_description_falls_back_to_the_first_paragraph() {
        let body = "<p>Employer of Record (EOR) services simplify hiring.</p>";
        let desc = finalize_meta_description("", body, "Employer of Record (EOR)");
        assert_eq!(desc, "Employer of Record (EOR) services simplify hiring.");
    }

    #[test]
    fn meta_description_is_prefixed_and_clamped() {
        let desc = finalize_meta_description("General description.", "", "work visa");
        assert_eq!(desc, "work visa - General description.");

        let long = "x".repeat(300);
        let clamped = finalize_meta_description(&long, "", "work visa");
        assert_eq!(clamped.chars().count(), 160);
    }

    #[test]
    fn fenced_json_payloads_are_parsed() {
        let fenced = "```json\n{\"html\": \"<p>x</p>\", \"meta_title\": \"t\", \"meta_description\": \"d\"}\n```";
        let payload = parse_article(fenced).unwrap();
        assert_eq!(payload.html, "<p>x</p>");
    }
}
