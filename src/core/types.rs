/// One keyword pulled from the keyword file, or supplied explicitly.
/// `row` is the 0-based data row it came from; `None` for explicit overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRecord {
    pub text: String,
    pub row: Option<usize>,
}

/// A finished article ready to publish. `keywords` is a comma-separated
/// line with the primary keyword first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogDraft {
    pub title: String,
    pub html: String,
    pub meta_description: String,
    pub keywords: String,
    pub primary_keyword: String,
}

impl BlogDraft {
    /// First term of the keywords line, falling back to the primary keyword.
    pub fn focus_keyword(&self) -> &str {
        self.keywords
            .split(',')
            .next()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .unwrap_or(&self.primary_keyword)
    }
}

/// Remote handle for an uploaded media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub id: u64,
    pub source_url: Option<String>,
}

/// Terminal result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub post_id: u64,
    pub status: String,
    pub link: Option<String>,
}
