//! Deterministic HTML cleanup applied to model output: fence stripping,
//! heading normalization with anchor ids, and internal link injection.

use regex::Regex;

/// Markers in the primary keyword that switch links to the US landing pages.
const US_MARKERS: [&str; 5] = ["united states", "usa", "u.s.", "california", "florida"];

pub fn strip_code_fences(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let fence = Regex::new(r"(?is)^\s*```(?:html|json)?\s*|\s*```\s*$").unwrap();
    let text = fence.replace_all(text, "");
    let leading_quotes = Regex::new(r#"^\s*["'`“”]+"#).unwrap();
    leading_quotes.replace(text.trim(), "").trim().to_string()
}

pub fn visible_text(html: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").unwrap();
    tags.replace_all(html, " ").to_string()
}

pub fn word_count(html: &str) -> usize {
    let words = Regex::new(r"\w+").unwrap();
    words.find_iter(&visible_text(html)).count()
}

pub fn first_paragraph_text(html: &str) -> String {
    let paragraph = Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap();
    let Some(caps) = paragraph.captures(html) else {
        return String::new();
    };
    let tags = Regex::new(r"(?s)<.*?>").unwrap();
    let raw = tags.replace_all(caps.get(1).map(|m| m.as_str()).unwrap_or(""), " ");
    collapse_whitespace(&raw)
}

pub fn slug(text: &str) -> String {
    let tags = Regex::new(r"(?s)<.*?>").unwrap();
    let text = tags.replace_all(text, "");
    let punctuation = Regex::new(r"[^\w\s-]").unwrap();
    let text = punctuation.replace_all(&text, "");
    let spaces = Regex::new(r"\s+").unwrap();
    spaces.replace_all(text.trim(), "-").to_lowercase()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

pub fn promote_h3_to_h2(html: &str) -> String {
    let open = Regex::new(r"(?is)<h3\b([^>]*)>").unwrap();
    let html = open.replace_all(html, "<h2$1>");
    let close = Regex::new(r"(?is)</h3>").unwrap();
    close.replace_all(&html, "</h2>").to_string()
}

/// Promotes h3 headings, gives every h2 a slug id, and appends headings for
/// planned chapters until the article carries at least `max(3, min(6, n))`
/// sections.
pub fn ensure_headings_and_ids(html: &str, chapters: &[String]) -> String {
    let html = promote_h3_to_h2(html);

    let heading = Regex::new(r"(?is)<h2[^>]*>(.*?)</h2>").unwrap();
    let tags = Regex::new(r"(?s)<.*?>").unwrap();
    let mut ids: Vec<String> = Vec::new();
    let mut html = heading
        .replace_all(&html, |caps: &regex::Captures| {
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let text = tags.replace_all(inner, "").trim().to_string();
            let sid = if text.is_empty() {
                format!("sec-{}", ids.len() + 1)
            } else {
                slug(&text)
            };
            let rendered = format!("<h2 id=\"{}\">{}</h2>", sid, inner);
            ids.push(sid);
            rendered
        })
        .to_string();

    let need_min = 3usize.max(chapters.len().min(6));
    if ids.len() < need_min && !chapters.is_empty() {
        for title in chapters {
            let title = title.trim();
            if title.is_empty() {
                continue;
            }
            let sid = slug(title);
            if ids.iter().any(|existing| existing == &sid) {
                continue;
            }
            html.push_str(&format!(
                "\n<h2 id=\"{}\">{}</h2>\n",
                sid,
                escape_html(title)
            ));
            ids.push(sid);
            if ids.len() >= need_min {
                break;
            }
        }
    }
    html
}

/// Wraps the first occurrence of known service phrases in `<p>`/`<li>` blocks
/// with links into the site, one link per target URL, `max_links` overall.
pub fn add_internal_links(
    html: &str,
    primary_kw: &str,
    site_base: &str,
    max_links: usize,
) -> String {
    let base = site_base.trim_end_matches('/');
    let low = primary_kw.to_lowercase();
    let is_usa = US_MARKERS.iter().any(|marker| low.contains(marker));

    let mut pairs = vec![
        (
            r"(?i)\bEmployer of Record\b|\bEOR services?\b|\bEOR\b".to_string(),
            format!("{}/services/employer-of-record/", base),
        ),
        (
            r"(?i)\bglobal payroll\b|\bpayroll\b".to_string(),
            format!("{}/services/global-payroll/", base),
        ),
        (
            r"(?i)\blabor cost calculator\b".to_string(),
            format!("{}/usa/labor-cost-calculator/", base),
        ),
        (
            r"(?i)\bwork permits?\b|\bvisa\b".to_string(),
            format!("{}/services/", base),
        ),
    ];
    if is_usa {
        pairs[0].1 = format!("{}/usa/employer-of-record-eor-peo-geo-company/", base);
        pairs[1].1 = format!("{}/usa/payroll-service-company/", base);
    }

    let mut seen: Vec<String> = Vec::new();
    let mut html = apply_links_in_tag(html, "p", &pairs, &mut seen, max_links);
    if seen.len() < max_links {
        html = apply_links_in_tag(&html, "li", &pairs, &mut seen, max_links);
    }
    if seen.len() < max_links {
        let extra = vec![(
            r"(?i)\bUnited States\b|\bUSA\b|\bU\.S\.A\.?\b".to_string(),
            format!("{}/usa/", base),
        )];
        html = apply_links_in_tag(&html, "p", &extra, &mut seen, max_links);
    }
    html
}

fn apply_links_in_tag(
    html: &str,
    tag: &str,
    pairs: &[(String, String)],
    seen: &mut Vec<String>,
    limit: usize,
) -> String {
    let block = Regex::new(&format!(r"(?is)(<{tag}[^>]*>)(.*?)(</{tag}>)")).unwrap();
    let anchor = Regex::new(r"(?is)<a\b[^>]*>.*?</a>").unwrap();
    let compiled: Vec<(Regex, &str)> = pairs
        .iter()
        .map(|(pattern, url)| (Regex::new(pattern).unwrap(), url.as_str()))
        .collect();

    block
        .replace_all(html, |caps: &regex::Captures| {
            let open = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let inner = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let close = caps.get(3).map(|m| m.as_str()).unwrap_or("");

            // Mask existing anchors so links never nest.
            let mut anchors: Vec<String> = Vec::new();
            let mut masked = anchor
                .replace_all(inner, |a: &regex::Captures| {
                    let token = format!("__A_{}__", anchors.len());
                    anchors.push(a.get(0).map(|m| m.as_str()).unwrap_or("").to_string());
                    token
                })
                .to_string();

            for (re, url) in &compiled {
                if seen.len() >= limit || seen.iter().any(|u| u == url) {
                    continue;
                }
                let linked = re
                    .replacen(&masked, 1, format!("<a href=\"{}\">$0</a>", url).as_str())
                    .to_string();
                if linked != masked {
                    masked = linked;
                    seen.push((*url).to_string());
                    if seen.len() >= limit {
                        break;
                    }
                }
            }

            for (i, original) in anchors.iter().enumerate() {
                masked = masked.replace(&format!("__A_{}__", i), original);
            }
            format!("{}{}{}", open, masked, close)
        })
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
