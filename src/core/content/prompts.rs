//! Prompt templates for the outline, article and expansion phases.

pub fn outline_prompt(primary: &str, secondary: &str, brand: &str, site_url: &str) -> String {
    format!(
        r#"You are preparing an SEO-friendly blog outline for {site_url}.

Primary keyword (exact, contiguous): '{primary}'
Additional context / secondary hints: '{secondary}'

Goals:
- Target C-level readers such as CEOs, CFOs, HR heads and legal leads at international companies.
- Tone: professional, authoritative, approachable; plain English, short paragraphs and bullets; avoid dense legal text.
- Mention relevant local/US/California policies or laws in plain English where applicable.

Return JSON ONLY with exactly these fields:
1) "long_tail_keywords": a list of 3-6 long-tail keywords derived from the primary keyword.
2) "title": an SEO title that MUST include the exact primary keyword as a contiguous phrase. You MAY include one number and one power word.
3) "chapters": a JSON list of 4-8 chapters. Each item has:
   - "heading" (concise; across the whole list the primary keyword should appear at least once where natural)
   - "keywords" (2-5 relevant terms)
   - "highlights" (2-4 bullet points of key content ideas)
   Balance guideline: about half introduction plus US/California-related policies where relevant, about a third {brand} recommendation and service introduction, the remainder best practices and FAQs.
4) "refined_keywords": ONE line string: "<primary>, <one long-tail keyword>" (exactly these two, comma-separated, primary first and unchanged).

Rules:
- Keep the company name exactly "{brand}" when it appears.
- English only.
- Return valid JSON only, no extra text."#
    )
}

pub fn article_prompt(
    primary: &str,
    chapters_json: &str,
    keywords_line: &str,
    brand: &str,
    site_url: &str,
    contact_email: &str,
) -> String {
    format!(
        r#"You are generating the full blog HTML and SEO meta information for {site_url}.

Chapters JSON: '{chapters_json}'
Refinement keywords line: '{keywords_line}'

STRICT REQUIREMENTS:
- Length: about 1,200-1,500 words total.
- HTML only in "html"; use <h2>/<h3>/<p>/<ul>/<li> (NO <h1>).
- The FIRST <h2> is the on-page title and MUST contain the exact primary keyword '{primary}'.
- Use the primary keyword multiple times naturally; include it at least once in each chapter heading where natural.
- The introduction MUST contain the primary keyword exactly once (no more than once).
- Style: short paragraphs, plain English; bullets, tables and callouts allowed; avoid dense legal text.
- Mention key local/US/California laws or policies by name where relevant, with very short plain-English explanations.
- Include at least one <div class='callout'>...</div> for key compliance notes.
- End the article with: "If you have questions, please contact us at {contact_email}."
- Keep the company name exactly "{brand}" when used.

Meta fields:
- "meta_title": MUST include the exact primary keyword.
- "meta_description": at most 140 characters and MUST include exactly one of the terms from '{keywords_line}'.

OUTPUT FORMAT (STRICT):
- Return JSON ONLY with the fields "html", "meta_title" and "meta_description".
- All JSON keys and strings use double quotes.
- Inside "html", prefer single quotes for HTML attributes to minimize escaping."#
    )
}

pub fn expand_prompt(html: &str, keywords_line: &str, target_min: usize, target_max: usize) -> String {
    format!(
        r#"You are an editor. Expand the following HTML article to {target_min}-{target_max} words.
Keep all existing H2/H3 headings, structure, and style. Do not add <h1>.
Preserve the first <h2> as the on-page title. Keep compliance callouts and short paragraphs.
Use the primary keyword from '{keywords_line}' naturally across headings and body.
Return HTML only (no code fences).

[Current HTML]
{html}"#
    )
}
