//! Minimal HTML-to-text stripping and token-budget truncation (§4.5.2,
//! §4.5.4), ported from `mail_attachment_converter.py`'s `_html_to_text`.

fn strip_block(input: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut out = String::with_capacity(input.len());
    let lower = input.to_lowercase();
    let mut pos = 0;
    loop {
        match lower[pos..].find(&open) {
            Some(start_rel) => {
                let start = pos + start_rel;
                out.push_str(&input[pos..start]);
                match lower[start..].find(&close) {
                    Some(end_rel) => pos = start + end_rel + close.len(),
                    None => return out,
                }
            }
            None => {
                out.push_str(&input[pos..]);
                return out;
            }
        }
    }
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn replace_tag_with(input: &str, tag_prefix: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let lower = input.to_lowercase();
    let mut pos = 0;
    while let Some(start_rel) = lower[pos..].find(tag_prefix) {
        let start = pos + start_rel;
        out.push_str(&input[pos..start]);
        out.push_str(replacement);
        match input[start..].find('>') {
            Some(end_rel) => pos = start + end_rel + 1,
            None => {
                pos = input.len();
                break;
            }
        }
    }
    out.push_str(&input[pos..]);
    out
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_blank_line = false;
    for line in input.split('\n') {
        let collapsed: String = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if last_was_blank_line {
                continue;
            }
            last_was_blank_line = true;
        } else {
            last_was_blank_line = false;
        }
        out.push_str(&collapsed);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Strips `<script>`/`<style>` blocks, converts `<br>`/`<p>` to newlines,
/// removes remaining tags, and decodes the standard HTML entities.
pub fn html_to_text(html: &str) -> String {
    let mut text = strip_block(html, "script");
    text = strip_block(&text, "style");
    text = replace_tag_with(&text, "<br", "\n");
    text = replace_tag_with(&text, "<p", "\n");
    text = text.replace("</p>", "");
    text = strip_tags(&text);
    text = decode_entities(&text);
    collapse_whitespace(&text)
}

/// Roughly approximates token count as `len(text) / 4`, matching §4.5.4's
/// stated heuristic.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Truncates `text` to approximately `limit` tokens, preferring to cut at
/// the last newline or sentence boundary within the final 20% of the
/// allowed character range, and appends a marker noting the original count.
pub fn truncate_to_token_budget(text: &str, limit: usize) -> String {
    if estimate_tokens(text) <= limit {
        return text.to_string();
    }

    let char_budget = limit * 4;
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= char_budget {
        return text.to_string();
    }

    let original_tokens = estimate_tokens(text);
    let hard_cut = char_budget;
    let search_start = (hard_cut as f64 * 0.8) as usize;

    let window: String = chars[search_start..hard_cut].iter().collect();
    let boundary = window
        .rfind('\n')
        .or_else(|| window.rfind(". "))
        .map(|idx| search_start + idx + 1);

    let cut_at = boundary.unwrap_or(hard_cut);
    let truncated: String = chars[..cut_at].iter().collect();

    format!(
        "{}\n\n[... truncated, original content was approximately {} tokens ...]",
        truncated.trim_end(),
        original_tokens
    )
}
