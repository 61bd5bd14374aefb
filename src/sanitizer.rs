//! HTML cleaning for user-supplied rich text.

use std::collections::HashSet;

/// Strips disallowed markup from a rich-text field.
///
/// Uses ammonia's default allow-list: formatting tags survive, `<script>` and `<style>`
/// are dropped along with their content, and event-handler attributes and
/// `javascript:` links are removed.
pub fn sanitize(html: &str) -> String {
    ammonia::clean(html)
}

/// Plain-text preview of a (sanitized) body for list pages.
///
/// All tags are removed, whitespace is collapsed and the result is cut to at most
/// `max_chars` characters, with an ellipsis appended when something was cut.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(html)
        .to_string();
    // ammonia escapes text nodes; the excerpt is escaped again by the view layer.
    let text = html_escape::decode_html_entities(&text);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}
