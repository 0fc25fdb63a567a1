//! Deferred Admin Notices
//!
//! Problems detected early in a request are queued here and rendered later,
//! during the host's notice rendering phase. Notices are keyed: enqueuing an
//! existing key replaces the message but keeps its original position.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Notice severity, which also selects the rendered CSS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// CSS class list for the notice container
    pub fn css_class(&self) -> String {
        format!("notice notice-{}", self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing message awaiting display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub key: String,
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    /// Render as an HTML block with the message sanitized
    pub fn render(&self) -> String {
        format!(
            "<div class=\"{}\">\n\t<p>{}</p>\n</div>\n",
            escape_html(&self.severity.css_class()),
            sanitize_message(&self.message)
        )
    }
}

/// Insertion-ordered notices keyed by identity
#[derive(Debug, Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
    index: HashMap<String, usize>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a notice, replacing any existing notice with the same key in place
    pub fn enqueue<K, M>(&mut self, key: K, severity: Severity, message: M)
    where
        K: Into<String>,
        M: Into<String>,
    {
        let key = key.into();
        let notice = Notice { key: key.clone(), severity, message: message.into() };

        match self.index.get(&key) {
            Some(&position) => self.notices[position] = notice,
            None => {
                self.index.insert(key, self.notices.len());
                self.notices.push(notice);
            }
        }
    }

    /// Notices in first-insertion order
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn get(&self, key: &str) -> Option<&Notice> {
        self.index.get(key).map(|&position| &self.notices[position])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
        self.index.clear();
    }

    /// Render every notice in order. The queue is left intact.
    pub fn render(&self) -> String {
        self.notices.iter().map(Notice::render).collect()
    }
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<a\s+href\s*=\s*"([^"<>]*)"\s*>|</a\s*>"#)
            .expect("link pattern is a valid regex")
    })
}

/// Escape HTML special characters
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn char_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(?:#[xX]([0-9a-fA-F]+);?|#([0-9]+);?|([a-zA-Z][a-zA-Z0-9]*);)")
            .expect("character reference pattern is a valid regex")
    })
}

fn named_reference(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "colon" => ':',
        "sol" => '/',
        "quest" => '?',
        "num" => '#',
        "period" => '.',
        "equals" => '=',
        "percnt" => '%',
        "Tab" => '\t',
        "NewLine" => '\n',
        "nbsp" => '\u{a0}',
        _ => return None,
    };
    Some(c)
}

/// Decode the character references a browser would resolve in an attribute.
///
/// Returns `None` for references that cannot be resolved, so the caller can
/// refuse the value instead of guessing.
fn decode_char_references(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for captures in char_reference_pattern().captures_iter(input) {
        let Some(reference) = captures.get(0) else { continue };
        out.push_str(&input[last..reference.start()]);

        let decoded = if let Some(hex) = captures.get(1) {
            u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
        } else if let Some(decimal) = captures.get(2) {
            decimal.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else {
            captures.get(3).and_then(|name| named_reference(name.as_str()))
        };

        match decoded {
            Some('\0') | None => return None,
            Some(c) => out.push(c),
        }
        last = reference.end();
    }

    out.push_str(&input[last..]);
    Some(out)
}

/// Normalize a link target, returning it only if it is relative or http(s).
///
/// The value is entity-decoded and stripped of the whitespace and control
/// characters URL parsers ignore before the scheme is inspected.
fn allowed_url(raw: &str) -> Option<String> {
    let decoded = decode_char_references(raw)?;
    let url: String = decoded
        .trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect();

    let lowered = url.to_lowercase();
    let scheme_end = lowered.find(':');
    let path_start = lowered.find(|c: char| c == '/' || c == '?' || c == '#');

    let allowed = match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => true,
        (Some(colon), _) => matches!(&lowered[..colon], "http" | "https"),
        (None, _) => true,
    };

    allowed.then_some(url)
}

/// Escape a message, keeping only balanced `<a href="...">` links
pub fn sanitize_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut last = 0;
    let mut open = false;

    for captures in link_pattern().captures_iter(message) {
        let Some(tag) = captures.get(0) else { continue };
        out.push_str(&escape_html(&message[last..tag.start()]));

        let target = match captures.get(1) {
            Some(href) if !open => allowed_url(href.as_str()),
            _ => None,
        };

        match target {
            Some(url) => {
                out.push_str(&format!("<a href=\"{}\">", escape_html(&url)));
                open = true;
            }
            None if open && captures.get(1).is_none() => {
                out.push_str("</a>");
                open = false;
            }
            _ => out.push_str(&escape_html(tag.as_str())),
        }
        last = tag.end();
    }

    out.push_str(&escape_html(&message[last..]));
    if open {
        out.push_str("</a>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_preserves_order() {
        let mut queue = NoticeQueue::new();
        queue.enqueue("first", Severity::Error, "one");
        queue.enqueue("second", Severity::Warning, "two");
        queue.enqueue("third", Severity::Info, "three");

        let keys: Vec<&str> = queue.notices().iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_enqueue_same_key_replaces_in_place() {
        let mut queue = NoticeQueue::new();
        queue.enqueue("bad_environment", Severity::Error, "old");
        queue.enqueue("update_host", Severity::Error, "host");
        queue.enqueue("bad_environment", Severity::Warning, "new");

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.notices()[0].key, "bad_environment");
        assert_eq!(queue.notices()[0].message, "new");
        assert_eq!(queue.notices()[0].severity, Severity::Warning);
        assert_eq!(queue.get("update_host").unwrap().message, "host");
    }

    #[test]
    fn test_render_does_not_clear() {
        let mut queue = NoticeQueue::new();
        queue.enqueue("key", Severity::Info, "hello");
        let first = queue.render();
        assert_eq!(queue.render(), first);
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains("key"));
        assert_eq!(queue.render(), "");
    }

    #[test]
    fn test_render_block_format() {
        let notice = Notice {
            key: "k".to_string(),
            severity: Severity::Error,
            message: "Plain text".to_string(),
        };
        assert_eq!(
            notice.render(),
            "<div class=\"notice notice-error\">\n\t<p>Plain text</p>\n</div>\n"
        );
    }

    #[test]
    fn test_sanitize_keeps_link() {
        let message = r#"Please <a href="https://example.com/wp-admin/update-core.php">update</a> now"#;
        assert_eq!(sanitize_message(message), message);
    }

    #[test]
    fn test_sanitize_escapes_other_markup() {
        let message = r#"<strong>Gateway</strong> requires <script>alert(1)</script> 5 > 4 & "more""#;
        let sanitized = sanitize_message(message);
        assert!(!sanitized.contains("<strong>"));
        assert!(!sanitized.contains("<script>"));
        assert!(sanitized.contains("&lt;strong&gt;Gateway&lt;/strong&gt;"));
        assert!(sanitized.contains("5 &gt; 4 &amp; &quot;more&quot;"));
    }

    #[test]
    fn test_sanitize_rejects_unsafe_scheme() {
        let sanitized = sanitize_message(r#"<a href="javascript:alert(1)">click</a>"#);
        assert!(!sanitized.contains("<a "));
        assert!(sanitized.starts_with("&lt;a href="));
        // the orphaned closing tag is escaped too
        assert!(sanitized.ends_with("&lt;/a&gt;"));
    }

    #[test]
    fn test_sanitize_extra_attributes_are_escaped() {
        let sanitized = sanitize_message(r#"<a href="/x" onclick="evil()">x</a>"#);
        assert!(!sanitized.contains("<a "));
    }

    #[test]
    fn test_sanitize_closes_unbalanced_link() {
        assert_eq!(
            sanitize_message(r#"see <a href="/docs">docs"#),
            r#"see <a href="/docs">docs</a>"#
        );
    }

    #[test]
    fn test_sanitize_escapes_computed_values() {
        let detected = "<img src=x onerror=alert(1)>";
        let sanitized = sanitize_message(&format!("You are running {}.", detected));
        assert!(sanitized.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn test_allowed_urls() {
        assert!(allowed_url("https://downloads.example.org/plugin.zip").is_some());
        assert!(allowed_url("/wp-admin/update-core.php").is_some());
        assert!(allowed_url("update-core.php?x=a:b").is_some());
        assert!(allowed_url("JavaScript:void(0)").is_none());
        assert!(allowed_url("data:text/html,hi").is_none());
        assert!(allowed_url("mailto:support@example.org").is_none());
    }

    #[test]
    fn test_encoded_script_scheme_rejected() {
        for href in [
            "javascript&#58;alert(1)",
            "javascript&#x3A;alert(1)",
            "javascript&#X3a;alert(1)",
            "javascript&colon;alert(1)",
            "javascript&#0000058alert(1)",
            "java&Tab;script:alert(1)",
            "java\tscript:alert(1)",
            " &#x20;javascript:alert(1)",
            "javascript&bogus;alert(1)",
        ] {
            assert!(allowed_url(href).is_none(), "accepted {:?}", href);

            let sanitized = sanitize_message(&format!("<a href=\"{}\">x</a>", href));
            assert!(!sanitized.contains("<a href"), "live link for {:?}: {}", href, sanitized);
            assert!(sanitized.starts_with("&lt;a href="));
        }
    }

    #[test]
    fn test_href_decoded_then_escaped() {
        assert_eq!(
            sanitize_message(r#"<a href="update.php?a=1&amp;b='2'">go</a>"#),
            r#"<a href="update.php?a=1&amp;b=&#039;2&#039;">go</a>"#
        );
        assert_eq!(
            sanitize_message(r#"<a href="https&#58;//example.org/">x</a>"#),
            r#"<a href="https://example.org/">x</a>"#
        );
    }

    #[test]
    fn test_mailto_links_escaped() {
        let sanitized = sanitize_message(r#"<a href="mailto:support@example.org">mail</a>"#);
        assert_eq!(
            sanitized,
            "&lt;a href=&quot;mailto:support@example.org&quot;&gt;mail&lt;/a&gt;"
        );
    }
}
