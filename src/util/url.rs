use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

/// Matches an http(s) URL with at least one dot in it, anywhere in a string.
pub const URL_PATTERN: &str = r"https?://\S+\.\S*";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(URL_PATTERN).expect("URL_PATTERN is valid"));

/// Does this text contain a URL anywhere?
pub fn contains_url(text: &str) -> bool {
    URL_RE.is_match(text)
}

/// Whitespace-separated tokens of `title` that are URLs, in order.
pub fn extract_links(title: &str) -> Vec<&str> {
    title
        .split_whitespace()
        .filter(|tok| URL_RE.is_match(tok))
        .collect()
}

/// `title` with its URL tokens removed and the rest re-joined by single
/// spaces. "Check this http://example.com out" becomes "Check this out".
pub fn strip_links(title: &str) -> String {
    title
        .split_whitespace()
        .filter(|tok| !URL_RE.is_match(tok))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetch a page and pull the contents of its `<title>` element.
///
/// Best-effort: non-HTML responses, network failures, and missing titles all
/// yield `None` so callers can degrade to "no suggested title".
pub fn page_title(url: &str) -> Option<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("kard/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()
        .ok()?;
    let resp = client.get(url).send().ok()?;
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)?
        .to_str()
        .ok()?
        .to_string();
    if !content_type.contains("text/html") {
        return None;
    }
    let body = resp.text().ok()?;
    let start = body.find("<title>")? + "<title>".len();
    let end = body[start..].find("</title>")? + start;
    let title = body[start..end].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

/// Open a URL in the user's browser, discarding the opener's chatter so it
/// does not corrupt our prompt output.
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
    Command::new(OPENER)
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contains_url() {
        assert!(contains_url("Check this http://example.com out"));
        assert!(contains_url("https://docs.rs/regex is handy"));
        assert!(!contains_url("no links here"));
        assert!(!contains_url("http:// not a real link"));
    }

    #[test]
    fn test_extract_single_link() {
        let links = extract_links("Check this http://example.com out");
        assert_eq!(links, vec!["http://example.com"]);
    }

    #[test]
    fn test_extract_multiple_links() {
        let links = extract_links("https://a.example.com and http://b.example.com/page");
        assert_eq!(
            links,
            vec!["https://a.example.com", "http://b.example.com/page"]
        );
    }

    #[test]
    fn test_strip_links_rejoins_title() {
        assert_eq!(
            strip_links("Check this http://example.com out"),
            "Check this out"
        );
    }

    #[test]
    fn test_strip_links_no_links() {
        assert_eq!(strip_links("plain  title"), "plain title");
    }

    #[test]
    fn test_strip_links_only_link() {
        assert_eq!(strip_links("https://example.com/article"), "");
    }
}
