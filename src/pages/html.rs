//! HTML pages: `<title>` and `<meta name content>` become metadata, the
//! contents of `<body>` become the page body.

use super::Parsed;
use regex::Regex;
use std::sync::LazyLock;

static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head\s*>").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").unwrap());

/// `None` when the document has no `<body>`.
pub(super) fn parse(text: &str) -> Option<Parsed> {
    let body = BODY_RE.captures(text)?.get(1)?.as_str().trim().to_string();
    let mut parsed = Parsed {
        body,
        ..Default::default()
    };

    if let Some(head) = HEAD_RE.captures(text).and_then(|c| c.get(1)) {
        let head = head.as_str();
        if let Some(title) = TITLE_RE.captures(head).and_then(|c| c.get(1)) {
            parsed
                .metadata
                .insert("title".to_string(), title.as_str().trim().to_string());
        }
        for meta in META_RE.captures_iter(head) {
            let mut name = None;
            let mut content = None;
            for attr in ATTR_RE.captures_iter(&meta[1]) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .map(|m| m.as_str().to_string());
                match attr[1].to_lowercase().as_str() {
                    "name" => name = value,
                    "content" => content = value,
                    _ => {}
                }
            }
            if let (Some(name), Some(content)) = (name, content) {
                parsed.metadata.insert(name.to_lowercase(), content);
            }
        }
    }

    Some(parsed)
}
