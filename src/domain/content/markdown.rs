//! Lightweight Markdown scanning for model responses.

use std::sync::LazyLock;

use regex::Regex;

use super::PLAIN_LANGUAGE;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+#.\-]*)[^\n]*\n(.*?)```").expect("valid fence regex")
});
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<<<CODE_BLOCK_(\d+)>>>$").expect("valid placeholder regex"));
static SEPARATOR_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(\|\s*:?-+:?\s*)*\|?$").expect("valid separator regex")
});
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}(?:\s+(.*))?$").expect("valid heading regex"));

const KNOWN_LANGUAGES: &[&str] = &[
    "c", "cpp", "c++", "cc", "cxx", "h", "python", "py", "python3", "java", "javascript", "js",
    "node", "typescript", "ts", "rust", "rs", "go", "bash", "sh", "shell", "sql", "json", "xml",
    "html", "css", "yaml", "yml", "toml", "matlab", "r", "kotlin", "swift", "ruby", "php",
    "csharp", "cs",
];

/// A fenced code span in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Fence {
    pub language: String,
    pub body: String,
}

/// Replace every fenced span with a placeholder line, returning the rewritten
/// text and the fences in order.
pub(super) fn extract_fences(text: &str) -> (String, Vec<Fence>) {
    let mut fences = Vec::new();
    let rewritten = FENCE.replace_all(text, |captures: &regex::Captures<'_>| {
        let body = &captures[2];
        let body = body.strip_suffix('\n').unwrap_or(body);
        let body = body.strip_suffix('\r').unwrap_or(body);
        fences.push(Fence { language: normalize_language(&captures[1]), body: body.to_string() });
        format!("\n<<<CODE_BLOCK_{}>>>\n", fences.len() - 1)
    });
    (rewritten.into_owned(), fences)
}

pub(super) fn placeholder_index(line: &str) -> Option<usize> {
    PLACEHOLDER.captures(line).and_then(|captures| captures[1].parse().ok())
}

/// Lower-cased fence language; missing or unrecognised tags become `plain`.
pub(super) fn normalize_language(raw: &str) -> String {
    let language = raw.trim().to_ascii_lowercase();
    if KNOWN_LANGUAGES.contains(&language.as_str()) {
        language
    } else {
        PLAIN_LANGUAGE.to_string()
    }
}

/// Heading text without its `#` markers.
pub(super) fn heading_text(line: &str) -> Option<&str> {
    HEADING
        .captures(line)
        .map(|captures| captures.get(1).map_or("", |text| text.as_str().trim_end_matches('#').trim()))
}

pub(super) fn is_table_row(line: &str) -> bool {
    line.starts_with('|')
}

pub(super) fn is_separator_row(line: &str) -> bool {
    line.contains('-') && SEPARATOR_ROW.is_match(line)
}

/// Cells of a pipe-delimited row, trimmed and stripped of emphasis.
pub(super) fn split_row(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| strip_emphasis(cell.trim())).collect()
}

/// Remove paired `**`, `__`, `*` and `_` delimiters, keeping the enclosed text.
/// Unpaired delimiters and intra-word underscores are left alone.
pub(super) fn strip_emphasis(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut output = String::with_capacity(line.len());
    let mut i = 0;
    while i < chars.len() {
        match emphasis_span(&chars, i) {
            Some((width, close)) => {
                let inner: String = chars[i + width..close].iter().collect();
                output.push_str(&strip_emphasis(&inner));
                i = close + width;
            }
            None => {
                output.push(chars[i]);
                i += 1;
            }
        }
    }
    output
}

/// Delimiter width and closing position of an emphasis span opening at `start`.
fn emphasis_span(chars: &[char], start: usize) -> Option<(usize, usize)> {
    let marker = chars[start];
    if marker != '*' && marker != '_' {
        return None;
    }
    if marker == '_' && start > 0 && chars[start - 1].is_alphanumeric() {
        return None;
    }
    let width = if chars.get(start + 1) == Some(&marker) { 2 } else { 1 };
    let content_start = start + width;
    let first = *chars.get(content_start)?;
    if first.is_whitespace() || first == marker {
        return None;
    }

    let mut j = content_start + 1;
    while j + width <= chars.len() {
        let delimiter = chars[j..j + width].iter().all(|c| *c == marker);
        let isolated = chars[j - 1] != marker && chars.get(j + width) != Some(&marker);
        let flanked = !chars[j - 1].is_whitespace();
        let word_end = marker != '_' || !chars.get(j + width).is_some_and(|c| c.is_alphanumeric());
        if delimiter && isolated && flanked && word_end {
            return Some((width, j));
        }
        j += 1;
    }
    None
}
