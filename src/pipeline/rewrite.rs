//! Text substitution: swap local image paths for their remote URLs.

use std::collections::HashSet;

/// Replace every literal occurrence of `local_path` with `remote_url`.
///
/// A `local_path` that does not occur leaves the text unchanged.
pub fn rewrite(markdown: &str, local_path: &str, remote_url: &str) -> String {
    rewrite_all(markdown, &[(local_path, remote_url)])
}

/// Apply a set of `(local_path, remote_url)` replacements to one document.
///
/// The text is scanned once, left to right. At each position the longest
/// matching local path wins, so `/images/a.png` cannot clobber part of
/// `/images/a.png.bak.png`. Inserted URLs are never scanned again, so a URL
/// that happens to contain another local path stays intact. Duplicate local
/// paths use their first URL.
pub fn rewrite_all<S: AsRef<str>>(markdown: &str, replacements: &[(S, S)]) -> String {
    let mut seen = HashSet::new();
    let mut ordered: Vec<(&str, &str)> = replacements
        .iter()
        .map(|(l, r)| (l.as_ref(), r.as_ref()))
        .filter(|(l, _)| !l.is_empty() && seen.insert(*l))
        .collect();
    if ordered.is_empty() {
        return markdown.to_string();
    }
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(markdown.len());
    let mut copied = 0;
    let mut pos = 0;
    while pos < markdown.len() {
        let rest = &markdown[pos..];
        match ordered.iter().find(|(local, _)| rest.starts_with(*local)) {
            Some((local, remote)) => {
                out.push_str(&markdown[copied..pos]);
                out.push_str(remote);
                pos += local.len();
                copied = pos;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    out.push_str(&markdown[copied..]);
    out
}
