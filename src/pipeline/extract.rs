//! Image-link extraction: find `![alt](/images/...)` references in Markdown.
//!
//! Only the inline image form is recognised. The path is captured verbatim;
//! anything that does not start with [`LOCAL_IMAGE_ROOT`] (already-remote
//! URLs, relative paths) is left alone.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path};

/// Prefix marking an image path as local and eligible for upload.
pub const LOCAL_IMAGE_ROOT: &str = "/images/";

// Alt text and path each allow one level of balanced brackets/parens
// (`![fig [1]](...)`, `Screenshot (1).png`) but stop at the first unbalanced
// closer, so two images on one line are captured separately.
static RE_IMAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[(?:[^\[\]]|\[[^\]]*\])*\]\(((?:[^()]|\([^()]*\))*)\)").unwrap()
});

/// Collect local image paths in order of appearance, duplicates preserved.
///
/// A document without image links yields an empty vector.
pub fn extract_image_paths(markdown: &str) -> Vec<String> {
    RE_IMAGE_LINK
        .captures_iter(markdown)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|path| path.starts_with(LOCAL_IMAGE_ROOT))
        .map(str::to_string)
        .collect()
}

/// Repository-relative path for a local image link.
///
/// `/images/blog/cat.png` → `blog/cat.png`. Returns `None` for paths outside
/// the local image root, for the bare root itself, and for paths with `.`,
/// `..` or absolute segments, which could name a file outside `images/`.
pub fn output_path_for(local_path: &str) -> Option<&str> {
    local_path
        .strip_prefix(LOCAL_IMAGE_ROOT)
        .filter(|rest| !rest.is_empty())
        .filter(|rest| is_contained(rest))
}

fn is_contained(relative: &str) -> bool {
    !relative.starts_with('/')
        && !relative.split('/').any(|seg| seg == "." || seg == "..")
        && Path::new(relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
