//! Pipeline stages applied to each Markdown document.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ resolve (per image) ──▶ rewrite
//! (regex)     (lookup / upload)       (string replace)
//! ```
//!
//! 1. [`extract`] — collect `![alt](/images/...)` paths from the text
//! 2. [`resolve`] — map each path to a download URL; the only stage with
//!    network I/O
//! 3. [`rewrite`] — substitute the URLs back into the text

pub mod extract;
pub mod resolve;
pub mod rewrite;
