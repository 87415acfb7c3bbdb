//! Escaping of `{identifier}` tokens in generated documentation comments.
//!
//! YARD treats `{foo}` as a link, so literal placeholders in comments must be
//! written as `\\{foo}`. Tokens inside backtick spans and Ruby (`#{..}`) or
//! shell (`${..}`) interpolations are left alone.

use crate::constants::MAX_ESCAPE_PASSES;
use crate::error::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// Group 1 is the longest prefix with balanced backticks, so group 4 is the
// rightmost token outside any backtick span.
static UNESCAPED_BRACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^`]*(`[^`]*`[^`]*)*)([^`#$\\])\{([\w,]+)\}").expect("valid brace regex")
});

/// Escapes every unescaped brace token in `text`, one per pass, until a pass
/// finds nothing left to escape.
///
/// Every pass removes one unescaped `{`, so the pass limit is the number of
/// braces in `text` plus one, and never below [`MAX_ESCAPE_PASSES`].
///
/// # Errors
/// * `Error::FixedPointError` if the text still changes after the pass limit
pub fn escape_braces(text: &str) -> Result<String> {
    let passes = (text.matches('{').count() + 1).max(MAX_ESCAPE_PASSES);
    let mut content = text.to_string();
    for _ in 0..passes {
        let next = match UNESCAPED_BRACE.replacen(&content, 1, r"${1}${3}\\{${4}}") {
            Cow::Borrowed(_) => None,
            Cow::Owned(rewritten) => Some(rewritten),
        };
        match next {
            Some(rewritten) => content = rewritten,
            None => return Ok(content),
        }
    }
    Err(Error::FixedPointError { passes })
}
