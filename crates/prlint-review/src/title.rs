use regex::Regex;
use tracing::debug;

/// Check whether `title` matches `pattern` anywhere.
///
/// The search is unanchored and the title is used exactly as given; anchors
/// belong in the pattern itself.
///
/// # Examples
///
/// ```
/// use prlint_review::title::evaluate;
/// use regex::Regex;
///
/// let pattern = Regex::new("^(feat|fix|chore):").unwrap();
/// assert!(evaluate(&pattern, "fix: bug"));
/// assert!(!evaluate(&pattern, "bad title"));
/// ```
pub fn evaluate(pattern: &Regex, title: &str) -> bool {
    debug!(pattern = pattern.as_str(), "title regex");
    debug!(title, "title");
    pattern.is_match(title)
}
