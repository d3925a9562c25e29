//! Fuzzy matching between free-text show titles and artist identities.
//!
//! Show titles on the schedule are written by hand ("DJ Nova B2B Set",
//! "Late Night w/ Marcus") and only loosely resemble roster names. The matcher
//! tries, in order, containment, whole-word equality, honorific-prefix
//! stripping, and finally a bigram similarity score. The first rule that
//! fires wins.

use serde::{Deserialize, Serialize};

/// Similarity threshold applied unless configured otherwise.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

const PREFIXES: [&str; 4] = ["dj ", "mc ", "dr. ", "prof. "];

/// Similarity thresholds for the two places the matcher is used.
///
/// Both default to [`DEFAULT_THRESHOLD`]. Deployments with a large roster
/// usually raise `directory_threshold` to around 0.7.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
  /// Applied when checking whether an artist is already on air.
  pub threshold:           f64,
  /// Applied when resolving an upcoming show against the artist roster.
  pub directory_threshold: f64,
}

impl Default for MatchConfig {
  fn default() -> Self {
    Self {
      threshold:           DEFAULT_THRESHOLD,
      directory_threshold: DEFAULT_THRESHOLD,
    }
  }
}

/// Compare two free-text strings.
///
/// Case-insensitive. Either side being empty never matches.
pub fn fuzzy_match(a: &str, b: &str, threshold: f64) -> bool {
  let s1 = fold_case(a);
  let s2 = fold_case(b);
  if s1.trim().is_empty() || s2.trim().is_empty() {
    return false;
  }

  if s1.contains(&s2) || s2.contains(&s1) {
    return true;
  }

  if contains_word(&s1, &s2) {
    return true;
  }

  for prefix in PREFIXES {
    if prefixed_remainder_within(&s1, &s2, prefix)
      || prefixed_remainder_within(&s2, &s1, prefix)
    {
      return true;
    }
  }

  strsim::sorensen_dice(&s1, &s2) >= threshold
}

/// Decide whether `show_title` refers to the artist `name` / `username`.
///
/// The name goes through [`fuzzy_match`]; the username is checked for
/// containment and whole-word equality only, since roster usernames
/// ("djnova", "marcus99") rarely resemble titles closely enough for the
/// similarity score to mean anything. Empty fields are ignored.
pub fn matches(
  show_title: &str,
  name: &str,
  username: &str,
  threshold: f64,
) -> bool {
  if fuzzy_match(show_title, name, threshold) {
    return true;
  }

  let username = fold_case(username);
  let username = username.trim();
  if username.is_empty() {
    return false;
  }
  let title = fold_case(show_title);
  title.contains(username) || contains_word(&title, username)
}

/// Case-fold for comparison. Uppercasing first folds characters that only
/// match once expanded, so `ß` and `SS` compare equal.
fn fold_case(s: &str) -> String { s.to_uppercase().to_lowercase() }

/// True if any whitespace-separated token of `haystack` equals `needle`,
/// either verbatim or once punctuation is stripped from both.
fn contains_word(haystack: &str, needle: &str) -> bool {
  let stripped = word_chars(needle);
  if stripped.is_empty() {
    return false;
  }
  haystack
    .split_whitespace()
    .any(|word| word == needle || word_chars(word) == stripped)
}

/// `a` starts with `prefix` and `b` contains what follows it.
fn prefixed_remainder_within(a: &str, b: &str, prefix: &str) -> bool {
  match a.strip_prefix(prefix) {
    Some(rest) if !rest.trim().is_empty() => b.contains(rest),
    _ => false,
  }
}

fn word_chars(s: &str) -> String {
  s.chars().filter(|c| c.is_alphanumeric() || *c == '_').collect()
}
