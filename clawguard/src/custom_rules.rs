//! User-supplied allow/block regexes.
//!
//! These run before the built-in checks so the user can override them. Each
//! pattern passes through a protected tester: a static guard refuses nested
//! quantifiers outright, and the candidate string is clamped so even a
//! pathological pattern that slips through cannot run unbounded.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::decision::{Decision, Source};

/// Longest input a user pattern is ever tested against.
const INPUT_CLAMP_BYTES: usize = 2048;

/// A group ending in a quantifier that is itself quantified: `(x+)+`,
/// `(x*)+`, `(x+)*` and non-capturing variants. The classic ReDoS shape.
static NESTED_QUANTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\?:)?[^()]*[+*]\)\s*[+*]").expect("guard pattern must compile")
});

/// Apply the user's allow list, then block list. Returns a terminal decision
/// on the first match, `None` otherwise.
pub fn apply_custom_rules(
    command: &str,
    allow_patterns: &[String],
    block_patterns: &[String],
) -> Option<Decision> {
    for pattern in allow_patterns {
        if safe_regex_match(pattern, command) {
            return Some(Decision::allow(
                Source::CustomAllow,
                format!("matched custom allow pattern `{pattern}`"),
            ));
        }
    }

    for pattern in block_patterns {
        if safe_regex_match(pattern, command) {
            return Some(
                Decision::deny(
                    Source::CustomBlock,
                    format!("matched custom block pattern `{pattern}`"),
                )
                .with_user_message(format!(
                    "[BLOCKED] Command matches your block pattern `{pattern}` \
                     (Auto-reject in {}s)\n\nRemove the pattern with `clawguard config` \
                     if this is intentional.",
                    crate::decision::DEFAULT_DENY_TIMEOUT_SECS
                )),
            );
        }
    }

    None
}

/// Test `input` against a user-supplied pattern, refusing dangerous patterns
/// and clamping the input. Compile errors and refused patterns are no-match.
fn safe_regex_match(pattern: &str, input: &str) -> bool {
    if NESTED_QUANTIFIER.is_match(pattern) {
        warn!(pattern, "refusing custom pattern with nested quantifier");
        return false;
    }

    let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            warn!(pattern, error = %e, "custom pattern failed to compile; treating as no-match");
            return false;
        }
    };

    regex.is_match(clamp(input))
}

/// Truncate to the clamp size without splitting a UTF-8 character.
fn clamp(input: &str) -> &str {
    if input.len() <= INPUT_CLAMP_BYTES {
        return input;
    }
    let mut end = INPUT_CLAMP_BYTES;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Behavior;

    #[test]
    fn test_allow_pattern_wins_first() {
        let allow = vec![r"^npm test\b".to_string()];
        let block = vec![r"npm".to_string()];

        let decision = apply_custom_rules("npm test -- --watch", &allow, &block).unwrap();
        assert_eq!(decision.behavior, Behavior::Allow);
        assert_eq!(decision.source, Source::CustomAllow);
    }

    #[test]
    fn test_block_pattern_denies_with_message() {
        let decision =
            apply_custom_rules("terraform apply", &[], &[r"terraform\s+apply".to_string()])
                .unwrap();
        assert_eq!(decision.behavior, Behavior::Deny);
        assert_eq!(decision.source, Source::CustomBlock);
        assert!(decision.user_message.as_deref().unwrap().contains("[BLOCKED]"));
        assert!(decision.timeout_seconds.is_some());
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(apply_custom_rules("ls -la", &["^git".into()], &["^rm".into()]).is_none());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let decision = apply_custom_rules("TERRAFORM APPLY", &[], &["terraform".into()]);
        assert!(decision.is_some());
    }

    #[test]
    fn test_nested_quantifiers_are_refused() {
        for pattern in [r"(a+)+", r"(a*)+b", r"(x+)*", r"(?:\w+)+$"] {
            assert!(
                !safe_regex_match(pattern, "aaaaaaaaaaaaaaaaaaaaaaaaaaa!"),
                "{pattern} should be refused"
            );
        }
    }

    #[test]
    fn test_plain_quantifiers_still_work() {
        assert!(safe_regex_match(r"a+b", "aaab"));
        assert!(safe_regex_match(r"(abc)+", "abcabc"));
        assert!(safe_regex_match(r"^git\s+\w+", "git status"));
    }

    #[test]
    fn test_invalid_pattern_is_no_match() {
        assert!(!safe_regex_match(r"([unclosed", "anything"));
    }

    #[test]
    fn test_input_clamp_bounds_matching() {
        let long_input = "x".repeat(INPUT_CLAMP_BYTES * 4);
        assert_eq!(clamp(&long_input).len(), INPUT_CLAMP_BYTES);

        // A pattern anchored past the clamp can't see that far.
        let pattern = format!("x{{{}}}", INPUT_CLAMP_BYTES * 2);
        assert!(!safe_regex_match(&pattern, &long_input));
    }

    #[test]
    fn test_clamp_respects_char_boundaries() {
        let long_input = "é".repeat(INPUT_CLAMP_BYTES);
        let clamped = clamp(&long_input);
        assert!(clamped.len() <= INPUT_CLAMP_BYTES);
        // Must not panic and must remain valid UTF-8 (guaranteed by &str).
        assert!(clamped.chars().all(|c| c == 'é'));
    }
}
