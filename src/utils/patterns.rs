//! Candidate email pattern keys, their priority ordering, and rendering.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifies the template used to build a candidate local part.
///
/// Four fixed fallback templates cover the common corporate conventions; the
/// `Custom` variant carries a literal template discovered from the static
/// per-domain hints. A custom key can never alias a fallback: [`PatternKey::parse`]
/// folds any string matching a fallback's template or durable name back into
/// the fallback variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternKey {
    /// `{first}` — e.g. `jane@acme.com`
    FirstOnly,
    /// `{first}.{last}` — e.g. `jane.doe@acme.com`
    FirstDotLast,
    /// `{first}_{last}` — e.g. `jane_doe@acme.com`
    FirstUnderscoreLast,
    /// `{firstInitial}.{last}` — e.g. `j.doe@acme.com`
    FirstInitialDotLast,
    /// A literal local-part template taken from the static format hints.
    Custom(String),
}

/// Fixed fallback templates in canonical priority order.
pub const FALLBACK_PATTERNS: [PatternKey; 4] = [
    PatternKey::FirstOnly,
    PatternKey::FirstDotLast,
    PatternKey::FirstUnderscoreLast,
    PatternKey::FirstInitialDotLast,
];

impl PatternKey {
    /// The local-part template this key expands to.
    pub fn template(&self) -> &str {
        match self {
            PatternKey::FirstOnly => "{first}",
            PatternKey::FirstDotLast => "{first}.{last}",
            PatternKey::FirstUnderscoreLast => "{first}_{last}",
            PatternKey::FirstInitialDotLast => "{firstInitial}.{last}",
            PatternKey::Custom(t) => t,
        }
    }

    /// Short, stable name used as the key in the durable pattern store.
    pub fn as_str(&self) -> &str {
        match self {
            PatternKey::FirstOnly => "first",
            PatternKey::FirstDotLast => "first.last",
            PatternKey::FirstUnderscoreLast => "first_last",
            PatternKey::FirstInitialDotLast => "f.last",
            PatternKey::Custom(t) => t,
        }
    }

    /// Parses a template or durable key string back into a `PatternKey`.
    ///
    /// Recognizes both the canonical template (`{first}.{last}`) and the
    /// durable name (`first.last`) of each fallback so usage statistics stay
    /// consolidated on the fallback variant. Anything else becomes `Custom`.
    pub fn parse(s: &str) -> PatternKey {
        let trimmed = s.trim();
        for key in &FALLBACK_PATTERNS {
            if trimmed == key.template() || trimmed == key.as_str() {
                return key.clone();
            }
        }
        PatternKey::Custom(trimmed.to_string())
    }

    /// Parses a static format hint into a `PatternKey`.
    ///
    /// Hints may be full address templates (`{first}.{last}@acme.com`); only
    /// the local part left of the `@` is kept.
    pub fn from_hint(hint: &str) -> PatternKey {
        let local = hint.split('@').next().unwrap_or("");
        PatternKey::parse(local)
    }

    /// Renders the template into a concrete local part.
    ///
    /// Name parts are sanitized and lowercased before substitution. Returns
    /// an empty string for unusable inputs or malformed custom templates
    /// (leftover `{`/`}` after substitution); callers skip empty renders.
    pub fn render(&self, first_name: &str, last_name: &str) -> String {
        let first = sanitize_name_part(first_name);
        let last = sanitize_name_part(last_name);
        if first.is_empty() || last.is_empty() {
            return String::new();
        }
        let first_initial = match first.chars().next() {
            Some(c) => c.to_string(),
            None => return String::new(),
        };

        let rendered = self
            .template()
            .replace("{first}", &first)
            .replace("{last}", &last)
            .replace("{firstInitial}", &first_initial);

        if rendered.is_empty() || rendered.contains('{') || rendered.contains('}') {
            tracing::debug!(
                "Template '{}' rendered to unusable local part '{}', skipping",
                self.template(),
                rendered
            );
            return String::new();
        }
        rendered
    }
}

impl Serialize for PatternKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PatternKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PatternKey::parse(&s))
    }
}

/// Removes most non-alphanumeric characters, whitespace, and converts to
/// lowercase, producing usable parts for email local-part generation.
fn sanitize_name_part(part: &str) -> String {
    part.trim()
        .replace(
            |c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'),
            "",
        )
        .to_lowercase()
}

/// Produces the ordered, duplicate-free candidate pattern sequence for one
/// contact at one domain.
///
/// Priority:
/// 1. the static hint for the domain, if any (folded into a fallback variant
///    when textually identical to one);
/// 2. patterns previously confirmed for the domain, by descending usage count
///    with discovery-order ties (stable sort);
/// 3. the fixed fallbacks in canonical order.
///
/// First occurrence wins on reoccurrence.
pub fn candidate_patterns(hint: Option<&str>, learned: &[(PatternKey, u32)]) -> Vec<PatternKey> {
    let mut ordered = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |key: PatternKey, list: &mut Vec<PatternKey>, seen: &mut HashSet<PatternKey>| {
        if seen.insert(key.clone()) {
            list.push(key);
        }
    };

    if let Some(h) = hint {
        let key = PatternKey::from_hint(h);
        if !key.template().is_empty() {
            push(key, &mut ordered, &mut seen);
        }
    }

    let mut by_usage: Vec<&(PatternKey, u32)> = learned.iter().collect();
    by_usage.sort_by(|a, b| b.1.cmp(&a.1));
    for (key, _) in by_usage {
        push(key.clone(), &mut ordered, &mut seen);
    }

    for key in &FALLBACK_PATTERNS {
        push(key.clone(), &mut ordered, &mut seen);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fallbacks() {
        assert_eq!(PatternKey::FirstOnly.render("Jane", "Doe"), "jane");
        assert_eq!(PatternKey::FirstDotLast.render("Jane", "Doe"), "jane.doe");
        assert_eq!(
            PatternKey::FirstUnderscoreLast.render("Jane", "Doe"),
            "jane_doe"
        );
        assert_eq!(
            PatternKey::FirstInitialDotLast.render("Jane", "Doe"),
            "j.doe"
        );
    }

    #[test]
    fn test_render_sanitizes_names() {
        assert_eq!(
            PatternKey::FirstDotLast.render("  Jean-Luc ", "O'Malley"),
            "jean-luc.o'malley"
        );
        assert_eq!(
            PatternKey::FirstDotLast.render("John%$", "Doe JR."),
            "john.doejr"
        );
    }

    #[test]
    fn test_render_empty_names_yield_empty() {
        assert_eq!(PatternKey::FirstDotLast.render("", "Doe"), "");
        assert_eq!(PatternKey::FirstDotLast.render("Jane", "  "), "");
        assert_eq!(PatternKey::FirstDotLast.render("$%^", "Doe"), "");
    }

    #[test]
    fn test_render_malformed_custom_yields_empty() {
        let key = PatternKey::Custom("{first}.{unknown}".to_string());
        assert_eq!(key.render("Jane", "Doe"), "");
        let unclosed = PatternKey::Custom("{first".to_string());
        assert_eq!(unclosed.render("Jane", "Doe"), "");
    }

    #[test]
    fn test_render_custom() {
        let key = PatternKey::Custom("{last}.{first}".to_string());
        assert_eq!(key.render("Jane", "Doe"), "doe.jane");
        let literal = PatternKey::Custom("info".to_string());
        assert_eq!(literal.render("Jane", "Doe"), "info");
    }

    #[test]
    fn test_parse_folds_fallbacks() {
        assert_eq!(
            PatternKey::parse("{first}.{last}"),
            PatternKey::FirstDotLast
        );
        assert_eq!(PatternKey::parse("first.last"), PatternKey::FirstDotLast);
        assert_eq!(PatternKey::parse("first"), PatternKey::FirstOnly);
        assert_eq!(PatternKey::parse("f.last"), PatternKey::FirstInitialDotLast);
        assert_eq!(
            PatternKey::parse("first_last"),
            PatternKey::FirstUnderscoreLast
        );
        assert_eq!(
            PatternKey::parse("{last}{firstInitial}"),
            PatternKey::Custom("{last}{firstInitial}".to_string())
        );
    }

    #[test]
    fn test_from_hint_strips_domain() {
        assert_eq!(
            PatternKey::from_hint("{first}.{last}@acme.com"),
            PatternKey::FirstDotLast
        );
        assert_eq!(
            PatternKey::from_hint("{last}.{first}@acme.com"),
            PatternKey::Custom("{last}.{first}".to_string())
        );
    }

    #[test]
    fn test_candidates_hint_first_for_unseen_domain() {
        let candidates = candidate_patterns(Some("{last}.{first}@acme.com"), &[]);
        assert_eq!(
            candidates[0],
            PatternKey::Custom("{last}.{first}".to_string())
        );
        assert_eq!(&candidates[1..], &FALLBACK_PATTERNS);
    }

    #[test]
    fn test_candidates_hint_identical_to_fallback_consolidates() {
        let candidates = candidate_patterns(Some("{first}.{last}@acme.com"), &[]);
        assert_eq!(candidates[0], PatternKey::FirstDotLast);
        // The fallback must not reappear later in the sequence.
        assert_eq!(
            candidates
                .iter()
                .filter(|k| **k == PatternKey::FirstDotLast)
                .count(),
            1
        );
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn test_candidates_learned_sorted_by_usage_with_stable_ties() {
        let learned = vec![
            (PatternKey::FirstInitialDotLast, 2),
            (PatternKey::Custom("{last}".to_string()), 5),
            (PatternKey::FirstOnly, 2),
        ];
        let candidates = candidate_patterns(None, &learned);
        assert_eq!(candidates[0], PatternKey::Custom("{last}".to_string()));
        // Tie at count 2 keeps discovery order.
        assert_eq!(candidates[1], PatternKey::FirstInitialDotLast);
        assert_eq!(candidates[2], PatternKey::FirstOnly);
        // Remaining fallbacks follow, already-seen ones omitted.
        assert_eq!(candidates[3], PatternKey::FirstDotLast);
        assert_eq!(candidates[4], PatternKey::FirstUnderscoreLast);
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn test_candidates_no_hint_no_history_yields_fallbacks() {
        let candidates = candidate_patterns(None, &[]);
        assert_eq!(candidates, FALLBACK_PATTERNS.to_vec());
    }

    #[test]
    fn test_serde_round_trip() {
        for key in FALLBACK_PATTERNS
            .iter()
            .cloned()
            .chain([PatternKey::Custom("{last}.{first}".to_string())])
        {
            let json = serde_json::to_string(&key).unwrap();
            let back: PatternKey = serde_json::from_str(&json).unwrap();
            assert_eq!(back, key);
        }
    }
}
