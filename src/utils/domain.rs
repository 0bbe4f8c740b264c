//! Derivation of a company's mail domain from its free-text name.

/// Derives the assumed mail domain for a company: the lowercased name with
/// all whitespace stripped, suffixed `.com`.
///
/// This mirrors the convention the rest of the pipeline indexes hint and
/// pattern data by; it is a keying rule, not a claim the domain exists.
/// Returns an empty string for a blank company name.
pub fn company_domain(company: &str) -> String {
    let compact: String = company
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        tracing::warn!("Received empty company name for domain derivation.");
        return String::new();
    }
    format!("{}.com", compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_domain_basic() {
        assert_eq!(company_domain("Acme"), "acme.com");
        assert_eq!(company_domain("Acme Corp"), "acmecorp.com");
        assert_eq!(company_domain("  Blue Sky Labs  "), "blueskylabs.com");
    }

    #[test]
    fn test_company_domain_preserves_punctuation() {
        assert_eq!(company_domain("O'Neill & Sons"), "o'neill&sons.com");
    }

    #[test]
    fn test_company_domain_empty() {
        assert_eq!(company_domain(""), "");
        assert_eq!(company_domain("   "), "");
    }
}
