//! Canonical form for login domains.

/// Normalize a raw domain string for storage and comparison.
///
/// Strips surrounding whitespace, a leading `http://`/`https://`
/// scheme, a leading `www.`, and trailing slashes, then lowercases.
/// Total: empty input yields empty output. Idempotent, so it is safe
/// to apply to values that were already stored normalized.
pub fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    let mut s = lowered.as_str();
    loop {
        let stripped = s
            .strip_prefix("https://")
            .or_else(|| s.strip_prefix("http://"))
            .or_else(|| s.strip_prefix("www."));
        match stripped {
            Some(rest) => s = rest,
            None => break,
        }
    }
    s.trim_end_matches('/').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_www_and_trailing_slash() {
        assert_eq!(normalize_domain("https://www.example.com/"), "example.com");
        assert_eq!(normalize_domain("http://example.com"), "example.com");
        assert_eq!(normalize_domain("www.payroll.acme.co.uk"), "payroll.acme.co.uk");
    }

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize_domain("  HTTPS://Example.COM/  "), "example.com");
        assert_eq!(normalize_domain("ACME.com"), "acme.com");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize_domain(""), "");
        assert_eq!(normalize_domain("   "), "");
        assert_eq!(normalize_domain("https://"), "");
    }

    #[test]
    fn is_idempotent() {
        for raw in [
            "HTTPS://WWW.Example.COM//",
            "www.www.example.com",
            "example.com",
            "  payroll.io/ ",
            "",
        ] {
            let once = normalize_domain(raw);
            assert_eq!(normalize_domain(&once), once, "not idempotent for {raw:?}");
        }
    }
}
