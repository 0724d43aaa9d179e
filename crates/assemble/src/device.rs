//! Device classification from the user-agent

use once_cell::sync::Lazy;
use regex::Regex;

static MOBILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)mobile|android|iphone|ipod|blackberry|iemobile|opera mini").unwrap()
});

static TABLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tablet|ipad|playbook|silk").unwrap());

/// Classify a user-agent as `mobile`, `tablet`, or `desktop`
///
/// Mobile is checked first so phone UAs that also mention a tablet token
/// stay mobile. A missing user-agent yields `None`.
pub fn classify_device(user_agent: Option<&str>) -> Option<&'static str> {
    let ua = user_agent?;
    if MOBILE.is_match(ua) {
        Some("mobile")
    } else if TABLET.is_match(ua) {
        Some("tablet")
    } else {
        Some("desktop")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_first() {
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile")),
            Some("mobile")
        );
        // Android tablets without "Mobile" classify as tablet
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (iPad; CPU OS 17_0) Tablet")),
            Some("tablet")
        );
    }

    #[test]
    fn test_desktop_fallback() {
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)")),
            Some("desktop")
        );
    }

    #[test]
    fn test_missing_ua() {
        assert_eq!(classify_device(None), None);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify_device(Some("SOMETHING ANDROID")), Some("mobile"));
    }
}
