//! User-agent device classification.
//!
//! Pure string matching against two curated pattern sets; no state, safe to
//! call from any thread. Unknown or absent agents classify as desktop so the
//! server-rendered fallback stays usable.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
        }
    }
}

const MOBILE_PATTERNS: &[&str] = &[
    // iOS
    "iPhone",
    "iPod",
    "iPad",
    "iOS",
    // Android
    "Android",
    "Mobile.*Android",
    // Windows Phone
    "Windows Phone",
    "Windows Mobile",
    // BlackBerry
    "BlackBerry",
    "BB10",
    // Mobile browsers
    "Mobile Safari",
    "Opera Mini",
    "Opera Mobi",
    "Mobile.*Firefox",
    "Mobile.*Chrome",
    // Tablets (treated as mobile for UI purposes)
    "Tablet",
    "Kindle",
    "Silk",
    // Other mobile indicators
    "Mobile",
    "webOS",
    "Palm",
    "Fennec",
    "Maemo",
    "Symbian",
    "J2ME",
    "MIDP",
    "CLDC",
    // Specific mobile browsers
    "UCWEB",
    "UCBrowser",
    "MicroMessenger",
    "QQBrowser.*Mobile",
    "Baiduspider.*mobile",
    // WebView marker
    "wv",
    "Mobile.*wv",
];

const DESKTOP_PATTERNS: &[&str] = &[
    "Windows NT",
    "Macintosh",
    "Linux.*x86_64",
    "X11.*Linux",
    "Win64",
    "WOW64",
];

const DESKTOP_BROWSERS: &[&str] = &["chrome", "firefox", "safari", "edge", "opera"];

static MOBILE_RE: Lazy<Regex> = Lazy::new(|| joined(MOBILE_PATTERNS));
static DESKTOP_RE: Lazy<Regex> = Lazy::new(|| joined(DESKTOP_PATTERNS));

fn joined(patterns: &[&str]) -> Regex {
    let alternation = patterns
        .iter()
        .map(|p| format!("({p})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}")).expect("device pattern regex")
}

pub fn is_mobile(user_agent: Option<&str>) -> bool {
    let Some(ua) = user_agent.filter(|ua| !ua.is_empty()) else {
        return false;
    };
    if MOBILE_RE.is_match(ua) {
        return true;
    }
    // "Mobile" anywhere, as long as no desktop marker contradicts it.
    let lower = ua.to_lowercase();
    if lower.contains("mobile") && !DESKTOP_RE.is_match(ua) {
        return true;
    }
    false
}

pub fn is_desktop(user_agent: Option<&str>) -> bool {
    let Some(ua) = user_agent.filter(|ua| !ua.is_empty()) else {
        return true;
    };
    if DESKTOP_RE.is_match(ua) && !MOBILE_RE.is_match(ua) {
        return true;
    }
    if !MOBILE_RE.is_match(ua) {
        let lower = ua.to_lowercase();
        if DESKTOP_BROWSERS.iter().any(|b| lower.contains(b)) && !lower.contains("mobile") {
            return true;
        }
    }
    false
}

/// Mobile detection wins; everything else defaults to desktop.
pub fn classify(user_agent: Option<&str>) -> DeviceClass {
    if is_mobile(user_agent) {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOBILE_AGENTS: &[&str] = &[
        "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15",
        "Mozilla/5.0 (iPad; CPU OS 13_3 like Mac OS X) AppleWebKit/605.1.15",
        "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 Mobile Safari/537.36",
        "Mozilla/5.0 (Windows Phone 10.0; Android 6.0.1)",
        "Mozilla/5.0 (BlackBerry; U; BlackBerry 9900)",
        "Opera/9.80 (J2ME/MIDP; Opera Mini/9.80)",
        "Mozilla/5.0 (Linux; U; Android 4.4.2) Silk/44.1.54",
    ];

    const DESKTOP_AGENTS: &[&str] = &[
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
        "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36",
    ];

    #[test]
    fn known_mobile_agents_classify_mobile() {
        for ua in MOBILE_AGENTS {
            assert_eq!(classify(Some(ua)), DeviceClass::Mobile, "agent: {ua}");
        }
    }

    #[test]
    fn known_desktop_agents_classify_desktop() {
        for ua in DESKTOP_AGENTS {
            assert_eq!(classify(Some(ua)), DeviceClass::Desktop, "agent: {ua}");
        }
    }

    #[test]
    fn absent_or_empty_agent_defaults_to_desktop() {
        assert_eq!(classify(None), DeviceClass::Desktop);
        assert_eq!(classify(Some("")), DeviceClass::Desktop);
        assert!(is_desktop(None));
        assert!(!is_mobile(None));
    }

    #[test]
    fn mobile_marker_without_desktop_marker_wins() {
        assert_eq!(classify(Some("SomethingMobileish mobile")), DeviceClass::Mobile);
    }

    #[test]
    fn unknown_agent_defaults_to_desktop() {
        assert_eq!(classify(Some("curl/8.4.0")), DeviceClass::Desktop);
    }
}
