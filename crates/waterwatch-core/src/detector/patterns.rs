use url::Url;

/// Default host patterns for recognized AI chat services
pub const DEFAULT_MATCH_PATTERNS: &[&str] = &[
    "*.openai.com",
    "*://claude.ai/*",
    "*://chat.mistral.ai/*",
    "*.deepseek.com",
    "*://www.perplexity.ai/*",
    "*://phind.com/*",
];

/// Ordered, immutable set of host-matching patterns.
///
/// Patterns use the extension match-pattern shape (`*://chat.openai.com/*`,
/// `*.openai.com`). Each reduces to a bare domain that matches itself and
/// any subdomain; the suffix check is dot-bounded so `openai.com` never
/// matches `openai.com.attacker.net`.
#[derive(Debug, Clone)]
pub struct MatchSet {
    domains: Vec<String>,
}

impl MatchSet {
    /// Build a match set from raw patterns. Patterns with no usable host
    /// part are dropped.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = patterns
            .into_iter()
            .filter_map(|pattern| normalize_pattern(pattern.as_ref()))
            .collect();
        Self { domains }
    }

    /// The built-in pattern set
    pub fn default_set() -> Self {
        Self::from_patterns(DEFAULT_MATCH_PATTERNS.iter().copied())
    }

    /// Whether `raw` points at a recognized service. Unparsable URLs and
    /// URLs without a hostname never match.
    pub fn matches_url(&self, raw: &str) -> bool {
        match Url::parse(raw) {
            Ok(url) => url
                .host_str()
                .map(|host| self.matches_host(host))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Dot-bounded host comparison: the host equals a domain or ends with
    /// `.` + domain.
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.domains.iter().any(|domain| {
            host == *domain
                || (host.len() > domain.len()
                    && host.ends_with(domain.as_str())
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        })
    }

    /// Number of usable domains in the set
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the set has no usable domains
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Reduce a match pattern to its bare domain: strip the scheme wildcard,
/// anything from the first `/` (including a trailing `/*`), and a leading
/// `*.`. Returns `None` when nothing usable remains.
fn normalize_pattern(pattern: &str) -> Option<String> {
    let mut rest = pattern.trim();
    if let Some(stripped) = rest.strip_prefix("*://") {
        rest = stripped;
    } else if let Some(pos) = rest.find("://") {
        rest = &rest[pos + 3..];
    }
    if let Some(pos) = rest.find('/') {
        rest = &rest[..pos];
    }
    if let Some(stripped) = rest.strip_prefix("*.") {
        rest = stripped;
    }
    let domain = rest.trim().to_ascii_lowercase();
    if domain.is_empty() || domain == "*" {
        None
    } else {
        Some(domain)
    }
}
