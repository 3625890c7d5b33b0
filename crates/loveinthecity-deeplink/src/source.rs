//! Traffic-source classification.
//!
//! Buckets a visit into ads / referral / app / organic from its UTM query
//! parameters and referrer, in that precedence order. The visit context is
//! pushed in by the shell; nothing here inspects global state.

use serde::Serialize;
use url::Url;

/// How the visit arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Ads,
    Referral,
    App,
    Organic,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ads => "ads",
            Self::Referral => "referral",
            Self::App => "app",
            Self::Organic => "organic",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Referrers bucketed as search traffic (organic).
const SEARCH_ENGINES: &[&str] = &["google", "bing"];

/// Referrers bucketed with search rather than referral traffic.
const SOCIAL_REFERRERS: &[&str] = &["facebook"];

/// Where the visit landed and came from.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    /// Current page href, including any UTM query parameters.
    pub url: String,
    /// Referrer URL; empty for direct visits.
    pub referrer: String,
}

impl VisitContext {
    /// A query parameter of the landing URL, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Hostname of the landing URL, if it parses.
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()?
            .host_str()
            .map(str::to_string)
    }

    /// Path of the landing URL, or `/` when it does not parse.
    pub fn page(&self) -> String {
        Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }

    /// Classify the visit and report the attributed source URL
    /// (the referrer, falling back to the landing URL for direct visits).
    ///
    /// Precedence: paid UTM, explicit referral UTM, same-origin referrer,
    /// external non-search referrer, organic (search engines, social, and
    /// direct visits).
    pub fn classify(&self) -> (SourceType, String) {
        let utm_source = self.query_param("utm_source").unwrap_or_default();
        let utm_medium = self.query_param("utm_medium").unwrap_or_default();
        let referrer = self.referrer.as_str();

        let source_type = if utm_medium == "paid" || utm_source.contains("ads") {
            SourceType::Ads
        } else if utm_source == "referral" || utm_medium == "referral" {
            SourceType::Referral
        } else if !referrer.is_empty()
            && self.hostname().is_some_and(|host| referrer.contains(&host))
        {
            SourceType::App
        } else if !referrer.is_empty()
            && !SEARCH_ENGINES.iter().any(|s| referrer.contains(s))
            && !SOCIAL_REFERRERS.iter().any(|s| referrer.contains(s))
        {
            SourceType::Referral
        } else {
            SourceType::Organic
        };

        let source_url = if referrer.is_empty() {
            self.url.clone()
        } else {
            referrer.to_string()
        };
        (source_type, source_url)
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(url: &str, referrer: &str) -> VisitContext {
        VisitContext {
            url: url.to_string(),
            referrer: referrer.to_string(),
        }
    }

    #[test]
    fn direct_visit_is_organic() {
        let (source, url) = visit("https://loveinthecity.app/", "").classify();
        assert_eq!(source, SourceType::Organic);
        assert_eq!(url, "https://loveinthecity.app/");
    }

    #[test]
    fn paid_utm_wins_regardless_of_referrer() {
        let (source, _) = visit(
            "https://loveinthecity.app/?utm_medium=paid",
            "https://news.example.com/article",
        )
        .classify();
        assert_eq!(source, SourceType::Ads);
    }

    #[test]
    fn utm_source_containing_ads_is_ads() {
        let (source, _) =
            visit("https://loveinthecity.app/?utm_source=fb_ads", "").classify();
        assert_eq!(source, SourceType::Ads);
    }

    #[test]
    fn explicit_referral_utm_is_referral() {
        let (source, _) =
            visit("https://loveinthecity.app/?utm_medium=referral", "").classify();
        assert_eq!(source, SourceType::Referral);

        let (source, _) =
            visit("https://loveinthecity.app/?utm_source=referral", "").classify();
        assert_eq!(source, SourceType::Referral);
    }

    #[test]
    fn same_origin_referrer_is_app() {
        let (source, url) = visit(
            "https://loveinthecity.app/home",
            "https://loveinthecity.app/vip",
        )
        .classify();
        assert_eq!(source, SourceType::App);
        assert_eq!(url, "https://loveinthecity.app/vip");
    }

    #[test]
    fn external_referrer_is_referral() {
        let (source, _) = visit(
            "https://loveinthecity.app/",
            "https://blog.example.com/dating-apps",
        )
        .classify();
        assert_eq!(source, SourceType::Referral);
    }

    #[test]
    fn search_engine_referrer_is_organic() {
        for referrer in ["https://www.google.com/search?q=x", "https://www.bing.com/"] {
            let (source, _) = visit("https://loveinthecity.app/", referrer).classify();
            assert_eq!(source, SourceType::Organic, "referrer: {referrer}");
        }
    }

    #[test]
    fn social_referrer_is_organic() {
        let (source, _) =
            visit("https://loveinthecity.app/", "https://m.facebook.com/").classify();
        assert_eq!(source, SourceType::Organic);
    }

    #[test]
    fn unparseable_landing_url_still_classifies() {
        let (source, _) = visit("not a url", "").classify();
        assert_eq!(source, SourceType::Organic);
    }
}
