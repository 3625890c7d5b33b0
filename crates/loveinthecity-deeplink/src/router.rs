//! Deep-link router.
//!
//! Resolves path-like identifiers (URL opens, share links, QR codes) to
//! in-app destinations through an ordered pattern registry, gating on a
//! single `authenticated` flag. Matched support routes synthesize an
//! outbound [`SupportRequest`] and hand it to the external chat link.
//!
//! Resolution never fails: unknown routes, unparseable URLs, and
//! auth-gated routes all resolve to a fallback path.
//!
//! # Example
//!
//! ```rust
//! use loveinthecity_deeplink::{DeepLinkRouter, RouterConfig};
//!
//! let mut router = DeepLinkRouter::new(RouterConfig::default());
//! assert_eq!(router.handle_deep_link("/#/user/42"), "/login");
//!
//! router.set_authenticated(true);
//! assert_eq!(router.handle_deep_link("/#/user/42"), "/user/42");
//! ```

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};
use url::Url;

use crate::pattern::{RouteParams, RoutePattern};
use crate::source::VisitContext;
use crate::support::{
    CurrentUser, DeviceContext, ExternalOpener, LogOpener, SUPPORT_CHAT_URL, SourceTracking,
    SupportChannel, SupportContext, SupportRequest, chat_url, render_message,
};

/// Destination for unauthenticated visitors.
pub const LOGIN_PATH: &str = "/login";

/// Destination for authenticated visitors with nowhere better to go.
pub const HOME_PATH: &str = "/";

// ---------------------------------------------------------------------------
// Route configuration
// ---------------------------------------------------------------------------

/// Side effect attached to a route.
#[derive(Clone)]
pub enum RouteHandler {
    /// Funnel into support-request synthesis with the given origin.
    Support(SupportOrigin),
    /// Arbitrary callback invoked with the bound parameters.
    Custom(Arc<dyn Fn(&RouteParams) + Send + Sync>),
}

/// How a support deep link was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportOrigin {
    /// Plain `/support/:issueType` link.
    DeepLink,
    /// Scanned `/support/qr/:issueType` code.
    QrCode,
    /// `/support/:issueType/:source` — the origin is the bound `:source`.
    PathParam,
}

/// A registered deep-link route.
#[derive(Clone)]
pub struct DeepLinkConfig {
    /// Pattern with literal and `:name` segments.
    pub path: String,
    pub requires_auth: bool,
    /// Redirect target when auth is required but absent.
    pub fallback: Option<String>,
    pub handler: Option<RouteHandler>,
}

impl DeepLinkConfig {
    /// A public route at `path` with no fallback and no handler.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            requires_auth: false,
            fallback: None,
            handler: None,
        }
    }

    /// Gate the route on authentication.
    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Redirect target used instead of the login path when gated.
    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback = Some(path.into());
        self
    }

    /// Attach a side-effecting callback, invoked on match independent of
    /// navigation.
    pub fn with_handler(mut self, handler: impl Fn(&RouteParams) + Send + Sync + 'static) -> Self {
        self.handler = Some(RouteHandler::Custom(Arc::new(handler)));
        self
    }

    fn with_support(mut self, origin: SupportOrigin) -> Self {
        self.handler = Some(RouteHandler::Support(origin));
        self
    }
}

/// Router construction parameters.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origin prefixed onto generated share links.
    pub origin: String,
    /// External chat link support requests are handed to.
    pub support_chat_url: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            origin: "https://loveinthecity.app".to_string(),
            support_chat_url: SUPPORT_CHAT_URL.to_string(),
        }
    }
}

/// Invoked with the resolved path after a successful match.
pub type NavigationCallback = Box<dyn FnMut(&str) + Send>;

// ---------------------------------------------------------------------------
// DeepLinkRouter
// ---------------------------------------------------------------------------

/// Registry of path patterns with match-and-dispatch, auth gating, and
/// support-request synthesis.
///
/// One instance is shared per process, constructed by the application
/// context and handed to consumers.
pub struct DeepLinkRouter {
    routes: Vec<(RoutePattern, DeepLinkConfig)>,
    authenticated: bool,
    session_id: String,
    current_user: Option<CurrentUser>,
    visit: VisitContext,
    device: DeviceContext,
    navigation: Option<NavigationCallback>,
    opener: Box<dyn ExternalOpener>,
    config: RouterConfig,
    support_log: Vec<SupportRequest>,
}

impl Default for DeepLinkRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl DeepLinkRouter {
    /// Create a router with the default route set registered.
    pub fn new(config: RouterConfig) -> Self {
        let mut router = Self {
            routes: Vec::new(),
            authenticated: false,
            session_id: generate_session_id(),
            current_user: None,
            visit: VisitContext::default(),
            device: DeviceContext::detect(),
            navigation: None,
            opener: Box::new(LogOpener),
            config,
            support_log: Vec::new(),
        };
        router.register_default_links();
        debug!(
            session_id = %router.session_id,
            routes = router.routes.len(),
            "deep link router initialized"
        );
        router
    }

    /// Replace the external-open seam (the shell supplies the real one).
    pub fn with_opener(mut self, opener: Box<dyn ExternalOpener>) -> Self {
        self.opener = opener;
        self
    }

    fn register_default_links(&mut self) {
        for path in [
            HOME_PATH,
            "/home",
            "/community",
            "/community/:communityId",
            "/choose",
            "/hotel",
            "/hotel/:hotelId",
            "/mine",
            "/vip",
            "/messages",
            "/messages/:conversationId",
            "/user/:id",
        ] {
            self.register(
                DeepLinkConfig::new(path)
                    .requires_auth()
                    .with_fallback(LOGIN_PATH),
            );
        }

        self.register(DeepLinkConfig::new(LOGIN_PATH));
        self.register(DeepLinkConfig::new("/signup"));

        // The QR variant is registered before the two-param variant so that
        // /support/qr/... resolves as a QR scan rather than binding
        // issueType="qr".
        self.register(
            DeepLinkConfig::new("/support/qr/:issueType").with_support(SupportOrigin::QrCode),
        );
        self.register(
            DeepLinkConfig::new("/support/:issueType").with_support(SupportOrigin::DeepLink),
        );
        self.register(
            DeepLinkConfig::new("/support/:issueType/:source")
                .with_support(SupportOrigin::PathParam),
        );
    }

    /// Register a route. Re-registering an existing pattern replaces its
    /// config in place, preserving its match priority.
    pub fn register(&mut self, config: DeepLinkConfig) {
        match self.routes.iter_mut().find(|(p, _)| p.raw() == config.path) {
            Some(entry) => entry.1 = config,
            None => {
                let pattern = RoutePattern::compile(&config.path);
                self.routes.push((pattern, config));
            }
        }
    }

    // ── pushed-in state ──────────────────────────────────────────────

    /// Set the authentication flag consulted for gating.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Set (or clear) the user context support requests are built from.
    pub fn set_current_user(&mut self, user: Option<CurrentUser>) {
        match &user {
            Some(user) => debug!(
                name = user.name.as_deref().unwrap_or("Anonymous"),
                "user context set"
            ),
            None => debug!("user context cleared"),
        }
        self.current_user = user;
    }

    /// Set the landing URL / referrer used for source classification.
    pub fn set_visit_context(&mut self, visit: VisitContext) {
        self.visit = visit;
    }

    /// Override the device snapshot attached to support requests.
    pub fn set_device_context(&mut self, device: DeviceContext) {
        self.device = device;
    }

    /// Register the navigation callback invoked with resolved paths.
    pub fn set_navigation_callback(&mut self, callback: NavigationCallback) {
        self.navigation = Some(callback);
        debug!("navigation callback registered");
    }

    /// Tracking id for this router's lifetime.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// All registered pattern strings, in match priority order.
    pub fn registered_paths(&self) -> Vec<&str> {
        self.routes.iter().map(|(p, _)| p.raw()).collect()
    }

    /// Whether the route matching `path` is auth-gated (false when no
    /// route matches).
    pub fn requires_auth(&self, path: &str) -> bool {
        self.find_match(path)
            .map(|(idx, _)| self.routes[idx].1.requires_auth)
            .unwrap_or(false)
    }

    /// Support requests synthesized so far, oldest first.
    pub fn support_log(&self) -> &[SupportRequest] {
        &self.support_log
    }

    // ── resolution ───────────────────────────────────────────────────

    /// Resolve `url` to an in-app destination.
    ///
    /// The leading `#` fragment, when present, is the effective path
    /// (hash-based routing). Unknown routes and parse failures resolve to
    /// `/` when authenticated and the login path otherwise; auth-gated
    /// routes resolve to their fallback without invoking the handler or
    /// navigation callback.
    pub fn handle_deep_link(&mut self, url: &str) -> String {
        let Some(path) = effective_path(url) else {
            warn!(url, "unparseable deep link");
            return self.no_match_fallback();
        };
        debug!(url, path = %path, authenticated = self.authenticated, "handling deep link");

        let Some((idx, params)) = self.find_match(&path) else {
            debug!(path = %path, "no matching route");
            return self.no_match_fallback();
        };

        let config = &self.routes[idx].1;
        if config.requires_auth && !self.authenticated {
            let fallback = config
                .fallback
                .clone()
                .unwrap_or_else(|| LOGIN_PATH.to_string());
            debug!(path = %path, fallback = %fallback, "route requires authentication");
            return fallback;
        }

        if let Some(handler) = config.handler.clone() {
            match handler {
                RouteHandler::Support(origin) => self.handle_support_request(&params, origin),
                RouteHandler::Custom(callback) => callback(&params),
            }
        }

        if let Some(navigation) = self.navigation.as_mut() {
            navigation(&path);
        }
        path
    }

    /// Substitute `:name` placeholders in `path` and prefix the
    /// application's hash-routing origin.
    pub fn generate_share_link(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut link = path.to_string();
        for (name, value) in params {
            link = link.replace(&format!(":{name}"), value);
        }
        format!("{}/#{}", self.config.origin.trim_end_matches('/'), link)
    }

    /// Shareable support link for the given issue and source page.
    pub fn support_link(&self, issue_type: &str, source: &str) -> String {
        self.generate_share_link(
            "/support/:issueType/:source",
            &[("issueType", issue_type), ("source", source)],
        )
    }

    /// Resolve a support deep link as if it had been opened.
    pub fn trigger_support(&mut self, issue_type: &str, source: &str) -> String {
        self.handle_deep_link(&format!("/support/{issue_type}/{source}"))
    }

    // ── internals ────────────────────────────────────────────────────

    fn no_match_fallback(&self) -> String {
        if self.authenticated {
            HOME_PATH.to_string()
        } else {
            LOGIN_PATH.to_string()
        }
    }

    fn find_match(&self, path: &str) -> Option<(usize, RouteParams)> {
        self.routes
            .iter()
            .enumerate()
            .find_map(|(idx, (pattern, _))| pattern.matches(path).map(|params| (idx, params)))
    }

    /// Synthesize a support request and open the chat link. No-op (logged)
    /// without a current-user context.
    fn handle_support_request(&mut self, params: &RouteParams, origin: SupportOrigin) {
        let Some(user) = self.current_user.clone() else {
            warn!("no user context available for support request");
            return;
        };

        let (source_type, source_url) = self.visit.classify();
        let issue_type = params
            .get("issueType")
            .cloned()
            .unwrap_or_else(|| "general".to_string());

        let origin_label = match origin {
            SupportOrigin::DeepLink => "deep_link".to_string(),
            SupportOrigin::QrCode => "qr_code".to_string(),
            SupportOrigin::PathParam => params
                .get("source")
                .cloned()
                .unwrap_or_else(|| "deep_link".to_string()),
        };
        let mut query_params = params.clone();
        query_params.insert("source".to_string(), origin_label);

        let request = SupportRequest {
            id: generate_request_id(),
            user_id: user.id.clone().unwrap_or_else(|| "unknown".to_string()),
            user_name: user.name.clone().unwrap_or_else(|| "Anonymous".to_string()),
            user_email: user
                .email
                .clone()
                .or_else(|| params.get("email").cloned())
                .unwrap_or_else(|| "not-provided".to_string()),
            issue_type,
            source_url,
            source_type,
            timestamp: Utc::now().to_rfc3339(),
            user_agent: self.device.user_agent.clone(),
            session_id: self.session_id.clone(),
            support: SupportChannel {
                contact_info: format!(
                    "{} | {}",
                    user.email.as_deref().unwrap_or("no-email"),
                    user.phone.as_deref().unwrap_or("no-phone"),
                ),
                preferred_channel: params
                    .get("channel")
                    .cloned()
                    .unwrap_or_else(|| "telegram".to_string()),
            },
            context: SupportContext {
                device: self.device.clone(),
                url: self.visit.url.clone(),
                referrer: self.visit.referrer.clone(),
                page: self.visit.page(),
                query_params,
                source_tracking: SourceTracking {
                    referrer: self.visit.referrer.clone(),
                    direct: self.visit.referrer.is_empty(),
                    utm_source: self.visit.query_param("utm_source"),
                    utm_medium: self.visit.query_param("utm_medium"),
                    utm_campaign: self.visit.query_param("utm_campaign"),
                },
                user_profile: user,
            },
        };

        info!(
            request_id = %request.id,
            issue = %request.issue_type,
            source = %request.source_type,
            "support request synthesized"
        );

        let message = render_message(&request);
        let link = chat_url(&self.config.support_chat_url, &message);
        self.support_log.push(request);
        self.opener.open(&link);
    }
}

// ---------------------------------------------------------------------------
// Path normalization
// ---------------------------------------------------------------------------

/// Extract the effective in-app path from a deep-link URL.
///
/// A `#` fragment, when present, is the path (hash-based routing);
/// otherwise the URL path itself is used. Query strings are ignored for
/// matching. Returns `None` for URLs with no usable path.
fn effective_path(url: &str) -> Option<String> {
    if let Some((_, fragment)) = url.split_once('#') {
        return Some(normalize(fragment));
    }

    match Url::parse(url) {
        Ok(parsed) if parsed.cannot_be_a_base() => None,
        Ok(parsed) => Some(parsed.path().to_string()),
        // Not an absolute URL: treat the input as a bare path.
        Err(_) => Some(normalize(url)),
    }
}

fn normalize(path: &str) -> String {
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return HOME_PATH.to_string();
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

const ID_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ID_DIGITS[rng.random_range(0..ID_DIGITS.len())] as char)
        .collect()
}

fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        Utc::now().timestamp_millis(),
        random_suffix(9)
    )
}

fn generate_request_id() -> String {
    format!("req_{}_{}", Utc::now().timestamp_millis(), random_suffix(6))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
