//! # loveinthecity-deeplink
//!
//! Deep-link routing for LoveInTheCity.
//!
//! A deep link is a path-like identifier resolved to an in-app
//! destination, independent of how it was received (URL open, share link,
//! QR code). This crate provides:
//!
//! - an ordered registry of compiled path patterns (`/user/:id`, …) with
//!   deterministic first-match-wins resolution,
//! - authentication gating with per-route fallback paths,
//! - traffic-source classification (ads / referral / app / organic) from
//!   UTM parameters and the referrer,
//! - support-request synthesis: a templated, URL-encoded message handed to
//!   an external chat application through the [`ExternalOpener`] seam.
//!
//! Resolution never fails; every input maps to a destination path.

pub mod pattern;
pub mod router;
pub mod source;
pub mod support;

// ── re-exports ───────────────────────────────────────────────────────

pub use pattern::{RouteParams, RoutePattern};
pub use router::{
    DeepLinkConfig, DeepLinkRouter, HOME_PATH, LOGIN_PATH, NavigationCallback, RouteHandler,
    RouterConfig, SupportOrigin,
};
pub use source::{SourceType, VisitContext};
pub use support::{
    CurrentUser, DeviceContext, ExternalOpener, LogOpener, SUPPORT_CHAT_URL, SupportRequest,
    chat_url, render_message,
};
