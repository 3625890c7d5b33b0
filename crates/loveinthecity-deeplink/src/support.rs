//! Support-request synthesis and the outbound chat hand-off.
//!
//! A [`SupportRequest`] is an ephemeral record bundling user identity,
//! issue type, traffic-source classification, and a device snapshot. It is
//! never persisted; it exists only to render a human-readable message and
//! hand it to an external chat application as a URL-encoded link. The
//! contract ends at producing the encoded URL and invoking
//! [`ExternalOpener::open`].

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::pattern::RouteParams;
use crate::source::SourceType;

/// Fixed external chat link support requests are handed to.
pub const SUPPORT_CHAT_URL: &str = "https://t.me/+5n1XeNZl39VkYzU0";

// ---------------------------------------------------------------------------
// Context records
// ---------------------------------------------------------------------------

/// The user on whose behalf support requests are synthesized.
///
/// Every field the support path reads is explicit and optional, so absent
/// attributes render as their documented placeholders instead of drifting
/// silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub residence: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<String>,
}

/// Device/browser snapshot attached to support requests.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_resolution: String,
}

impl DeviceContext {
    /// Fill in what the process can know about itself; the shell overrides
    /// the rest.
    pub fn detect() -> Self {
        Self {
            user_agent: format!("loveinthecity/{}", env!("CARGO_PKG_VERSION")),
            platform: std::env::consts::OS.to_string(),
            ..Self::default()
        }
    }
}

/// UTM breakdown recorded alongside the classification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTracking {
    pub referrer: String,
    pub direct: bool,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

/// Preferred contact channel for the requester.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportChannel {
    pub contact_info: String,
    pub preferred_channel: String,
}

/// Everything surrounding the request: device, page, params, attribution,
/// and a profile snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportContext {
    pub device: DeviceContext,
    pub url: String,
    pub referrer: String,
    pub page: String,
    pub query_params: RouteParams,
    pub source_tracking: SourceTracking,
    pub user_profile: CurrentUser,
}

/// Ephemeral record synthesized per outbound support action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportRequest {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub issue_type: String,
    pub source_url: String,
    pub source_type: SourceType,
    pub timestamp: String,
    pub user_agent: String,
    pub session_id: String,
    pub support: SupportChannel,
    pub context: SupportContext,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the templated, human-readable support message.
pub fn render_message(request: &SupportRequest) -> String {
    let context = serde_json::to_string_pretty(request)
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        "Support Request Logged\n\
         \n\
         Request ID: {id}\n\
         User: {name} ({user_id})\n\
         Issue: {issue}\n\
         Source: {source}\n\
         Time: {time}\n\
         Session: {session}\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Please assist with this request.",
        id = request.id,
        name = request.user_name,
        user_id = request.user_id,
        issue = request.issue_type.to_uppercase(),
        source = request.source_type,
        time = request.timestamp,
        session = request.session_id,
    )
}

/// Build the outbound chat URL with `message` URL-encoded as the `text`
/// query parameter.
pub fn chat_url(base: &str, message: &str) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("text", message);
            url.to_string()
        }
        Err(_) => {
            let encoded: String =
                url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
            format!("{base}?text={encoded}")
        }
    }
}

// ---------------------------------------------------------------------------
// External navigation seam
// ---------------------------------------------------------------------------

/// Opens a URL in an external context (the "open in new tab" boundary).
///
/// Delivery, read receipts, and replies are out of contract; the core's
/// responsibility ends at invoking this with a correctly encoded URL.
pub trait ExternalOpener: Send {
    fn open(&self, url: &str);
}

/// Default opener: records the outbound link in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOpener;

impl ExternalOpener for LogOpener {
    fn open(&self, url: &str) {
        info!(url, "opening external link");
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> SupportRequest {
        SupportRequest {
            id: "req_1_abc123".to_string(),
            user_id: "USER_A".to_string(),
            user_name: "Ana".to_string(),
            user_email: "ana@example.com".to_string(),
            issue_type: "vip".to_string(),
            source_url: "https://loveinthecity.app/".to_string(),
            source_type: SourceType::Organic,
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            user_agent: "test".to_string(),
            session_id: "session_1_xyz".to_string(),
            support: SupportChannel {
                contact_info: "ana@example.com | no-phone".to_string(),
                preferred_channel: "telegram".to_string(),
            },
            context: SupportContext {
                device: DeviceContext::default(),
                url: "https://loveinthecity.app/".to_string(),
                referrer: String::new(),
                page: "/".to_string(),
                query_params: RouteParams::new(),
                source_tracking: SourceTracking {
                    referrer: String::new(),
                    direct: true,
                    utm_source: None,
                    utm_medium: None,
                    utm_campaign: None,
                },
                user_profile: CurrentUser::default(),
            },
        }
    }

    #[test]
    fn message_carries_identity_and_context() {
        let message = render_message(&sample_request());
        assert!(message.contains("Request ID: req_1_abc123"));
        assert!(message.contains("User: Ana (USER_A)"));
        assert!(message.contains("Issue: VIP"));
        assert!(message.contains("Source: organic"));
        assert!(message.contains("\"preferredChannel\": \"telegram\""));
    }

    #[test]
    fn chat_url_encodes_the_message() {
        let url = chat_url(SUPPORT_CHAT_URL, "hello world & more");
        assert!(url.starts_with("https://t.me/"));
        assert!(url.contains("text=hello+world+%26+more"));
    }

    #[test]
    fn chat_url_survives_an_unparseable_base() {
        let url = chat_url("t.me/support", "hi there");
        assert_eq!(url, "t.me/support?text=hi+there");
    }

    #[test]
    fn request_serializes_camel_case() {
        let json = serde_json::to_value(sample_request()).unwrap();
        assert_eq!(json["sourceType"], "organic");
        assert_eq!(json["support"]["preferredChannel"], "telegram");
        assert!(json["context"]["sourceTracking"]["direct"].as_bool().unwrap());
    }
}
