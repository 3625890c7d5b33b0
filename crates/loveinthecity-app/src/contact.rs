//! Contact hand-off to external chat applications.
//!
//! "Messaging" is a pre-filled text blob deep-linked into a third-party
//! chat app. The composer validates the form, renders the message preview,
//! copies it to the clipboard, and only then opens the platform link —
//! callers can rely on the clipboard write being issued before the
//! external open.

use thiserror::Error;
use tracing::debug;

use loveinthecity_deeplink::ExternalOpener;

// ---------------------------------------------------------------------------
// Issue catalog
// ---------------------------------------------------------------------------

/// Supported support/contact issue types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Inquiry,
    Reserve,
    Support,
    Vip,
    Password,
    Verification,
    Report,
    Videos,
    Pin,
    Funding,
    Announcements,
}

impl IssueKind {
    /// All issue kinds, in display order.
    pub const ALL: &'static [IssueKind] = &[
        Self::Inquiry,
        Self::Reserve,
        Self::Support,
        Self::Vip,
        Self::Password,
        Self::Verification,
        Self::Report,
        Self::Videos,
        Self::Pin,
        Self::Funding,
        Self::Announcements,
    ];

    /// The key used in deep links and query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Reserve => "reserve",
            Self::Support => "support",
            Self::Vip => "vip",
            Self::Password => "password",
            Self::Verification => "verification",
            Self::Report => "report",
            Self::Videos => "videos",
            Self::Pin => "pin",
            Self::Funding => "funding",
            Self::Announcements => "announcements",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Inquiry => "General Inquiry",
            Self::Reserve => "Reserve a Profile",
            Self::Support => "Support 24/7",
            Self::Vip => "VIP Upgrade & Billing",
            Self::Password => "Login Password",
            Self::Verification => "Account Verification",
            Self::Report => "Report a User",
            Self::Videos => "Private Videos",
            Self::Pin => "Payment PIN",
            Self::Funding => "Funding Details",
            Self::Announcements => "Announcements",
        }
    }

    /// Parse a deep-link key; unknown keys fall back to the general
    /// inquiry.
    pub fn parse(key: &str) -> IssueKind {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == key)
            .unwrap_or(Self::Inquiry)
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Platforms
// ---------------------------------------------------------------------------

/// Chat application targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPlatform {
    Telegram,
    WhatsApp,
}

impl ChatPlatform {
    /// The external link the platform opens with.
    pub fn url(self) -> &'static str {
        match self {
            Self::Telegram => "https://t.me/loveinthecity",
            Self::WhatsApp => "https://wa.me/1234567890",
        }
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Why a message could not be sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("please enter your name")]
    NameRequired,
    #[error("please enter your phone number")]
    PhoneRequired,
    #[error("please select a profile to reserve")]
    ProfileRequired,
}

/// Clipboard seam; the shell supplies the real one.
pub trait Clipboard {
    fn write(&mut self, text: &str);
}

/// Default clipboard: records the copy in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogClipboard;

impl Clipboard for LogClipboard {
    fn write(&mut self, text: &str) {
        debug!(chars = text.len(), "message copied to clipboard");
    }
}

/// Contact form state, prefilled from the profile and deep-link query
/// parameters.
#[derive(Debug, Clone)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub issue: IssueKind,
    /// Display name of the reserved profile, for [`IssueKind::Reserve`].
    pub partner_name: Option<String>,
    pub message: String,
}

impl ContactForm {
    /// The pre-filled text handed to the chat application.
    pub fn message_preview(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "Friend"
        } else {
            self.name.as_str()
        };

        match self.issue {
            IssueKind::Reserve => format!(
                "Hi! My name is {name}. I'm interested in {partner}. {message}",
                partner = self.partner_name.as_deref().unwrap_or("someone"),
                message = self.message,
            ),
            _ => format!("Hi! My name is {name}. {message}", message = self.message),
        }
    }

    fn validate(&self) -> Result<(), ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::NameRequired);
        }
        if self.phone.trim().is_empty() {
            return Err(ContactError::PhoneRequired);
        }
        if self.issue == IssueKind::Reserve && self.partner_name.is_none() {
            return Err(ContactError::ProfileRequired);
        }
        Ok(())
    }

    /// Validate, copy the preview to the clipboard, then open the platform
    /// link. Returns the copied preview.
    ///
    /// The clipboard write is issued before the external open so the text
    /// is available by the time the chat app takes focus.
    pub fn send(
        &self,
        platform: ChatPlatform,
        clipboard: &mut dyn Clipboard,
        opener: &dyn ExternalOpener,
    ) -> Result<String, ContactError> {
        self.validate()?;

        let preview = self.message_preview();
        clipboard.write(&preview);
        opener.open(platform.url());
        Ok(preview)
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingClipboard(Arc<Mutex<Vec<String>>>);

    impl Clipboard for RecordingClipboard {
        fn write(&mut self, text: &str) {
            self.0.lock().unwrap().push(format!("clipboard:{text}"));
        }
    }

    struct RecordingOpener(Arc<Mutex<Vec<String>>>);

    impl ExternalOpener for RecordingOpener {
        fn open(&self, url: &str) {
            self.0.lock().unwrap().push(format!("open:{url}"));
        }
    }

    fn form() -> ContactForm {
        ContactForm {
            name: "Jon".to_string(),
            phone: "5550001111".to_string(),
            issue: IssueKind::Inquiry,
            partner_name: None,
            message: "How do I verify my account?".to_string(),
        }
    }

    #[test]
    fn preview_for_plain_issue() {
        assert_eq!(
            form().message_preview(),
            "Hi! My name is Jon. How do I verify my account?"
        );
    }

    #[test]
    fn preview_for_reserve_names_the_partner() {
        let mut form = form();
        form.issue = IssueKind::Reserve;
        form.partner_name = Some("Sasha".to_string());
        form.message = "Is she available this weekend?".to_string();

        assert_eq!(
            form.message_preview(),
            "Hi! My name is Jon. I'm interested in Sasha. Is she available this weekend?"
        );
    }

    #[test]
    fn anonymous_preview_falls_back_to_friend() {
        let mut form = form();
        form.name = String::new();
        assert!(form.message_preview().starts_with("Hi! My name is Friend."));
    }

    #[test]
    fn send_requires_name_phone_and_reserve_target() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut clipboard = RecordingClipboard(Arc::clone(&log));
        let opener = RecordingOpener(Arc::clone(&log));

        let mut bad = form();
        bad.name = String::new();
        assert_eq!(
            bad.send(ChatPlatform::Telegram, &mut clipboard, &opener),
            Err(ContactError::NameRequired)
        );

        let mut bad = form();
        bad.phone = "  ".to_string();
        assert_eq!(
            bad.send(ChatPlatform::Telegram, &mut clipboard, &opener),
            Err(ContactError::PhoneRequired)
        );

        let mut bad = form();
        bad.issue = IssueKind::Reserve;
        assert_eq!(
            bad.send(ChatPlatform::Telegram, &mut clipboard, &opener),
            Err(ContactError::ProfileRequired)
        );

        // Nothing was copied or opened for rejected sends.
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn clipboard_write_precedes_the_external_open() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut clipboard = RecordingClipboard(Arc::clone(&log));
        let opener = RecordingOpener(Arc::clone(&log));

        let preview = form()
            .send(ChatPlatform::WhatsApp, &mut clipboard, &opener)
            .unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], format!("clipboard:{preview}"));
        assert_eq!(log[1], "open:https://wa.me/1234567890");
    }

    #[test]
    fn issue_catalog_round_trips_keys() {
        for kind in IssueKind::ALL {
            assert_eq!(IssueKind::parse(kind.as_str()), *kind);
            assert!(!kind.label().is_empty());
        }
        assert_eq!(IssueKind::parse("unknown"), IssueKind::Inquiry);
    }
}
