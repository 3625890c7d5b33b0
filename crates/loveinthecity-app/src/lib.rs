//! # loveinthecity-app
//!
//! Application layer for LoveInTheCity: the constructed-instances context
//! wiring the storage engine to the deep-link router, plus the account
//! flows (signup, login, logout) and the contact composer that hands
//! pre-filled messages to external chat applications.
//!
//! The visual screens live elsewhere; they call into [`AppContext`] for
//! every piece of persisted or routed state.

pub mod config;
pub mod contact;
pub mod context;
pub mod error;
pub mod signup;

// ── re-exports ───────────────────────────────────────────────────────

pub use config::AppConfig;
pub use contact::{ChatPlatform, Clipboard, ContactError, ContactForm, IssueKind, LogClipboard};
pub use context::AppContext;
pub use error::AppError;
pub use signup::{SUPPORT_CONTACT_EMAIL, SignupData, SignupError, SupportSnapshot};
