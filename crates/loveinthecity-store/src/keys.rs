//! Well-known logical storage keys.
//!
//! All keys are namespaced with [`STORAGE_PREFIX`](crate::STORAGE_PREFIX)
//! when persisted; callers use these logical names.

/// The canonical user profile record.
pub const USER_PROFILE: &str = "userProfile";

/// The authenticated session record.
pub const USER_SESSION: &str = "userSession";

/// Opaque bearer-style login marker (not cryptographically meaningful).
pub const AUTH_TOKEN: &str = "funloves_token";

/// Signup-time customer support snapshot.
pub const SUPPORT_DATA: &str = "customerSupportData";
