//! Application configuration.

use std::path::PathBuf;

use loveinthecity_deeplink::SUPPORT_CHAT_URL;

/// Construction parameters for [`AppContext`](crate::AppContext).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the storage database; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    /// Origin prefixed onto generated share links.
    pub origin: String,
    /// External chat link support requests are handed to.
    pub support_chat_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            origin: "https://loveinthecity.app".to_string(),
            support_chat_url: SUPPORT_CHAT_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `LOVEINTHECITY_DB`, `LOVEINTHECITY_ORIGIN`,
    /// and `LOVEINTHECITY_SUPPORT_CHAT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("LOVEINTHECITY_DB")
            && !path.is_empty()
        {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Ok(origin) = std::env::var("LOVEINTHECITY_ORIGIN")
            && !origin.is_empty()
        {
            config.origin = origin;
        }
        if let Ok(url) = std::env::var("LOVEINTHECITY_SUPPORT_CHAT")
            && !url.is_empty()
        {
            config.support_chat_url = url;
        }

        config
    }
}
