//! # loveinthecity-store
//!
//! Client-side storage engine for LoveInTheCity.
//!
//! Provides durable, prefixed, versioned key-value persistence with
//! per-item TTL, an in-process read cache via `moka`, a synchronous
//! change-notification registry, and the profile/session records built on
//! top of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ProfileManager (userProfile / userSession)  │
//! ├─────────────────────────────────────────────┤
//! │  StorageManager                              │
//! │    StoredItem envelope (timestamp, ttl, ver) │
//! │    moka read cache + WatchRegistry           │
//! ├─────────────────────────────────────────────┤
//! │  StorageBackend (sqlite / memory / null)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous: operations run to completion on the calling
//! thread, and watchers fire inline after the cache is updated.
//!
//! ## Quick start
//!
//! ```ignore
//! use loveinthecity_store::{ProfileManager, StorageManager};
//! use std::sync::Arc;
//!
//! let store = Arc::new(StorageManager::open("data/loveinthecity.db")?);
//! let profiles = ProfileManager::new(Arc::clone(&store));
//!
//! store.set("funloves_token", &"mock_jwt_token", None);
//! let profile = profiles.create_or_update(Default::default());
//! ```

pub mod backend;
pub mod clock;
pub mod error;
pub mod keys;
pub mod manager;
pub mod profile;
pub mod watch;

// ── re-exports ───────────────────────────────────────────────────────

pub use backend::{MemoryBackend, NullBackend, SqliteBackend, StorageBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use manager::{
    BatchOp, STORAGE_PREFIX, STORAGE_VERSION, StorageManager, StorageStats, StoredItem,
};
pub use profile::{
    Preferences, ProfileManager, ProfileUpdate, SupportMetadata, UserProfile, UserSession,
    generate_signup_user_id, generate_user_id,
};
pub use watch::{WatchHandle, WatchRegistry};
