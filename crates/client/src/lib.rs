//! `mall-client`
//!
//! **Responsibility:** everything the portal needs from the outside world.
//!
//! This crate provides:
//! - the backend REST client (auth, paginated collections, schedules, roles)
//! - the generic list controller behind every admin listing
//! - media uploads to object storage (Cloudinary or Supabase)
//! - the chat assistant client and its connectivity state
//! - the top-level error boundary
//!
//! The backend stays the authority; nothing here caches beyond the page on
//! screen.

pub mod backend;
pub mod boundary;
pub mod chat;
pub mod collection;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod list;
pub mod storage;

pub use backend::BackendClient;
pub use boundary::{Fault, RecoveryAction};
pub use chat::{ChatClient, ChatError, ChatMessage, ChatReply};
pub use collection::{CollectionApi, InMemoryCollection};
pub use config::{ChatConfig, ClientConfig, CloudinaryConfig, ConfigError, SupabaseConfig};
pub use connectivity::Connectivity;
pub use error::{ClientError, ClientResult};
pub use list::{DeleteState, ListController, SearchScope, SortOrder};
pub use storage::{
    CloudinaryStorage, DeleteOutcome, MediaFile, MediaKind, MediaPolicy, MediaUploader, ObjectStorage,
    StoredObject, SupabaseStorage, UploadError,
};
