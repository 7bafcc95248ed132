//! `mall-core` — domain building blocks for the mall portal.
//!
//! This crate contains **pure domain** types (no HTTP, no storage): the
//! listable entities shown in the directory and admin screens, their
//! create/update drafts, and the pagination envelope the backend returns.

pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod page;
pub mod schedule;
pub mod store;

pub use entity::{Entity, Listable, Resource};
pub use error::{DomainError, DomainResult};
pub use event::{Event, EventDraft, slugify};
pub use id::{EventId, PermissionId, RoleId, StoreId, UserId};
pub use page::{Page, PageMeta, PageQuery};
pub use schedule::{ScheduleEntry, Weekday, WeeklySchedule};
pub use store::{Store, StoreDraft};
