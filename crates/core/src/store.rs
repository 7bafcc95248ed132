//! Stores in the mall directory.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Listable, Resource};
use crate::error::{DomainError, DomainResult};
use crate::id::StoreId;
use crate::schedule::{ScheduleEntry, WeeklySchedule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub store_number: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

impl Store {
    pub fn weekly_schedule(&self) -> WeeklySchedule {
        WeeklySchedule::new(self.schedule.clone())
    }

    /// First image, used as the directory thumbnail.
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> &StoreId {
        &self.id
    }
}

impl Listable for Store {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn identifier(&self) -> Option<&str> {
        self.store_number.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Create/update payload for a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

impl StoreDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("store name is required"));
        }
        if let Some(phone) = self.phone.as_deref() {
            let ok = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
            if !ok {
                return Err(DomainError::validation(format!("invalid phone number '{phone}'")));
            }
        }
        WeeklySchedule::new(self.schedule.clone()).validate()
    }
}

impl From<&Store> for StoreDraft {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description.clone(),
            store_number: store.store_number.clone(),
            floor: store.floor.clone(),
            phone: store.phone.clone(),
            category: store.category.clone(),
            images: store.images.clone(),
            schedule: store.schedule.clone(),
        }
    }
}

impl Resource for Store {
    const COLLECTION: &'static str = "stores";

    type Draft = StoreDraft;

    fn validate_draft(draft: &StoreDraft) -> DomainResult<()> {
        draft.validate()
    }
}
