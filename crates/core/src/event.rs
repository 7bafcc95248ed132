//! Mall events (workshops, concerts, promotions).

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::entity::{Entity, Listable, Resource};
use crate::error::{DomainError, DomainResult};
use crate::id::EventId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub registered_count: u32,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Event {
    /// Seats left; `None` when the event has no capacity limit.
    pub fn remaining_capacity(&self) -> Option<u32> {
        self.capacity
            .map(|cap| cap.saturating_sub(self.registered_count))
    }

    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == Some(0)
    }

    pub fn is_free(&self) -> bool {
        self.price.is_none_or(|p| p <= 0.0)
    }

    /// Whether the event is running or upcoming at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date >= now
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &EventId {
        &self.id
    }
}

impl Listable for Event {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn identifier(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Create/update payload for an event.
///
/// A blank `slug` is derived from `name` when the draft is sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    slug: Cow<'a, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    images: &'a [String],
}

impl Serialize for EventDraft {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EventPayload {
            name: &self.name,
            description: self.description.as_deref(),
            start_date: self.start_date,
            end_date: self.end_date,
            capacity: self.capacity,
            price: self.price,
            slug: self.effective_slug(),
            location: self.location.as_deref(),
            images: &self.images,
        }
        .serialize(serializer)
    }
}

impl EventDraft {
    /// New draft with the slug derived from the name.
    pub fn new(name: impl Into<String>, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            name,
            description: None,
            start_date,
            end_date,
            capacity: None,
            price: None,
            location: None,
            images: Vec::new(),
        }
    }

    /// The explicit slug, or one derived from the name when blank.
    pub fn effective_slug(&self) -> Cow<'_, str> {
        match self.slug.trim() {
            "" => Cow::Owned(slugify(&self.name)),
            slug => Cow::Borrowed(slug),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("event name is required"));
        }
        if self.effective_slug().is_empty() {
            return Err(DomainError::validation("event slug is required"));
        }
        if self.end_date < self.start_date {
            return Err(DomainError::validation("event cannot end before it starts"));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(DomainError::validation("event price must be zero or positive"));
            }
        }
        if self.capacity == Some(0) {
            return Err(DomainError::validation("event capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Resource for Event {
    const COLLECTION: &'static str = "events";

    type Draft = EventDraft;

    fn validate_draft(draft: &EventDraft) -> DomainResult<()> {
        draft.validate()
    }
}

/// URL slug from a display name: lowercase ASCII words joined by `-`.
///
/// Common Spanish accents are folded (`"Café Niños"` → `"cafe-ninos"`).
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        let folded = match c {
            'á' | 'à' | 'ä' | 'â' | 'Á' | 'À' | 'Ä' | 'Â' => 'a',
            'é' | 'è' | 'ë' | 'ê' | 'É' | 'È' | 'Ë' | 'Ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' | 'Í' | 'Ì' | 'Ï' | 'Î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'Ó' | 'Ò' | 'Ö' | 'Ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' | 'Ú' | 'Ù' | 'Ü' | 'Û' => 'u',
            'ñ' | 'Ñ' => 'n',
            'ç' | 'Ç' => 'c',
            other => other.to_ascii_lowercase(),
        };

        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    slug
}
