//! Entity traits: identity, list presentation and backend collection binding.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DomainResult;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that can be shown in a paginated admin listing.
///
/// The three text accessors feed the client-side search filter; the name and
/// the identifier also drive sorting.
pub trait Listable: Entity {
    /// Display name (store name, event title, user full name).
    fn display_name(&self) -> &str;

    /// Secondary identifier shown next to the name (store number, event slug,
    /// user email).
    fn identifier(&self) -> Option<&str>;

    /// Free-text description.
    fn description(&self) -> Option<&str>;

    /// Case-insensitive substring match over name, identifier and description.
    ///
    /// An empty (or whitespace-only) term matches everything.
    fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let haystacks = [
            Some(self.display_name()),
            self.identifier(),
            self.description(),
        ];

        haystacks
            .into_iter()
            .flatten()
            .any(|h| h.to_lowercase().contains(&needle))
    }
}

/// Binds an entity type to its backend collection.
pub trait Resource: Listable + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection path segment, e.g. `"stores"` for `GET /stores`.
    const COLLECTION: &'static str;

    /// Payload used for both create and update.
    type Draft: Serialize + Send + Sync;

    /// Local validation run before any network call.
    fn validate_draft(draft: &Self::Draft) -> DomainResult<()>;
}
