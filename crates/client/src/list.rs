//! Generic list controller backing the admin listing screens.
//!
//! One controller per screen. It owns the current page of entities and its
//! pagination metadata, applies the search filter and sort order to the page
//! it holds, and drives create/update/delete through a [`CollectionApi`].
//! Backend failures end up in [`ListController::error`]; the items already on
//! screen are never discarded because of one.

use std::cmp::Ordering;
use std::sync::Arc;

use mall_auth::{Capabilities, Requirements, RoleName};
use mall_core::{Listable, Page, PageMeta, PageQuery, Resource};

use crate::collection::CollectionApi;
use crate::error::{ClientError, ClientResult};

/// Client-side ordering of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// As returned by the backend.
    #[default]
    Server,
    NameAsc,
    NameDesc,
    /// By the secondary identifier (store number, slug, email), numbers
    /// compared numerically.
    Identifier,
}

impl SortOrder {
    /// Parse the select-box token; unknown tokens mean server order.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "asc" => SortOrder::NameAsc,
            "desc" => SortOrder::NameDesc,
            "numero" | "number" | "identifier" => SortOrder::Identifier,
            _ => SortOrder::Server,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            SortOrder::Server => "",
            SortOrder::NameAsc => "asc",
            SortOrder::NameDesc => "desc",
            SortOrder::Identifier => "numero",
        }
    }

    fn compare<E: Listable>(&self, a: &E, b: &E) -> Ordering {
        match self {
            SortOrder::Server => Ordering::Equal,
            SortOrder::NameAsc => by_name(a, b),
            SortOrder::NameDesc => by_name(b, a),
            SortOrder::Identifier => by_identifier(a.identifier(), b.identifier()),
        }
    }
}

fn by_name<E: Listable>(a: &E, b: &E) -> Ordering {
    a.display_name()
        .to_lowercase()
        .cmp(&b.display_name().to_lowercase())
}

/// Digits compare as numbers, then text breaks ties; missing identifiers last.
fn by_identifier(a: Option<&str>, b: Option<&str>) -> Ordering {
    fn key(s: &str) -> (Option<u64>, String) {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        (digits.parse().ok(), s.to_lowercase())
    }

    match (a, b) {
        (Some(a), Some(b)) => {
            let (na, ta) = key(a);
            let (nb, tb) = key(b);
            match (na, nb) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| ta.cmp(&tb)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => ta.cmp(&tb),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Where the search term is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Filter the page currently held; pagination metadata is untouched.
    #[default]
    PageLocal,
    /// Send the term as the `search` query parameter; a new term restarts at
    /// page 1.
    Server,
}

/// Two-phase delete.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeleteState<Id> {
    #[default]
    Idle,
    ConfirmPending(Id),
    Deleting(Id),
}

impl<Id> DeleteState<Id> {
    pub fn is_idle(&self) -> bool {
        matches!(self, DeleteState::Idle)
    }

    pub fn pending(&self) -> Option<&Id> {
        match self {
            DeleteState::ConfirmPending(id) | DeleteState::Deleting(id) => Some(id),
            DeleteState::Idle => None,
        }
    }
}

/// Sets a field for the lifetime of the guard and restores it on drop, so an
/// abandoned future never leaves it behind.
struct Hold<'a, T> {
    slot: &'a mut T,
    after: Option<T>,
}

impl<'a, T> Hold<'a, T> {
    fn new(slot: &'a mut T, during: T, after: T) -> Self {
        *slot = during;
        Self {
            slot,
            after: Some(after),
        }
    }
}

impl<T> Drop for Hold<'_, T> {
    fn drop(&mut self) {
        if let Some(after) = self.after.take() {
            *self.slot = after;
        }
    }
}

pub struct ListController<E: Resource> {
    api: Arc<dyn CollectionApi<E>>,
    items: Vec<E>,
    page_info: PageMeta,
    search_term: String,
    sort_order: SortOrder,
    scope: SearchScope,
    loading: bool,
    error: Option<String>,
    delete_state: DeleteState<E::Id>,
    delete_requirements: Requirements,
}

impl<E: Resource> ListController<E> {
    pub fn new(api: Arc<dyn CollectionApi<E>>) -> Self {
        Self {
            api,
            items: Vec::new(),
            page_info: PageMeta::default(),
            search_term: String::new(),
            sort_order: SortOrder::Server,
            scope: SearchScope::PageLocal,
            loading: false,
            error: None,
            delete_state: DeleteState::Idle,
            delete_requirements: Requirements::roles([RoleName::ADMIN]),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.page_info = PageMeta::new(1, limit.max(1), 0);
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Who may see and use the delete action (ADMIN by default).
    pub fn with_delete_requirements(mut self, requirements: Requirements) -> Self {
        self.delete_requirements = requirements;
        self
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn page_info(&self) -> &PageMeta {
        &self.page_info
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn delete_state(&self) -> &DeleteState<E::Id> {
        &self.delete_state
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn can_delete<C: Capabilities + ?Sized>(&self, caps: &C) -> bool {
        self.delete_requirements.is_satisfied_by(caps)
    }

    /// Load `page` with `limit` items per page, replacing items and metadata
    /// on success. A page past the end is replaced by the last existing one
    /// (page 1 when the collection is empty).
    pub async fn fetch_page(&mut self, page: u32, limit: u32) -> ClientResult<()> {
        let term = self.search_term.clone();
        self.fetch_matching(page, limit, term).await
    }

    /// Fetch with `term` as the search; the term is kept only on success.
    async fn fetch_matching(&mut self, page: u32, limit: u32, term: String) -> ClientResult<()> {
        let page = page.max(1);
        let limit = if limit == 0 { PageQuery::DEFAULT_LIMIT } else { limit };

        let mut result = self.load(page, limit, &term).await;
        let vanished = match &result {
            Ok(fetched) => {
                let last = fetched.meta.normalized().total_pages.max(1);
                (fetched.meta.page > last).then_some(last)
            }
            Err(_) => None,
        };
        if let Some(last) = vanished {
            tracing::debug!(collection = E::COLLECTION, page, last, "page vanished, loading last page");
            result = self.load(last, limit, &term).await;
        }

        match result {
            Ok(fetched) => {
                self.items = fetched.data;
                self.page_info = fetched.meta.normalized();
                self.search_term = term;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(collection = E::COLLECTION, page, limit, "fetch failed: {e}");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Re-fetch the current page.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.fetch_page(self.page_info.page, self.page_info.limit).await
    }

    /// Go to `page`. Returns `Ok(false)` without fetching when `page` is
    /// outside `[1, total_pages]` or a fetch is already running.
    pub async fn change_page(&mut self, page: u32) -> ClientResult<bool> {
        if self.loading || !self.page_info.contains_page(page) {
            return Ok(false);
        }
        self.fetch_page(page, self.page_info.limit).await?;
        Ok(true)
    }

    /// Update the search term. In [`SearchScope::Server`] a changed term
    /// re-fetches from page 1 and only takes effect once that fetch succeeds.
    pub async fn set_search(&mut self, term: impl Into<String>) -> ClientResult<()> {
        let term = term.into();
        if term == self.search_term {
            return Ok(());
        }
        match self.scope {
            SearchScope::PageLocal => {
                self.search_term = term;
                Ok(())
            }
            SearchScope::Server => self.fetch_matching(1, self.page_info.limit, term).await,
        }
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    /// The current page filtered and sorted for display. Stable: entries that
    /// compare equal keep their fetch order.
    pub fn visible_items(&self) -> Vec<&E> {
        let mut visible: Vec<&E> = match self.scope {
            SearchScope::PageLocal => self
                .items
                .iter()
                .filter(|e| e.matches_search(&self.search_term))
                .collect(),
            SearchScope::Server => self.items.iter().collect(),
        };

        if self.sort_order != SortOrder::Server {
            visible.sort_by(|a, b| self.sort_order.compare(*a, *b));
        }
        visible
    }

    /// Start the delete flow for `entity`. Ignored unless idle.
    pub fn request_delete(&mut self, entity: &E) -> bool {
        if !self.delete_state.is_idle() {
            return false;
        }
        self.delete_state = DeleteState::ConfirmPending(entity.id().clone());
        true
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.delete_state, DeleteState::ConfirmPending(_)) {
            self.delete_state = DeleteState::Idle;
        }
    }

    /// Perform the confirmed delete, then re-fetch the current page.
    ///
    /// Returns `Ok(false)` when no delete was pending confirmation.
    pub async fn confirm_delete(&mut self) -> ClientResult<bool> {
        let DeleteState::ConfirmPending(id) = &self.delete_state else {
            return Ok(false);
        };
        let id = id.clone();

        let outcome = {
            let _deleting = Hold::new(
                &mut self.delete_state,
                DeleteState::Deleting(id.clone()),
                DeleteState::Idle,
            );
            self.api.delete(&id).await
        };

        match outcome {
            Ok(()) => {
                tracing::info!(collection = E::COLLECTION, %id, "deleted");
                self.reload().await;
                Ok(true)
            }
            Err(e) => Err(self.record("delete", e)),
        }
    }

    /// Validate locally, create, then re-fetch the current page.
    pub async fn create(&mut self, draft: &E::Draft) -> ClientResult<E> {
        E::validate_draft(draft)?;
        let created = match self.api.create(draft).await {
            Ok(created) => created,
            Err(e) => return Err(self.record("create", e)),
        };
        self.reload().await;
        Ok(created)
    }

    /// Validate locally, update, then re-fetch the current page.
    pub async fn update(&mut self, id: &E::Id, draft: &E::Draft) -> ClientResult<E> {
        E::validate_draft(draft)?;
        let updated = match self.api.update(id, draft).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.record("update", e)),
        };
        self.reload().await;
        Ok(updated)
    }

    fn record(&mut self, action: &'static str, e: ClientError) -> ClientError {
        tracing::warn!(collection = E::COLLECTION, action, "{e}");
        self.error = Some(e.user_message());
        e
    }

    /// Re-fetch after a successful write. A failure is already on the banner.
    async fn reload(&mut self) {
        let _ = self.refresh().await;
    }

    async fn load(&mut self, page: u32, limit: u32, term: &str) -> ClientResult<Page<E>> {
        let mut query = PageQuery::new(page, limit);
        if self.scope == SearchScope::Server {
            query = query.with_search(term.to_string());
        }

        let _loading = Hold::new(&mut self.loading, true, false);
        self.api.list(&query).await
    }
}
