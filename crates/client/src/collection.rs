//! Paginated CRUD over one backend collection.

use std::sync::{Arc, Mutex, RwLock};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use mall_core::{Page, PageMeta, PageQuery, Resource};

use crate::error::{ClientError, ClientResult};

/// `GET/POST /{collection}`, `PUT/DELETE /{collection}/{id}`.
#[async_trait]
pub trait CollectionApi<E: Resource>: Send + Sync {
    async fn list(&self, query: &PageQuery) -> ClientResult<Page<E>>;
    async fn create(&self, draft: &E::Draft) -> ClientResult<E>;
    async fn update(&self, id: &E::Id, draft: &E::Draft) -> ClientResult<E>;
    async fn delete(&self, id: &E::Id) -> ClientResult<()>;
}

#[async_trait]
impl<E, S> CollectionApi<E> for Arc<S>
where
    E: Resource,
    S: CollectionApi<E> + ?Sized,
{
    async fn list(&self, query: &PageQuery) -> ClientResult<Page<E>> {
        (**self).list(query).await
    }

    async fn create(&self, draft: &E::Draft) -> ClientResult<E> {
        (**self).create(draft).await
    }

    async fn update(&self, id: &E::Id, draft: &E::Draft) -> ClientResult<E> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &E::Id) -> ClientResult<()> {
        (**self).delete(id).await
    }
}

/// In-memory collection for tests/dev.
///
/// Pages like the backend (1-based, `ceil(total/limit)` pages, an empty page
/// past the end) and honours the `search` parameter. Create/update need a
/// factory turning a draft into an entity.
pub struct InMemoryCollection<E: Resource> {
    items: RwLock<Vec<E>>,
    factory: Option<Box<dyn Fn(u64, &E::Draft, Option<&E>) -> E + Send + Sync>>,
    next_id: AtomicU64,
    requests: AtomicUsize,
    fail_next: Mutex<Option<ClientError>>,
}

impl<E: Resource> InMemoryCollection<E> {
    pub fn new(items: Vec<E>) -> Self {
        let next_id = items.len() as u64 + 1;
        Self {
            items: RwLock::new(items),
            factory: None,
            next_id: AtomicU64::new(next_id),
            requests: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    /// `factory(next_id, draft, existing)` builds the stored entity;
    /// `existing` is set on update.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(u64, &E::Draft, Option<&E>) -> E + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ClientError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    /// Number of calls received, failed ones included.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<E> {
        self.items.read().map(|items| items.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enter(&self) -> ClientResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().ok().and_then(|mut slot| slot.take()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn build(&self, draft: &E::Draft, existing: Option<&E>) -> ClientResult<E> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| ClientError::api(501, "writes are not supported by this collection"))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(factory(id, draft, existing))
    }

    fn poisoned() -> ClientError {
        ClientError::api(500, "collection lock poisoned")
    }
}

impl<E: Resource> Default for InMemoryCollection<E> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl<E: Resource> CollectionApi<E> for InMemoryCollection<E> {
    async fn list(&self, query: &PageQuery) -> ClientResult<Page<E>> {
        self.enter()?;
        if query.page == 0 || query.limit == 0 {
            return Err(ClientError::api(400, "page and limit must be positive"));
        }

        let items = self.items.read().map_err(|_| Self::poisoned())?;
        let matching: Vec<&E> = match query.search.as_deref() {
            Some(term) => items.iter().filter(|e| e.matches_search(term)).collect(),
            None => items.iter().collect(),
        };

        let limit = query.limit as usize;
        let start = (query.page as usize - 1).saturating_mul(limit);
        let data = matching.iter().skip(start).take(limit).map(|e| (*e).clone()).collect();

        Ok(Page {
            data,
            meta: PageMeta::new(query.page, query.limit, matching.len() as u64),
        })
    }

    async fn create(&self, draft: &E::Draft) -> ClientResult<E> {
        self.enter()?;
        E::validate_draft(draft)?;
        let entity = self.build(draft, None)?;
        self.items
            .write()
            .map_err(|_| Self::poisoned())?
            .push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &E::Id, draft: &E::Draft) -> ClientResult<E> {
        self.enter()?;
        E::validate_draft(draft)?;
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        let slot = items
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| ClientError::api(404, format!("{} {id} not found", E::COLLECTION)))?;
        let updated = self.build(draft, Some(&*slot))?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &E::Id) -> ClientResult<()> {
        self.enter()?;
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        let before = items.len();
        items.retain(|e| e.id() != id);
        if items.len() == before {
            return Err(ClientError::api(404, format!("{} {id} not found", E::COLLECTION)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mall_core::{Store, StoreDraft, StoreId};

    fn store(i: u64) -> Store {
        serde_json::from_value(serde_json::json!({
            "id": i,
            "name": format!("Store {i}"),
            "storeNumber": format!("L-{i:03}"),
        }))
        .unwrap()
    }

    fn stores(n: u64) -> InMemoryCollection<Store> {
        InMemoryCollection::new((1..=n).map(store).collect()).with_factory(|id, draft: &StoreDraft, existing| {
            let mut s = existing.cloned().unwrap_or_else(|| store(id));
            s.name = draft.name.clone();
            s
        })
    }

    #[tokio::test]
    async fn pages_like_the_backend() {
        let api = stores(25);
        let page = CollectionApi::<Store>::list(&api, &PageQuery::new(3, 10)).await.unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.meta, PageMeta::new(3, 10, 25));

        let past_end = CollectionApi::<Store>::list(&api, &PageQuery::new(9, 10)).await.unwrap();
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.meta.total_pages, 3);
    }

    #[tokio::test]
    async fn server_search_filters_before_paging() {
        let api = stores(25);
        let page = CollectionApi::<Store>::list(&api, &PageQuery::new(1, 10).with_search("l-02"))
            .await
            .unwrap();
        assert_eq!(page.meta.total, 6);
    }

    #[tokio::test]
    async fn write_operations() {
        let api = stores(2);
        let draft = StoreDraft {
            name: "Kiosko".to_string(),
            ..StoreDraft::default()
        };
        let created = api.create(&draft).await.unwrap();
        assert_eq!(created.name, "Kiosko");
        assert_eq!(api.len(), 3);

        api.delete(&StoreId::new("1")).await.unwrap();
        let err = api.delete(&StoreId::new("1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, .. }));

        api.fail_next(ClientError::api(500, "boom"));
        assert!(CollectionApi::<Store>::list(&api, &PageQuery::default()).await.is_err());
        assert_eq!(api.requests(), 4);
    }
}
