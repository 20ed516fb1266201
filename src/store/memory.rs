//! In-process product collection.

use dashmap::DashMap;
use futures_util::future::{self, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::catalog::{Product, ProductId};
use crate::store::{ProductStore, StoreError};

/// A `DashMap`-backed store.
///
/// `find_all` returns products ordered by id, which for ids generated in this
/// process is creation order. A failure can be injected with
/// [`MemoryStore::fail_with`] to simulate an unreachable backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: DashMap<ProductId, Product>,
    failure: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for p in products {
            store.products.insert(p.id, p);
        }
        store
    }

    /// Make every subsequent call fail with `message` until cleared.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of collaborator calls served (including failed ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn begin_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self
            .failure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(message) => Err(StoreError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn all_sorted(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.iter().map(|e| e.value().clone()).collect();
        products.sort_by_key(|p| p.id);
        products
    }
}

impl ProductStore for MemoryStore {
    fn find_all(&self) -> BoxFuture<'_, Result<Vec<Product>, StoreError>> {
        let result = self.begin_call().map(|()| self.all_sorted());
        future::ready(result).boxed()
    }

    fn find_by_id(&self, id: ProductId) -> BoxFuture<'_, Result<Product, StoreError>> {
        let result = self.begin_call().and_then(|()| {
            self.products
                .get(&id)
                .map(|e| e.value().clone())
                .ok_or(StoreError::NotFound)
        });
        future::ready(result).boxed()
    }

    fn insert(&self, product: Product) -> BoxFuture<'_, Result<(), StoreError>> {
        let result = self.begin_call().and_then(|()| {
            use dashmap::mapref::entry::Entry;
            match self.products.entry(product.id) {
                Entry::Occupied(_) => Err(StoreError::DuplicateKey(product.id)),
                Entry::Vacant(slot) => {
                    slot.insert(product);
                    Ok(())
                }
            }
        });
        future::ready(result).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            short_description: String::new(),
            description: String::new(),
            image_url1: String::new(),
            image_url2: String::new(),
            image_url3: String::new(),
            price: 1.0,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let store = MemoryStore::new();
        let p = product("ball");
        store.insert(p.clone()).await.unwrap();
        assert_eq!(store.find_by_id(p.id).await.unwrap(), p);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.find_by_id(ProductId::new()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
        assert_eq!(err.to_string(), "not found");
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let p = product("ball");
        store.insert(p.clone()).await.unwrap();
        let err = store.insert(p.clone()).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey(p.id));
        assert!(err.to_string().contains(&p.id.to_string()));
    }

    #[tokio::test]
    async fn test_find_all_in_creation_order() {
        let store = MemoryStore::new();
        let names = ["a", "b", "c", "d"];
        for n in names {
            store.insert(product(n)).await.unwrap();
        }
        let listed: Vec<String> = store.find_all().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(listed, names);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::with_products([product("a")]);
        store.fail_with("connection refused");

        assert_eq!(
            store.find_all().await.unwrap_err().to_string(),
            "connection refused"
        );
        assert!(store.insert(product("b")).await.is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.call_count(), 2);

        store.clear_failure();
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }
}
