use crate::models::{Facility, FacilityCategory, Recipient};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur when reading facilities from storage
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or project")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Collection unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Shared(std::sync::Arc<StoreError>),
}

/// Read-only view of the facility collections
#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// List every facility stored under `category`
    async fn list_by_category(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError>;
}

#[async_trait]
impl<T: FacilityStore + ?Sized> FacilityStore for std::sync::Arc<T> {
    async fn list_by_category(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError> {
        (**self).list_by_category(category).await
    }
}

/// Source of heroes eligible for digests
#[async_trait]
pub trait RecipientSource: Send + Sync {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, StoreError>;
}

/// Facility store backed by an in-memory snapshot
///
/// Categories registered with [`InMemoryStore::fail_category`] return
/// [`StoreError::Unavailable`], which makes storage outages reproducible.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    facilities: HashMap<FacilityCategory, Vec<Facility>>,
    recipients: Vec<Recipient>,
    failing: Vec<FacilityCategory>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facilities<I: IntoIterator<Item = Facility>>(facilities: I) -> Self {
        let mut store = Self::new();
        for facility in facilities {
            store.insert(facility);
        }
        store
    }

    pub fn insert(&mut self, facility: Facility) {
        self.facilities.entry(facility.category).or_default().push(facility);
    }

    pub fn add_recipient(&mut self, recipient: Recipient) {
        self.recipients.push(recipient);
    }

    pub fn fail_category(&mut self, category: FacilityCategory) {
        self.failing.push(category);
    }
}

#[async_trait]
impl FacilityStore for InMemoryStore {
    async fn list_by_category(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError> {
        if self.failing.contains(&category) {
            return Err(StoreError::Unavailable(category.to_string()));
        }
        Ok(self.facilities.get(&category).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl RecipientSource for InMemoryStore {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, StoreError> {
        Ok(self.recipients.clone())
    }
}
