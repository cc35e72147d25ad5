// Service exports
pub mod appwrite;
pub mod cache;
pub mod geocoder;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections};
pub use cache::{CacheStats, CachedStore};
pub use geocoder::{GeocodeError, GeocodingClient};
pub use store::{FacilityStore, InMemoryStore, RecipientSource, StoreError};
