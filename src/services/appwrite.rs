use crate::models::{Coordinate, Facility, FacilityCategory, Recipient};
use crate::services::store::{FacilityStore, RecipientSource, StoreError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Documents requested per page when listing a collection
const PAGE_SIZE: usize = 100;

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub heroes: String,
    /// Collection per facility category, falling back to the category name
    pub facilities: HashMap<FacilityCategory, String>,
}

impl AppwriteCollections {
    pub fn facility_collection(&self, category: FacilityCategory) -> &str {
        self.facilities
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.as_str())
    }
}

impl Default for AppwriteCollections {
    fn default() -> Self {
        Self {
            heroes: "heroes".to_string(),
            facilities: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoPoint {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FacilityDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    latlng: Option<GeoPoint>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeroDocument {
    #[serde(rename = "$id")]
    id: String,
    email: String,
    #[serde(rename = "zipCode")]
    zip_code: String,
    #[serde(rename = "doubleOptIn", default)]
    double_opt_in: bool,
}

/// Appwrite API client
///
/// Handles all communication with the Appwrite backend including:
/// - Listing facility documents per category
/// - Listing opted-in heroes for digests
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    /// List every document of a collection, following offset pagination
    async fn list_documents(&self, collection: &str, filters: &[Value]) -> Result<Vec<Value>, StoreError> {
        let url = format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        );

        let mut documents = Vec::new();
        loop {
            let mut queries: Vec<Value> = filters.to_vec();
            queries.push(json!({ "method": "limit", "values": [PAGE_SIZE] }));
            queries.push(json!({ "method": "offset", "values": [documents.len()] }));

            let query_string = queries
                .iter()
                .map(|q| format!("queries[]={}", urlencoding::encode(&q.to_string())))
                .collect::<Vec<_>>()
                .join("&");
            let full_url = format!("{}?{}", url, query_string);

            tracing::debug!("Listing documents from: {}", full_url);

            let response = self
                .client
                .get(&full_url)
                .header("X-Appwrite-Key", &self.api_key)
                .header("X-Appwrite-Project", &self.project_id)
                .send()
                .await?;

            match response.status() {
                status if status.is_success() => {}
                StatusCode::UNAUTHORIZED => return Err(StoreError::Unauthorized),
                status => {
                    let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
                    tracing::error!("Failed to list {}: {} - {}", collection, status, body);
                    return Err(StoreError::ApiError(format!(
                        "Failed to list {}: {}",
                        collection, status
                    )));
                }
            }

            let json: Value = response.json().await?;

            let page = json
                .get("documents")
                .and_then(|d| d.as_array())
                .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

            let page_len = page.len();
            documents.extend(page.iter().cloned());

            let total = json.get("total").and_then(|t| t.as_u64()).map(|t| t as usize);
            let done = page_len < PAGE_SIZE || total.is_some_and(|t| documents.len() >= t);
            if done {
                break;
            }
        }

        tracing::debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    /// List all facilities of one category
    pub async fn list_facilities(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError> {
        let collection = self.collections.facility_collection(category);
        let documents = self.list_documents(collection, &[]).await?;

        let facilities = documents
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<FacilityDocument>(doc) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::debug!("Skipping malformed {} document: {}", collection, e);
                    None
                }
            })
            .map(|doc| Facility {
                coordinate: doc
                    .latlng
                    .and_then(|p| Coordinate::from_parts(p.latitude, p.longitude)),
                id: doc.id,
                category,
                title: doc.title,
                address: doc.address,
            })
            .collect();

        Ok(facilities)
    }

    /// List heroes who confirmed their registration
    pub async fn list_opted_in_heroes(&self) -> Result<Vec<Recipient>, StoreError> {
        let filter = json!({ "method": "equal", "attribute": "doubleOptIn", "values": [true] });
        let documents = self.list_documents(&self.collections.heroes, &[filter]).await?;

        let recipients: Vec<Recipient> = documents
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<HeroDocument>(doc).ok())
            .filter(|hero| hero.double_opt_in)
            .map(|hero| Recipient {
                key: hero.id,
                email: hero.email,
                zip_code: hero.zip_code,
            })
            .collect();

        tracing::debug!("Found {} opted-in heroes", recipients.len());
        Ok(recipients)
    }
}

#[async_trait]
impl FacilityStore for AppwriteClient {
    async fn list_by_category(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError> {
        self.list_facilities(category).await
    }
}

#[async_trait]
impl RecipientSource for AppwriteClient {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, StoreError> {
        self.list_opted_in_heroes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(base_url: String) -> AppwriteClient {
        let mut collections = AppwriteCollections::default();
        collections
            .facilities
            .insert(FacilityCategory::Plasma, "plasma2".to_string());

        AppwriteClient::new(
            base_url,
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            collections,
        )
        .unwrap()
    }

    #[test]
    fn test_appwrite_client_creation() {
        let client = client("https://appwrite.test/v1".to_string());

        assert_eq!(client.base_url, "https://appwrite.test/v1");
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.collections.facility_collection(FacilityCategory::Plasma), "plasma2");
        assert_eq!(client.collections.facility_collection(FacilityCategory::Tafel), "tafel");
    }

    #[tokio::test]
    async fn test_list_facilities_parses_documents() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "total": 3,
            "documents": [
                { "$id": "f1", "title": "Center", "address": "Main St 1",
                  "latlng": { "latitude": 51.3460671, "longitude": 12.3989616 } },
                { "$id": "f2", "latlng": { "latitude": 51.3 } },
                { "title": "no id" }
            ]
        });
        let mock = server
            .mock("GET", Matcher::Regex(r"^/databases/test_db/collections/plasma2/documents".to_string()))
            .match_query(Matcher::Any)
            .match_header("X-Appwrite-Key", "test_key")
            .match_header("X-Appwrite-Project", "test_project")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let facilities = client(server.url()).list_facilities(FacilityCategory::Plasma).await.unwrap();

        mock.assert_async().await;
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].id, "f1");
        assert!(facilities[0].coordinate.is_some());
        assert_eq!(facilities[0].title.as_deref(), Some("Center"));
        assert_eq!(facilities[1].id, "f2");
        assert!(facilities[1].coordinate.is_none());
    }

    #[tokio::test]
    async fn test_list_recipients_filters_opt_in() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "total": 2,
            "documents": [
                { "$id": "h1", "email": "a@example.org", "zipCode": "04103", "doubleOptIn": true },
                { "$id": "h2", "email": "b@example.org", "zipCode": "10115", "doubleOptIn": false }
            ]
        });
        server
            .mock("GET", Matcher::Regex(r"^/databases/test_db/collections/heroes/documents".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let recipients = client(server.url()).list_opted_in_heroes().await.unwrap();

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].key, "h1");
        assert_eq!(recipients[0].zip_code, "04103");
    }

    #[tokio::test]
    async fn test_unauthorized_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/databases/".to_string()))
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let err = client(server.url())
            .list_by_category(FacilityCategory::Ads)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unauthorized));
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/databases/".to_string()))
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let err = client(server.url())
            .list_by_category(FacilityCategory::Ads)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ApiError(_)));
    }
}
