use minerva_core::config::{InstanceEntry, TessConfig, TessCredentials};
use minerva_core::export::LearningMaterial;
use minerva_core::sources::tess::TessMaterial;
use minerva_core::{AppError, HttpConfig};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::retry::{build_client, send_with_retry};

const JSON_API: &str = "application/vnd.api+json";

/// One page of the JSON:API `materials` listing.
#[derive(Deserialize, Debug, Default)]
struct MaterialsPage {
    #[serde(default)]
    data: Vec<TessMaterial>,
    #[serde(default)]
    links: PageLinks,
}

#[derive(Deserialize, Debug, Default)]
struct PageLinks {
    next: Option<String>,
}

/// HTTP client for one TeSS-family catalog (ELIXIR TeSS, Taxila, mTeSS-X spaces, ...).
///
/// # Examples
///
/// ```no_run
/// use minerva_client::TessClient;
/// use minerva_core::{HttpConfig, TessConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TessClient::new("taxila", "https://taxila.nl", &HttpConfig::default(), &TessConfig::default())?;
/// let materials = client.list_materials().await?;
/// println!("Found {} materials", materials.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TessClient {
    client: Client,
    key: String,
    base_url: Url,
    http: HttpConfig,
    page_size: usize,
}

impl TessClient {
    /// Creates a client for the instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(
        key: &str,
        base_url: &str,
        http: &HttpConfig,
        tess: &TessConfig,
    ) -> Result<Self, AppError> {
        // A trailing slash keeps Url::join from dropping the last path segment.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|_| AppError::InvalidUrl(format!("Invalid TeSS URL: {}", base_url)))?;

        Ok(Self {
            client: build_client(http)?,
            key: key.to_string(),
            base_url,
            http: http.clone(),
            page_size: tess.page_size.max(1),
        })
    }

    pub fn from_instance(
        instance: &InstanceEntry,
        http: &HttpConfig,
        tess: &TessConfig,
    ) -> Result<Self, AppError> {
        Self::new(&instance.name, &instance.url, http, tess)
    }

    /// Instance key, used as the platform tag of converted records.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Base URL without trailing slash, for building `derived_from` links.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn materials_url(&self, page: usize) -> Result<Url, AppError> {
        let mut url = self
            .base_url
            .join("materials")
            .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("page_number", &page.to_string())
            .append_pair("page_size", &self.page_size.to_string());
        Ok(url)
    }

    fn post_url(&self) -> Result<Url, AppError> {
        self.base_url
            .join("materials.json")
            .map_err(|e| AppError::InvalidUrl(e.to_string()))
    }

    async fn fetch_page(&self, page: usize) -> Result<MaterialsPage, AppError> {
        let url = self.materials_url(page)?;
        let resp = send_with_retry(
            || self.client.get(url.clone()).header(ACCEPT, JSON_API),
            &self.http,
            true,
        )
        .await?;

        resp.json()
            .await
            .map_err(|e| AppError::ClientError(format!("Failed to parse materials page: {}", e)))
    }

    /// Fetches every material, following pagination until an empty page or
    /// a page without a `next` link.
    pub async fn list_materials(&self) -> Result<Vec<TessMaterial>, AppError> {
        let mut materials = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.fetch_page(page).await?;
            let received = batch.data.len();
            debug!("[{}] page {}: {} materials", self.key, page, received);
            materials.extend(batch.data);

            if received == 0 || batch.links.next.is_none() {
                break;
            }
            page += 1;
        }

        info!("[{}] fetched {} materials", self.key, materials.len());
        Ok(materials)
    }

    /// Creates a material on the instance.
    ///
    /// POSTs are not retried on server errors, so a failed upload never
    /// produces a duplicate.
    pub async fn post_material(
        &self,
        material: &LearningMaterial,
        credentials: &TessCredentials,
    ) -> Result<(), AppError> {
        let url = self.post_url()?;
        let body = material.envelope();
        send_with_retry(
            || {
                self.client
                    .post(url.clone())
                    .header(ACCEPT, "application/json")
                    .header("X-User-Email", &credentials.email)
                    .header("X-User-Token", &credentials.api_key)
                    .json(&body)
            },
            &self.http,
            false,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> Result<TessClient, AppError> {
        TessClient::new("taxila", url, &HttpConfig::default(), &TessConfig { page_size: 50 })
    }

    #[test]
    fn test_new_with_valid_url() {
        let client = client("https://taxila.nl").unwrap();
        assert_eq!(client.key(), "taxila");
        assert_eq!(client.base_url(), "https://taxila.nl");
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = client("not a url");
        assert!(matches!(result, Err(AppError::InvalidUrl(msg)) if msg.contains("Invalid TeSS URL")));
    }

    #[test]
    fn test_materials_url() {
        let client = client("https://taxila.nl/").unwrap();
        assert_eq!(
            client.materials_url(3).unwrap().as_str(),
            "https://taxila.nl/materials?page_number=3&page_size=50"
        );
    }

    #[test]
    fn test_urls_keep_base_path() {
        let client = client("https://example.org/tess").unwrap();
        assert_eq!(client.base_url(), "https://example.org/tess");
        assert_eq!(
            client.post_url().unwrap().as_str(),
            "https://example.org/tess/materials.json"
        );
    }

    #[test]
    fn test_page_deserialization() {
        let json = r#"{
            "data": [
                {"id": "1", "type": "materials", "attributes": {"title": "One"}, "links": {"self": "/materials/one"}},
                {"id": 2, "type": "materials", "attributes": {"title": "Two"}}
            ],
            "links": {"self": "/materials?page_number=1", "next": "/materials?page_number=2"},
            "meta": {"results-count": 2}
        }"#;
        let page: MaterialsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].id.to_string(), "2");
        assert!(page.links.next.is_some());

        let last: MaterialsPage = serde_json::from_str(r#"{"data": [], "links": {}}"#).unwrap();
        assert!(last.data.is_empty());
        assert!(last.links.next.is_none());
    }
}
