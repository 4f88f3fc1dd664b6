use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use url::Url;

use crate::domain::{
    City, CityPayload, Country, CountryPayload, Page, PageRequest, ResourceId, ResourceKind,
};

#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable response came back from the backend.
    #[error("no response from backend: {0}")]
    Transport(String),
    /// The backend answered with an error status and (usually) a message.
    #[error("backend rejected the request: {message}")]
    Rejected { status: u16, message: String },
    /// A by-id lookup missed.
    #[error("resource not found")]
    NotFound,
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Typed request surface for one resource kind. Performs no validation,
/// no caching and no retries; errors are classified and handed back.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    type Resource: Send;
    type Payload: Send + Sync;

    fn kind(&self) -> ResourceKind;

    async fn list(&self, page: PageRequest) -> Result<Page<Self::Resource>, ClientError>;

    async fn get_by_id(&self, id: ResourceId) -> Result<Self::Resource, ClientError>;

    async fn create(&self, payload: &Self::Payload) -> Result<Self::Resource, ClientError>;

    async fn update(
        &self,
        id: ResourceId,
        payload: &Self::Payload,
    ) -> Result<Self::Resource, ClientError>;

    async fn delete(&self, id: ResourceId) -> Result<(), ClientError>;
}

/// Error bodies carry `{"message": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn rejection(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    match response.json::<ErrorBody>().await {
        Ok(body) => ClientError::Rejected {
            status,
            message: body.message,
        },
        Err(_) => ClientError::Rejected {
            status,
            message: format!("HTTP {status}"),
        },
    }
}

/// REST transport shared by the typed clients, bound to one collection
/// under the API base: `{base}/{kind}` and `{base}/{kind}/{id}`.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: String,
    kind: ResourceKind,
}

impl RestClient {
    pub fn new(http: reqwest::Client, base_url: &Url, kind: ResourceKind) -> Self {
        Self {
            http,
            base: base_url.as_str().trim_end_matches('/').to_string(),
            kind,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base, self.kind.path())
    }

    fn item_url(&self, id: ResourceId) -> String {
        format!("{}/{}/{}", self.base, self.kind.path(), id)
    }

    #[tracing::instrument(name = "client::list", skip(self), fields(kind = %self.kind))]
    async fn list<R: DeserializeOwned>(&self, page: PageRequest) -> Result<Page<R>, ClientError> {
        let response = self
            .http
            .get(self.collection_url())
            .query(&[
                ("pageIndex", page.page_index),
                ("pageSize", page.page_size),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "client::get_by_id", skip(self), fields(kind = %self.kind))]
    async fn get_by_id<R: DeserializeOwned>(&self, id: ResourceId) -> Result<R, ClientError> {
        let response = self.http.get(self.item_url(id)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "client::create", skip(self, payload), fields(kind = %self.kind))]
    async fn create<R: DeserializeOwned, P: Serialize + Sync>(
        &self,
        payload: &P,
    ) -> Result<R, ClientError> {
        let response = self
            .http
            .post(self.collection_url())
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "client::update", skip(self, payload), fields(kind = %self.kind))]
    async fn update<R: DeserializeOwned, P: Serialize + Sync>(
        &self,
        id: ResourceId,
        payload: &P,
    ) -> Result<R, ClientError> {
        let response = self
            .http
            .put(self.item_url(id))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "client::delete", skip(self), fields(kind = %self.kind))]
    async fn delete(&self, id: ResourceId) -> Result<(), ClientError> {
        let response = self.http.delete(self.item_url(id)).send().await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CountryClient {
    inner: RestClient,
}

impl CountryClient {
    pub fn new(http: reqwest::Client, base_url: &Url) -> Self {
        Self {
            inner: RestClient::new(http, base_url, ResourceKind::Country),
        }
    }
}

#[async_trait]
impl ResourceClient for CountryClient {
    type Resource = Country;
    type Payload = CountryPayload;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Country
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Country>, ClientError> {
        self.inner.list(page).await
    }

    async fn get_by_id(&self, id: ResourceId) -> Result<Country, ClientError> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, payload: &CountryPayload) -> Result<Country, ClientError> {
        self.inner.create(payload).await
    }

    async fn update(&self, id: ResourceId, payload: &CountryPayload) -> Result<Country, ClientError> {
        self.inner.update(id, payload).await
    }

    async fn delete(&self, id: ResourceId) -> Result<(), ClientError> {
        self.inner.delete(id).await
    }
}

#[derive(Debug, Clone)]
pub struct CityClient {
    inner: RestClient,
}

impl CityClient {
    pub fn new(http: reqwest::Client, base_url: &Url) -> Self {
        Self {
            inner: RestClient::new(http, base_url, ResourceKind::City),
        }
    }
}

#[async_trait]
impl ResourceClient for CityClient {
    type Resource = City;
    type Payload = CityPayload;

    fn kind(&self) -> ResourceKind {
        ResourceKind::City
    }

    async fn list(&self, page: PageRequest) -> Result<Page<City>, ClientError> {
        self.inner.list(page).await
    }

    async fn get_by_id(&self, id: ResourceId) -> Result<City, ClientError> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, payload: &CityPayload) -> Result<City, ClientError> {
        self.inner.create(payload).await
    }

    async fn update(&self, id: ResourceId, payload: &CityPayload) -> Result<City, ClientError> {
        self.inner.update(id, payload).await
    }

    async fn delete(&self, id: ResourceId) -> Result<(), ClientError> {
        self.inner.delete(id).await
    }
}
