use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cache::{QueryCache, QueryKey, Subscription};
use crate::client::{CityClient, CountryClient, ResourceClient};
use crate::config::Settings;
use crate::domain::{
    City, CityPayload, Country, CountryPayload, Page, PageRequest, ResourceId, ResourceKind,
};
use crate::mutation::{MutationError, MutationExecutor};

/// Cached value for any query key. Listings and by-id lookups of both
/// kinds share one cache so a mutation can invalidate across all of them.
#[derive(Debug, Clone)]
pub enum QueryData {
    Countries(Page<Country>),
    Cities(Page<City>),
    Country(Country),
    City(City),
}

impl QueryData {
    pub fn into_countries(self) -> Option<Page<Country>> {
        match self {
            Self::Countries(page) => Some(page),
            _ => None,
        }
    }

    pub fn into_cities(self) -> Option<Page<City>> {
        match self {
            Self::Cities(page) => Some(page),
            _ => None,
        }
    }

    pub fn into_country(self) -> Option<Country> {
        match self {
            Self::Country(country) => Some(country),
            _ => None,
        }
    }

    pub fn into_city(self) -> Option<City> {
        match self {
            Self::City(city) => Some(city),
            _ => None,
        }
    }
}

/// One application session: the query cache, the typed REST clients and a
/// mutation executor per resource kind, wired from [`Settings`]. This is
/// the whole surface a view layer consumes.
pub struct Session {
    cache: QueryCache<QueryData>,
    country_client: Arc<CountryClient>,
    city_client: Arc<CityClient>,
    countries: MutationExecutor<CountryClient, QueryData>,
    cities: MutationExecutor<CityClient, QueryData>,
    page_size: u32,
}

impl Session {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let country_client = Arc::new(CountryClient::new(http.clone(), &settings.api_base_url));
        let city_client = Arc::new(CityClient::new(http, &settings.api_base_url));
        let cache = QueryCache::new();

        Ok(Self {
            countries: MutationExecutor::new(Arc::clone(&country_client), cache.clone()),
            cities: MutationExecutor::new(Arc::clone(&city_client), cache.clone()),
            cache,
            country_client,
            city_client,
            page_size: settings.page_size,
        })
    }

    pub fn cache(&self) -> &QueryCache<QueryData> {
        &self.cache
    }

    pub fn countries(&self, page_index: u32) -> Subscription<QueryData> {
        let page = PageRequest::new(page_index, self.page_size);
        let client = Arc::clone(&self.country_client);
        self.cache
            .subscribe(QueryKey::list(ResourceKind::Country, page), move || {
                let client = Arc::clone(&client);
                async move { client.list(page).await.map(QueryData::Countries) }
            })
    }

    pub fn cities(&self, page_index: u32) -> Subscription<QueryData> {
        let page = PageRequest::new(page_index, self.page_size);
        let client = Arc::clone(&self.city_client);
        self.cache
            .subscribe(QueryKey::list(ResourceKind::City, page), move || {
                let client = Arc::clone(&client);
                async move { client.list(page).await.map(QueryData::Cities) }
            })
    }

    pub fn country(&self, id: ResourceId) -> Subscription<QueryData> {
        let client = Arc::clone(&self.country_client);
        self.cache
            .subscribe(QueryKey::by_id(ResourceKind::Country, id), move || {
                let client = Arc::clone(&client);
                async move { client.get_by_id(id).await.map(QueryData::Country) }
            })
    }

    pub fn city(&self, id: ResourceId) -> Subscription<QueryData> {
        let client = Arc::clone(&self.city_client);
        self.cache
            .subscribe(QueryKey::by_id(ResourceKind::City, id), move || {
                let client = Arc::clone(&client);
                async move { client.get_by_id(id).await.map(QueryData::City) }
            })
    }

    pub async fn create_country(&self, payload: CountryPayload) -> Result<Country, MutationError> {
        self.countries.create(payload).await
    }

    pub async fn update_country(
        &self,
        id: ResourceId,
        payload: CountryPayload,
    ) -> Result<Country, MutationError> {
        self.countries.update(id, payload).await
    }

    pub async fn delete_country(&self, id: ResourceId) -> Result<(), MutationError> {
        self.countries.delete(id).await
    }

    pub async fn create_city(&self, payload: CityPayload) -> Result<City, MutationError> {
        self.cities.create(payload).await
    }

    pub async fn update_city(
        &self,
        id: ResourceId,
        payload: CityPayload,
    ) -> Result<City, MutationError> {
        self.cities.update(id, payload).await
    }

    pub async fn delete_city(&self, id: ResourceId) -> Result<(), MutationError> {
        self.cities.delete(id).await
    }
}
