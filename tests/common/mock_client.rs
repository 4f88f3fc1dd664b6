use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use atlas_sync::client::{ClientError, ResourceClient};
use atlas_sync::domain::{Country, CountryPayload, Page, PageRequest, ResourceId, ResourceKind};

#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounts {
    pub list: u32,
    pub get_by_id: u32,
    pub create: u32,
    pub update: u32,
    pub delete: u32,
}

/// In-memory stand-in for the country backend with call counting and
/// one-shot failure injection.
#[derive(Clone, Default)]
pub struct MockCountryClient {
    pub store: Arc<Mutex<Vec<Country>>>,
    next_id: Arc<Mutex<ResourceId>>,
    calls: Arc<Mutex<CallCounts>>,
    fail_next: Arc<Mutex<Option<ClientError>>>,
}

impl MockCountryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    pub fn fail_next_write(&self, error: ClientError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    fn take_failure(&self) -> Option<ClientError> {
        self.fail_next.lock().unwrap().take()
    }
}

#[async_trait]
impl ResourceClient for MockCountryClient {
    type Resource = Country;
    type Payload = CountryPayload;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Country
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Country>, ClientError> {
        self.calls.lock().unwrap().list += 1;

        let store = self.store.lock().unwrap();
        let items = store
            .iter()
            .skip((page.page_index * page.page_size) as usize)
            .take(page.page_size as usize)
            .cloned()
            .collect();
        Ok(Page {
            items,
            total: store.len() as u64,
        })
    }

    async fn get_by_id(&self, id: ResourceId) -> Result<Country, ClientError> {
        self.calls.lock().unwrap().get_by_id += 1;

        let store = self.store.lock().unwrap();
        store
            .iter()
            .find(|country| country.id == id)
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    async fn create(&self, payload: &CountryPayload) -> Result<Country, ClientError> {
        self.calls.lock().unwrap().create += 1;
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let country = Country {
            id: *next_id,
            name: payload.name.clone(),
            flag: payload.flag.clone(),
        };
        self.store.lock().unwrap().push(country.clone());
        Ok(country)
    }

    async fn update(&self, id: ResourceId, payload: &CountryPayload) -> Result<Country, ClientError> {
        self.calls.lock().unwrap().update += 1;
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let mut store = self.store.lock().unwrap();
        let country = store
            .iter_mut()
            .find(|country| country.id == id)
            .ok_or(ClientError::NotFound)?;
        country.name = payload.name.clone();
        country.flag = payload.flag.clone();
        Ok(country.clone())
    }

    async fn delete(&self, id: ResourceId) -> Result<(), ClientError> {
        self.calls.lock().unwrap().delete += 1;
        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        self.store.lock().unwrap().retain(|country| country.id != id);
        Ok(())
    }
}
