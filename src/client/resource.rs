//! Remote resource handles
//!
//! A [`Remote<T>`] pairs a record decoded from the API with the client it
//! came from, so that query and mutation methods can call back into the
//! same transport. The client is shared, never owned by one resource.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::{ClientResult, RestClient};

/// A record with a server-issued detail URL
pub trait Resource: DeserializeOwned {
    /// Detail URL of this resource
    fn url(&self) -> &str;

    /// Set the detail URL, for responses that omit it
    fn set_url(&mut self, url: String);
}

/// A record bound to the client it was fetched with
#[derive(Clone)]
pub struct Remote<T> {
    client: Arc<RestClient>,
    record: T,
}

impl<T> Remote<T> {
    /// Bind a record to a client
    pub fn new(client: Arc<RestClient>, record: T) -> Self {
        Self { client, record }
    }

    /// The locally held (possibly stale) record
    pub fn record(&self) -> &T {
        &self.record
    }

    /// Drop the client binding
    pub fn into_record(self) -> T {
        self.record
    }

    /// Client this resource calls back into
    pub fn client(&self) -> &Arc<RestClient> {
        &self.client
    }
}

impl<T: Resource> Remote<T> {
    /// Replace every field from a fresh server copy
    pub async fn refresh(&mut self) -> ClientResult<()> {
        let url = self.record.url().to_string();
        let fresh: T = self.client.get(&url).await?;
        self.replace(fresh, url);
        Ok(())
    }

    /// POST a partial update to the detail URL and adopt the server's reply
    pub(crate) async fn post_for_update<B>(&mut self, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.record.url().to_string();
        let fresh: T = self.client.post(&url, body).await?;
        self.replace(fresh, url);
        Ok(())
    }

    fn replace(&mut self, mut fresh: T, url: String) {
        if fresh.url().is_empty() {
            fresh.set_url(url);
        }
        self.record = fresh;
    }
}

impl<T> Deref for Remote<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T: fmt::Debug> fmt::Debug for Remote<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.record.fmt(f)
    }
}

impl RestClient {
    /// GET a single resource and bind it to this client
    pub async fn fetch<T>(self: &Arc<Self>, url: &str) -> ClientResult<Remote<T>>
    where
        T: DeserializeOwned,
    {
        let record = self.get(url).await?;
        Ok(Remote::new(Arc::clone(self), record))
    }

    /// GET a collection and bind each element to this client
    pub async fn fetch_all<T>(self: &Arc<Self>, url: &str) -> ClientResult<Vec<Remote<T>>>
    where
        T: DeserializeOwned,
    {
        let records: Vec<T> = self.get(url).await?;
        Ok(self.bind_all(records))
    }

    /// POST a creation request and bind the created resource
    pub async fn create<T, B>(self: &Arc<Self>, url: &str, body: &B) -> ClientResult<Remote<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let record = self.post(url, body).await?;
        Ok(Remote::new(Arc::clone(self), record))
    }

    /// Bind already-decoded records to this client
    pub fn bind_all<T>(self: &Arc<Self>, records: Vec<T>) -> Vec<Remote<T>> {
        records
            .into_iter()
            .map(|record| Remote::new(Arc::clone(self), record))
            .collect()
    }
}
