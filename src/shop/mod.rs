//! The AnnoMarket shop: purchasable annotation pipelines

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::client::{ClientResult, Remote, Resource, RestClient};
use crate::config::SHOP_ROOT;
use crate::job::Job;
use crate::Prices;

/// A pipeline offered in the shop
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Detail URL
    #[serde(default)]
    pub url: String,
    /// Numeric ID
    pub id: u64,
    /// Item name
    #[serde(default)]
    pub name: String,
    /// Prices charged by jobs created from this item
    #[serde(default)]
    pub price: Option<Prices>,
    /// One-paragraph description
    #[serde(default)]
    pub short_description: Option<String>,
}

impl Resource for Item {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_url(&mut self, url: String) {
        self.url = url;
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReserveRequest {
    payment_allowed: bool,
}

impl Remote<Item> {
    /// Reserve a new job running this item's pipeline
    ///
    /// `payment_allowed` must be true for items that cost money; the server
    /// refuses the reservation otherwise.
    pub async fn reserve(&self, payment_allowed: bool) -> ClientResult<Remote<Job>> {
        info!("Reserving job from item {}", self.id);
        let url = format!("{}/reserve", self.url.trim_end_matches('/'));
        self.client()
            .create(&url, &ReserveRequest { payment_allowed })
            .await
    }
}

/// Entry point for shop queries
#[derive(Debug, Clone)]
pub struct Shop {
    client: Arc<RestClient>,
}

impl Shop {
    /// Create a shop view sharing the given client
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    /// List items, optionally narrowed by keywords
    pub async fn list_items(&self, keywords: &[String]) -> ClientResult<Vec<Remote<Item>>> {
        let mut url = self.client.resolve(SHOP_ROOT)?;
        if !keywords.is_empty() {
            let mut query = url.query_pairs_mut();
            for keyword in keywords {
                query.append_pair("keyword", keyword);
            }
        }
        self.client.fetch_all(url.as_str()).await
    }

    /// Fetch an item by numeric ID
    pub async fn get_item(&self, id: u64) -> ClientResult<Remote<Item>> {
        self.get_item_by_url(&format!("{SHOP_ROOT}/{id}")).await
    }

    /// Fetch an item by detail URL
    pub async fn get_item_by_url(&self, url: &str) -> ClientResult<Remote<Item>> {
        let mut record: Item = self.client.get(url).await?;
        if record.url.is_empty() {
            record.url = self.client.resolve(url)?.to_string();
        }
        Ok(Remote::new(Arc::clone(&self.client), record))
    }
}
