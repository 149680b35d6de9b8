//! Shop commands

use clap::Args;
use tracing::info;

use crate::config::SHOP_ROOT;
use crate::identifier::{parse_id, ResourceRef};
use crate::shop::{Item, Shop};

use super::format::{format_prices, truncate};
use super::{CliError, Context};

/// list-items arguments
#[derive(Args, Debug)]
pub struct ListItemsArgs {
    /// Keywords to filter items by
    pub keywords: Vec<String>,
}

impl ListItemsArgs {
    /// Print one line per item
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let shop = Shop::new(ctx.client.clone());
        let items = shop.list_items(&self.keywords).await?;
        if items.is_empty() {
            println!("No items found");
            return Ok(());
        }
        println!("    ID  Name                                        Price");
        println!("----------------------------------------------------------");
        for item in items {
            println!(
                "{:>6}  {:<42}  {}",
                item.id,
                truncate(&item.name, 42),
                format_prices(item.price.as_ref())
            );
        }
        Ok(())
    }
}

/// Arguments naming an item by ID
#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Numeric item ID
    #[arg(value_parser = parse_id)]
    pub item_id: u64,
}

/// reserve-job arguments
#[derive(Args, Debug)]
pub struct ReserveJobArgs {
    /// Numeric item ID or item detail URL
    pub item: ResourceRef,
    /// Name to give the new job
    pub name: Option<String>,
}

impl ReserveJobArgs {
    /// Reserve the job, rename it if asked, and print it
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let shop = Shop::new(ctx.client.clone());
        let item = match &self.item {
            ResourceRef::Id(id) => shop.get_item(*id).await?,
            ResourceRef::Url(_) => shop.get_item_by_url(&self.item.to_url(SHOP_ROOT)).await?,
        };
        if !ctx.payment_allowed && item.price.is_some_and(|p| !p.is_free()) {
            info!("Item {} is not free; the server may refuse without --allow-payment", item.id);
        }
        let mut job = item.reserve(ctx.payment_allowed).await?;
        println!("Successfully reserved job.");
        if let Some(name) = &self.name {
            job.rename(name).await?;
        }
        println!();
        println!("  ID: {}", job.id);
        println!("Name: {}", job.name);
        Ok(())
    }
}

/// item-details
pub async fn item_details(ctx: &Context, item_id: u64) -> Result<(), CliError> {
    let shop = Shop::new(ctx.client.clone());
    let item = shop.get_item(item_id).await?;
    render_item(&item);
    Ok(())
}

fn render_item(item: &Item) {
    println!("   ID: {}", item.id);
    println!(" Name: {}", item.name);
    println!("Price: {}", format_prices(item.price.as_ref()));
    println!();
    println!("Description");
    println!("-----------");
    println!();
    println!("{}", item.short_description.as_deref().unwrap_or(""));
}
