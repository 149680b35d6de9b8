//! Data bundle commands

use clap::Args;
use std::path::PathBuf;

use crate::config::BUNDLES_ROOT;
use crate::data::{BundleAccess, DataBundle, DataManager};
use crate::identifier::ResourceRef;
use crate::Remote;

use super::format::{format_bytes, truncate};
use super::jobs::download_file;
use super::{CliError, Context};

/// Arguments naming a bundle by ID or URL
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Numeric bundle ID or bundle detail URL
    pub bundle: ResourceRef,
    /// Directory to save into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// bundle-details arguments
#[derive(Args, Debug)]
pub struct BundleDetailsArgs {
    /// Numeric bundle ID or bundle detail URL
    pub bundle: ResourceRef,
    /// Omit the listing of the bundle's files
    #[arg(long)]
    pub no_files: bool,
}

impl BundleDetailsArgs {
    /// Print the bundle
    pub async fn execute(&self, ctx: &Context) -> Result<(), CliError> {
        let bundle = fetch_bundle(ctx, &self.bundle).await?;
        render_bundle(&bundle, self.no_files);
        Ok(())
    }
}

async fn fetch_bundle(ctx: &Context, bundle: &ResourceRef) -> Result<Remote<DataBundle>, CliError> {
    let mgr = DataManager::new(ctx.client.clone());
    let bundle = match bundle {
        ResourceRef::Id(id) => mgr.get_bundle(*id).await?,
        ResourceRef::Url(_) => mgr.get_bundle_by_url(&bundle.to_url(BUNDLES_ROOT)).await?,
    };
    Ok(bundle)
}

fn render_bundle(bundle: &DataBundle, no_files: bool) {
    println!("                    ID: {}", bundle.id);
    println!("                  Name: {}", bundle.name);
    println!("          Date created: {}", bundle.date_created.as_deref().unwrap_or("-"));
    println!("       Total data size: {}", format_bytes(bundle.total_size));
    println!("        Cost per month: £{:.2}", bundle.monthly_price);
    if let Some(bundle_type) = bundle.bundle_type {
        println!("           Bundle type: {bundle_type}");
        let filters = [
            ("File extension filters", &bundle.file_extensions),
            ("MIME type filters", &bundle.mime_type_filters),
            ("MIME type override", &bundle.mime_type_override),
            ("Encoding override", &bundle.encoding),
        ];
        for (label, value) in filters {
            if let Some(value) = value {
                println!("{label:>22}: {value}");
            }
        }
    }
    println!();
    match bundle.access() {
        BundleAccess::Downloadable => {
            println!("Bundle contains {} file(s):", bundle.files.len());
            if !no_files {
                for entry in &bundle.files {
                    println!("{}", entry.url);
                }
            }
        }
        BundleAccess::InputOnly => {
            println!("Bundle is not directly downloadable, but can be used as input");
            println!("to an annotation job.");
        }
        BundleAccess::OpenForUploads => println!("Bundle is currently open for uploads."),
    }
}

/// list-bundles
pub async fn list_bundles(ctx: &Context) -> Result<(), CliError> {
    let mgr = DataManager::new(ctx.client.clone());
    let bundles = mgr.list_bundles().await?;
    if bundles.is_empty() {
        println!("No data bundles found");
        return Ok(());
    }
    println!("    ID  Name                                      Notes");
    println!("----------------------------------------------------------");
    for bundle in bundles {
        let notes = match bundle.access() {
            BundleAccess::OpenForUploads => "Open for uploads",
            BundleAccess::InputOnly => "Not directly downloadable",
            BundleAccess::Downloadable => "",
        };
        println!("{:>6}  {:<40}  {}", bundle.id, truncate(&bundle.name, 40), notes);
    }
    Ok(())
}

/// download-bundle
pub async fn download_bundle(ctx: &Context, args: &BundleArgs) -> Result<(), CliError> {
    let bundle = fetch_bundle(ctx, &args.bundle).await?;
    let entries = bundle.download_entries()?;
    let total = entries.len();
    for (i, entry) in entries.iter().enumerate() {
        let file_name = entry.file_name().ok_or_else(|| {
            CliError::InvalidArgument(format!("{} does not name a file", entry.url))
        })?;
        println!("{} (file {} of {})", file_name, i + 1, total);
        let target = entry.url_to_download().await?;
        download_file(&ctx.client, &target, &args.output_dir.join(&file_name), &file_name).await?;
    }
    Ok(())
}
