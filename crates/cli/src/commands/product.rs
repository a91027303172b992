//! Product lookup commands.
//!
//! # Usage
//!
//! ```bash
//! horno product show 7
//! horno product show 7 --json
//! ```

use horno_cart::{CartClientConfig, HttpCatalog, ProductCatalog};
use horno_core::ProductId;

use super::CommandError;

/// Resolve one product through the catalog and print it.
#[allow(clippy::print_stdout)]
pub async fn show(config: &CartClientConfig, id: ProductId, json: bool) -> Result<(), CommandError> {
    let catalog = HttpCatalog::new(config)?;
    let product = catalog.resolve(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
        return Ok(());
    }

    println!("#{} {}", product.id, product.name);
    println!("  Price: {}", product.price);
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    if let Some(image_url) = &product.image_url {
        println!("  Image: {image_url}");
    }
    Ok(())
}
