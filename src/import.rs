//! Loads a catalog file directly into a live PostgreSQL database.
//!
//! The target is the redesigned schema: surrogate bigserial ids,
//! products unique by slug, variants unique by SKU, prices keyed by
//! variant id. Each product is one explicit transaction; the id
//! returned by every upsert flows into the dependent statements, so no
//! statement ever has to re-find a row it just wrote. Execution is
//! strictly sequential.

use crate::catalog::read_catalog;
use crate::config;
use crate::models::Product;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tokio_postgres::{Client, NoTls};
use tracing::{info, warn};

/// Target schema. `IF NOT EXISTS` keeps re-runs harmless.
const SCHEMA_DDL: &str = "\
CREATE TABLE IF NOT EXISTS products (
    id bigserial PRIMARY KEY,
    slug text NOT NULL UNIQUE,
    title text NOT NULL,
    description text NOT NULL DEFAULT '',
    thumbnail text,
    active boolean NOT NULL DEFAULT true,
    base_price bigint NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS product_variants (
    id bigserial PRIMARY KEY,
    product_id bigint NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    sku text NOT NULL UNIQUE,
    name text NOT NULL,
    stock_quantity bigint NOT NULL DEFAULT 0,
    active boolean NOT NULL DEFAULT true
);
CREATE TABLE IF NOT EXISTS prices (
    variant_id bigint PRIMARY KEY REFERENCES product_variants(id) ON DELETE CASCADE,
    amount bigint NOT NULL,
    currency text NOT NULL
);
CREATE TABLE IF NOT EXISTS product_images (
    id bigserial PRIMARY KEY,
    product_id bigint NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    url text NOT NULL,
    position bigint NOT NULL DEFAULT 0
);";

const SQL_TRUNCATE: &str =
    "TRUNCATE products, product_variants, prices, product_images RESTART IDENTITY CASCADE;";

const SQL_UPSERT_PRODUCT: &str = "\
INSERT INTO products (slug, title, description, thumbnail, active, base_price)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (slug) DO UPDATE SET
    title = EXCLUDED.title,
    description = EXCLUDED.description,
    thumbnail = EXCLUDED.thumbnail,
    active = EXCLUDED.active,
    base_price = EXCLUDED.base_price
RETURNING id";

const SQL_UPSERT_VARIANT: &str = "\
INSERT INTO product_variants (product_id, sku, name, stock_quantity)
VALUES ($1, $2, $3, $4)
ON CONFLICT (sku) DO UPDATE SET
    product_id = EXCLUDED.product_id,
    name = EXCLUDED.name,
    stock_quantity = EXCLUDED.stock_quantity
RETURNING id";

const SQL_UPSERT_PRICE: &str = "\
INSERT INTO prices (variant_id, amount, currency)
VALUES ($1, $2, $3)
ON CONFLICT (variant_id) DO UPDATE SET
    amount = EXCLUDED.amount,
    currency = EXCLUDED.currency";

const SQL_DELETE_IMAGES: &str = "DELETE FROM product_images WHERE product_id = $1";

const SQL_INSERT_IMAGE: &str = "\
INSERT INTO product_images (product_id, url, position)
VALUES ($1, $2, $3)";

pub struct ImportConfig {
    pub catalog_path: String,
    pub db_url: String,
    pub clean: bool,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub products: u64,
    pub variants: u64,
    pub prices: u64,
    pub images: u64,
}

pub async fn run_import(config: ImportConfig) -> Result<ImportSummary> {
    let start = Instant::now();

    let products = read_catalog(Path::new(&config.catalog_path))?;
    println!();
    println!(
        "==> Loaded {} products from {}",
        products.len(),
        config.catalog_path
    );

    println!();
    println!("==> Connecting to PostgreSQL ...");
    let mut client = connect_with_retry(&config.db_url).await?;
    println!("    Connected.");

    client
        .batch_execute(SCHEMA_DDL)
        .await
        .context("Failed to ensure target schema")?;

    if config.clean {
        println!();
        println!("==> Truncating existing catalog tables ...");
        client
            .batch_execute(SQL_TRUNCATE)
            .await
            .context("Failed to truncate catalog tables")?;
    }

    println!();
    println!("==> Importing products ...");
    let pb = make_progress_bar(products.len() as u64, "Products");
    let mut summary = ImportSummary::default();
    for product in &products {
        import_product(&mut client, product, &mut summary)
            .await
            .with_context(|| {
                format!("Import failed at product {} ({})", product.id, product.slug)
            })?;
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} products imported", summary.products));

    let elapsed = start.elapsed();
    println!();
    println!("============================================");
    println!("  SUCCESS: Import complete!");
    println!("============================================");
    println!();
    println!("Total time:         {:.2}s", elapsed.as_secs_f64());
    println!("Products:           {}", summary.products);
    println!("Variants:           {}", summary.variants);
    println!("Prices:             {}", summary.prices);
    println!("Images:             {}", summary.images);

    Ok(summary)
}

/// One transaction per product. The upsert's returned id feeds the
/// dependent rows; image rows are replaced wholesale so positions track
/// the catalog exactly.
async fn import_product(
    client: &mut Client,
    product: &Product,
    summary: &mut ImportSummary,
) -> Result<()> {
    let tx = client
        .transaction()
        .await
        .context("Failed to begin transaction")?;

    let row = tx
        .query_one(
            SQL_UPSERT_PRODUCT,
            &[
                &product.slug,
                &product.title,
                &product.description,
                &product.thumbnail,
                &product.active,
                &product.base_price(),
            ],
        )
        .await
        .context("Product upsert failed")?;
    let product_id: i64 = row.get(0);

    for variant in &product.variants {
        let row = tx
            .query_one(
                SQL_UPSERT_VARIANT,
                &[
                    &product_id,
                    &variant.sku,
                    &variant.name,
                    &(variant.stock as i64),
                ],
            )
            .await
            .with_context(|| format!("Variant upsert failed for SKU {}", variant.sku))?;
        let variant_id: i64 = row.get(0);
        summary.variants += 1;

        if let Some(amount) = variant.price {
            tx.execute(SQL_UPSERT_PRICE, &[&variant_id, &amount, &variant.currency])
                .await
                .with_context(|| format!("Price upsert failed for SKU {}", variant.sku))?;
            summary.prices += 1;
        }
    }

    tx.execute(SQL_DELETE_IMAGES, &[&product_id])
        .await
        .context("Image cleanup failed")?;
    for (position, url) in product.images.iter().enumerate() {
        tx.execute(SQL_INSERT_IMAGE, &[&product_id, url, &(position as i64)])
            .await
            .with_context(|| format!("Image insert failed for {}", url))?;
        summary.images += 1;
    }

    tx.commit().await.context("Failed to commit transaction")?;
    summary.products += 1;
    Ok(())
}

async fn connect_with_retry(db_url: &str) -> Result<Client> {
    let max_retries = config::IMPORT_MAX_RETRIES;
    let delay = tokio::time::Duration::from_secs(config::IMPORT_RETRY_DELAY_SECS);

    for attempt in 1..=max_retries {
        match tokio_postgres::connect(db_url, NoTls).await {
            Ok((client, connection)) => {
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        warn!(error = %e, "PostgreSQL connection error");
                    }
                });
                return Ok(client);
            }
            Err(e) if attempt < max_retries => {
                info!(attempt, "Cannot connect to PostgreSQL, retrying: {e}");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(e).context(format!(
                    "Cannot connect to PostgreSQL after {max_retries} attempts.\n\
                     Is the database running? Check the connection string."
                ));
            }
        }
    }

    bail!("Cannot connect to PostgreSQL after {max_retries} attempts")
}

fn make_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "    {{spinner:.cyan}} {label:<10} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
            ))
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
