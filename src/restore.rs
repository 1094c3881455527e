//! Regenerates an idempotent SQL upsert script from a catalog file.
//!
//! Each product becomes one explicit transaction: the product upsert,
//! its variant upserts (prices attached through the variant CTE's
//! returned id, not a correlated subquery), and its image inserts. The
//! script closes by resetting the products id sequence.

use crate::catalog::read_catalog;
use crate::models::{Product, Variant};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// SQL templates. `{...}` placeholders are replaced with escaped
/// literals at generation time.
const SQL_UPSERT_PRODUCT: &str = "\
INSERT INTO products (id, title, slug, description, thumbnail, active, base_price)
VALUES ({id}, {title}, {slug}, {description}, {thumbnail}, {active}, {base_price})
ON CONFLICT (id) DO UPDATE SET
    title = EXCLUDED.title,
    slug = EXCLUDED.slug,
    description = EXCLUDED.description,
    thumbnail = EXCLUDED.thumbnail,
    active = EXCLUDED.active,
    base_price = EXCLUDED.base_price;";

/// The variant display name lands in the legacy `size` column.
const SQL_UPSERT_VARIANT: &str = "\
INSERT INTO product_variants (product_id, sku, size, color, stock_quantity, price_adjustment, active, image)
VALUES ({product_id}, {sku}, {size}, NULL, {stock}, 0, true, NULL)
ON CONFLICT (sku) DO UPDATE SET
    stock_quantity = EXCLUDED.stock_quantity,
    size = EXCLUDED.size,
    active = EXCLUDED.active;";

/// Variant upsert with its price attached via the returned id. The CTE
/// propagates the id whether the variant was inserted or updated, so no
/// existence check against prices is needed.
const SQL_UPSERT_VARIANT_WITH_PRICE: &str = "\
WITH variant AS (
    INSERT INTO product_variants (product_id, sku, size, color, stock_quantity, price_adjustment, active, image)
    VALUES ({product_id}, {sku}, {size}, NULL, {stock}, 0, true, NULL)
    ON CONFLICT (sku) DO UPDATE SET
        stock_quantity = EXCLUDED.stock_quantity,
        size = EXCLUDED.size,
        active = EXCLUDED.active
    RETURNING id
)
INSERT INTO prices (variant_id, amount, currency)
SELECT id, {amount}, {currency} FROM variant
ON CONFLICT (variant_id) DO UPDATE SET
    amount = EXCLUDED.amount,
    currency = EXCLUDED.currency;";

const SQL_INSERT_IMAGE: &str = "\
INSERT INTO product_images (product_id, url, position)
VALUES ({product_id}, {url}, {position})
ON CONFLICT DO NOTHING;";

const SQL_RESET_PRODUCT_SEQUENCE: &str =
    "SELECT setval('products_id_seq', (SELECT MAX(id) FROM products));";

#[derive(Debug, Default)]
pub struct RestoreSummary {
    pub products: u64,
    pub variants: u64,
    pub prices: u64,
    pub images: u64,
    pub statements: u64,
}

/// Renders a string as a SQL literal, doubling embedded single quotes.
/// `None` renders as `NULL`.
pub fn sql_literal(value: Option<&str>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn product_upsert(product: &Product) -> String {
    SQL_UPSERT_PRODUCT
        .replace("{id}", &product.id.to_string())
        .replace("{title}", &sql_literal(Some(&product.title)))
        .replace("{slug}", &sql_literal(Some(&product.slug)))
        .replace("{description}", &sql_literal(Some(&product.description)))
        .replace("{thumbnail}", &sql_literal(product.thumbnail.as_deref()))
        .replace("{active}", if product.active { "true" } else { "false" })
        .replace("{base_price}", &product.base_price().to_string())
}

fn variant_upsert(product_id: i64, variant: &Variant) -> String {
    let template = match variant.price {
        Some(_) => SQL_UPSERT_VARIANT_WITH_PRICE,
        None => SQL_UPSERT_VARIANT,
    };
    let mut sql = template
        .replace("{product_id}", &product_id.to_string())
        .replace("{sku}", &sql_literal(Some(&variant.sku)))
        .replace("{size}", &sql_literal(Some(&variant.name)))
        .replace("{stock}", &variant.stock.to_string());
    if let Some(amount) = variant.price {
        sql = sql
            .replace("{amount}", &amount.to_string())
            .replace("{currency}", &sql_literal(Some(&variant.currency)));
    }
    sql
}

fn image_insert(product_id: i64, url: &str, position: usize) -> String {
    SQL_INSERT_IMAGE
        .replace("{product_id}", &product_id.to_string())
        .replace("{url}", &sql_literal(Some(url)))
        .replace("{position}", &position.to_string())
}

/// Generates the full statement list for a catalog: one transaction per
/// product, then the sequence reset.
pub fn generate_statements(products: &[Product]) -> (Vec<String>, RestoreSummary) {
    let mut statements = Vec::new();
    let mut summary = RestoreSummary::default();

    for product in products {
        statements.push("BEGIN;".to_string());
        statements.push(product_upsert(product));
        summary.products += 1;

        for variant in &product.variants {
            statements.push(variant_upsert(product.id, variant));
            summary.variants += 1;
            if variant.price.is_some() {
                summary.prices += 1;
            }
        }

        for (position, url) in product.images.iter().enumerate() {
            statements.push(image_insert(product.id, url, position));
            summary.images += 1;
        }

        statements.push("COMMIT;".to_string());
    }

    statements.push(SQL_RESET_PRODUCT_SEQUENCE.to_string());
    summary.statements = statements.len() as u64;
    (statements, summary)
}

/// Reads a catalog file and writes the restore script, temp-then-rename
/// like the catalog itself.
pub fn run_restore(input: &str, output: &str) -> Result<RestoreSummary> {
    let products = read_catalog(Path::new(input))?;
    info!(products = products.len(), "Catalog loaded");

    let (statements, summary) = generate_statements(&products);

    let path = Path::new(output);
    let tmp_path = path.with_extension("sql.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp script file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    for statement in &statements {
        writeln!(writer, "{}", statement)
            .with_context(|| format!("Failed to write script: {:?}", tmp_path))?;
    }
    writer.flush().context("Failed to flush script")?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move script into place: {:?}", path))?;

    info!(path = output, statements = summary.statements, "Restore script written");
    Ok(summary)
}
