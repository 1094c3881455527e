use crate::config::CURRENCY_CODE;
use crate::dump::{decode_row, non_empty};
use crate::join::CatalogIndex;
use crate::models::{Product, Variant};
use crate::rows::{product_col, ProductRow};
use crate::stats::RunStats;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Assembles one catalog record per product row, in source order, then
/// sorts ascending by id (the dump is not assumed sorted).
///
/// A row is skipped, never erroring, when it is too short, its id is not
/// an integer, or title/slug are null-sentinel/empty. Everything else
/// resolves through the index; unknown product ids just yield empty
/// lists.
pub fn build_products(
    lines: &[&str],
    index: &CatalogIndex,
    stats: &mut RunStats,
) -> Vec<Product> {
    let mut products = Vec::with_capacity(lines.len());

    for line in lines {
        let fields = decode_row(line);
        let Some(row) = ProductRow::parse(&fields) else {
            stats.record_skip(format!(
                "product row has {} fields, expected at least {}",
                fields.len(),
                product_col::MIN_FIELDS
            ));
            continue;
        };

        let Ok(id) = row.id.parse::<i64>() else {
            stats.record_skip(format!("product '{}': non-integer id", row.id));
            continue;
        };

        if non_empty(&row.title).is_none() || non_empty(&row.slug).is_none() {
            stats.record_skip(format!(
                "product {}: title='{}', slug='{}'",
                row.id, row.title, row.slug
            ));
            continue;
        }

        let categories = index.categories_for(&row.id).to_vec();
        let images = index.images_for(&row.id).to_vec();

        // Source thumbnail wins; otherwise the first image by sorted
        // position; otherwise stays null. Description is the one field
        // that collapses to "" instead.
        let thumbnail = row.thumbnail.clone().or_else(|| images.first().cloned());

        let variants = index
            .variants_for(&row.id)
            .iter()
            .map(|v| Variant {
                id: v.id,
                name: v.name.clone(),
                sku: v.sku.clone(),
                price: index.price_for(&v.id.to_string()),
                currency: CURRENCY_CODE.to_string(),
                stock: v.stock,
            })
            .collect();

        debug!(id, slug = %row.slug, "Assembled product");
        products.push(Product {
            id,
            title: row.title,
            slug: row.slug,
            description: row.description.unwrap_or_default(),
            thumbnail,
            active: row.active,
            categories,
            variants,
            images,
        });
        stats.products_written += 1;
    }

    products.sort_by_key(|p| p.id);
    products
}

/// Writes the catalog as pretty JSON, unicode preserved. The file is
/// written next to the target and renamed into place so a failed run
/// never leaves a partial catalog.
pub fn write_catalog(products: &[Product], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp catalog file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, products).context("Failed to serialize catalog")?;
    writer.flush().context("Failed to flush catalog")?;

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move catalog into place: {:?}", path))?;
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<Vec<Product>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open catalog: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse catalog JSON: {:?}", path))
}
