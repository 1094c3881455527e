use crate::config::{MINOR_UNIT_DIVISOR, MINOR_UNIT_THRESHOLD, STOCK_PLACEHOLDER};
use crate::rows::{CategoryRow, ImageRow, PriceRow, ProductCategoryRow, VariantRow};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Intermediate variant record. Stock is the policy placeholder, never the
/// source value; the price is attached later by the catalog builder.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub stock: u32,
    pub active: bool,
}

/// In-memory lookup structures joining the five auxiliary tables to
/// products. All keys are the string form of ids as they appear in the
/// dump; only emitted ids are parsed to integers. Category names are
/// resolved eagerly during build, so the id-to-name map never outlives
/// it.
pub struct CatalogIndex {
    product_categories: FxHashMap<String, Vec<String>>,
    product_images: FxHashMap<String, Vec<String>>,
    product_variants: FxHashMap<String, Vec<VariantRecord>>,
    variant_prices: FxHashMap<String, i64>,
}

/// Amounts at or above the threshold are minor-unit and divide down,
/// truncating. Anything that does not parse as an integer is "no price".
pub fn normalize_price(raw: &str) -> Option<i64> {
    let amount: i64 = raw.parse().ok()?;
    if amount >= MINOR_UNIT_THRESHOLD {
        Some(amount / MINOR_UNIT_DIVISOR)
    } else {
        Some(amount)
    }
}

impl CatalogIndex {
    pub fn build(
        categories: &[CategoryRow],
        product_categories: &[ProductCategoryRow],
        images: &[ImageRow],
        variants: &[VariantRow],
        prices: &[PriceRow],
    ) -> Self {
        // id -> name; duplicate ids keep the last row, matching the
        // last-write-wins policy of the price join.
        let mut category_names = FxHashMap::default();
        for cat in categories {
            category_names.insert(cat.id.clone(), cat.name.clone());
        }

        // Join-row order is preserved; rows naming an unknown category
        // contribute nothing.
        let mut resolved_joins = 0usize;
        let mut product_cats: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for pc in product_categories {
            if let Some(name) = category_names.get(&pc.category_id) {
                product_cats
                    .entry(pc.product_id.clone())
                    .or_default()
                    .push(name.clone());
                resolved_joins += 1;
            } else {
                debug!(
                    product_id = %pc.product_id,
                    category_id = %pc.category_id,
                    "Dropping join row for unknown category"
                );
            }
        }

        // Group, stable-sort by position, flatten to URLs. The stable
        // sort keeps dump order for equal positions (sentinel ties).
        let mut grouped: FxHashMap<String, Vec<(u32, String)>> = FxHashMap::default();
        for img in images {
            grouped
                .entry(img.product_id.clone())
                .or_default()
                .push((img.position, img.url.clone()));
        }
        let mut product_images = FxHashMap::default();
        for (product_id, mut pairs) in grouped {
            pairs.sort_by_key(|(position, _)| *position);
            product_images.insert(
                product_id,
                pairs.into_iter().map(|(_, url)| url).collect(),
            );
        }

        let mut product_variants: FxHashMap<String, Vec<VariantRecord>> = FxHashMap::default();
        for var in variants {
            let Ok(id) = var.id.parse::<i64>() else {
                debug!(variant_id = %var.id, "Skipping variant with non-integer id");
                continue;
            };
            product_variants
                .entry(var.product_id.clone())
                .or_default()
                .push(VariantRecord {
                    id,
                    name: var.name.clone(),
                    sku: var.sku.clone(),
                    stock: STOCK_PLACEHOLDER,
                    active: var.active,
                });
        }

        // 1:1 join on variant id; duplicates in the source keep the last
        // amount seen.
        let mut variant_prices = FxHashMap::default();
        for price in prices {
            if let Some(amount) = normalize_price(&price.amount) {
                variant_prices.insert(price.variant_id.clone(), amount);
            } else {
                debug!(
                    variant_id = %price.variant_id,
                    amount = %price.amount,
                    "Dropping price with non-integer amount"
                );
            }
        }

        info!(
            categories = category_names.len(),
            category_joins = resolved_joins,
            products_with_images = product_images.len(),
            products_with_variants = product_variants.len(),
            prices = variant_prices.len(),
            "Lookup structures built"
        );

        Self {
            product_categories: product_cats,
            product_images,
            product_variants,
            variant_prices,
        }
    }

    /// Category names for a product, in join-row order. Unknown product
    /// ids resolve to an empty list, never an error.
    pub fn categories_for(&self, product_id: &str) -> &[String] {
        self.product_categories
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Image URLs for a product, sorted ascending by position.
    pub fn images_for(&self, product_id: &str) -> &[String] {
        self.product_images
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn variants_for(&self, product_id: &str) -> &[VariantRecord] {
        self.product_variants
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn price_for(&self, variant_id: &str) -> Option<i64> {
        self.variant_prices.get(variant_id).copied()
    }
}
