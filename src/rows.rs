//! Typed views over decoded dump rows.
//!
//! Field identification is purely positional. Each table's column layout
//! is documented once here as index constants; nothing ever parses the
//! column list in the COPY header. Rows shorter than a table's minimum
//! are malformed and parse to `None`; there is no best-effort recovery
//! of partial rows.

use crate::config::IMAGE_POSITION_SENTINEL;
use crate::dump::{is_null, non_empty, parse_bool_token};

/// `products`: 0 id, 1 created_at, 2 updated_at, 3 title, 4 slug,
/// 5 description, 6 thumbnail, 7 active
pub mod product_col {
    pub const ID: usize = 0;
    pub const TITLE: usize = 3;
    pub const SLUG: usize = 4;
    pub const DESCRIPTION: usize = 5;
    pub const THUMBNAIL: usize = 6;
    pub const ACTIVE: usize = 7;
    pub const MIN_FIELDS: usize = 5;
}

/// `variants`: 0 id, 1 created_at, 2 updated_at, 3 product_id, 4 name,
/// 5 sku, 6 image, 7 stock, 8 active. Source stock is ignored by policy.
pub mod variant_col {
    pub const ID: usize = 0;
    pub const PRODUCT_ID: usize = 3;
    pub const NAME: usize = 4;
    pub const SKU: usize = 5;
    pub const ACTIVE: usize = 8;
    pub const MIN_FIELDS: usize = 7;
}

/// `prices`: 0 id, 1 created_at, 2 updated_at, 3 variant_id, 4 amount
pub mod price_col {
    pub const VARIANT_ID: usize = 3;
    pub const AMOUNT: usize = 4;
    pub const MIN_FIELDS: usize = 5;
}

/// `product_images`: 0 id, 1 created_at, 2 updated_at, 3 product_id,
/// 4 url, 5 position
pub mod image_col {
    pub const PRODUCT_ID: usize = 3;
    pub const URL: usize = 4;
    pub const POSITION: usize = 5;
    pub const MIN_FIELDS: usize = 5;
}

/// `categories`: 0 id, 1 name
pub mod category_col {
    pub const ID: usize = 0;
    pub const NAME: usize = 1;
    pub const MIN_FIELDS: usize = 2;
}

/// `product_categories`: 0 product_id, 1 category_id
pub mod product_category_col {
    pub const PRODUCT_ID: usize = 0;
    pub const CATEGORY_ID: usize = 1;
    pub const MIN_FIELDS: usize = 2;
}

/// One `products` row. Ids stay in string form until a record is
/// emitted; title and slug stay raw (possibly null-sentinel) because the
/// catalog builder owns the skip decision and its diagnostics.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub active: bool,
}

impl ProductRow {
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() < product_col::MIN_FIELDS {
            return None;
        }
        Some(Self {
            id: fields[product_col::ID].to_string(),
            title: fields[product_col::TITLE].to_string(),
            slug: fields[product_col::SLUG].to_string(),
            description: fields
                .get(product_col::DESCRIPTION)
                .filter(|f| !is_null(f))
                .map(|f| f.to_string()),
            thumbnail: fields
                .get(product_col::THUMBNAIL)
                .and_then(|f| non_empty(f))
                .map(str::to_string),
            active: fields
                .get(product_col::ACTIVE)
                .map_or(true, |f| parse_bool_token(f)),
        })
    }
}

/// One `variants` row. The active flag is coerced here but never
/// serialized into the catalog.
#[derive(Debug, Clone)]
pub struct VariantRow {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub active: bool,
}

impl VariantRow {
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() < variant_col::MIN_FIELDS {
            return None;
        }
        Some(Self {
            id: fields[variant_col::ID].to_string(),
            product_id: fields[variant_col::PRODUCT_ID].to_string(),
            name: fields[variant_col::NAME].to_string(),
            sku: fields[variant_col::SKU].to_string(),
            active: fields
                .get(variant_col::ACTIVE)
                .map_or(true, |f| parse_bool_token(f)),
        })
    }
}

/// One `prices` row. The amount stays raw; normalization belongs to the
/// joiner and a non-integer amount means "no price", not an error.
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub variant_id: String,
    pub amount: String,
}

impl PriceRow {
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() < price_col::MIN_FIELDS {
            return None;
        }
        Some(Self {
            variant_id: fields[price_col::VARIANT_ID].to_string(),
            amount: fields[price_col::AMOUNT].to_string(),
        })
    }
}

/// One `product_images` row. Missing, null, or unparseable positions take
/// the sentinel so they sort after every positioned image.
#[derive(Debug, Clone)]
pub struct ImageRow {
    pub product_id: String,
    pub url: String,
    pub position: u32,
}

impl ImageRow {
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() < image_col::MIN_FIELDS {
            return None;
        }
        let url = non_empty(fields[image_col::URL])?;
        Some(Self {
            product_id: fields[image_col::PRODUCT_ID].to_string(),
            url: url.to_string(),
            position: fields
                .get(image_col::POSITION)
                .filter(|f| !is_null(f))
                .and_then(|f| f.parse().ok())
                .unwrap_or(IMAGE_POSITION_SENTINEL),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

impl CategoryRow {
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() < category_col::MIN_FIELDS {
            return None;
        }
        Some(Self {
            id: fields[category_col::ID].to_string(),
            name: fields[category_col::NAME].to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProductCategoryRow {
    pub product_id: String,
    pub category_id: String,
}

impl ProductCategoryRow {
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() < product_category_col::MIN_FIELDS {
            return None;
        }
        Some(Self {
            product_id: fields[product_category_col::PRODUCT_ID].to_string(),
            category_id: fields[product_category_col::CATEGORY_ID].to_string(),
        })
    }
}
