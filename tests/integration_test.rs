//! Integration tests for the dump-to-catalog extraction pipeline.
//!
//! Tests drive the public `run_extraction` entry point over an in-repo
//! dump fixture and validate the written artifact. Sections:
//!
//! - **Pipeline Tests** -- full dump to catalog flow, counters, sorting
//! - **Normalization Tests** -- price scaling, image ordering, thumbnail
//!   fallback, active coercion
//! - **Exclusion Tests** -- skip rules for malformed and placeholder rows
//! - **Robustness Tests** -- missing blocks, CRLF dumps, idempotence
//!
//! # Sample Data
//!
//! The fixture holds three valid products in deliberately unsorted
//! order (ids 5, 1, 3) plus two rows that must be excluded (null title,
//! empty slug) and one short row. Product 1 exercises the joins: two
//! categories (plus one join row to a nonexistent category), three
//! positioned images and one without a position, and three variants
//! covering priced-above-threshold, priced-below-threshold, and
//! unpriced.

use luxe_migrate::catalog::read_catalog;
use luxe_migrate::extract::run_extraction;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SAMPLE_DUMP: &str = "\
--
-- PostgreSQL database dump
--

COPY public.products (id, created_at, updated_at, title, slug, description, thumbnail, active) FROM stdin;
5\t2024-01-05\t2024-01-05\tCotton Scarf No\u{eb}l\tcotton-scarf\tSoft scarf.\t/images/scarf.jpg\tf
1\t2024-01-01\t2024-01-01\tSilk Dress\tsilk-dress\t\\N\t\\N\tt
3\t2024-01-03\t2024-01-03\tLinen Shirt\tlinen-shirt\tCrisp linen.\t/images/shirt-main.jpg\tt
99\t2024-01-09\t2024-01-09\t\\N\tghost-product\t\\N\t\\N\tt
98\t2024-01-09\t2024-01-09\tNo Slug\t\t\\N\t\\N\tt
97\t2024-01-09
\\.

COPY public.variants (id, created_at, updated_at, product_id, name, sku, image, stock, active) FROM stdin;
11\t2024-01-01\t2024-01-01\t1\tSilk Dress S\tDRESS-S\t\\N\t0\tt
12\t2024-01-01\t2024-01-01\t1\tSilk Dress M\tDRESS-M\t\\N\t0\tf
13\t2024-01-01\t2024-01-01\t1\tSilk Dress L\tDRESS-L\t\\N\t0\tt
31\t2024-01-03\t2024-01-03\t3\tLinen Shirt M\tSHIRT-M\t\\N\t0\tt
\\.

COPY public.prices (id, created_at, updated_at, variant_id, amount) FROM stdin;
201\t2024-01-01\t2024-01-01\t11\t12345
202\t2024-01-01\t2024-01-01\t12\t9999
204\t2024-01-03\t2024-01-03\t31\t10000
\\.

COPY public.product_images (id, created_at, updated_at, product_id, url, position) FROM stdin;
301\t2024-01-01\t2024-01-01\t1\t/images/dress-back.jpg\t2
302\t2024-01-01\t2024-01-01\t1\t/images/dress-front.jpg\t0
303\t2024-01-01\t2024-01-01\t1\t/images/dress-side.jpg\t1
304\t2024-01-01\t2024-01-01\t1\t/images/dress-extra.jpg\t\\N
\\.

COPY public.categories (id, name) FROM stdin;
41\tDresses
42\tNew Arrivals
\\.

COPY public.product_categories (product_id, category_id) FROM stdin;
1\t42
1\t41
1\t77
3\t41
\\.
";

fn extract_to(dir: &TempDir, dump: &str) -> (PathBuf, luxe_migrate::stats::RunStats) {
    let input = dir.path().join("import.sql");
    fs::write(&input, dump).unwrap();
    let output = dir.path().join("products_catalog.json");
    let stats = run_extraction(
        input.to_str().unwrap(),
        output.to_str().unwrap(),
        None,
        false,
    )
    .unwrap();
    (output, stats)
}

// ---- Pipeline Tests ----

#[test]
fn catalog_is_sorted_by_id() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();
    let ids: Vec<i64> = catalog.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn counters_reflect_dump_contents() {
    let dir = TempDir::new().unwrap();
    let (_, stats) = extract_to(&dir, SAMPLE_DUMP);
    assert_eq!(stats.product_rows, 6);
    assert_eq!(stats.variant_rows, 4);
    assert_eq!(stats.price_rows, 3);
    assert_eq!(stats.image_rows, 4);
    assert_eq!(stats.category_rows, 2);
    assert_eq!(stats.category_join_rows, 4);
    assert_eq!(stats.products_written, 3);
    assert_eq!(stats.products_skipped, 3);
}

#[test]
fn every_product_has_the_documented_field_set() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let raw: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();

    for product in raw.as_array().unwrap() {
        for key in [
            "id",
            "title",
            "slug",
            "description",
            "thumbnail",
            "active",
            "categories",
            "variants",
            "images",
        ] {
            assert!(product.get(key).is_some(), "missing field {}", key);
        }
        // Lists are present even when empty, never absent as a whole.
        assert!(product["categories"].is_array());
        assert!(product["variants"].is_array());
        assert!(product["images"].is_array());

        for variant in product["variants"].as_array().unwrap() {
            for key in ["id", "name", "sku", "price", "currency", "stock"] {
                assert!(variant.get(key).is_some(), "missing variant field {}", key);
            }
        }
    }
}

#[test]
fn unicode_survives_serialization() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let raw = fs::read_to_string(&output).unwrap();
    assert!(raw.contains("Cotton Scarf No\u{eb}l"));
    assert!(!raw.contains("\\u00eb"));
}

// ---- Normalization Tests ----

#[test]
fn prices_normalize_at_the_minor_unit_threshold() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    let dress = &catalog[0];
    assert_eq!(dress.slug, "silk-dress");
    // 12345 >= 10000 divides down, truncating; 9999 stays as-is.
    assert_eq!(dress.variants[0].price, Some(123));
    assert_eq!(dress.variants[1].price, Some(9999));
    // No price row at all stays null.
    assert_eq!(dress.variants[2].price, None);

    // Exactly at the threshold.
    let shirt = &catalog[1];
    assert_eq!(shirt.variants[0].price, Some(100));
}

#[test]
fn variants_carry_fixed_currency_and_stock() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    for product in &catalog {
        for variant in &product.variants {
            assert_eq!(variant.currency, luxe_migrate::config::CURRENCY_CODE);
            assert_eq!(variant.stock, luxe_migrate::config::STOCK_PLACEHOLDER);
        }
    }
}

#[test]
fn images_sort_by_position_with_sentinel_last() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    assert_eq!(
        catalog[0].images,
        vec![
            "/images/dress-front.jpg",
            "/images/dress-side.jpg",
            "/images/dress-back.jpg",
            "/images/dress-extra.jpg",
        ]
    );
}

#[test]
fn null_thumbnail_falls_back_to_first_image() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    // Product 1 declares no thumbnail but has images.
    assert_eq!(
        catalog[0].thumbnail.as_deref(),
        Some("/images/dress-front.jpg")
    );
    // Product 3 declares its own thumbnail; images don't override it.
    assert_eq!(
        catalog[1].thumbnail.as_deref(),
        Some("/images/shirt-main.jpg")
    );
}

#[test]
fn no_thumbnail_and_no_images_stays_null() {
    let dump = "\
COPY public.products (id, created_at, updated_at, title, slug, description, thumbnail, active) FROM stdin;
1\tx\ty\tBare Product\tbare-product\t\\N\t\\N\tt
\\.
";
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, dump);
    let catalog = read_catalog(&output).unwrap();
    assert_eq!(catalog[0].thumbnail, None);

    let raw: Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(raw[0]["thumbnail"].is_null());
}

#[test]
fn description_collapses_to_empty_string_not_null() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let raw: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();

    // Product 1 has a null description in the dump.
    assert_eq!(raw[0]["description"], Value::String(String::new()));
    assert_eq!(raw[1]["description"], Value::String("Crisp linen.".to_string()));
}

#[test]
fn active_flag_coerces_from_single_char_token() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    assert!(catalog[0].active);
    assert!(!catalog[2].active, "token 'f' coerces to false");
}

#[test]
fn categories_resolve_in_join_order_and_drop_unknown() {
    let dir = TempDir::new().unwrap();
    let (output, _) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    // Join rows name 42 then 41 then nonexistent 77.
    assert_eq!(catalog[0].categories, vec!["New Arrivals", "Dresses"]);
    assert_eq!(catalog[1].categories, vec!["Dresses"]);
    assert!(catalog[2].categories.is_empty());
}

// ---- Exclusion Tests ----

#[test]
fn placeholder_and_malformed_products_are_excluded() {
    let dir = TempDir::new().unwrap();
    let (output, stats) = extract_to(&dir, SAMPLE_DUMP);
    let catalog = read_catalog(&output).unwrap();

    assert!(catalog.iter().all(|p| p.slug != "ghost-product"));
    assert!(catalog.iter().all(|p| p.title != "No Slug"));
    assert_eq!(stats.products_skipped, 3);

    let samples = stats.skip_samples();
    assert!(samples.iter().any(|s| s.contains("product 99")));
    assert!(samples.iter().any(|s| s.contains("product 98")));
}

// ---- Robustness Tests ----

#[test]
fn missing_blocks_degrade_to_empty_joins() {
    let dump = "\
COPY public.products (id, created_at, updated_at, title, slug, description, thumbnail, active) FROM stdin;
1\tx\ty\tLonely Product\tlonely-product\t\\N\t\\N\tt
\\.
";
    let dir = TempDir::new().unwrap();
    let (output, stats) = extract_to(&dir, dump);
    let catalog = read_catalog(&output).unwrap();

    assert_eq!(stats.variant_rows, 0);
    assert_eq!(catalog.len(), 1);
    assert!(catalog[0].variants.is_empty());
    assert!(catalog[0].images.is_empty());
    assert!(catalog[0].categories.is_empty());
}

#[test]
fn crlf_dump_parses_identically() {
    let dir = TempDir::new().unwrap();
    let (unix_output, _) = extract_to(&dir, SAMPLE_DUMP);
    let unix_bytes = fs::read(&unix_output).unwrap();

    let crlf = SAMPLE_DUMP.replace('\n', "\r\n");
    let crlf_dir = TempDir::new().unwrap();
    let (crlf_output, _) = extract_to(&crlf_dir, &crlf);
    let crlf_bytes = fs::read(&crlf_output).unwrap();

    assert_eq!(unix_bytes, crlf_bytes);
}

#[test]
fn extraction_is_idempotent() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let (out_a, _) = extract_to(&dir_a, SAMPLE_DUMP);
    let (out_b, _) = extract_to(&dir_b, SAMPLE_DUMP);
    assert_eq!(fs::read(&out_a).unwrap(), fs::read(&out_b).unwrap());
}

#[test]
fn interleaved_unrelated_blocks_do_not_confuse_extraction() {
    let dump = "\
COPY public.audit_log (id, message) FROM stdin;
1\tproducts were reindexed
\\.
COPY public.products (id, created_at, updated_at, title, slug, description, thumbnail, active) FROM stdin;
1\tx\ty\tReal Product\treal-product\t\\N\t\\N\tt
\\.
COPY public.product_categories (product_id, category_id) FROM stdin;
1\t41
\\.
COPY public.categories (id, name) FROM stdin;
41\tDresses
\\.
";
    let dir = TempDir::new().unwrap();
    let (output, stats) = extract_to(&dir, dump);
    let catalog = read_catalog(&output).unwrap();

    assert_eq!(stats.product_rows, 1);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].title, "Real Product");
    // Category block appears after the join block in the dump; the
    // join still resolves because lookups build before assembly.
    assert_eq!(catalog[0].categories, vec!["Dresses"]);
}
