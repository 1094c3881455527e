use crate::catalog::{build_products, write_catalog};
use crate::dump::{decode_row, extract_table_block, normalize_line_endings};
use crate::join::CatalogIndex;
use crate::rows::{CategoryRow, ImageRow, PriceRow, ProductCategoryRow, VariantRow};
use crate::stats::RunStats;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::fs;
use std::path::Path;
use tracing::info;

/// Runs the full dump-to-catalog pass: read, extract the six COPY
/// blocks, join, assemble, write. One pass, no partial output.
///
/// `limit` caps the number of product rows processed (for testing);
/// `dry_run` skips the final write.
pub fn run_extraction(
    input: &str,
    output: &str,
    limit: Option<u64>,
    dry_run: bool,
) -> Result<RunStats> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read dump file: {}", input))?;
    let dump = normalize_line_endings(&raw);
    drop(raw);

    let mut stats = RunStats::new();

    let product_lines = extract_table_block(&dump, "products");
    let variant_lines = extract_table_block(&dump, "variants");
    let price_lines = extract_table_block(&dump, "prices");
    let image_lines = extract_table_block(&dump, "product_images");
    let category_lines = extract_table_block(&dump, "categories");
    let join_lines = extract_table_block(&dump, "product_categories");

    stats.product_rows = product_lines.len() as u64;
    stats.variant_rows = variant_lines.len() as u64;
    stats.price_rows = price_lines.len() as u64;
    stats.image_rows = image_lines.len() as u64;
    stats.category_rows = category_lines.len() as u64;
    stats.category_join_rows = join_lines.len() as u64;

    // Malformed auxiliary rows are dropped silently; only product rows
    // feed the skip counter.
    let variants: Vec<VariantRow> = variant_lines
        .iter()
        .filter_map(|l| VariantRow::parse(&decode_row(l)))
        .collect();
    let prices: Vec<PriceRow> = price_lines
        .iter()
        .filter_map(|l| PriceRow::parse(&decode_row(l)))
        .collect();
    let images: Vec<ImageRow> = image_lines
        .iter()
        .filter_map(|l| ImageRow::parse(&decode_row(l)))
        .collect();
    let categories: Vec<CategoryRow> = category_lines
        .iter()
        .filter_map(|l| CategoryRow::parse(&decode_row(l)))
        .collect();
    let joins: Vec<ProductCategoryRow> = join_lines
        .iter()
        .filter_map(|l| ProductCategoryRow::parse(&decode_row(l)))
        .collect();

    let index = CatalogIndex::build(&categories, &joins, &images, &variants, &prices);

    let product_lines: Vec<&str> = match limit {
        Some(limit) => product_lines.into_iter().take(limit as usize).collect(),
        None => product_lines,
    };

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    let products = build_products(&product_lines, &index, &mut stats);
    pb.finish_and_clear();

    info!(
        products = products.len(),
        skipped = stats.products_skipped,
        "Catalog assembled"
    );

    if dry_run {
        info!("Dry run, not writing catalog");
    } else {
        write_catalog(&products, Path::new(output))?;
        info!(path = output, "Catalog written");
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE_DUMP: &str = "\
COPY public.products (id, created_at, updated_at, title, slug, description, thumbnail, active) FROM stdin;
10\t2024-01-01\t2024-01-02\tSilk Dress\tsilk-dress\tA dress.\t\\N\tt
11\t2024-01-01\t2024-01-02\t\\N\tghost\t\\N\t\\N\tt
\\.
COPY public.variants (id, created_at, updated_at, product_id, name, sku, image, stock, active) FROM stdin;
7\t2024-01-01\t2024-01-02\t10\tSilk Dress S\tSKU-7\t\\N\t0\tt
\\.
COPY public.prices (id, created_at, updated_at, variant_id, amount) FROM stdin;
1\t2024-01-01\t2024-01-02\t7\t12345
\\.
COPY public.product_images (id, created_at, updated_at, product_id, url, position) FROM stdin;
1\t2024-01-01\t2024-01-02\t10\t/images/dress.jpg\t0
\\.
COPY public.categories (id, name) FROM stdin;
1\tDresses
\\.
COPY public.product_categories (product_id, category_id) FROM stdin;
10\t1
\\.
";

    fn write_dump(dir: &TempDir, content: &str) -> String {
        let path = dir.path().join("import.sql");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn extraction_writes_catalog() {
        let dir = TempDir::new().unwrap();
        let input = write_dump(&dir, SAMPLE_DUMP);
        let output = dir.path().join("catalog.json");

        let stats =
            run_extraction(&input, output.to_str().unwrap(), None, false).unwrap();

        assert_eq!(stats.product_rows, 2);
        assert_eq!(stats.products_written, 1);
        assert_eq!(stats.products_skipped, 1);
        assert!(output.exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = write_dump(&dir, SAMPLE_DUMP);
        let output = dir.path().join("catalog.json");

        run_extraction(&input, output.to_str().unwrap(), None, true).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn limit_caps_product_rows() {
        let dir = TempDir::new().unwrap();
        let input = write_dump(&dir, SAMPLE_DUMP);
        let output = dir.path().join("catalog.json");

        let stats =
            run_extraction(&input, output.to_str().unwrap(), Some(1), false).unwrap();
        assert_eq!(stats.products_written, 1);
        assert_eq!(stats.products_skipped, 0);
    }

    #[test]
    fn unreadable_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.sql");
        let result = run_extraction(
            missing.to_str().unwrap(),
            dir.path().join("out.json").to_str().unwrap(),
            None,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_tables_yield_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let input = write_dump(&dir, "-- empty dump, no COPY blocks\n");
        let output = dir.path().join("catalog.json");

        let stats =
            run_extraction(&input, output.to_str().unwrap(), None, false).unwrap();
        assert_eq!(stats.product_rows, 0);
        assert_eq!(stats.products_written, 0);

        let catalog = crate::catalog::read_catalog(&output).unwrap();
        assert!(catalog.is_empty());
    }
}
