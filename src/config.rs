/// Null sentinel used by PostgreSQL's textual COPY format
pub const NULL_SENTINEL: &str = "\\N";

/// Lone terminator line closing a COPY block
pub const COPY_TERMINATOR: &str = "\\.";

/// Stock quantity written for every variant; source stock is not trusted
/// for re-import and is overridden by policy
pub const STOCK_PLACEHOLDER: u32 = 1;

/// Currency code attached to every resolved price (Ethiopian Birr)
pub const CURRENCY_CODE: &str = "Br";

/// Amounts at or above this are minor-unit and get divided down
pub const MINOR_UNIT_THRESHOLD: i64 = 10_000;

/// Divisor applied to minor-unit amounts (integer division, truncating)
pub const MINOR_UNIT_DIVISOR: i64 = 100;

/// Sort key for images whose position is missing or unparseable; sorts last
pub const IMAGE_POSITION_SENTINEL: u32 = 999;

/// How many skip reasons to surface in the run summary
pub const SKIP_REASON_LIMIT: usize = 5;

/// Default catalog artifact path
pub const DEFAULT_CATALOG_PATH: &str = "products_catalog.json";

/// Default path for the generated restore script
pub const DEFAULT_RESTORE_PATH: &str = "restore_data.sql";

/// Default PostgreSQL connection string for the import target
pub const DEFAULT_DB_URL: &str =
    "host=localhost port=5433 user=postgres password=postgres dbname=luxe_db";

/// Connection attempts before giving up on the import target
pub const IMPORT_MAX_RETRIES: u32 = 10;

/// Seconds between connection attempts
pub const IMPORT_RETRY_DELAY_SECS: u64 = 3;
