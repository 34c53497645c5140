/// Shared defaults and environment knobs for the importer.

pub const CONFIG_PATH: &str = "config.toml";

// The legacy export carries six contiguous years of land-cover data.
pub const DEFAULT_YEAR_START: i32 = 2019;
pub const DEFAULT_YEAR_END: i32 = 2024;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Overrides the registry base URL from `config.toml`.
pub const STORE_URL_ENV: &str = "ATLAS_STORE_URL";

/// When set, each run pushes a metrics snapshot to this Pushgateway.
pub const PUSHGATEWAY_URL_ENV: &str = "ATLAS_PUSHGATEWAY_URL";
