//! Application-wide constants.

/// Only uploads whose path ends with this extension are sent to scanners.
pub const SCANNABLE_EXTENSION: &str = ".xpi";

/// Namespace for scanner metric keys: `devhub.<name>`, `devhub.<name>.success`.
pub const SCANNER_METRIC_PREFIX: &str = "devhub";
