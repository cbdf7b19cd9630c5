mod scan_result;
mod upload;

pub use scan_result::{PgScanResultRepository, ScanResultRepository};
pub use upload::{PgUploadRepository, UploadRepository};
