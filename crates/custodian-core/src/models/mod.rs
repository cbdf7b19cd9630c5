pub mod scan_result;
pub mod scanner;
pub mod task;
pub mod upload;

pub use scan_result::{NewScanResult, ScanResult};
pub use scanner::{Scanner, ScannerConfig};
pub use task::{Task, TaskStatus, TaskType};
pub use upload::Upload;
