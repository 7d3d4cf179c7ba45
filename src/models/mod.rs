pub mod log;
pub mod requests;
pub mod severity;

pub use log::{Log, LogRecord};
pub use requests::{
    CreateLogRequest, CreateSeverityRequest, CreatedResponse, UpdateLogRequest,
    UpdateSeverityRequest,
};
pub use severity::{Severity, SeverityRecord};
