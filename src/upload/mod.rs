mod pipeline;

pub use pipeline::{PartialFailurePolicy, UploadError, UploadPipeline, UploadReceipt};
