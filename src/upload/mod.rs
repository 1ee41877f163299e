//! Best-effort submission of finalized recordings for analysis

mod client;

pub use client::{HttpUploader, UploadConfig, UploadError, UploadReceipt, Uploader};
