pub mod checkpoint;
pub mod document_capture;
pub mod dom_query;
pub mod record_export;
pub mod search;
pub mod status_writer;
pub mod uploader;

pub use document_capture::DocumentCapture;
pub use record_export::RecordExporter;
pub use status_writer::StatusWriter;
pub use uploader::Uploader;
