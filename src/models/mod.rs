pub mod loaders;
pub mod record;

pub use loaders::load_job_file;
pub use record::{RecordEntry, ResumeCheckpoint, RunOutcome, SearchRange, DATE_FORMAT};
