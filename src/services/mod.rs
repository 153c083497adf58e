pub mod job_store;
pub mod scan_driver;

pub use job_store::{
    spawn_driver, spawn_sweeper, submit, InMemoryJobStore, Job, JobStore, DEFAULT_JOB_TTL,
    DEFAULT_MAX_JOBS,
};
pub use scan_driver::{filter_file, filter_image, run_blocking, FilterParams, FilterReport, ProgressLog};
