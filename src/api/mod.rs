pub mod jobs;

pub use jobs::{handle_create, handle_delete, handle_image, handle_status, CreateJobQuery, ImageQuery};
