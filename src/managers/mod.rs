pub mod backup;
pub mod jobs;
pub mod logging;
pub mod service;
