pub mod batch;
pub mod commit;
pub mod location;
pub mod prompt;
pub mod range;
pub mod summary;
