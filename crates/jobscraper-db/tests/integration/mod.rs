pub mod common;
pub mod job_store_tests;
