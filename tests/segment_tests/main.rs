//! Segment layer tests

mod pool_tests;
mod record_tests;
