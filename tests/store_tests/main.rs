//! Store facade tests
