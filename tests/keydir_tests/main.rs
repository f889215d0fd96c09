//! KeyDir tests
