//! Database integration tests.
//!
//! All tests here require a migrated Postgres instance (`DATABASE_URL`) and
//! are `#[ignore]`-gated so the default test run stays hermetic.
