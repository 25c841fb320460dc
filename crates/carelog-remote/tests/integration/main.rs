//! Integration tests for carelog-remote
//!
//! Uses wiremock to simulate the backend REST API and verifies end-to-end
//! behavior of authentication, error classification, and the dedup/merge
//! record save path.

mod common;

mod test_auth;
mod test_records;
