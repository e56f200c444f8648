//! Integration tests for the census crawler
//!
//! These tests use wiremock to stand in for the code search API and exercise
//! the HTTP backend and full two-phase runs end-to-end.

mod crawl_tests;
mod search_tests;
