//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run whole crawl
//! sessions end-to-end.

mod backpressure_tests;
mod common;
mod crawl_tests;
mod expand_tests;
mod robots_tests;
