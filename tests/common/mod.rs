//! Common test utilities for happymap.
//!
//! This module provides shared utilities for testing the happymap server.

#![allow(dead_code)]

pub mod assertions;
pub mod http_client;
pub mod test_data;
