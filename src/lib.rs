//! rentcache library
//!
//! In-memory TTL cache with pattern-based invalidation, plus the rental API
//! client and CLI configuration built on it.

pub mod cache;
pub mod cli;
pub mod data;
