//! Shared utilities and common types for the Homigo backend.
//!
//! This crate provides functionality used across all other crates:
//! - JWT issuing and validation
//! - Password hashing with Argon2id
//! - Offset pagination helpers
//! - Common validation logic

pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
