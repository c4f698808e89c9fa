//! Shared test fixtures for querygen crates.
//!
//! This crate provides entity metamodels and small helpers for testing.
//!
//! - [`entity`] - Builders for ad hoc entities and registration helpers
//! - [`domain`] - A small domain model with inheritance, embedded
//!   collections and every property category
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! querygen-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use querygen_test::domain::{abstract_entity, sub_entity};
//! use querygen_test::entity::{entity, register_all};
//! ```

pub mod domain;
pub mod entity;

pub use entity::{entity, entity_with_category, register, register_all};
