//! Shared test utilities for the extension-host workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`manifest`] — [`ManifestBuilder`](manifest::ManifestBuilder) for composing `package.json` documents
//! - [`fixture`] — [`ExtensionFixture`](fixture::ExtensionFixture) for on-disk extension layouts
//! - [`logging`] — tracing subscriber installation for test binaries

pub mod fixture;
pub mod logging;
pub mod manifest;

pub use fixture::ExtensionFixture;
pub use manifest::ManifestBuilder;
