//! Rendering helpers for fetched documents.
//!
//! Each submodule is a pure `&str → …` transformation with no I/O, so the
//! whole chain is testable without a backend.
//!
//! ```text
//! md_text ──▶ clean ──▶ paginate ──▶ pages
//! meeting ──▶ info  ──▶ markdown table
//! ```
//!
//! 1. [`clean`]: strip the code fences generators wrap minutes in
//! 2. [`paginate`]: split into print pages without cutting a table
//! 3. [`info`]: render meeting metadata as a two-column table

pub mod clean;
pub mod info;
pub mod paginate;
