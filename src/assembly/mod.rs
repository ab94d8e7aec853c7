//! # Assembly Module
//!
//! In-memory model of a compiled DAO assembly: the types it declares, which of
//! them carry table metadata, and each type's members with their declared types.
//!
//! Descriptions are usually loaded from YAML or JSON:
//!
//! ```yaml
//! name: billing
//! default_connection: Billing
//! types:
//!   - name: Customer
//!     namespace: Acme.Billing
//!     table: true
//!     members:
//!       - { name: Id, type: int }
//!       - { name: Total, type: decimal? }
//! ```

mod load;
mod types;

pub use load::*;
pub use types::*;
