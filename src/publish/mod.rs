//! Downstream publication targets.
//!
//! After a pass has reconciled the branch-per-application layout, two
//! optional consumers are fed from it:
//!
//! - an **indexing API** that receives each branch's `(sha, file listing)`
//!   as a JSON payload ([`IndexApi`] / [`HttpIndexApi`])
//! - an **object store** that mirrors the raw file bytes under
//!   branch-scoped keys ([`ObjectStore`] / [`S3Store`])
//!
//! Both are trait seams so the publish engine can run against in-memory
//! recorders in tests. Neither target is quota-limited; the hosting-side
//! reads that feed them are governed in [`crate::sync`].

mod index;
mod store;

pub use index::{HttpIndexApi, IndexApi, IndexUpdate};
pub use store::{ObjectStore, S3Store};
