//! Umbrella crate for the `line-inspect` workspace.
//!
//! Re-exports image primitives, line-profile kernels and the defect detector
//! so applications depend on a single crate.

pub use li_core::*;
pub use li_detect::*;
pub use li_profile::*;
