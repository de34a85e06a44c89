//! Input/output helpers.
//!
//! - NPY array container read/write (`npy`)
//! - file naming, column docs and skip logs (`artifacts`)
//! - JSON run summary (`summary`)

pub mod artifacts;
pub mod npy;
pub mod summary;

pub use artifacts::*;
pub use npy::*;
pub use summary::*;
