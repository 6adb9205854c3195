//! Media inspection and dupe-check seams.

mod dupe;
mod inspector;
mod types;

pub use dupe::{DupeChecker, NoopDupeChecker};
pub use inspector::{MediaInspector, ReleaseNameInspector};
pub use types::{MediaError, MediaInfo};
