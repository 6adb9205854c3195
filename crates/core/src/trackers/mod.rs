//! Destination trackers: descriptor registry, dynamic selection and uploads.

mod registry;
mod selector;
mod uploader;

pub use registry::{TrackerAuth, TrackerDescriptor, TrackerRegistry};
pub use selector::{parse_label_trackers, Selection, SelectionSource, TrackerSelector};
pub use uploader::{HttpTrackerUploader, TrackerUploader, UploadError, UploadOutcome};
