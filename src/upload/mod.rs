//! Resumable upload stage.
//!
//! Drives a chunked, resumable upload protocol against the object store:
//! create -> append-until-complete -> finalize. The remote file id is the
//! trailing path segment of the created resource URL.

mod metadata;
mod session;

pub use metadata::{file_id_from_resource_url, UploadMetadata};
pub use session::{TransferProgress, UploadSession};
