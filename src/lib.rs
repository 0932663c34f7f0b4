//! Stage a directory of derivative files as a preservation submission
//! package.
//!
//! A run produces:
//!
//! ```text
//! <target>/<id>/
//!     LOCKED              present only while staging (or after a failure)
//!     content/
//!         ie.xml          METS-style descriptor
//!         streams/...     copy of the source tree
//! ```
//!
//! The pipeline is single-pass and synchronous:
//!
//! - [`stage`] - package directories and the lock marker, plus the tree copy
//! - [`manifest`] - sorted walk of the streams tree, identifier assignment
//! - [`descriptor`] - XML rendering of the manifest and metadata
//! - [`submission`] - runs the steps in order
//!
//! # Example
//!
//! ```rust,ignore
//! use derivative_submission::{run, Settings, SubmissionRequest};
//!
//! let request = SubmissionRequest::new("IE1234", "DERIVATIVE", "JPG", "/data/in", "/deposit")?;
//! let report = run(&request, &Settings::default())?;
//! println!("{} files in {}", report.files, report.package_dir.display());
//! ```

pub mod config;
pub mod descriptor;
pub mod logging;
pub mod manifest;
pub mod request;
pub mod stage;
pub mod submission;

pub use config::{load_settings, Settings};
pub use manifest::{FileEntry, IdAllocator, Manifest, SequentialIds};
pub use request::SubmissionRequest;
pub use stage::{ExistingPackage, PackageLayout};
pub use submission::{run, run_with_ids, SubmissionReport};
