//! Group directory lookups.
//!
//! A [`PrincipalResolver`] maps a logical group name to the set of concrete
//! principals in it. Results may differ between calls; callers must treat
//! every resolution as a fresh snapshot.
//!
//! - [`StaticDirectory`] - fixed group table, used for tests and bootstrap
//! - [`HttpDirectory`] - JSON directory service over HTTP

mod error;
pub mod http;
mod principal;
mod resolver;
mod static_dir;

pub use error::DirectoryError;
pub use http::{HttpDirectory, HttpDirectoryConfig};
pub use principal::Principal;
pub use resolver::{DynResolver, PrincipalResolver, resolve_all};
pub use static_dir::StaticDirectory;
