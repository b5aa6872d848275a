//! # SurrealDB Blob
//!
//! Bindings for the browser's native `Blob`, `File` and `FileReader` APIs.
//!
//! [`Blob`] and [`File`] wrap platform handles and forward property reads and
//! method calls to them. A [`Reader`] turns the event-driven `FileReader`
//! into a pull-based read: a call to [`Reader::read`] suspends until the
//! platform reports that the whole content has loaded, then hands the bytes
//! out through an internal cursor.
//!
//! The platform is reached through the traits in [`platform`]. On
//! `target_family = "wasm"` the default backend is
//! [`WebBlob`](platform::web::WebBlob), backed by `web-sys`. Everywhere else it
//! is [`MemoryBlob`](platform::mem::MemoryBlob), an in-process stand-in which
//! needs a `tokio::task::LocalSet` to deliver read notifications.
//!
//! ```no_run
//! # async fn example() -> Result<(), surrealdb_blob::err::Error> {
//! use surrealdb_blob::{Blob, BlobOptions};
//!
//! let blob = Blob::new(["hello", " ", "world"], BlobOptions::default().with_type("text/plain"))?;
//! assert_eq!(blob.size(), 11);
//! let mut reader = blob.reader();
//! let mut content = Vec::new();
//! reader.read_to_end(&mut content).await?;
//! assert_eq!(content, b"hello world");
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod blob;
pub mod cnf;
pub mod err;
pub mod file;
pub mod platform;
pub mod reader;

pub use blob::{Blob, BlobOptions, BlobPart, Endings};
pub use file::{File, FileOptions};
pub use reader::{Aborter, ReadState, Reader};

/// The platform handle used when no backend is named explicitly
#[cfg(target_family = "wasm")]
pub type DefaultBlob = platform::web::WebBlob;

/// The platform handle used when no backend is named explicitly
#[cfg(not(target_family = "wasm"))]
pub type DefaultBlob = platform::mem::MemoryBlob;
