//! The platform seam consumed by the facades.
//!
//! A backend supplies handles implementing [`RawBlob`] (and [`RawFile`] for
//! file-origin blobs). Reads are dispatched with [`RawBlob::read`], which
//! returns a [`RawRead`] handle for aborting, and the backend reports the
//! single terminal notification of each read through the [`Completion`] it was
//! given.

use std::fmt;
use std::rc::Weak;

use bytes::Bytes;

use crate::blob::{BlobOptions, BlobPart};
use crate::err::Error;
use crate::file::FileOptions;

pub mod mem;
#[cfg(target_family = "wasm")]
pub mod web;

/// A reference to platform managed binary data.
pub trait RawBlob: Clone + fmt::Debug + Sized + 'static {
	/// The in-flight read handle returned by [`RawBlob::read`]
	type Read: RawRead;

	/// Creates a new handle over the concatenation of the given parts.
	fn create(parts: Vec<BlobPart<Self>>, options: &BlobOptions) -> Result<Self, Error>;

	/// The size of the data in bytes.
	fn size(&self) -> u64;

	/// The MIME type of the data, or an empty string if it is unknown.
	fn content_type(&self) -> String;

	/// Whether the handle has been closed.
	fn is_closed(&self) -> bool;

	/// Creates a new handle over the byte range `[start, end)`.
	///
	/// Bounds are clamped by the platform. Negative bounds count back from
	/// the end of the data.
	fn slice(&self, start: i64, end: i64, content_type: &str) -> Result<Self, Error>;

	/// Releases the underlying resource.
	fn close(&self);

	/// Starts an asynchronous read of the whole content.
	///
	/// The backend must report exactly one terminal notification through
	/// `completion`, unless the read is rejected by returning an error.
	fn read(&self, completion: Completion) -> Result<Self::Read, Error>;
}

/// A reference to a platform file.
pub trait RawFile: RawBlob {
	/// Creates a new file handle over the concatenation of the given parts.
	fn create_file(
		parts: Vec<BlobPart<Self>>,
		name: &str,
		options: &FileOptions,
	) -> Result<Self, Error>;

	/// The name of the file.
	fn name(&self) -> String;

	/// The last modified time of the file in milliseconds since the epoch.
	fn last_modified(&self) -> i64;
}

/// An in-flight platform read.
pub trait RawRead: Clone + 'static {
	/// Asks the platform to cancel the read.
	///
	/// The platform may deliver the abort notification before this returns.
	fn abort(&self) -> Result<(), String>;
}

/// The terminal notifications a platform reader can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadEvent {
	/// The content was loaded
	Load,
	/// The read failed
	Error,
	/// The read was cancelled
	Abort,
}

impl ReadEvent {
	/// The name of the platform event.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Load => "load",
			Self::Error => "error",
			Self::Abort => "abort",
		}
	}
}

impl fmt::Display for ReadEvent {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The state of a platform reader at the moment it delivered a notification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadSnapshot {
	/// The ready state of the platform reader
	pub ready_state: u16,
	/// The error recorded by the platform reader, if any
	pub error: Option<String>,
	/// The loaded content, if any
	pub result: Option<Bytes>,
}

pub(crate) trait Settle {
	fn settle(&self, event: ReadEvent, snapshot: ReadSnapshot);
}

/// The callback through which a backend reports the outcome of a read.
///
/// Notifications for a read which has already settled, or whose reader has
/// been dropped, are ignored.
#[derive(Clone)]
pub struct Completion(Weak<dyn Settle>);

impl Completion {
	pub(crate) fn new(target: Weak<dyn Settle>) -> Self {
		Self(target)
	}

	/// Delivers a terminal notification.
	pub fn notify(&self, event: ReadEvent, snapshot: ReadSnapshot) {
		match self.0.upgrade() {
			Some(target) => target.settle(event, snapshot),
			None => trace!("Dropping the {event} notification of a released reader"),
		}
	}
}

impl fmt::Debug for Completion {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_tuple("Completion").field(&(self.0.strong_count() > 0)).finish()
	}
}
