use std::ops::Deref;

use chrono::{DateTime, Utc};

use crate::DefaultBlob;
use crate::blob::{Blob, BlobOptions, BlobPart};
use crate::err::Error;
use crate::platform::RawFile;

/// Options used when constructing a file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileOptions {
	/// The options shared with blob construction
	pub blob: BlobOptions,
	/// The last modified time in milliseconds since the epoch, defaulting to now
	pub last_modified: Option<i64>,
}

impl FileOptions {
	pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
		self.blob.content_type = content_type.into();
		self
	}

	pub fn with_last_modified(mut self, millis: i64) -> Self {
		self.last_modified = Some(millis);
		self
	}
}

impl From<BlobOptions> for FileOptions {
	fn from(blob: BlobOptions) -> Self {
		Self {
			blob,
			last_modified: None,
		}
	}
}

/// A platform file: a [`Blob`] with a name and a last modified time.
///
/// All blob operations are available through `Deref`.
#[derive(Clone, Debug)]
pub struct File<R = DefaultBlob> {
	blob: Blob<R>,
}

impl File {
	/// Creates a file on the default platform from the concatenation of `parts`.
	pub fn new<I, P>(parts: I, name: &str, options: FileOptions) -> Result<Self, Error>
	where
		I: IntoIterator<Item = P>,
		P: Into<BlobPart>,
	{
		Self::from_parts(parts, name, options)
	}
}

impl<R: RawFile> File<R> {
	/// Creates a file from the concatenation of `parts`.
	pub fn from_parts<I, P>(parts: I, name: &str, options: FileOptions) -> Result<Self, Error>
	where
		I: IntoIterator<Item = P>,
		P: Into<BlobPart<R>>,
	{
		let parts = parts.into_iter().map(Into::into).collect();
		R::create_file(parts, name, &options).map(Self::wrap)
	}

	/// Wraps an existing platform file handle.
	pub fn wrap(raw: R) -> Self {
		Self {
			blob: Blob::wrap(raw),
		}
	}

	/// The name of the file.
	pub fn name(&self) -> String {
		self.blob.raw.name()
	}

	/// The last modified time in milliseconds since the epoch, as reported by the platform.
	pub fn last_modified_millis(&self) -> i64 {
		self.blob.raw.last_modified()
	}

	/// The last modified time of the file.
	pub fn last_modified(&self) -> Result<DateTime<Utc>, Error> {
		from_millis(self.last_modified_millis())
	}

	pub fn as_blob(&self) -> &Blob<R> {
		&self.blob
	}

	pub fn into_blob(self) -> Blob<R> {
		self.blob
	}
}

impl<R> Deref for File<R> {
	type Target = Blob<R>;

	fn deref(&self) -> &Self::Target {
		&self.blob
	}
}

impl<R> From<File<R>> for Blob<R> {
	fn from(file: File<R>) -> Self {
		file.blob
	}
}

/// Converts milliseconds since the epoch into seconds and a nanosecond remainder.
pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>, Error> {
	let secs = millis.div_euclid(1000);
	let nanos = millis.rem_euclid(1000) as u32 * 1_000_000;
	DateTime::from_timestamp(secs, nanos).ok_or(Error::InvalidTimestamp(millis))
}
