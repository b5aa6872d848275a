use bytes::Bytes;

use crate::DefaultBlob;
use crate::err::Error;
use crate::platform::RawBlob;
use crate::reader::Reader;

/// How line endings in text parts are written into a new blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endings {
	/// Text is copied unchanged
	#[default]
	Transparent,
	/// Line endings are converted to the native line ending of the host
	Native,
}

impl Endings {
	/// The name used by the platform for this option.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Transparent => "transparent",
			Self::Native => "native",
		}
	}
}

/// Options used when constructing a blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlobOptions {
	/// The MIME type of the content
	pub content_type: String,
	/// How line endings in text parts are handled
	pub endings: Endings,
}

impl BlobOptions {
	pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = content_type.into();
		self
	}

	pub fn with_endings(mut self, endings: Endings) -> Self {
		self.endings = endings;
		self
	}
}

/// A single value making up part of the content of a new blob.
#[derive(Clone, Debug)]
pub enum BlobPart<R = DefaultBlob> {
	/// Raw bytes, copied as they are
	Bytes(Bytes),
	/// Text, encoded as UTF-8
	Text(String),
	/// The content of another blob
	Blob(R),
}

impl<R> From<&str> for BlobPart<R> {
	fn from(v: &str) -> Self {
		Self::Text(v.to_owned())
	}
}

impl<R> From<String> for BlobPart<R> {
	fn from(v: String) -> Self {
		Self::Text(v)
	}
}

impl<R> From<&[u8]> for BlobPart<R> {
	fn from(v: &[u8]) -> Self {
		Self::Bytes(Bytes::copy_from_slice(v))
	}
}

impl<R, const N: usize> From<&[u8; N]> for BlobPart<R> {
	fn from(v: &[u8; N]) -> Self {
		Self::Bytes(Bytes::copy_from_slice(v))
	}
}

impl<R> From<Vec<u8>> for BlobPart<R> {
	fn from(v: Vec<u8>) -> Self {
		Self::Bytes(v.into())
	}
}

impl<R> From<Bytes> for BlobPart<R> {
	fn from(v: Bytes) -> Self {
		Self::Bytes(v)
	}
}

impl<R> From<Blob<R>> for BlobPart<R> {
	fn from(v: Blob<R>) -> Self {
		Self::Blob(v.raw)
	}
}

impl<R: Clone> From<&Blob<R>> for BlobPart<R> {
	fn from(v: &Blob<R>) -> Self {
		Self::Blob(v.raw.clone())
	}
}

/// A platform binary large object.
///
/// Cloning a `Blob` clones the reference, not the content. All clones observe
/// the same closed state.
#[derive(Clone, Debug)]
pub struct Blob<R = DefaultBlob> {
	pub(crate) raw: R,
}

impl Blob {
	/// Creates a blob on the default platform from the concatenation of `parts`.
	pub fn new<I, P>(parts: I, options: BlobOptions) -> Result<Self, Error>
	where
		I: IntoIterator<Item = P>,
		P: Into<BlobPart>,
	{
		Self::from_parts(parts, options)
	}
}

impl<R: RawBlob> Blob<R> {
	/// Creates a blob from the concatenation of `parts`.
	pub fn from_parts<I, P>(parts: I, options: BlobOptions) -> Result<Self, Error>
	where
		I: IntoIterator<Item = P>,
		P: Into<BlobPart<R>>,
	{
		let parts = parts.into_iter().map(Into::into).collect();
		R::create(parts, &options).map(Self::wrap)
	}

	/// Wraps an existing platform handle.
	pub fn wrap(raw: R) -> Self {
		Self {
			raw,
		}
	}

	/// The size of the content in bytes.
	pub fn size(&self) -> u64 {
		self.raw.size()
	}

	/// The MIME type of the content, or an empty string if it is unknown.
	pub fn content_type(&self) -> String {
		self.raw.content_type()
	}

	/// Whether [`Blob::close`] has been called on this blob.
	pub fn is_closed(&self) -> bool {
		self.raw.is_closed()
	}

	/// Returns a new blob over the byte range `[start, end)` of this one.
	///
	/// Out of range bounds are clamped by the platform, and negative bounds
	/// count back from the end. The source blob is left untouched.
	pub fn slice(&self, start: i64, end: i64, content_type: &str) -> Result<Self, Error> {
		self.raw.slice(start, end, content_type).map(Self::wrap)
	}

	/// Closes the blob. Any read started afterwards fails.
	pub fn close(&self) {
		debug!("Closing a blob of {} bytes", self.raw.size());
		self.raw.close()
	}

	/// Starts reading the whole content of the blob.
	///
	/// This returns immediately. The content is retrieved by pulling from the
	/// returned [`Reader`].
	///
	/// # Panics
	///
	/// With the in-process backend on native hosts, the read is driven by a
	/// local task, so this panics when called outside a `tokio::task::LocalSet`.
	pub fn reader(&self) -> Reader<R> {
		Reader::start(&self.raw)
	}

	/// Reads the whole content of the blob.
	pub async fn bytes(&self) -> Result<Bytes, Error> {
		let mut reader = self.reader();
		let mut content = Vec::new();
		reader.read_to_end(&mut content).await?;
		Ok(content.into())
	}

	pub fn as_raw(&self) -> &R {
		&self.raw
	}

	pub fn into_raw(self) -> R {
		self.raw
	}
}
