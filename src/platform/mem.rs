//! An in-process stand-in for the browser platform.
//!
//! `MemoryBlob` lets the facades and the reader run on hosts with no browser.
//! It reproduces the platform behaviour the facades rely on: concatenation of
//! parts, clamped slicing, type normalisation, closing, and a read which
//! delivers exactly one terminal notification from a separate task.
//!
//! Notifications are delivered from a task spawned on the local executor, so
//! native callers must run inside a `tokio::task::LocalSet`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::blob::{BlobOptions, BlobPart, Endings};
use crate::cnf::{NATIVE_LINE_ENDING, READY_STATE_DONE, READY_STATE_LOADING};
use crate::err::Error;
use crate::file::FileOptions;
use crate::platform::{Completion, RawBlob, RawFile, RawRead, ReadEvent, ReadSnapshot};

#[cfg(not(target_family = "wasm"))]
use tokio::task::spawn_local as spawn;
#[cfg(not(target_family = "wasm"))]
use tokio::time::sleep;
#[cfg(target_family = "wasm")]
use wasm_bindgen_futures::spawn_local as spawn;
#[cfg(target_family = "wasm")]
use wasmtimer::tokio::sleep;

#[derive(Debug)]
struct FileMeta {
	name: String,
	last_modified: i64,
}

/// An in-memory platform blob handle.
///
/// Clones share the closed state. Slices share the content but are closed
/// independently, and inherit the read behaviour of their source.
#[derive(Clone, Debug)]
pub struct MemoryBlob {
	data: Bytes,
	content_type: Rc<str>,
	closed: Rc<Cell<bool>>,
	file: Option<Rc<FileMeta>>,
	latency: Duration,
	read_error: Option<Rc<str>>,
	abort_error: Option<Rc<str>>,
}

impl MemoryBlob {
	fn new(data: Bytes, content_type: &str, file: Option<FileMeta>) -> Self {
		Self {
			data,
			content_type: normalize_type(content_type).into(),
			closed: Rc::new(Cell::new(false)),
			file: file.map(Rc::new),
			latency: Duration::ZERO,
			read_error: None,
			abort_error: None,
		}
	}

	/// Creates an untyped handle over the given bytes.
	pub fn from_bytes(data: impl Into<Bytes>) -> Self {
		Self::new(data.into(), "", None)
	}

	/// Delays the load notification of every read by `latency`.
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = latency;
		self
	}

	/// Makes every read fail with the given platform error.
	pub fn with_read_error(mut self, error: &str) -> Self {
		self.read_error = Some(error.into());
		self
	}

	/// Makes every abort request fail with the given platform error.
	pub fn with_abort_error(mut self, error: &str) -> Self {
		self.abort_error = Some(error.into());
		self
	}

	/// The content of the handle.
	pub fn data(&self) -> &Bytes {
		&self.data
	}
}

impl RawBlob for MemoryBlob {
	type Read = MemoryRead;

	fn create(parts: Vec<BlobPart<Self>>, options: &BlobOptions) -> Result<Self, Error> {
		Ok(Self::new(concat(parts, options.endings), &options.content_type, None))
	}

	fn size(&self) -> u64 {
		self.data.len() as u64
	}

	fn content_type(&self) -> String {
		self.content_type.to_string()
	}

	fn is_closed(&self) -> bool {
		self.closed.get()
	}

	fn slice(&self, start: i64, end: i64, content_type: &str) -> Result<Self, Error> {
		let size = self.data.len() as i64;
		let start = clamp(start, size);
		let end = clamp(end, size).max(start);
		Ok(Self {
			latency: self.latency,
			read_error: self.read_error.clone(),
			abort_error: self.abort_error.clone(),
			..Self::new(self.data.slice(start as usize..end as usize), content_type, None)
		})
	}

	fn close(&self) {
		self.closed.set(true);
	}

	fn read(&self, completion: Completion) -> Result<MemoryRead, Error> {
		let read = MemoryRead {
			op: Rc::new(RefCell::new(Operation {
				ready_state: READY_STATE_LOADING,
				completion,
				abort_error: self.abort_error.clone(),
			})),
		};
		let op = read.op.clone();
		let latency = self.latency;
		let data = self.data.clone();
		let error = self.read_error.clone();
		spawn(async move {
			if !latency.is_zero() {
				sleep(latency).await;
			}
			let completion = {
				let mut op = op.borrow_mut();
				// An aborted read has already delivered its notification
				if op.ready_state != READY_STATE_LOADING {
					return;
				}
				op.ready_state = READY_STATE_DONE;
				op.completion.clone()
			};
			match error {
				Some(error) => completion.notify(
					ReadEvent::Error,
					ReadSnapshot {
						ready_state: READY_STATE_DONE,
						error: Some(error.to_string()),
						result: None,
					},
				),
				None => completion.notify(
					ReadEvent::Load,
					ReadSnapshot {
						ready_state: READY_STATE_DONE,
						error: None,
						result: Some(data),
					},
				),
			}
		});
		Ok(read)
	}
}

impl RawFile for MemoryBlob {
	fn create_file(
		parts: Vec<BlobPart<Self>>,
		name: &str,
		options: &FileOptions,
	) -> Result<Self, Error> {
		let meta = FileMeta {
			name: name.to_owned(),
			last_modified: options
				.last_modified
				.unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
		};
		let data = concat(parts, options.blob.endings);
		Ok(Self::new(data, &options.blob.content_type, Some(meta)))
	}

	fn name(&self) -> String {
		self.file.as_ref().map(|f| f.name.clone()).unwrap_or_default()
	}

	fn last_modified(&self) -> i64 {
		self.file.as_ref().map(|f| f.last_modified).unwrap_or_default()
	}
}

#[derive(Debug)]
struct Operation {
	ready_state: u16,
	completion: Completion,
	abort_error: Option<Rc<str>>,
}

/// An in-flight read of a [`MemoryBlob`].
#[derive(Clone, Debug)]
pub struct MemoryRead {
	op: Rc<RefCell<Operation>>,
}

impl RawRead for MemoryRead {
	fn abort(&self) -> Result<(), String> {
		let completion = {
			let mut op = self.op.borrow_mut();
			if let Some(error) = &op.abort_error {
				return Err(error.to_string());
			}
			// Aborting a finished read has no effect
			if op.ready_state != READY_STATE_LOADING {
				return Ok(());
			}
			op.ready_state = READY_STATE_DONE;
			op.completion.clone()
		};
		// The abort notification is delivered synchronously
		completion.notify(
			ReadEvent::Abort,
			ReadSnapshot {
				ready_state: READY_STATE_DONE,
				error: None,
				result: None,
			},
		);
		Ok(())
	}
}

/// Resolves a relative slice bound against the size of the content.
fn clamp(bound: i64, size: i64) -> i64 {
	if bound < 0 {
		(size + bound).max(0)
	} else {
		bound.min(size)
	}
}

/// Lowercases a MIME type, or discards it if it contains characters outside U+0020 to U+007E.
fn normalize_type(content_type: &str) -> String {
	if content_type.chars().all(|c| (' '..='~').contains(&c)) {
		content_type.to_ascii_lowercase()
	} else {
		String::new()
	}
}

/// Replaces every CRLF, CR or LF with the native line ending.
fn native_line_endings(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	while let Some(c) = chars.next() {
		match c {
			'\r' => {
				chars.next_if_eq(&'\n');
				out.push_str(NATIVE_LINE_ENDING);
			}
			'\n' => out.push_str(NATIVE_LINE_ENDING),
			c => out.push(c),
		}
	}
	out
}

fn concat(parts: Vec<BlobPart<MemoryBlob>>, endings: Endings) -> Bytes {
	let mut data = BytesMut::new();
	for part in parts {
		match part {
			BlobPart::Bytes(v) => data.extend_from_slice(&v),
			BlobPart::Text(v) => match endings {
				Endings::Transparent => data.extend_from_slice(v.as_bytes()),
				Endings::Native => data.extend_from_slice(native_line_endings(&v).as_bytes()),
			},
			BlobPart::Blob(v) => data.extend_from_slice(&v.data),
		}
	}
	data.freeze()
}
