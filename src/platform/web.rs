//! The browser platform, backed by `web-sys`.

use std::cell::Cell;
use std::rc::Rc;

use bytes::Bytes;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::{BlobPropertyBag, EndingTypes, FilePropertyBag, FileReader};

use crate::blob::{Blob, BlobOptions, BlobPart, Endings};
use crate::err::Error;
use crate::file::{File, FileOptions};
use crate::platform::{Completion, RawBlob, RawFile, RawRead, ReadEvent, ReadSnapshot};

#[wasm_bindgen]
extern "C" {
	// Members which are missing from some platforms, or which may throw
	#[wasm_bindgen(extends = web_sys::Blob, js_name = Blob)]
	type PlatformBlob;

	#[wasm_bindgen(method, catch, js_name = close)]
	fn try_close(this: &PlatformBlob) -> Result<(), JsValue>;

	#[wasm_bindgen(method, getter, js_name = isClosed)]
	fn is_closed(this: &PlatformBlob) -> Option<bool>;

	#[wasm_bindgen(extends = web_sys::FileReader, js_name = FileReader)]
	type PlatformReader;

	#[wasm_bindgen(method, catch, js_name = abort)]
	fn try_abort(this: &PlatformReader) -> Result<(), JsValue>;
}

/// Renders a thrown JavaScript value as an error message.
fn js_error(value: JsValue) -> String {
	if let Some(e) = value.dyn_ref::<web_sys::DomException>() {
		return format!("{}: {}", e.name(), e.message());
	}
	if let Some(e) = value.dyn_ref::<js_sys::Error>() {
		return String::from(e.to_string());
	}
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

impl From<Endings> for EndingTypes {
	fn from(v: Endings) -> Self {
		match v {
			Endings::Transparent => EndingTypes::Transparent,
			Endings::Native => EndingTypes::Native,
		}
	}
}

/// A browser `Blob` or `File` handle.
#[derive(Clone, Debug)]
pub struct WebBlob {
	inner: web_sys::Blob,
	closed: Rc<Cell<bool>>,
}

impl WebBlob {
	/// The underlying platform object.
	pub fn as_js(&self) -> &web_sys::Blob {
		&self.inner
	}

	fn platform(&self) -> &PlatformBlob {
		self.inner.unchecked_ref()
	}
}

impl From<web_sys::Blob> for WebBlob {
	fn from(inner: web_sys::Blob) -> Self {
		Self {
			inner,
			closed: Rc::new(Cell::new(false)),
		}
	}
}

impl From<web_sys::File> for WebBlob {
	fn from(file: web_sys::File) -> Self {
		Self::from(web_sys::Blob::from(file))
	}
}

impl From<web_sys::Blob> for Blob<WebBlob> {
	fn from(v: web_sys::Blob) -> Self {
		Blob::wrap(v.into())
	}
}

impl From<web_sys::File> for File<WebBlob> {
	fn from(v: web_sys::File) -> Self {
		File::wrap(v.into())
	}
}

/// Builds the platform sequence of parts.
fn sequence(parts: Vec<BlobPart<WebBlob>>) -> Array {
	parts
		.into_iter()
		.map(|part| -> JsValue {
			match part {
				BlobPart::Bytes(v) => Uint8Array::from(v.as_ref()).into(),
				BlobPart::Text(v) => JsValue::from_str(&v),
				BlobPart::Blob(v) => v.inner.into(),
			}
		})
		.collect()
}

impl RawBlob for WebBlob {
	type Read = WebRead;

	fn create(parts: Vec<BlobPart<Self>>, options: &BlobOptions) -> Result<Self, Error> {
		let bag = BlobPropertyBag::new();
		bag.set_type(&options.content_type);
		bag.set_endings(options.endings.into());
		web_sys::Blob::new_with_blob_sequence_and_options(&sequence(parts), &bag)
			.map(Self::from)
			.map_err(|e| Error::Platform(js_error(e)))
	}

	fn size(&self) -> u64 {
		self.inner.size() as u64
	}

	fn content_type(&self) -> String {
		self.inner.type_()
	}

	fn is_closed(&self) -> bool {
		self.closed.get() || self.platform().is_closed().unwrap_or(false)
	}

	fn slice(&self, start: i64, end: i64, content_type: &str) -> Result<Self, Error> {
		self.inner
			.slice_with_f64_and_f64_and_str(start as f64, end as f64, content_type)
			.map(Self::from)
			.map_err(|e| Error::Platform(js_error(e)))
	}

	fn close(&self) {
		self.closed.set(true);
		if let Err(e) = self.platform().try_close() {
			trace!("The platform does not support closing blobs: {}", js_error(e));
		}
	}

	fn read(&self, completion: Completion) -> Result<WebRead, Error> {
		let reader = FileReader::new().map_err(|e| Error::PlatformRead(js_error(e)))?;
		let listeners = Listeners::attach(&reader, completion);
		reader.read_as_array_buffer(&self.inner).map_err(|e| Error::PlatformRead(js_error(e)))?;
		Ok(WebRead {
			reader,
			_listeners: Rc::new(listeners),
		})
	}
}

impl RawFile for WebBlob {
	fn create_file(
		parts: Vec<BlobPart<Self>>,
		name: &str,
		options: &FileOptions,
	) -> Result<Self, Error> {
		let bag = FilePropertyBag::new();
		bag.set_type(&options.blob.content_type);
		bag.set_endings(options.blob.endings.into());
		if let Some(millis) = options.last_modified {
			bag.set_last_modified(millis as f64);
		}
		web_sys::File::new_with_blob_sequence_and_options(&sequence(parts), name, &bag)
			.map(Self::from)
			.map_err(|e| Error::Platform(js_error(e)))
	}

	fn name(&self) -> String {
		self.inner.dyn_ref::<web_sys::File>().map(web_sys::File::name).unwrap_or_default()
	}

	fn last_modified(&self) -> i64 {
		self.inner
			.dyn_ref::<web_sys::File>()
			.map(|f| f.last_modified() as i64)
			.unwrap_or_default()
	}
}

/// The `onload`, `onerror` and `onabort` handlers of a pending read.
struct Listeners {
	reader: FileReader,
	_load: Closure<dyn FnMut()>,
	_error: Closure<dyn FnMut()>,
	_abort: Closure<dyn FnMut()>,
}

impl Listeners {
	fn attach(reader: &FileReader, completion: Completion) -> Self {
		let listener = |event: ReadEvent| {
			let reader = reader.clone();
			let completion = completion.clone();
			Closure::<dyn FnMut()>::new(move || completion.notify(event, snapshot(&reader)))
		};
		let load = listener(ReadEvent::Load);
		let error = listener(ReadEvent::Error);
		let abort = listener(ReadEvent::Abort);
		reader.set_onload(Some(load.as_ref().unchecked_ref()));
		reader.set_onerror(Some(error.as_ref().unchecked_ref()));
		reader.set_onabort(Some(abort.as_ref().unchecked_ref()));
		Self {
			reader: reader.clone(),
			_load: load,
			_error: error,
			_abort: abort,
		}
	}
}

impl Drop for Listeners {
	fn drop(&mut self) {
		self.reader.set_onload(None);
		self.reader.set_onerror(None);
		self.reader.set_onabort(None);
	}
}

/// Captures the state of the platform reader when it delivers an event.
fn snapshot(reader: &FileReader) -> ReadSnapshot {
	ReadSnapshot {
		ready_state: reader.ready_state(),
		error: reader.error().map(|e| format!("{}: {}", e.name(), e.message())),
		result: reader
			.result()
			.ok()
			.filter(|v| v.is_instance_of::<js_sys::ArrayBuffer>())
			.map(|v| Bytes::from(Uint8Array::new(&v).to_vec())),
	}
}

/// An in-flight browser `FileReader` read.
#[derive(Clone)]
pub struct WebRead {
	reader: FileReader,
	_listeners: Rc<Listeners>,
}

impl RawRead for WebRead {
	fn abort(&self) -> Result<(), String> {
		self.reader.unchecked_ref::<PlatformReader>().try_abort().map_err(js_error)
	}
}
