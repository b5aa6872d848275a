#![cfg(not(target_family = "wasm"))]

mod common;

use bytes::Bytes;
use rstest::rstest;
use surrealdb_blob::err::Error;
use surrealdb_blob::platform::mem::MemoryBlob;
use surrealdb_blob::{Blob, BlobOptions, BlobPart, Endings, File, FileOptions};

use crate::common::local;

#[rstest]
#[case::empty(b"", "")]
#[case::single(b"a", "text/plain")]
#[case::text(b"hello world", "text/plain")]
#[case::binary(&[0, 1, 2, 254, 255], "application/octet-stream")]
#[case::uppercase_type(b"<p></p>", "Text/HTML")]
fn slice_of_whole_blob_keeps_size_and_takes_type(#[case] bytes: &[u8], #[case] ty: &str) {
	let blob = Blob::new([bytes], BlobOptions::default()).unwrap();
	let slice = blob.slice(0, bytes.len() as i64, ty).unwrap();
	assert_eq!(slice.size(), bytes.len() as u64);
	assert_eq!(slice.content_type(), ty.to_ascii_lowercase());
}

#[rstest]
#[case::texts(vec!["abc".into(), "de".into()], 5)]
#[case::bytes(vec![vec![1u8, 2, 3].into(), vec![4u8].into()], 4)]
#[case::mixed(vec!["abc".into(), Bytes::from_static(&[0, 0]).into()], 5)]
#[case::empty_parts(vec!["".into(), "".into()], 0)]
#[case::none(vec![], 0)]
fn concatenation_size(#[case] parts: Vec<BlobPart>, #[case] size: u64) {
	let blob = Blob::new(parts, BlobOptions::default()).unwrap();
	assert_eq!(blob.size(), size);
	assert_eq!(blob.content_type(), "");
}

#[test]
fn construct_hello_world() {
	let blob = Blob::new(["hello", " ", "world"], BlobOptions::default().with_type("text/plain"))
		.unwrap();
	assert_eq!(blob.size(), 11);
	assert_eq!(blob.content_type(), "text/plain");
	assert!(!blob.is_closed());
}

#[test]
fn blob_parts_nest() {
	let inner = Blob::new(["bc"], BlobOptions::default()).unwrap();
	let parts: Vec<BlobPart> = vec!["a".into(), (&inner).into(), inner.into(), "d".into()];
	let outer = Blob::new(parts, BlobOptions::default()).unwrap();
	assert_eq!(outer.size(), 6);
	assert_eq!(outer.as_raw().data(), &b"abcbcd"[..]);
}

#[rstest]
#[case::range(1, 4, b"ell")]
#[case::open_end(6, 100, b"world")]
#[case::negative_start(-5, 11, b"world")]
#[case::negative_both(-5, -3, b"wo")]
#[case::inverted(8, 2, b"")]
#[case::past_end(20, 30, b"")]
fn slice_bounds_are_clamped(#[case] start: i64, #[case] end: i64, #[case] expected: &[u8]) {
	let blob = Blob::new(["hello world"], BlobOptions::default()).unwrap();
	let slice = blob.slice(start, end, "").unwrap();
	assert_eq!(slice.size(), expected.len() as u64);
	assert_eq!(slice.as_raw().data(), expected);
	// The source is left untouched
	assert_eq!(blob.size(), 11);
}

#[test]
fn invalid_types_are_discarded() {
	let blob = Blob::new(["x"], BlobOptions::default().with_type("text/plaîn")).unwrap();
	assert_eq!(blob.content_type(), "");
	let slice = blob.slice(0, 1, "TEXT/PLAIN").unwrap();
	assert_eq!(slice.content_type(), "text/plain");
}

#[test]
fn native_endings_convert_text() {
	let options = BlobOptions::default().with_endings(Endings::Native);
	let blob = Blob::new(["a\r\nb\rc\n"], options).unwrap();
	let expected = if cfg!(windows) {
		"a\r\nb\r\nc\r\n"
	} else {
		"a\nb\nc\n"
	};
	assert_eq!(blob.as_raw().data(), expected.as_bytes());
}

#[test]
fn close_is_idempotent_and_shared_by_clones() {
	let blob = Blob::new(["data"], BlobOptions::default()).unwrap();
	let clone = blob.clone();
	blob.close();
	blob.close();
	assert!(blob.is_closed());
	assert!(clone.is_closed());
}

#[test]
fn wrap_existing_handle() {
	let raw = MemoryBlob::from_bytes(Bytes::from_static(b"picked"));
	let blob = Blob::wrap(raw);
	assert_eq!(blob.size(), 6);
	assert_eq!(blob.into_raw().data(), &b"picked"[..]);
}

#[test_log::test(tokio::test)]
async fn blob_bytes_reads_everything() {
	local(async {
		let blob = Blob::new(["one", "two"], BlobOptions::default()).unwrap();
		assert_eq!(blob.bytes().await, Ok(Bytes::from_static(b"onetwo")));
	})
	.await
}

#[test_log::test(tokio::test)]
async fn closed_blob_can_not_be_read() {
	local(async {
		let blob = Blob::new(["data"], BlobOptions::default()).unwrap();
		blob.close();
		assert_eq!(blob.bytes().await, Err(Error::Closed));
	})
	.await
}

#[test]
fn file_metadata() {
	let options = FileOptions::default().with_type("text/csv").with_last_modified(1_600_000_000_500);
	let file = File::new(["a,b\n", "1,2\n"], "data.csv", options).unwrap();
	assert_eq!(file.name(), "data.csv");
	assert_eq!(file.size(), 8);
	assert_eq!(file.content_type(), "text/csv");
	assert_eq!(file.last_modified_millis(), 1_600_000_000_500);
	let modified = file.last_modified().unwrap();
	assert_eq!(modified.timestamp(), 1_600_000_000);
	assert_eq!(modified.timestamp_subsec_nanos(), 500_000_000);
}

#[test]
fn file_defaults_to_now() {
	let before = chrono::Utc::now().timestamp_millis();
	let file = File::new(["x"], "x.txt", FileOptions::default()).unwrap();
	let after = chrono::Utc::now().timestamp_millis();
	assert!((before..=after).contains(&file.last_modified_millis()));
}

#[test]
fn file_is_a_blob() {
	let file = File::new(["content"], "f.txt", FileOptions::default()).unwrap();
	let slice = file.slice(0, 3, "text/plain").unwrap();
	assert_eq!(slice.size(), 3);
	// A slice of a file is a plain blob
	assert_eq!(File::wrap(slice.into_raw()).name(), "");
	let blob: Blob = file.clone().into();
	assert_eq!(blob.size(), file.as_blob().size());
	assert_eq!(file.into_blob().size(), 7);
}

#[test_log::test(tokio::test)]
async fn file_can_be_read() {
	local(async {
		let file = File::new(["file ", "content"], "f.txt", FileOptions::default()).unwrap();
		let mut reader = file.reader();
		let mut content = Vec::new();
		assert_eq!(reader.read_to_end(&mut content).await, Ok(12));
		assert_eq!(content, b"file content");
	})
	.await
}
