use std::io;

use thiserror::Error;

/// An error originating from a blob, a file, or a read over one of them.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// The platform reported an error during the asynchronous read
	#[error("The platform failed to read the blob: {0}")]
	PlatformRead(String),

	/// The read finished, but the platform reader was not in the done state
	#[error("The read finished with an unexpected ready state: {0}")]
	UnexpectedState(u16),

	/// The read was aborted before the content was loaded
	#[error("The read was not completed")]
	NotCompleted,

	/// There is no pending read which could be aborted
	#[error("There is no read in progress")]
	AbortNotInProgress,

	/// The platform rejected the request to abort the read
	#[error("The platform failed to abort the read: {0}")]
	AbortFailed(String),

	/// The blob was closed before the read was started
	#[error("The blob has been closed and can not be read")]
	Closed,

	/// The platform raised an exception while creating or slicing a blob
	#[error("The platform raised an error: {0}")]
	Platform(String),

	/// The last modified time of a file can not be represented
	#[error("The timestamp {0} is out of the supported range")]
	InvalidTimestamp(i64),
}

impl From<Error> for io::Error {
	fn from(error: Error) -> Self {
		match error {
			Error::NotCompleted => io::Error::new(io::ErrorKind::Interrupted, error),
			Error::Closed => io::Error::new(io::ErrorKind::BrokenPipe, error),
			error => io::Error::other(error),
		}
	}
}
