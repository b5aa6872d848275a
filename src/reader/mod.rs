//! A pull-based reader over the platform's asynchronous whole-content read.
//!
//! The platform delivers the content of a blob atomically, through a single
//! terminal notification. [`Reader`] records that notification in a one-shot
//! slot and fires a completion signal. Calls to [`Reader::read`] suspend on the
//! signal, then copy the recorded content out through a cursor.

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::{Shared, poll_fn};
use futures::io::AsyncRead;

use crate::DefaultBlob;
use crate::cnf::{READY_STATE_DONE, UNKNOWN_READ_ERROR};
use crate::err::Error;
use crate::platform::{Completion, RawBlob, RawRead, ReadEvent, ReadSnapshot, Settle};

/// The observable state of a read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadState {
	/// The read has been dispatched and has not finished yet
	Pending,
	/// The content is available
	Completed,
	/// The read failed
	Failed,
	/// The read was cancelled before it finished
	Aborted,
}

impl ReadState {
	/// Whether the read has settled, successfully or not.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, Self::Pending)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Outcome {
	Pending,
	Completed(Bytes),
	Failed(Error),
	Aborted,
}

impl Outcome {
	/// Interprets the terminal notification of a platform read
	fn from_event(event: ReadEvent, snapshot: ReadSnapshot) -> Self {
		match event {
			ReadEvent::Abort => Self::Aborted,
			ReadEvent::Error => Self::Failed(Error::PlatformRead(
				snapshot.error.unwrap_or_else(|| UNKNOWN_READ_ERROR.to_owned()),
			)),
			ReadEvent::Load => match snapshot.error {
				Some(error) => Self::Failed(Error::PlatformRead(error)),
				None if snapshot.ready_state != READY_STATE_DONE => {
					Self::Failed(Error::UnexpectedState(snapshot.ready_state))
				}
				None => Self::Completed(snapshot.result.unwrap_or_default()),
			},
		}
	}

	fn state(&self) -> ReadState {
		match self {
			Self::Pending => ReadState::Pending,
			Self::Completed(_) => ReadState::Completed,
			Self::Failed(_) => ReadState::Failed,
			Self::Aborted => ReadState::Aborted,
		}
	}
}

struct Slot<R: RawBlob> {
	outcome: Outcome,
	// Present only while the outcome is pending
	in_flight: Option<R::Read>,
	abort_requested: bool,
	done: Option<oneshot::Sender<()>>,
}

struct Inner<R: RawBlob> {
	slot: RefCell<Slot<R>>,
}

impl<R: RawBlob> Inner<R> {
	/// Records a terminal outcome, releasing the in-flight read.
	fn finish(&self, outcome: Outcome) {
		let (retired, done) = {
			let mut slot = self.slot.borrow_mut();
			if slot.outcome != Outcome::Pending {
				trace!("Ignoring a notification for a read which is already {:?}", slot.outcome.state());
				return;
			}
			trace!("Blob read finished as {:?}", outcome.state());
			slot.outcome = outcome;
			(slot.in_flight.take(), slot.done.take())
		};
		// Released outside the borrow, as a backend may call back into the slot
		drop(retired);
		if let Some(done) = done {
			let _ = done.send(());
		}
	}

	fn abort(&self) -> Result<(), Error> {
		let read = {
			let mut slot = self.slot.borrow_mut();
			if slot.abort_requested {
				return Err(Error::AbortNotInProgress);
			}
			let Some(read) = slot.in_flight.clone() else {
				return Err(Error::AbortNotInProgress);
			};
			slot.abort_requested = true;
			read
		};
		debug!("Aborting a pending blob read");
		// The platform may settle the read before this call returns
		read.abort().map_err(Error::AbortFailed)
	}

	fn state(&self) -> ReadState {
		self.slot.borrow().outcome.state()
	}
}

impl<R: RawBlob> Settle for Inner<R> {
	fn settle(&self, event: ReadEvent, snapshot: ReadSnapshot) {
		trace!("Platform reader delivered the {event} event");
		self.finish(Outcome::from_event(event, snapshot))
	}
}

/// A single-shot, pull-based reader over the whole content of a blob.
///
/// The read is dispatched when the reader is created. [`Reader::read`]
/// suspends until the platform reports the outcome, and then either returns
/// the recorded error or copies out the content, returning `Ok(0)` once all of
/// it has been consumed.
pub struct Reader<R: RawBlob = DefaultBlob> {
	inner: Rc<Inner<R>>,
	done: Shared<oneshot::Receiver<()>>,
	content: Option<Bytes>,
	position: usize,
}

impl<R: RawBlob> Reader<R> {
	pub(crate) fn start(raw: &R) -> Self {
		let (tx, rx) = oneshot::channel();
		let inner = Rc::new(Inner {
			slot: RefCell::new(Slot {
				outcome: Outcome::Pending,
				in_flight: None,
				abort_requested: false,
				done: Some(tx),
			}),
		});
		// Check whether the blob can still be read
		if raw.is_closed() {
			inner.finish(Outcome::Failed(Error::Closed));
		} else {
			let target: Rc<dyn Settle> = inner.clone();
			let completion = Completion::new(Rc::downgrade(&target));
			trace!("Dispatching a read of {} bytes", raw.size());
			match raw.read(completion) {
				Ok(read) => {
					let mut slot = inner.slot.borrow_mut();
					// A backend may settle the read before handing it back
					if slot.outcome == Outcome::Pending {
						slot.in_flight = Some(read);
					}
				}
				Err(e) => inner.finish(Outcome::Failed(e)),
			}
		}
		Self {
			inner,
			done: rx.shared(),
			content: None,
			position: 0,
		}
	}

	/// The current state of the read.
	pub fn state(&self) -> ReadState {
		self.inner.state()
	}

	/// Waits until the read reaches a terminal state, without consuming any content.
	pub async fn finished(&self) -> ReadState {
		// The signal can only be awaited until it has fired once
		if !self.state().is_terminal() {
			let _ = self.done.clone().await;
		}
		self.state()
	}

	/// Requests cancellation of the pending read.
	///
	/// Fails with [`Error::AbortNotInProgress`] once the read has finished, or
	/// if cancellation has already been requested.
	pub fn abort(&self) -> Result<(), Error> {
		self.inner.abort()
	}

	/// Returns a handle which can abort the read while it is being awaited.
	pub fn abort_handle(&self) -> Aborter<R> {
		Aborter {
			inner: self.inner.clone(),
		}
	}

	/// Pulls content into `buf`, waiting for the read to finish first.
	///
	/// Returns the number of bytes copied, or `Ok(0)` at the end of the content.
	pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
		poll_fn(|cx| self.poll_fill(cx, buf)).await
	}

	/// Pulls all remaining content into `buf`, returning the number of bytes appended.
	pub async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, Error> {
		poll_fn(|cx| self.poll_wait(cx)).await?;
		let rest = self.remaining();
		buf.extend_from_slice(&rest);
		self.position += rest.len();
		Ok(rest.len())
	}

	fn remaining(&self) -> Bytes {
		match &self.content {
			Some(content) => content.slice(self.position..),
			None => Bytes::new(),
		}
	}

	fn poll_wait(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Error>> {
		if self.content.is_some() {
			return Poll::Ready(Ok(()));
		}
		if !self.state().is_terminal() {
			let _ = ready!(self.done.poll_unpin(cx));
		}
		let slot = self.inner.slot.borrow();
		match &slot.outcome {
			Outcome::Completed(content) => {
				self.content = Some(content.clone());
				Poll::Ready(Ok(()))
			}
			Outcome::Failed(e) => Poll::Ready(Err(e.clone())),
			Outcome::Aborted | Outcome::Pending => Poll::Ready(Err(Error::NotCompleted)),
		}
	}

	fn poll_fill(&mut self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<Result<usize, Error>> {
		ready!(self.poll_wait(cx))?;
		let rest = self.remaining();
		let n = rest.len().min(buf.len());
		buf[..n].copy_from_slice(&rest[..n]);
		self.position += n;
		Poll::Ready(Ok(n))
	}
}

impl<R: RawBlob> AsyncRead for Reader<R> {
	fn poll_read(
		self: Pin<&mut Self>,
		cx: &mut Context<'_>,
		buf: &mut [u8],
	) -> Poll<io::Result<usize>> {
		self.get_mut().poll_fill(cx, buf).map_err(io::Error::from)
	}
}

impl<R: RawBlob> Drop for Reader<R> {
	fn drop(&mut self) {
		let pending = {
			let slot = self.inner.slot.borrow();
			slot.in_flight.is_some() && !slot.abort_requested
		};
		if pending {
			if let Err(e) = self.inner.abort() {
				warn!("Failed to abort a blob read when dropping its reader: {e}");
			}
		}
		// Detach the platform listeners even if the abort was rejected
		let retired = self.inner.slot.borrow_mut().in_flight.take();
		drop(retired);
	}
}

impl<R: RawBlob> fmt::Debug for Reader<R> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Reader")
			.field("state", &self.state())
			.field("position", &self.position)
			.finish()
	}
}

/// A handle for aborting a read from outside the task awaiting it.
pub struct Aborter<R: RawBlob = DefaultBlob> {
	inner: Rc<Inner<R>>,
}

impl<R: RawBlob> Aborter<R> {
	/// Requests cancellation of the pending read. See [`Reader::abort`].
	pub fn abort(&self) -> Result<(), Error> {
		self.inner.abort()
	}

	/// The current state of the read.
	pub fn state(&self) -> ReadState {
		self.inner.state()
	}
}

impl<R: RawBlob> Clone for Aborter<R> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<R: RawBlob> fmt::Debug for Aborter<R> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Aborter").field("state", &self.state()).finish()
	}
}
