#![allow(dead_code)]
use std::future::Future;

use tokio::task::LocalSet;

/// Runs a future on a local task set, so the in-memory platform can deliver
/// read notifications.
pub async fn local<F: Future>(future: F) -> F::Output {
	LocalSet::new().run_until(future).await
}
