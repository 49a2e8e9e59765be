//! Shared refill handle and the detached task that drives it.
//!
//! Every caller interested in a refill holds a clone of the same
//! [`RefillHandle`]; the first poll from any clone advances the single
//! underlying fetch. The handle is also spawned on the runtime so the
//! refill finishes even when nobody awaits it.

use crate::transport::FetchError;
use futures::future::{BoxFuture, Shared};
use tokio::runtime::Handle;
use tracing::debug;

/// Number of questions appended, or the reason nothing was.
pub type RefillOutcome = Result<usize, FetchError>;

pub type RefillHandle = Shared<BoxFuture<'static, RefillOutcome>>;

/// Runs `handle` to completion in the background. Outside a tokio runtime
/// the refill only advances while someone awaits it.
pub(crate) fn spawn_detached(handle: RefillHandle) {
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(handle);
        }
        Err(_) => debug!("No runtime available, refill will run when awaited"),
    }
}
