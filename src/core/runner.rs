//! # Run a single producer or consumer call.
//!
//! Wraps one call in an optional deadline.
//!
//! ```text
//! deadline None    → fut.await
//! deadline Some(d) → time::timeout(d, fut)
//!                      ├─ completed → its result
//!                      └─ elapsed   → fut dropped → Err(CallError::Timeout { d })
//! ```
//!
//! ## Rules
//! - A zero deadline is treated as "no deadline".
//! - On timeout the call's future is dropped, cancelling it at its current await point.

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::CallError;

/// Awaits `call`, failing with [`CallError::Timeout`] if `deadline` elapses first.
pub(crate) async fn call_with_deadline<T, F>(call: F, deadline: Option<Duration>) -> Result<T, CallError>
where
    F: Future<Output = Result<T, CallError>>,
{
    match deadline.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, call).await {
            Ok(res) => res,
            Err(_elapsed) => Err(CallError::Timeout { timeout: dur }),
        },
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let slow = async {
            time::sleep(Duration::from_secs(10)).await;
            Ok::<_, CallError>(1)
        };
        let res = call_with_deadline(slow, Some(Duration::from_secs(1))).await;
        assert_eq!(
            res,
            Err(CallError::Timeout {
                timeout: Duration::from_secs(1)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_deadline_means_none() {
        let slow = async {
            time::sleep(Duration::from_secs(10)).await;
            Ok::<_, CallError>(7)
        };
        assert_eq!(call_with_deadline(slow, Some(Duration::ZERO)).await, Ok(7));
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let failing = async { Err::<u8, _>(CallError::fail("nope")) };
        assert_eq!(
            call_with_deadline(failing, Some(Duration::from_secs(1))).await,
            Err(CallError::fail("nope"))
        );
    }
}
