//! Fixed-delay retry for ledger calls.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with a fixed delay between attempts.
///
/// Errors for which `retryable` returns `false` stop immediately. Returns the
/// last result together with the number of attempts made.
pub async fn retry<F, Fut, T, E, P>(
    attempts: usize,
    delay: Duration,
    retryable: P,
    mut op: F,
) -> (Result<T, E>, usize)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let attempts = attempts.max(1);
    let mut made = 0;
    loop {
        made += 1;
        match op().await {
            Ok(v) => return (Ok(v), made),
            Err(err) => {
                if made >= attempts || !retryable(&err) {
                    return (Err(err), made);
                }
                sleep(delay).await;
            }
        }
    }
}
