use crate::error::Result;
use std::future::Future;
use tracing::debug;

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is used up.
///
/// Only `ConcurrentModification` is retried. A conflicting write never
/// commits anything, so repeating the call cannot double-count.
pub async fn retry_on_conflict<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                debug!(attempt, error = %e, "retrying after concurrent modification");
                attempt += 1;
                tokio::task::yield_now().await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::{GroupId, MemberId};
    use crate::error::RoscaError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn conflict() -> RoscaError {
        RoscaError::ConcurrentModification {
            group: GroupId(1),
            expected: 0,
        }
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_on_conflict(3, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_on_conflict(2, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(matches!(result, Err(RoscaError::ConcurrentModification { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_never_retries_rejections() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_on_conflict(5, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RoscaError::DuplicateContribution {
                group: GroupId(1),
                member: MemberId::from("B"),
                round: 0,
            })
        })
        .await;

        assert!(matches!(result, Err(RoscaError::DuplicateContribution { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
