//! 可中断等待
//!
//! 把长等待切成小片，每片之后检查一次停止条件。

use std::time::Duration;

use tokio::time::{sleep, Instant};

/// 等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 完整等待了 `total`
    Elapsed,
    /// 停止条件成立，提前返回
    Interrupted,
}

/// 最多等待 `total`，每隔不超过 `slice` 检查一次 `should_stop`
///
/// 开始前也会检查一次，已请求停止时立即返回。
pub async fn sleep_checking<F>(should_stop: F, total: Duration, slice: Duration) -> WaitOutcome
where
    F: Fn() -> bool,
{
    let slice = if slice.is_zero() { total } else { slice };
    let deadline = Instant::now() + total;

    loop {
        if should_stop() {
            return WaitOutcome::Interrupted;
        }
        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::Elapsed;
        }
        sleep(slice.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn waits_full_duration_when_not_stopped() {
        let started = Instant::now();
        let outcome = sleep_checking(|| false, Duration::from_secs(10), Duration::from_millis(500)).await;
        assert_eq!(outcome, WaitOutcome::Elapsed);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupts_within_one_slice() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = flag.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(1200)).await;
            setter.store(true, Ordering::SeqCst);
        });

        let started = Instant::now();
        let outcome = sleep_checking(
            || flag.load(Ordering::SeqCst),
            Duration::from_secs(10),
            Duration::from_millis(500),
        )
        .await;

        assert_eq!(outcome, WaitOutcome::Interrupted);
        assert!(started.elapsed() <= Duration::from_millis(1700));
    }

    #[tokio::test(start_paused = true)]
    async fn checks_before_sleeping() {
        let calls = AtomicUsize::new(0);
        let outcome = sleep_checking(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                true
            },
            Duration::from_secs(5),
            Duration::from_millis(500),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::Interrupted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
