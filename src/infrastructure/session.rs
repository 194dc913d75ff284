//! 浏览器会话协调器 - 基础设施层
//!
//! 进程内只有一个真实浏览器会话。本模块负责：
//! - 记录当前持有浏览器的任务
//! - 维护等待浏览器的任务 FIFO 队列
//! - 提供协作式中止标志
//!
//! 由启动代码构造一次，以 `Arc` 注入到编排层与自动化层。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info};

use super::wait::{sleep_checking, WaitOutcome};
use crate::config::Config;
use crate::error::AutomationError;

#[derive(Debug, Default)]
struct SessionState {
    current_job_id: Option<i64>,
    queued_jobs: VecDeque<i64>,
}

/// 当前持有者与队列的快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub current_job_id: Option<i64>,
    pub queued_jobs: Vec<i64>,
}

/// 单个任务的中止结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortOutcome {
    /// 任务正在运行，已设置中止标志
    Signalled,
    /// 任务尚在排队，已移出队列
    Dequeued,
    /// 任务既不在运行也不在排队
    NotActive,
}

/// 全部中止的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbortAllReport {
    pub signalled: Option<i64>,
    pub dequeued: Vec<i64>,
}

pub struct SessionCoordinator {
    state: Mutex<SessionState>,
    abort_requested: AtomicBool,
    poll_interval: Duration,
    abort_slice: Duration,
}

impl SessionCoordinator {
    pub fn new(poll_interval: Duration, abort_slice: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            abort_requested: AtomicBool::new(false),
            poll_interval,
            abort_slice,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.queue_poll_interval(), config.abort_slice())
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // 状态只有两个简单字段，持锁期间不会留下半更新的数据
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========== 队列 ==========

    /// 加入队尾；已在队列中则不变。返回是否新加入
    pub fn enqueue(&self, job_id: i64) -> bool {
        let mut state = self.state();
        if state.queued_jobs.contains(&job_id) {
            return false;
        }
        state.queued_jobs.push_back(job_id);
        debug!("[任务 {}] 加入浏览器队列，位置 {}", job_id, state.queued_jobs.len());
        true
    }

    /// 移出队列；返回是否确实在队列中
    pub fn dequeue(&self, job_id: i64) -> bool {
        let mut state = self.state();
        let before = state.queued_jobs.len();
        state.queued_jobs.retain(|id| *id != job_id);
        before != state.queued_jobs.len()
    }

    pub fn is_queued(&self, job_id: i64) -> bool {
        self.state().queued_jobs.contains(&job_id)
    }

    pub fn current_job(&self) -> Option<i64> {
        self.state().current_job_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            current_job_id: state.current_job_id,
            queued_jobs: state.queued_jobs.iter().copied().collect(),
        }
    }

    // ========== 浏览器所有权 ==========

    /// 等到浏览器空闲且本任务位于队首，然后成为持有者
    ///
    /// 等待期间若被移出队列（用户取消），返回 `None`，调用方不得开始任何工作。
    ///
    /// # 参数
    /// - `job_id`: 已入队的任务 ID
    ///
    /// # 返回
    /// 返回持有凭证，drop 时释放浏览器并清除中止标记
    pub async fn acquire(&self, job_id: i64) -> Option<SessionGuard<'_>> {
        let mut announced = false;
        loop {
            {
                let mut state = self.state();
                if !state.queued_jobs.contains(&job_id) {
                    info!("[任务 {}] ⏹️ 排队期间被取消", job_id);
                    return None;
                }
                if state.current_job_id.is_none() && state.queued_jobs.front() == Some(&job_id) {
                    state.queued_jobs.pop_front();
                    state.current_job_id = Some(job_id);
                    info!("[任务 {}] 🔒 获得浏览器会话", job_id);
                    return Some(SessionGuard {
                        coordinator: self,
                        job_id,
                    });
                }
                if !announced {
                    info!(
                        "[任务 {}] ⏳ 等待浏览器（当前: {:?}，排队: {:?}）",
                        job_id, state.current_job_id, state.queued_jobs
                    );
                    announced = true;
                }
            }
            sleep(self.poll_interval).await;
        }
    }

    /// 释放浏览器并清除中止标志
    pub fn release(&self) {
        let mut state = self.state();
        if let Some(job_id) = state.current_job_id.take() {
            info!("[任务 {}] 🔓 释放浏览器会话", job_id);
        }
        self.abort_requested.store(false, Ordering::SeqCst);
    }

    // ========== 协作式中止 ==========

    /// 运行中 → 设置标志；排队中 → 移出队列
    pub fn request_abort(&self, job_id: i64) -> AbortOutcome {
        let mut state = self.state();
        if state.current_job_id == Some(job_id) {
            self.abort_requested.store(true, Ordering::SeqCst);
            info!("[任务 {}] 🛑 已请求中止", job_id);
            return AbortOutcome::Signalled;
        }
        let before = state.queued_jobs.len();
        state.queued_jobs.retain(|id| *id != job_id);
        if before != state.queued_jobs.len() {
            info!("[任务 {}] 🛑 已移出队列", job_id);
            AbortOutcome::Dequeued
        } else {
            AbortOutcome::NotActive
        }
    }

    /// 清空队列，并中止当前任务
    pub fn abort_all(&self) -> AbortAllReport {
        let mut state = self.state();
        let dequeued: Vec<i64> = state.queued_jobs.drain(..).collect();
        let signalled = state.current_job_id;
        if signalled.is_some() {
            self.abort_requested.store(true, Ordering::SeqCst);
        }
        info!("🛑 全部中止：当前 {:?}，移出队列 {:?}", signalled, dequeued);
        AbortAllReport { signalled, dequeued }
    }

    pub fn clear_abort(&self) {
        self.abort_requested.store(false, Ordering::SeqCst);
    }

    pub fn is_abort_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    /// 安全检查点：已请求中止时返回 `AutomationError::Aborted`
    pub fn check_abort(&self) -> Result<(), AutomationError> {
        if self.is_abort_requested() {
            Err(AutomationError::Aborted)
        } else {
            Ok(())
        }
    }

    /// 可中断的等待，切片长度为配置的 `abort_slice`
    pub async fn pause(&self, total: Duration) -> Result<(), AutomationError> {
        match sleep_checking(|| self.is_abort_requested(), total, self.abort_slice).await {
            WaitOutcome::Elapsed => Ok(()),
            WaitOutcome::Interrupted => Err(AutomationError::Aborted),
        }
    }
}

/// 浏览器持有凭证，drop 时释放会话
pub struct SessionGuard<'a> {
    coordinator: &'a SessionCoordinator,
    job_id: i64,
}

impl SessionGuard<'_> {
    pub fn job_id(&self) -> i64 {
        self.job_id
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.coordinator.current_job() == Some(self.job_id) {
            self.coordinator.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn coordinator() -> Arc<SessionCoordinator> {
        Arc::new(SessionCoordinator::new(Duration::from_millis(10), Duration::from_millis(5)))
    }

    #[test]
    fn enqueue_is_idempotent() {
        let session = coordinator();
        assert!(session.enqueue(1));
        assert!(!session.enqueue(1));
        assert!(session.enqueue(2));
        assert_eq!(session.snapshot().queued_jobs, vec![1, 2]);
        assert!(session.dequeue(1));
        assert!(!session.dequeue(1));
    }

    #[tokio::test]
    async fn acquire_then_release_on_drop() {
        let session = coordinator();
        session.enqueue(7);
        {
            let guard = session.acquire(7).await.unwrap();
            assert_eq!(guard.job_id(), 7);
            assert_eq!(session.current_job(), Some(7));
            assert!(!session.is_queued(7));
        }
        assert_eq!(session.current_job(), None);
    }

    #[tokio::test]
    async fn acquire_without_queue_entry_is_cancelled() {
        let session = coordinator();
        assert!(session.acquire(3).await.is_none());
    }

    #[tokio::test]
    async fn queued_job_removed_while_waiting_never_starts() {
        let session = coordinator();
        session.enqueue(1);
        session.enqueue(2);
        let holder = session.acquire(1).await.unwrap();

        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.acquire(2).await.map(|g| g.job_id()) })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(session.request_abort(2), AbortOutcome::Dequeued);

        assert_eq!(waiter.await.unwrap(), None);
        drop(holder);
    }

    #[tokio::test]
    async fn fifo_and_single_holder() {
        let session = coordinator();
        for id in 1..=4 {
            session.enqueue(id);
        }

        let holders = Arc::new(AtomicUsize::new(0));
        let max_holders = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for id in (1..=4).rev() {
            let session = session.clone();
            let holders = holders.clone();
            let max_holders = max_holders.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _guard = session.acquire(id).await.unwrap();
                let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                max_holders.fetch_max(now, Ordering::SeqCst);
                order.lock().unwrap().push(id);
                tokio::time::sleep(Duration::from_millis(15)).await;
                holders.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_holders.load(Ordering::SeqCst), 1);
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn abort_flag_is_cleared_on_release() {
        let session = coordinator();
        session.enqueue(5);
        let guard = session.acquire(5).await.unwrap();

        assert_eq!(session.request_abort(5), AbortOutcome::Signalled);
        assert!(matches!(session.check_abort(), Err(AutomationError::Aborted)));
        assert!(session.pause(Duration::from_secs(10)).await.is_err());

        drop(guard);
        assert!(session.check_abort().is_ok());
        assert_eq!(session.request_abort(5), AbortOutcome::NotActive);
    }

    #[tokio::test]
    async fn abort_all_drains_queue_and_signals_holder() {
        let session = coordinator();
        session.enqueue(1);
        session.enqueue(2);
        session.enqueue(3);
        let _guard = session.acquire(1).await.unwrap();

        let report = session.abort_all();
        assert_eq!(report.signalled, Some(1));
        assert_eq!(report.dequeued, vec![2, 3]);
        assert!(session.is_abort_requested());
        assert!(session.snapshot().queued_jobs.is_empty());
    }
}
