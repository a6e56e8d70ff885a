//! 可取消的延遲任務
//!
//! 任務在延遲結束後才開始執行；開始前可取消，開始後取消無效。

use pantry_core::{PantryError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

/// 已排程任務的控制代碼
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    state: Arc<AtomicU8>,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 是否仍在等待延遲結束
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    /// 任務是否已結束（執行完畢或已取消）
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// 取消尚未開始的任務。回傳 false 表示任務已開始或已結束
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            self.token.cancel();
        }
        cancelled
    }

    /// 等待任務結束
    pub async fn wait(self) {
        if let Err(e) = self.join.await {
            if !e.is_cancelled() {
                tracing::error!("延遲任務 {} 異常結束: {}", self.id, e);
            }
        }
    }
}

/// 延遲任務排程器
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    runtime: Handle,
    next_id: Arc<AtomicU64>,
}

impl TaskScheduler {
    /// 使用目前的 tokio runtime 建立排程器
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| PantryError::Scheduler(format!("找不到 tokio runtime: {}", e)))?;
        Ok(Self::with_runtime(runtime))
    }

    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// 在延遲後執行任務
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(AtomicU8::new(PENDING));
        let token = CancellationToken::new();

        let task_state = state.clone();
        let task_token = token.clone();
        let join = self.runtime.spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    tracing::debug!("延遲任務 {} 已取消", id);
                }
                _ = tokio::time::sleep(delay) => {
                    if task_state
                        .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        task.await;
                    }
                }
            }
        });

        TaskHandle {
            id,
            state,
            token,
            join,
        }
    }

    /// 取消任務
    pub fn cancel(&self, handle: &TaskHandle) -> bool {
        handle.cancel()
    }

    /// 取消舊任務（若有）並重新排程
    pub fn reschedule<F>(
        &self,
        previous: Option<TaskHandle>,
        delay: Duration,
        task: F,
    ) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = previous {
            if !previous.cancel() {
                tracing::debug!("延遲任務 {} 已開始執行，無法取消", previous.id());
            }
        }
        self.schedule(delay, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_runs_after_delay() {
        let scheduler = TaskScheduler::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(100), counter_task(&counter));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(handle.is_pending());

        handle.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_start() {
        let scheduler = TaskScheduler::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(100), counter_task(&counter));
        assert!(scheduler.cancel(&handle));
        handle.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_run_returns_false() {
        let scheduler = TaskScheduler::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(10), counter_task(&counter));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;

        assert!(!handle.cancel());
        handle.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_runs_only_latest() {
        let scheduler = TaskScheduler::current().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let mut pending = None;
        for _ in 0..3 {
            pending = Some(scheduler.reschedule(
                pending.take(),
                Duration::from_millis(100),
                counter_task(&counter),
            ));
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        if let Some(handle) = pending {
            handle.wait().await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_current_requires_runtime() {
        assert!(matches!(
            TaskScheduler::current(),
            Err(PantryError::Scheduler(_))
        ));
    }
}
