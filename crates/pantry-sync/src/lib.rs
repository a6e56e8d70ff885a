//! # Pantry Sync
//!
//! 持久化介面、可取消的延遲任務與購物清單排序緩衝

pub mod ordering;
pub mod persistence;
pub mod scheduler;

// Re-export 主要類型
pub use ordering::OrderingBuffer;
pub use persistence::{MemoryStore, Persistence, Record, WriteOp};
pub use scheduler::{TaskHandle, TaskScheduler};
