//! Core types shared by the conductor crates: tasks, worker state, errors and the clock seam.

pub mod clock;
pub mod error;
pub mod types;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RejectReason, SchedulerError};
pub use types::{OutputFormat, Task, TaskId, TaskStatus, WorkerId};
pub use worker::{WorkerState, duration_secs};
