//! Rotation scheduling: duration sequence, scoring, assignment, health and the driving loop.

pub mod driver;
pub mod health;
pub mod scheduler;
pub mod score;
pub mod sequence;
pub mod shared;

pub use driver::{
    Assignment, CycleOptions, CycleSummary, IntervalTicker, ManualTicker, TaskSource, Ticker,
    VecTaskSource, run_cycle,
};
pub use health::{HealthReport, SystemMetrics, WorkerHealth};
pub use scheduler::{
    Candidate, Decision, MAX_SCHEDULE_CYCLES, RotationEvent, RotationScheduler, ScheduleEntry,
};
pub use sequence::{DurationSequence, fibonacci};
pub use shared::SharedScheduler;
