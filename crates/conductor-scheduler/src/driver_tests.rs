use super::*;
use crate::scheduler::RotationScheduler;
use chrono::{DateTime, Utc};
use conductor_config::SchedulerConfig;

fn setup() -> (SharedScheduler<ManualClock>, ManualClock) {
    let clock = ManualClock::at_epoch();
    let config = SchedulerConfig::with_workers(["A", "B", "C"]);
    let scheduler = RotationScheduler::new(&config, clock.clone()).unwrap();
    (SharedScheduler::new(scheduler), clock)
}

fn task(id: &str, priority: u32) -> Task {
    Task::new(id, priority, 0.0, 30.0, DateTime::<Utc>::UNIX_EPOCH)
}

fn idle_options() -> CycleOptions {
    CycleOptions {
        stop_when_idle: true,
        max_ticks: Some(100),
        ..CycleOptions::default()
    }
}

/// Turns the clock's auto step off after a number of ticks.
struct SettlingTicker {
    clock: ManualClock,
    remaining_slow: u32,
}

#[async_trait]
impl Ticker for SettlingTicker {
    async fn tick(&mut self) {
        if self.remaining_slow == 0 {
            self.clock.set_auto_step(Duration::zero());
        } else {
            self.remaining_slow -= 1;
        }
    }
}

#[tokio::test]
async fn test_cycle_assigns_queue_in_order() {
    let (shared, clock) = setup();
    let mut ticker = ManualTicker::new(clock, Duration::seconds(1));
    let mut source = VecTaskSource::new([task("t1", 95), task("t2", 90), task("t3", 85)]);

    let summary = run_cycle(&shared, &mut ticker, &mut source, &idle_options())
        .await
        .unwrap();

    assert_eq!(summary.assigned, 3);
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.dropped, 0);
    let ids: Vec<&str> = summary
        .assignments
        .iter()
        .map(|a| a.task_id.as_str())
        .collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert!(source.is_empty());
    assert_eq!(summary.final_health.metrics.total_tasks_assigned, 3);
}

#[tokio::test]
async fn test_cycle_rotates_on_schedule_until_deadline() {
    let (shared, clock) = setup();
    let mut ticker = ManualTicker::new(clock, Duration::seconds(30));
    let mut source = VecTaskSource::default();
    let options = CycleOptions {
        run_for: Some(Duration::minutes(10)),
        ..CycleOptions::default()
    };

    let summary = run_cycle(&shared, &mut ticker, &mut source, &options)
        .await
        .unwrap();

    // Windows: A 1m, B 2m, C 3m, A 1m, B 3m -> rotations at 1, 3, 6, 7, 10 minutes.
    assert_eq!(summary.ticks, 20);
    assert_eq!(summary.rotations, 5);
    assert_eq!(summary.final_health.active_worker, "C");
    assert_eq!(summary.final_health.metrics.rotation_count, 5);
}

#[tokio::test]
async fn test_rejected_task_is_dropped_after_max_attempts() {
    let (shared, clock) = setup();
    clock.set_auto_step(Duration::milliseconds(250));
    let mut ticker = ManualTicker::new(clock, Duration::seconds(1));
    let mut source = VecTaskSource::new([task("slow", 95)]);

    let summary = run_cycle(&shared, &mut ticker, &mut source, &idle_options())
        .await
        .unwrap();

    assert_eq!(summary.assigned, 0);
    assert_eq!(summary.rejected, 3);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.final_health.metrics.rejected_assignments, 3);
}

#[tokio::test]
async fn test_rejected_task_is_retried_on_next_tick() {
    let (shared, clock) = setup();
    clock.set_auto_step(Duration::milliseconds(250));
    let mut ticker = SettlingTicker {
        clock,
        remaining_slow: 1,
    };
    let mut source = VecTaskSource::new([task("t1", 95), task("t2", 90)]);

    let summary = run_cycle(&shared, &mut ticker, &mut source, &idle_options())
        .await
        .unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.dropped, 0);
    let ids: Vec<&str> = summary
        .assignments
        .iter()
        .map(|a| a.task_id.as_str())
        .collect();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_duplicate_task_is_skipped_and_loop_continues() {
    let (shared, clock) = setup();
    let mut ticker = ManualTicker::new(clock, Duration::seconds(1));
    let mut source = VecTaskSource::new([task("t1", 95), task("t1", 95), task("t2", 50)]);

    let summary = run_cycle(&shared, &mut ticker, &mut source, &idle_options())
        .await
        .unwrap();

    assert_eq!(summary.assigned, 2);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.rejected, 0);
}

#[tokio::test]
async fn test_max_ticks_bounds_the_run() {
    let (shared, clock) = setup();
    let mut ticker = ManualTicker::new(clock, Duration::seconds(1));
    let mut source = VecTaskSource::new((0..10).map(|i| task(&format!("t{i}"), 80)));
    let options = CycleOptions {
        max_ticks: Some(4),
        ..CycleOptions::default()
    };

    let summary = run_cycle(&shared, &mut ticker, &mut source, &options)
        .await
        .unwrap();

    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.assigned, 4);
    assert_eq!(source.len(), 6);
}

#[tokio::test]
async fn test_interval_ticker_with_system_clock() {
    let config = SchedulerConfig::with_workers(["A", "B"]);
    let shared = SharedScheduler::new(RotationScheduler::with_system_clock(&config).unwrap());
    let mut ticker = IntervalTicker::new(StdDuration::from_millis(1));
    let mut source = VecTaskSource::new([task("t1", 95)]);

    let summary = run_cycle(&shared, &mut ticker, &mut source, &idle_options())
        .await
        .unwrap();

    assert_eq!(summary.assigned, 1);
    assert_eq!(summary.assignments[0].worker, "B");
}
