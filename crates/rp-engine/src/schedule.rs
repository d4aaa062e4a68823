//! Multi-lane test schedule.
//!
//! Every kept test becomes one task on a resource lane. The strategy decides
//! the dependency edges; a forward pass then assigns start and finish days.
//! The result is a best-effort timeline, not an optimal one.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rp_core::{
    Exposure, ResourceLane, ScheduleSettings, ScheduleStats, ScheduleStrategy, ScheduleTask,
    SelectedTest, Stressor, WeekendShift,
};

/// Lanes fixed by test id, checked before any other rule.
const LANE_BY_TEST_ID: &[(&str, ResourceLane)] = &[
    ("high-temp-storage", ResourceLane::Thermal),
    ("high-temp-operating-life", ResourceLane::Thermal),
    ("low-temp-storage", ResourceLane::Thermal),
    ("thermal-cycling", ResourceLane::Thermal),
    ("thermal-shock", ResourceLane::Thermal),
    ("power-temperature-cycling", ResourceLane::Thermal),
    ("damp-heat", ResourceLane::Humidity),
    ("hast", ResourceLane::Humidity),
    ("humidity-freeze", ResourceLane::Humidity),
    ("random-vibration", ResourceLane::Vibration),
    ("sine-vibration", ResourceLane::Vibration),
    ("mechanical-shock", ResourceLane::Vibration),
    ("salt-spray", ResourceLane::Chemical),
    ("chemical-resistance", ResourceLane::Chemical),
    ("mixed-flowing-gas", ResourceLane::Chemical),
    ("dust-ingress", ResourceLane::Mechanical),
    ("connector-durability", ResourceLane::Mechanical),
    ("drop", ResourceLane::Mechanical),
];

const WATER_INGRESS_TEST_ID: &str = "water-ingress";

/// Resource lane for one test.
pub fn assign_lane(test: &SelectedTest, exposure: Option<Exposure>) -> ResourceLane {
    if let Some((_, lane)) = LANE_BY_TEST_ID.iter().find(|(id, _)| *id == test.id) {
        return *lane;
    }
    if test.id == WATER_INGRESS_TEST_ID {
        return if exposure.is_some_and(Exposure::is_corrosive) {
            ResourceLane::Chemical
        } else {
            ResourceLane::Humidity
        };
    }
    lane_for_stressors(test)
}

fn lane_for_stressors(test: &SelectedTest) -> ResourceLane {
    let has = |s| test.stress.has(s);
    if has(Stressor::Chemical) {
        ResourceLane::Chemical
    } else if has(Stressor::Humidity)
        && (has(Stressor::Temperature) || has(Stressor::ThermalCycling))
    {
        ResourceLane::Humidity
    } else if has(Stressor::Vibration) || has(Stressor::Shock) {
        ResourceLane::Vibration
    } else if has(Stressor::ContactMotion) || has(Stressor::Dust) {
        ResourceLane::Mechanical
    } else if has(Stressor::Temperature) || has(Stressor::ThermalCycling) {
        ResourceLane::Thermal
    } else {
        ResourceLane::Mechanical
    }
}

/// Weeks to whole days, rounded up. Non-finite or negative durations are 0.
pub fn weeks_to_days(weeks: f64) -> u32 {
    if !weeks.is_finite() || weeks <= 0.0 {
        return 0;
    }
    (weeks * 7.0).ceil().min(u32::MAX as f64) as u32
}

/// One task per kept test, in test order, wired per `strategy`. Timings are
/// left at zero; see [`forward_pass`].
pub fn build_tasks(
    tests: &[SelectedTest],
    strategy: ScheduleStrategy,
    exposure: Option<Exposure>,
) -> Vec<ScheduleTask> {
    let mut tasks: Vec<ScheduleTask> = Vec::new();
    let mut last_in_lane: HashMap<ResourceLane, String> = HashMap::new();

    for test in tests.iter().filter(|t| t.is_kept()) {
        let lane = assign_lane(test, exposure);
        let id = format!("task-{}", test.id);
        let dependencies = match strategy {
            ScheduleStrategy::Sequential => tasks.last().map(|t| t.id.clone()).into_iter().collect(),
            ScheduleStrategy::ParallelByStressor => {
                last_in_lane.get(&lane).cloned().into_iter().collect()
            }
        };
        last_in_lane.insert(lane, id.clone());
        tasks.push(ScheduleTask {
            id,
            test_id: test.id.clone(),
            duration_days: weeks_to_days(test.effective_duration_weeks()),
            dependencies,
            resource_lane: lane,
            earliest_start_day: 0,
            latest_finish_day: 0,
        });
    }
    tasks
}

/// Days to add so that `day` after `start` is not a Saturday or Sunday.
fn weekend_shift(start: NaiveDate, day: u32) -> u32 {
    let Some(date) = start.checked_add_signed(Duration::days(i64::from(day))) else {
        return 0;
    };
    match date.weekday() {
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ => 0,
    }
}

/// Assign start and finish days in dependency order.
///
/// Tasks are visited topologically, ties broken by position. Dependencies on
/// unknown ids are ignored; tasks caught in a cycle keep zero timings.
///
/// With a start date, no task starts before the first weekday on or after it.
/// [`WeekendShift::EveryTask`] additionally moves each task off a weekend.
pub fn forward_pass(
    tasks: &mut [ScheduleTask],
    start_date: Option<NaiveDate>,
    weekends: WeekendShift,
) {
    let index: HashMap<String, usize> =
        tasks.iter().enumerate().map(|(i, t)| (t.id.clone(), i)).collect();

    let mut indegree = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, t) in tasks.iter().enumerate() {
        for dep in &t.dependencies {
            if let Some(&j) = index.get(dep) {
                indegree[i] += 1;
                dependents[j].push(i);
            }
        }
    }

    let first_day = start_date.map_or(0, |d| weekend_shift(d, 0));
    let mut ready: VecDeque<usize> = (0..tasks.len()).filter(|&i| indegree[i] == 0).collect();
    let mut finish = vec![0u32; tasks.len()];
    let mut visited = 0usize;
    while let Some(i) = ready.pop_front() {
        visited += 1;
        let mut start = tasks[i]
            .dependencies
            .iter()
            .filter_map(|d| index.get(d))
            .map(|&j| finish[j])
            .max()
            .unwrap_or(0)
            .max(first_day);
        if let (Some(date), WeekendShift::EveryTask) = (start_date, weekends) {
            start = start.saturating_add(weekend_shift(date, start));
        }
        finish[i] = start.saturating_add(tasks[i].duration_days);
        tasks[i].earliest_start_day = start;
        tasks[i].latest_finish_day = finish[i];

        for &k in &dependents[i] {
            indegree[k] -= 1;
            if indegree[k] == 0 {
                ready.push_back(k);
            }
        }
    }
    if visited < tasks.len() {
        tracing::warn!(unscheduled = tasks.len() - visited, "schedule has a dependency cycle");
    }
}

/// Utilization summary of timed tasks.
pub fn schedule_stats(tasks: &[ScheduleTask]) -> ScheduleStats {
    let sequential_days: u32 = tasks.iter().map(|t| t.duration_days).sum();
    let current_days = tasks.iter().map(|t| t.latest_finish_day).max().unwrap_or(0);

    let savings_pct = if sequential_days == 0 {
        0
    } else {
        let pct = 100.0 * (f64::from(sequential_days) - f64::from(current_days))
            / f64::from(sequential_days);
        pct.round().max(0.0) as u32
    };

    let mut lane_finish: BTreeMap<ResourceLane, u32> = BTreeMap::new();
    for t in tasks {
        let e = lane_finish.entry(t.resource_lane).or_default();
        *e = (*e).max(t.latest_finish_day);
    }
    // Ties go to the lane declared first.
    let critical_lane = lane_finish
        .iter()
        .fold(None, |best: Option<(ResourceLane, u32)>, (&lane, &fin)| match best {
            Some((_, b)) if b >= fin => best,
            _ => Some((lane, fin)),
        })
        .map(|(lane, _)| lane);

    ScheduleStats { sequential_days, current_days, savings_pct, critical_lane }
}

/// Build, time and summarize the schedule for a test list.
pub fn build_schedule(
    tests: &[SelectedTest],
    settings: &ScheduleSettings,
    exposure: Option<Exposure>,
) -> (Vec<ScheduleTask>, ScheduleStats) {
    let mut tasks = build_tasks(tests, settings.strategy, exposure);
    forward_pass(&mut tasks, settings.start_date, settings.weekend_shift);
    let stats = schedule_stats(&tasks);
    tracing::debug!(
        tasks = tasks.len(),
        current_days = stats.current_days,
        savings_pct = stats.savings_pct,
        "schedule built"
    );
    (tasks, stats)
}
