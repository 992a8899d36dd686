//! Proximity ranking of tasks for a runner.

use serde::Serialize;

use crate::domain::{GeoPoint, Task, TaskStatus};
use crate::geo::distance_km;

/// A task annotated with its distance from the runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTask {
    #[serde(flatten)]
    pub task: Task,
    /// `None` when the task has no location to measure to.
    pub distance_from_runner_km: Option<f64>,
}

impl RankedTask {
    fn sort_key(&self) -> f64 {
        self.distance_from_runner_km.unwrap_or(f64::INFINITY)
    }
}

/// Where a runner would have to go for `task`: the errand destination when
/// known, else the poster.
pub fn target_of(task: &Task) -> Option<&GeoPoint> {
    task.errand_geo.as_ref().or(task.poster_geo.as_ref())
}

/// Sort `tasks` nearest first, dropping those beyond `max_km`.
///
/// Tasks without a target have no distance: they sort last and are dropped
/// whenever `max_km` is given. Without a runner position nothing can be
/// measured, so the list comes back unfiltered in input order.
pub fn rank_by_proximity(
    tasks: impl IntoIterator<Item = Task>,
    runner_geo: Option<&GeoPoint>,
    max_km: Option<f64>,
) -> Vec<RankedTask> {
    let Some(runner) = runner_geo else {
        return tasks
            .into_iter()
            .map(|task| RankedTask {
                task,
                distance_from_runner_km: None,
            })
            .collect();
    };

    let mut ranked: Vec<RankedTask> = tasks
        .into_iter()
        .map(|task| {
            let distance_from_runner_km = target_of(&task).map(|t| distance_km(runner, t));
            RankedTask {
                task,
                distance_from_runner_km,
            }
        })
        .filter(|r| max_km.is_none_or(|max| r.sort_key() <= max))
        .collect();

    // sort_by is stable; equal distances keep list order
    ranked.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    ranked
}

/// Posted tasks within `radius_km` of the runner, nearest first.
pub fn nearby(
    tasks: impl IntoIterator<Item = Task>,
    runner_geo: Option<&GeoPoint>,
    radius_km: f64,
) -> Vec<RankedTask> {
    let posted = tasks
        .into_iter()
        .filter(|t| t.status == TaskStatus::Posted);
    rank_by_proximity(posted, runner_geo, Some(radius_km))
}
