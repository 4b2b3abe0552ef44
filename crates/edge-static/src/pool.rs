//! Worker pool coordinator.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use edge_handler::CityPlan;
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, error, info, warn};

use crate::config::StaticGenerateOptions;
use crate::error::StaticError;
use crate::system::{System, WorkerHandle};
use crate::types::{StaticGenerateResult, StaticRoute, StaticWorkerRenderResult, WorkerMessage, WorkerResponse};
use crate::worker::worker_handler;

/// Progress notifications emitted by [`generate_with_progress`].
#[derive(Debug)]
pub enum GenerateEvent<'a> {
    /// Pathnames were enumerated and workers are about to start.
    Started { total: usize, workers: usize },
    /// One pathname finished.
    Rendered(&'a StaticWorkerRenderResult),
}

/// Enumerate every pathname to pre-render.
///
/// Routes without parameters contribute their declared path. Dynamic
/// routes contribute one pathname per parameter set returned by their leaf
/// module's `static_paths` hook. Pathnames outside `base_pathname` are
/// skipped; duplicates are dropped. Pathnames follow the app's own
/// trailing-slash policy.
pub async fn static_routes(plan: &CityPlan, options: &StaticGenerateOptions) -> anyhow::Result<Vec<StaticRoute>> {
    let trailing_slash = plan.config().trailing_slash;
    let mut seen = HashSet::new();
    let mut routes = Vec::new();
    let mut push = |route: StaticRoute| {
        let route = StaticRoute {
            pathname: normalize_pathname(&route.pathname, trailing_slash),
            ..route
        };
        if !route.pathname.starts_with(&options.base_pathname) {
            debug!(pathname = %route.pathname, "outside base pathname, skipped");
            return;
        }
        if seen.insert(route.pathname.clone()) {
            routes.push(route);
        }
    };

    for route in plan.routes() {
        if route.is_static() {
            push(StaticRoute::new(route.original_pathname.clone()));
            continue;
        }

        let Some(leaf) = route.loaders.last() else {
            continue;
        };
        let module = leaf
            .load()
            .await
            .with_context(|| format!("Failed to load module {}", leaf.id()))?;
        let Some(static_paths) = module.get_static_paths() else {
            debug!(route = %route.original_pathname, "dynamic route without static paths, skipped");
            continue;
        };

        let params_list = static_paths()
            .await
            .with_context(|| format!("Failed to enumerate static paths of {}", route.original_pathname))?;
        for params in params_list {
            match route.build_pathname(&params) {
                Some(pathname) => push(StaticRoute::new(pathname).with_params(params)),
                None => warn!(route = %route.original_pathname, ?params, "static path is missing a parameter"),
            }
        }
    }

    Ok(routes)
}

/// Apply the trailing-slash policy to a pathname.
pub fn normalize_pathname(pathname: &str, trailing_slash: bool) -> String {
    let pathname = if pathname.starts_with('/') {
        pathname.to_string()
    } else {
        format!("/{}", pathname)
    };
    if trailing_slash && !pathname.ends_with('/') {
        format!("{}/", pathname)
    } else if !trailing_slash && pathname.len() > 1 && pathname.ends_with('/') {
        pathname.trim_end_matches('/').to_string()
    } else {
        pathname
    }
}

/// Render every static pathname of `plan`.
pub async fn generate(sys: Arc<dyn System>, plan: CityPlan) -> anyhow::Result<StaticGenerateResult> {
    generate_with_progress(sys, plan, |_| {}).await
}

/// Render every static pathname of `plan`, reporting progress.
///
/// Renders are spread over the pool, always to the worker with the fewest
/// renders in flight, never exceeding `max_tasks_per_worker` per worker.
/// Every worker is closed, and thereby drained, before this returns.
pub async fn generate_with_progress<F>(
    sys: Arc<dyn System>,
    plan: CityPlan,
    mut progress: F,
) -> anyhow::Result<StaticGenerateResult>
where
    F: FnMut(GenerateEvent<'_>),
{
    let start = Instant::now();
    let options = sys.options().clone();
    options.validate()?;
    options.check_plan(plan.config())?;
    tokio::fs::create_dir_all(&options.out_dir)
        .await
        .map_err(|source| StaticError::Io {
            path: options.out_dir.clone(),
            source,
        })?;

    let routes = static_routes(&plan, &options).await?;
    let worker_count = options.worker_count().min(routes.len().max(1));
    let max_tasks = options.max_tasks_per_worker.max(1);
    progress(GenerateEvent::Started {
        total: routes.len(),
        workers: worker_count,
    });
    info!(pathnames = routes.len(), workers = worker_count, "static generation started");

    let workers: Vec<WorkerHandle> = (0..worker_count)
        .map(|_| sys.create_worker_process(worker_handler(sys.clone(), plan.clone())))
        .collect();

    let mut active = vec![0usize; workers.len()];
    let mut queue: VecDeque<StaticRoute> = routes.into();
    let mut in_flight = FuturesUnordered::new();
    let mut result = StaticGenerateResult::default();

    loop {
        while let Some(index) = least_loaded(&active, max_tasks) {
            let Some(route) = queue.pop_front() else {
                break;
            };
            active[index] += 1;
            let worker = workers[index].clone();
            in_flight.push(async move {
                let pathname = route.pathname.clone();
                (index, pathname, worker.send(WorkerMessage::Render(route)).await)
            });
        }

        let Some((index, pathname, response)) = in_flight.next().await else {
            break;
        };
        active[index] -= 1;

        let render = match response {
            Ok(WorkerResponse::Render(render)) => render,
            Ok(WorkerResponse::Close) => {
                let err = StaticError::UnexpectedResponse {
                    worker: workers[index].id(),
                    request: "render",
                };
                failed_render(pathname, err.to_string())
            }
            Err(err) => failed_render(pathname, err.to_string()),
        };

        match &render.error {
            Some(err) => {
                result.errors += 1;
                error!(pathname = %render.pathname, error = %err, "static render failed");
            }
            None if render.ok => {
                result.rendered += 1;
                if render.is_static {
                    result.static_paths.push(render.pathname.clone());
                }
            }
            None => debug!(pathname = %render.pathname, "not an HTML page, nothing written"),
        }
        progress(GenerateEvent::Rendered(&render));
    }

    close_workers(&workers).await?;

    result.static_paths.sort();
    result.duration = start.elapsed();
    info!(
        rendered = result.rendered,
        errors = result.errors,
        duration_ms = result.duration.as_millis() as u64,
        "static generation finished"
    );
    Ok(result)
}

/// Worker with the fewest renders in flight, if any has capacity.
fn least_loaded(active: &[usize], max_tasks: usize) -> Option<usize> {
    active
        .iter()
        .enumerate()
        .filter(|(_, count)| **count < max_tasks)
        .min_by_key(|(_, count)| **count)
        .map(|(index, _)| index)
}

fn failed_render(pathname: String, error: String) -> StaticWorkerRenderResult {
    let mut render = StaticWorkerRenderResult::new(pathname, "");
    render.error = Some(error);
    render
}

async fn close_workers(workers: &[WorkerHandle]) -> Result<(), StaticError> {
    try_join_all(workers.iter().map(|worker| async move {
        match worker.send(WorkerMessage::Close).await? {
            WorkerResponse::Close => Ok(()),
            WorkerResponse::Render(_) => Err(StaticError::UnexpectedResponse {
                worker: worker.id(),
                request: "close",
            }),
        }
    }))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pathname() {
        assert_eq!(normalize_pathname("/actions", true), "/actions/");
        assert_eq!(normalize_pathname("/actions/", true), "/actions/");
        assert_eq!(normalize_pathname("/actions/", false), "/actions");
        assert_eq!(normalize_pathname("/", false), "/");
        assert_eq!(normalize_pathname("blog/a", true), "/blog/a/");
    }

    #[test]
    fn test_least_loaded() {
        assert_eq!(least_loaded(&[2, 0, 1], 3), Some(1));
        assert_eq!(least_loaded(&[3, 3], 3), None);
        assert_eq!(least_loaded(&[1, 1], 3), Some(0));
        assert_eq!(least_loaded(&[], 3), None);
    }
}
