//! Worker processes started with `tokio::process`.

use std::process::Stdio;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::process::Command;

use crate::worker::{Spawner, WorkerError, WorkerExit, WorkerJob, DATA_URL_ENV, HANDLER_ID_ENV};

/// Runs `<entrypoint...> <command>` for every matched request.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    default_entrypoint: String,
    data_url: String,
    timeout: Duration,
}

impl ProcessSpawner {
    pub fn new(default_entrypoint: impl Into<String>, data_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            default_entrypoint: default_entrypoint.into(),
            data_url: data_url.into(),
            timeout,
        }
    }

    /// Assemble the command line for a job without running it.
    pub fn command_line(&self, job: &WorkerJob) -> Result<Vec<String>, WorkerError> {
        let entrypoint = if job.route.entrypoint.trim().is_empty() {
            &self.default_entrypoint
        } else {
            &job.route.entrypoint
        };

        let mut argv: Vec<String> = entrypoint.split_whitespace().map(str::to_owned).collect();
        if argv.is_empty() {
            return Err(WorkerError::InvalidEntrypoint(job.route.id.clone()));
        }
        if !job.route.command.is_empty() {
            argv.push(job.route.command.clone());
        }
        Ok(argv)
    }

    async fn run(self, job: WorkerJob) -> Result<WorkerExit, WorkerError> {
        let argv = self.command_line(&job)?;

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .env(HANDLER_ID_ENV, job.handler_id.to_string())
            .env(DATA_URL_ENV, &self.data_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(handler_id = %job.handler_id, route_id = %job.route.id, program = %argv[0], "Spawning worker");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| WorkerError::Timeout(self.timeout.as_secs()))??;

        if !output.stdout.is_empty() {
            tracing::debug!(handler_id = %job.handler_id, stdout = %String::from_utf8_lossy(&output.stdout), "Worker stdout");
        }
        if !output.stderr.is_empty() {
            tracing::debug!(handler_id = %job.handler_id, stderr = %String::from_utf8_lossy(&output.stderr), "Worker stderr");
        }

        Ok(WorkerExit {
            code: output.status.code(),
        })
    }
}

impl Spawner for ProcessSpawner {
    fn spawn(&self, job: WorkerJob) -> BoxFuture<'static, Result<WorkerExit, WorkerError>> {
        self.clone().run(job).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{Handler, HandlerRegistry};
    use crate::routing::{Route, RouteMatch};
    use axum::body::Body;
    use axum::http::Request;

    fn job(entrypoint: &str, command: &str) -> WorkerJob {
        let registry = HandlerRegistry::new();
        let handler_id = registry.register(Handler::new(
            RouteMatch::default(),
            Request::builder().uri("/").body(Body::empty()).unwrap(),
        ));
        WorkerJob {
            route: Route {
                id: "r1".into(),
                entrypoint: entrypoint.into(),
                ..Route::new("GET", "/", command)
            },
            handler_id,
        }
    }

    fn spawner(timeout: Duration) -> ProcessSpawner {
        ProcessSpawner::new("/bin/sh -c", "http://127.0.0.1:8082", timeout)
    }

    #[test]
    fn default_entrypoint_is_used_when_route_has_none() {
        let argv = spawner(Duration::from_secs(1))
            .command_line(&job("", "echo hi"))
            .unwrap();
        assert_eq!(argv, vec!["/bin/sh", "-c", "echo hi"]);
    }

    #[test]
    fn route_entrypoint_overrides_default() {
        let argv = spawner(Duration::from_secs(1))
            .command_line(&job("/usr/bin/env python3 -c", "print(1)"))
            .unwrap();
        assert_eq!(argv, vec!["/usr/bin/env", "python3", "-c", "print(1)"]);
    }

    #[test]
    fn empty_command_is_not_appended() {
        let argv = spawner(Duration::from_secs(1))
            .command_line(&job("/usr/local/bin/worker", ""))
            .unwrap();
        assert_eq!(argv, vec!["/usr/local/bin/worker"]);
    }

    #[test]
    fn blank_entrypoint_everywhere_is_an_error() {
        let spawner = ProcessSpawner::new("  ", "http://127.0.0.1:8082", Duration::from_secs(1));
        assert!(matches!(
            spawner.command_line(&job("", "echo")),
            Err(WorkerError::InvalidEntrypoint(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn worker_sees_its_environment() {
        let job = job("", "");
        let command = format!(
            "test \"${HANDLER_ID_ENV}\" = \"{}\" && test \"${DATA_URL_ENV}\" = http://127.0.0.1:8082",
            job.handler_id
        );
        let job = WorkerJob {
            route: Route {
                command,
                ..job.route
            },
            ..job
        };

        let exit = spawner(Duration::from_secs(5)).spawn(job).await.unwrap();
        assert!(exit.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_code_is_reported() {
        let exit = spawner(Duration::from_secs(5))
            .spawn(job("", "exit 3"))
            .await
            .unwrap();
        assert_eq!(exit.code, Some(3));
        assert!(!exit.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_workers_time_out() {
        let result = spawner(Duration::from_millis(100))
            .spawn(job("", "sleep 5"))
            .await;
        assert!(matches!(result, Err(WorkerError::Timeout(_))));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let result = spawner(Duration::from_secs(1))
            .spawn(job("/nonexistent/shellgate-worker", ""))
            .await;
        assert!(matches!(result, Err(WorkerError::Spawn(_))));
    }
}
