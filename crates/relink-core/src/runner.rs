use crate::backlinks::collect_backlinks;
use crate::config::{RenameJob, Settings};
use crate::error::ServiceError;
use crate::rename::{RenameOrchestrator, RunReport};
use crate::service::DocumentService;
use crate::watchdog::{WatchVerdict, Watchdog};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How a run ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// Every collected document was visited.
    Completed(RunReport),
    /// The watched discussion went back to normal. The report is `None` when
    /// that happened before backlink collection finished.
    WatchSatisfied(Option<RunReport>),
    /// A watchdog poll failed and took the run down with it.
    WatchFailed(ServiceError, Option<RunReport>),
}

impl JobOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            JobOutcome::Completed(report) => Some(report),
            JobOutcome::WatchSatisfied(report) | JobOutcome::WatchFailed(_, report) => {
                report.as_ref()
            }
        }
    }
}

/// Run one rename end to end.
///
/// The watchdog starts first and runs alongside backlink collection and the
/// per-document loop. Whichever side finishes first cancels the shared token:
/// the watchdog on a terminal verdict, this function once the loop is done.
pub async fn run_job<S>(service: Arc<S>, settings: &Settings, job: &RenameJob) -> JobOutcome
where
    S: DocumentService + ?Sized + 'static,
{
    let cancel = CancellationToken::new();
    let watchdog = Watchdog::new(
        service.clone(),
        &settings.watch_document,
        settings.watch_interval,
    )
    .spawn(cancel.clone());

    tracing::info!(
        "Renaming [[{}]] -> [[{}]] across {} namespace(s)",
        job.old_title,
        job.new_title,
        job.namespaces.len()
    );

    let documents = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        documents = collect_backlinks(service.as_ref(), &job.old_title, &job.namespaces) => Some(documents),
    };

    let report = match documents {
        Some(documents) => {
            let orchestrator = RenameOrchestrator::new(service.as_ref(), job, settings.edit_delay);
            Some(orchestrator.run(&documents, &cancel).await)
        }
        None => None,
    };

    cancel.cancel();
    let verdict = match watchdog.await {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::error!("Watchdog task ended abnormally: {}", e);
            WatchVerdict::Stopped
        }
    };

    match verdict {
        WatchVerdict::Satisfied => JobOutcome::WatchSatisfied(report),
        WatchVerdict::Failed(e) => JobOutcome::WatchFailed(e, report),
        WatchVerdict::Stopped => JobOutcome::Completed(report.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockService;
    use std::time::Duration;

    fn settings(edit_delay: Duration, watch_interval: Duration) -> Settings {
        Settings {
            domain: "wiki.example".into(),
            token: "t".into(),
            namespaces: vec!["Main".into(), "Template".into()],
            log_template: "{old} -> {new}".into(),
            watch_document: "Watched".into(),
            edit_delay,
            watch_interval,
            request_timeout: Duration::from_secs(30),
        }
    }

    fn corpus() -> MockService {
        MockService::new()
            .with_backlink("Main", "A", "link")
            .with_backlink("Main", "B", "link")
            .with_backlink("Template", "A", "link")
            .with_backlink("Template", "C", "link")
            .with_page("A", "[[Old]]")
            .with_page("B", "[[Old|Shown]]")
            .with_page("C", "[[Old|New]]")
    }

    #[tokio::test]
    async fn completes_when_watch_never_fires() {
        let service = Arc::new(corpus());
        let settings = settings(Duration::ZERO, Duration::from_secs(15));
        let job = RenameJob::new(&settings, "Old", "New", true).unwrap();

        let outcome = run_job(service.clone(), &settings, &job).await;

        let report = match outcome {
            JobOutcome::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(report.total, 3);
        assert_eq!(report.updated(), 3);
        assert_eq!(service.fetched(), vec!["A", "B", "C"]);
        assert_eq!(service.page("A").unwrap(), "[[New|Old]]");
        assert_eq!(service.page("B").unwrap(), "[[New|Shown]]");
        assert_eq!(service.page("C").unwrap(), "[[New]]");
        assert_eq!(service.submitted()[0].1.log, "Old -> New");
    }

    #[tokio::test(start_paused = true)]
    async fn normal_discussion_stops_before_unstarted_documents() {
        let service = Arc::new(corpus().with_normal_after_submits(1));
        let settings = settings(Duration::from_secs(1), Duration::from_millis(100));
        let job = RenameJob::new(&settings, "Old", "New", false).unwrap();

        let outcome = run_job(service.clone(), &settings, &job).await;

        let report = match outcome {
            JobOutcome::WatchSatisfied(Some(report)) => report,
            other => panic!("expected watch satisfied with a report, got {:?}", other),
        };
        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(service.fetched(), vec!["A"]);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_error_ends_the_run() {
        let service = Arc::new(corpus().with_failing_discussions());
        let settings = settings(Duration::from_secs(1), Duration::from_secs(15));
        let job = RenameJob::new(&settings, "Old", "New", false).unwrap();

        let outcome = run_job(service.clone(), &settings, &job).await;

        assert!(matches!(outcome, JobOutcome::WatchFailed(_, _)), "got {:?}", outcome);
        assert!(outcome.report().map_or(true, |r| r.cancelled));
        assert!(service.fetched().len() < 3);
    }
}
