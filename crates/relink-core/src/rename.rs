use crate::backlinks::DocumentSet;
use crate::config::RenameJob;
use crate::link_parser::rewrite;
use crate::service::{DocumentService, EditPage, EditSubmission};
use std::fmt;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// What happened to one document during a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Links were rewritten and the edit was accepted.
    Updated,
    /// No link to the old title, nothing submitted.
    Unchanged,
    /// The account may not edit this document.
    PermissionDenied,
    FetchFailed(String),
    SubmitFailed(String),
}

/// Per-document outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of documents the run set out to process.
    pub total: usize,
    pub outcomes: Vec<(String, DocumentOutcome)>,
    /// True when cancellation stopped the loop before every document was visited.
    pub cancelled: bool,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|o| *o == DocumentOutcome::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == DocumentOutcome::Unchanged)
    }

    pub fn permission_denied(&self) -> usize {
        self.count(|o| *o == DocumentOutcome::PermissionDenied)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                DocumentOutcome::FetchFailed(_) | DocumentOutcome::SubmitFailed(_)
            )
        })
    }

    pub fn outcome(&self, document: &str) -> Option<&DocumentOutcome> {
        self.outcomes
            .iter()
            .find(|(doc, _)| doc == document)
            .map(|(_, outcome)| outcome)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed: {} updated, {} unchanged, {} permission denied, {} failed",
            self.outcomes.len(),
            self.total,
            self.updated(),
            self.unchanged(),
            self.permission_denied(),
            self.failed()
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Running `(n/total)` counter shown next to each document.
#[derive(Clone, Copy)]
struct Progress {
    index: usize,
    total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index + 1, self.total)
    }
}

/// One document's fetch-rewrite-submit cycle. Dropped at the end of the
/// iteration that created it.
struct EditAttempt<'a> {
    document: &'a str,
    edit_token: String,
    original_text: String,
    rewritten_text: String,
}

impl<'a> EditAttempt<'a> {
    /// Rewrite the fetched page. Returns `None` when no link changed.
    fn prepare(document: &'a str, page: EditPage, job: &RenameJob) -> Option<Self> {
        let result = rewrite(
            &page.text,
            &job.old_title,
            &job.new_title,
            job.keep_alias_for_bare_links,
        );
        if !result.changed {
            return None;
        }
        Some(Self {
            document,
            edit_token: page.token,
            original_text: page.text,
            rewritten_text: result.text,
        })
    }

    fn into_submission(self, log: &str) -> EditSubmission {
        tracing::debug!(
            "{}: {} -> {} bytes",
            self.document,
            self.original_text.len(),
            self.rewritten_text.len()
        );
        EditSubmission {
            text: self.rewritten_text,
            log: log.to_string(),
            token: self.edit_token,
        }
    }
}

/// Drives a [`RenameJob`] over a collected [`DocumentSet`], one document at
/// a time.
pub struct RenameOrchestrator<'a, S: ?Sized> {
    service: &'a S,
    job: &'a RenameJob,
    /// Pause after each accepted edit.
    edit_delay: Duration,
}

impl<'a, S> RenameOrchestrator<'a, S>
where
    S: DocumentService + ?Sized,
{
    pub fn new(service: &'a S, job: &'a RenameJob, edit_delay: Duration) -> Self {
        Self {
            service,
            job,
            edit_delay,
        }
    }

    /// Visit every document once. A failing document never stops the loop;
    /// only `cancel` does, and it also interrupts an in-flight request or
    /// the pacing pause.
    pub async fn run(&self, documents: &DocumentSet, cancel: &CancellationToken) -> RunReport {
        let log = self.job.log_message();
        let mut report = RunReport {
            total: documents.len(),
            ..Default::default()
        };

        for (index, document) in documents.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let progress = Progress {
                index,
                total: report.total,
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!("Cancelled while processing {} ({})", document, progress);
                    report.cancelled = true;
                    break;
                }
                outcome = self.process(document, &log, progress) => outcome,
            };

            let pause = outcome == DocumentOutcome::Updated && index + 1 < report.total;
            report.outcomes.push((document.clone(), outcome));

            if pause {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.edit_delay) => {}
                }
            }
        }

        report
    }

    async fn process(&self, document: &str, log: &str, progress: Progress) -> DocumentOutcome {
        let page = match self.service.fetch_edit(document).await {
            Ok(page) => page,
            Err(e) if e.is_permission_denied() => {
                tracing::warn!(
                    "Cannot edit {} due to insufficient permission ({}).",
                    document,
                    progress
                );
                return DocumentOutcome::PermissionDenied;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {} ({}): {}", document, progress, e);
                return DocumentOutcome::FetchFailed(e.to_string());
            }
        };

        let Some(attempt) = EditAttempt::prepare(document, page, self.job) else {
            tracing::debug!("No links to {} in {} ({})", self.job.old_title, document, progress);
            return DocumentOutcome::Unchanged;
        };

        let submission = attempt.into_submission(log);
        match self.service.submit_edit(document, &submission).await {
            Ok(()) => {
                tracing::info!("Updated {} ({})", document, progress);
                DocumentOutcome::Updated
            }
            Err(e) => {
                tracing::warn!("Failed to update {} ({}): {}", document, progress, e);
                DocumentOutcome::SubmitFailed(e.to_string())
            }
        }
    }
}
