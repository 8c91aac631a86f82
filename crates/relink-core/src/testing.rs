//! In-memory [`DocumentService`] for unit tests.

use crate::error::ServiceError;
use crate::service::{Backlink, DiscussionThread, DocumentService, EditPage, EditSubmission};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    /// namespace -> backlinks
    backlinks: HashMap<String, Vec<Backlink>>,
    failing_namespaces: HashSet<String>,
    pages: HashMap<String, String>,
    denied: HashSet<String>,
    failing_fetch: HashSet<String>,
    failing_submit: HashSet<String>,
    /// Status reported for the watched document once `normal_after_submits`
    /// edits have landed.
    normal_after_submits: Option<usize>,
    failing_discussions: bool,
    /// Discussion responses that are not the expected JSON shape.
    malformed_discussions: bool,
    fetched: Vec<String>,
    submitted: Vec<(String, EditSubmission)>,
    discussion_polls: usize,
}

#[derive(Default)]
pub(crate) struct MockService {
    state: Mutex<State>,
}

fn status_error(endpoint: &str) -> ServiceError {
    ServiceError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "mock failure".to_string(),
    }
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backlink(self, namespace: &str, document: &str, relation_kind: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .backlinks
            .entry(namespace.to_string())
            .or_default()
            .push(Backlink {
                document: document.to_string(),
                relation_kind: relation_kind.to_string(),
            });
        self
    }

    pub fn with_failing_namespace(self, namespace: &str) -> Self {
        self.state.lock().unwrap().failing_namespaces.insert(namespace.to_string());
        self
    }

    pub fn with_page(self, document: &str, text: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(document.to_string(), text.to_string());
        self
    }

    pub fn with_denied(self, document: &str) -> Self {
        self.state.lock().unwrap().denied.insert(document.to_string());
        self
    }

    pub fn with_failing_fetch(self, document: &str) -> Self {
        self.state.lock().unwrap().failing_fetch.insert(document.to_string());
        self
    }

    pub fn with_failing_submit(self, document: &str) -> Self {
        self.state.lock().unwrap().failing_submit.insert(document.to_string());
        self
    }

    pub fn with_normal_after_submits(self, count: usize) -> Self {
        self.state.lock().unwrap().normal_after_submits = Some(count);
        self
    }

    pub fn with_failing_discussions(self) -> Self {
        self.state.lock().unwrap().failing_discussions = true;
        self
    }

    pub fn with_malformed_discussions(self) -> Self {
        self.state.lock().unwrap().malformed_discussions = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched.clone()
    }

    pub fn submitted(&self) -> Vec<(String, EditSubmission)> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn page(&self, document: &str) -> Option<String> {
        self.state.lock().unwrap().pages.get(document).cloned()
    }

    pub fn discussion_polls(&self) -> usize {
        self.state.lock().unwrap().discussion_polls
    }
}

#[async_trait]
impl DocumentService for MockService {
    async fn backlinks(&self, _title: &str, namespace: &str) -> Result<Vec<Backlink>, ServiceError> {
        let state = self.state.lock().unwrap();
        if state.failing_namespaces.contains(namespace) {
            return Err(status_error("backlink"));
        }
        Ok(state.backlinks.get(namespace).cloned().unwrap_or_default())
    }

    async fn discussions(&self, title: &str) -> Result<Vec<DiscussionThread>, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.discussion_polls += 1;
        if state.failing_discussions {
            return Err(status_error("discuss"));
        }
        if state.malformed_discussions {
            let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
            return Err(ServiceError::Decode {
                endpoint: "discuss".to_string(),
                source,
            });
        }
        let normal = state
            .normal_after_submits
            .is_some_and(|count| state.submitted.len() >= count);
        Ok(vec![DiscussionThread {
            slug: format!("{}-thread", title),
            topic: "Rename request".to_string(),
            updated_date: 0,
            status: if normal { "normal" } else { "pause" }.to_string(),
        }])
    }

    async fn fetch_edit(&self, title: &str) -> Result<EditPage, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.fetched.push(title.to_string());
        if state.denied.contains(title) {
            return Err(ServiceError::PermissionDenied {
                document: title.to_string(),
            });
        }
        if state.failing_fetch.contains(title) {
            return Err(status_error("edit"));
        }
        let text = state.pages.get(title).cloned().unwrap_or_default();
        Ok(EditPage {
            text,
            token: format!("token-{}", title),
        })
    }

    async fn submit_edit(&self, title: &str, edit: &EditSubmission) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_submit.contains(title) {
            return Err(status_error("edit"));
        }
        state.pages.insert(title.to_string(), edit.text.clone());
        state.submitted.push((title.to_string(), edit.clone()));
        Ok(())
    }
}
