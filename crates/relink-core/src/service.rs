use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Relation kind of a plain `[[...]]` link, as opposed to e.g. a transclusion.
pub const LINK_RELATION: &str = "link";

/// Discussion status that ends a run.
pub const NORMAL_STATUS: &str = "normal";

/// A recorded reference from `document` to the queried title.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Backlink {
    pub document: String,
    #[serde(rename = "flags")]
    pub relation_kind: String,
}

impl Backlink {
    pub fn is_direct_link(&self) -> bool {
        self.relation_kind == LINK_RELATION
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DiscussionThread {
    pub slug: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub updated_date: i64,
    pub status: String,
}

/// Document text plus the token that authorizes submitting it back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditPage {
    pub text: String,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditSubmission {
    pub text: String,
    pub log: String,
    pub token: String,
}

/// The document repository the bot works against.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Documents referencing `title` from within `namespace`.
    async fn backlinks(&self, title: &str, namespace: &str) -> Result<Vec<Backlink>, ServiceError>;

    /// Discussion threads attached to `title`.
    async fn discussions(&self, title: &str) -> Result<Vec<DiscussionThread>, ServiceError>;

    /// Current text of `title` with a fresh edit token. Fails with
    /// [`ServiceError::PermissionDenied`] when the account cannot edit it.
    async fn fetch_edit(&self, title: &str) -> Result<EditPage, ServiceError>;

    async fn submit_edit(&self, title: &str, edit: &EditSubmission) -> Result<(), ServiceError>;
}
