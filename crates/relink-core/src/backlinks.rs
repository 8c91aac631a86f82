use crate::service::DocumentService;
use std::collections::BTreeSet;

/// Documents that link to the renamed title, deduplicated across namespaces.
///
/// Ordered lexicographically so every run processes documents in the same
/// order.
pub type DocumentSet = BTreeSet<String>;

/// Query backlinks to `title` in each namespace and merge the direct links.
///
/// A namespace whose query fails is logged and skipped; whatever the other
/// namespaces returned is still collected.
pub async fn collect_backlinks<S>(service: &S, title: &str, namespaces: &[String]) -> DocumentSet
where
    S: DocumentService + ?Sized,
{
    let mut documents = DocumentSet::new();

    for namespace in namespaces {
        match service.backlinks(title, namespace).await {
            Ok(backlinks) => {
                let before = documents.len();
                documents.extend(
                    backlinks
                        .into_iter()
                        .filter(|b| b.is_direct_link())
                        .map(|b| b.document),
                );
                tracing::debug!(
                    "Namespace '{}': {} new backlinker(s) for {}",
                    namespace,
                    documents.len() - before,
                    title
                );
            }
            Err(e) => {
                tracing::warn!("Error fetching backlinks in namespace '{}': {}", namespace, e);
            }
        }
    }

    tracing::info!("Found {} backlinks to process.", documents.len());
    documents
}
