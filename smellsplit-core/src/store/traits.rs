use crate::config::SelectionSection;
use crate::labels::LabelHierarchy;
use crate::repository::Repository;

/// Read-only access to the label store. The batch driver fetches candidates
/// and labels exclusively through this trait.
#[async_trait::async_trait]
pub trait LabelStore: Send + Sync {
    /// All positive labels for a (repository, smell) pair, folded into a hierarchy.
    ///
    /// No rows yields [`LabelHierarchy::Empty`]; rows mixing design and
    /// implementation types are an error.
    async fn fetch_labels(
        &self,
        solution_id: &str,
        smell_name: &str,
    ) -> crate::error::Result<LabelHierarchy>;

    /// One page of repositories matching `selection`, ordered by name descending.
    async fn fetch_candidates(
        &self,
        selection: &SelectionSection,
        offset: u64,
        limit: u64,
    ) -> crate::error::Result<Vec<Repository>>;
}
