//! Inclusion resolver — which events a set of bank inclusions packages
//!
//! A bank inclusion can point at an event or at any container above events
//! (work unit, folder, actor-mixer, bus). The reachable set is the union of two
//! object queries over all roots at once:
//!
//! 1. descendants of the roots that are events
//! 2. the roots themselves that are events
//!
//! `descendants` excludes the root, so the second pass is what catches events
//! listed directly in a bank.

use indexmap::IndexSet;
use rf_waapi::{object_type, ObjectQuery, WaapiCall};

use crate::error::{AuditResult, QueryCall};
use crate::model::{ObjectRef, ReachableEvents};
use crate::queries::ProjectQueries;

/// Events nested anywhere under the roots
pub fn descendant_events_query(roots: &[ObjectRef]) -> ObjectQuery {
    ObjectQuery::from_ids(roots.iter().map(ObjectRef::as_str))
        .select_descendants()
        .where_type_is_in(&[object_type::EVENT])
        .returning(&["name"])
}

/// Roots that are events themselves
pub fn self_events_query(roots: &[ObjectRef]) -> ObjectQuery {
    ObjectQuery::from_ids(roots.iter().map(ObjectRef::as_str))
        .where_type_is_in(&[object_type::EVENT])
        .returning(&["name"])
}

/// Expands bank inclusion roots into reachable event names
pub struct InclusionResolver<'a, C> {
    queries: ProjectQueries<'a, C>,
}

impl<'a, C: WaapiCall> InclusionResolver<'a, C> {
    pub fn new(queries: ProjectQueries<'a, C>) -> Self {
        Self { queries }
    }

    /// Names of every event reachable from `roots`
    pub async fn resolve(&self, roots: &[ObjectRef]) -> AuditResult<ReachableEvents> {
        let roots: Vec<ObjectRef> = roots.iter().cloned().collect::<IndexSet<_>>().into_iter().collect();
        if roots.is_empty() {
            log::debug!("[Audit] No inclusion roots, nothing reachable");
            return Ok(ReachableEvents::new());
        }

        let descendants = descendant_events_query(&roots);
        let selves = self_events_query(&roots);

        // Independent reads, pipelined on the same session
        let (mut reachable, direct) = tokio::try_join!(
            self.queries.names(QueryCall::DescendantEvents, &descendants),
            self.queries.names(QueryCall::SelfEvents, &selves),
        )?;

        log::debug!(
            "[Audit] {} roots: {} nested events, {} direct events",
            roots.len(),
            reachable.len(),
            direct.len()
        );

        reachable.extend(direct);
        Ok(reachable)
    }
}
