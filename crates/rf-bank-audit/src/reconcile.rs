//! Reconciliation — catalog events that no bank reaches

use crate::model::{EventCatalog, ReachableEvents, ReportRow};

/// Catalog entries whose name is not reachable, in catalog order
pub fn unincluded_events(catalog: &EventCatalog, reachable: &ReachableEvents) -> Vec<ReportRow> {
    let stray = reachable.iter().filter(|name| !catalog.contains(name)).count();
    if stray > 0 {
        log::debug!("[Audit] {} reachable events are not in the catalog", stray);
    }

    catalog
        .iter()
        .filter(|(name, _)| !reachable.contains(*name))
        .map(|(name, path)| ReportRow::new(name, path))
        .collect()
}
