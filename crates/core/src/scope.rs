//! Tenant scoping filter.
//!
//! Records describe distinct customer security postures; cross-tenant
//! leakage is a correctness violation, not a UX nuisance. Matching is an
//! exact, case-sensitive string comparison -- no normalization of hyphens
//! or case.

/// Scope values that disable tenant filtering.
pub fn is_wildcard(tenant_id: &str) -> bool {
    tenant_id.is_empty() || tenant_id == "all"
}

/// Restrict a raw record set to one tenant.
///
/// A wildcard scope returns the input unchanged. Otherwise only records
/// whose `tenant_id` exactly equals the requested tenant are kept;
/// records without a `tenant_id` are excluded since their tenancy cannot
/// be proven.
pub fn scope(records: &[serde_json::Value], tenant_id: &str) -> Vec<serde_json::Value> {
    if is_wildcard(tenant_id) {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| crate::record::tenant_id(record) == Some(tenant_id))
        .cloned()
        .collect()
}
