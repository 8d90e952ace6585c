use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::principal::Principal;

/// Resolves logical group names to principals.
///
/// Implementations must be idempotent for a fixed directory state. An empty
/// group name resolves to the empty set.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, group: &str) -> Result<BTreeSet<Principal>, DirectoryError>;

    fn backend_name(&self) -> &'static str;
}

pub type DynResolver = Arc<dyn PrincipalResolver>;

/// Union of every group, failing on the first group that cannot be resolved.
pub async fn resolve_all<'a, I>(
    resolver: &dyn PrincipalResolver,
    groups: I,
) -> Result<BTreeSet<Principal>, DirectoryError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut principals = BTreeSet::new();
    for group in groups {
        principals.extend(resolver.resolve(group).await?);
    }
    Ok(principals)
}
