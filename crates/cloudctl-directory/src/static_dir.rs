use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::DirectoryError;
use crate::principal::Principal;
use crate::resolver::PrincipalResolver;

/// Directory backed by an in-process group table.
///
/// Groups can be replaced at runtime, which makes it the resolver of choice
/// for exercising membership changes.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    groups: DashMap<String, BTreeSet<Principal>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups<G, M>(groups: HashMap<G, Vec<M>>) -> Self
    where
        G: Into<String>,
        M: AsRef<str>,
    {
        let directory = Self::new();
        for (group, members) in groups {
            directory.set_group(group, members);
        }
        directory
    }

    pub fn with_group<M: AsRef<str>>(
        self,
        group: impl Into<String>,
        members: impl IntoIterator<Item = M>,
    ) -> Self {
        self.set_group(group, members);
        self
    }

    /// Replaces the membership of `group`.
    pub fn set_group<M: AsRef<str>>(
        &self,
        group: impl Into<String>,
        members: impl IntoIterator<Item = M>,
    ) {
        let members = members.into_iter().map(Principal::new).collect();
        self.groups.insert(group.into(), members);
    }

    pub fn remove_group(&self, group: &str) {
        self.groups.remove(group);
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[async_trait]
impl PrincipalResolver for StaticDirectory {
    async fn resolve(&self, group: &str) -> Result<BTreeSet<Principal>, DirectoryError> {
        if group.is_empty() {
            return Ok(BTreeSet::new());
        }
        self.groups
            .get(group)
            .map(|members| members.clone())
            .ok_or_else(|| DirectoryError::UnknownGroup(group.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "static"
    }
}
