use crate::error::SwitchError;
use serde::Deserialize;
use std::path::PathBuf;

/// A resource as written in configuration: a bare URL or an explicit descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResourceEntry {
    Url(String),
    Descriptor(ResourceDescriptor),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDescriptor {
    pub url: String,
    pub filename: String,
}

impl From<ResourceDescriptor> for ResourceEntry {
    fn from(descriptor: ResourceDescriptor) -> Self {
        ResourceEntry::Descriptor(descriptor)
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    AlreadyPresent { path: PathBuf },
    Fetched { path: PathBuf },
    Failed { error: SwitchError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource {
    pub descriptor: ResourceDescriptor,
    pub path: PathBuf,
    pub fetched: bool,
}

#[derive(Debug)]
pub struct ResourceFailure {
    pub descriptor: ResourceDescriptor,
    pub error: SwitchError,
}

#[derive(Debug)]
pub enum GroupStatus {
    Ok {
        message: String,
        resolved: Vec<ResolvedResource>,
    },
    Failed {
        resolved: Vec<ResolvedResource>,
        failures: Vec<ResourceFailure>,
    },
    /// Stopped before any resource was fetched.
    Rejected { error: SwitchError },
}

#[derive(Debug)]
pub struct GroupResult {
    pub name: String,
    pub download_path: PathBuf,
    pub status: GroupStatus,
}

impl GroupResult {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, GroupStatus::Ok { .. })
    }

    pub fn resolved(&self) -> &[ResolvedResource] {
        match &self.status {
            GroupStatus::Ok { resolved, .. } | GroupStatus::Failed { resolved, .. } => {
                resolved.as_slice()
            }
            GroupStatus::Rejected { .. } => &[],
        }
    }

    pub fn failures(&self) -> &[ResourceFailure] {
        match &self.status {
            GroupStatus::Failed { failures, .. } => failures.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct RunResult {
    pub groups: Vec<GroupResult>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.groups.iter().all(GroupResult::is_ok)
    }

    pub fn failed_groups(&self) -> impl Iterator<Item = &GroupResult> {
        self.groups.iter().filter(|g| !g.is_ok())
    }
}
