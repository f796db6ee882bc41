//! Reading and writing the deployments file, which maps deployment names to
//! the proxies deployed under them

use std::{collections::BTreeMap, fs, io::Write, path::Path};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{errors::ScriptError, types::DeploymentRecord};

/// The contents of the deployments file
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq)]
pub struct Deployments {
    /// The deployment records, keyed by deployment name
    #[serde(default)]
    pub deployments: BTreeMap<String, DeploymentRecord>,
}

impl Deployments {
    /// Read the deployments file, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
    }

    /// Look up the record of a deployment
    pub fn get(&self, name: &str) -> Result<&DeploymentRecord, ScriptError> {
        self.deployments.get(name).ok_or_else(|| {
            ScriptError::ReadDeployments(format!("no deployment named {name}"))
        })
    }

    /// Insert or replace the record of a deployment
    pub fn insert(&mut self, name: &str, record: DeploymentRecord) {
        self.deployments.insert(name.to_string(), record);
    }

    /// Write the deployments file.
    ///
    /// The contents go to a temporary file in the same directory which then replaces
    /// `path`, so an interrupted write never truncates existing records.
    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", dir.display(), e)))?;
        serde_json::to_writer_pretty(&mut file, self)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        file.flush().map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        file.persist(path)
            .map(drop)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))
    }
}
