//! Resolution of contract names to compiled artifacts.
//!
//! Artifacts are read from a hardhat artifacts directory, in which each contract
//! `Name` declared in `path/To.sol` is written to `path/To.sol/Name.json`.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;

use crate::{
    constants::{
        ARTIFACT_EXTENSION, BUILD_INFO_DIR, DEBUG_FILE_SUFFIX, LIBRARY_PLACEHOLDER_MARKER,
    },
    errors::ScriptError,
};

/// A compiled contract: its creation bytecode and ABI
#[derive(Clone, Debug)]
pub struct Artifact {
    /// The name of the contract
    pub contract_name: String,
    /// The source file the contract was declared in
    pub source_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The contract creation bytecode
    pub bytecode: Bytes,
}

impl Artifact {
    /// The fully qualified name of the contract, i.e. `path/To.sol:Name`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Whether the ABI declares a function with the given name
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.function(name).is_some_and(|overloads| !overloads.is_empty())
    }
}

/// A source of compiled artifacts
pub trait ArtifactRegistry {
    /// Resolve a contract name, or fully qualified name, to its artifact
    fn resolve(&self, name: &str) -> Result<Artifact, ScriptError>;
}

/// The on-disk layout of a hardhat artifact
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: JsonAbi,
    bytecode: String,
}

impl TryFrom<HardhatArtifact> for Artifact {
    type Error = ScriptError;

    fn try_from(artifact: HardhatArtifact) -> Result<Self, Self::Error> {
        if artifact.bytecode.contains(LIBRARY_PLACEHOLDER_MARKER) {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} references unlinked libraries",
                artifact.contract_name
            )));
        }

        let bytecode = Bytes::from_str(&artifact.bytecode)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no bytecode, is it abstract or an interface?",
                artifact.contract_name
            )));
        }

        Ok(Artifact {
            contract_name: artifact.contract_name,
            source_name: artifact.source_name,
            abi: artifact.abi,
            bytecode,
        })
    }
}

/// An [`ArtifactRegistry`] backed by a hardhat artifacts directory
#[derive(Clone, Debug)]
pub struct HardhatArtifacts {
    /// The root of the artifacts directory
    root: PathBuf,
}

impl HardhatArtifacts {
    /// Create a registry reading from the given artifacts directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find all artifact files for the given contract name beneath `dir`
    fn find(
        &self,
        dir: &Path,
        file_name: &str,
        found: &mut Vec<PathBuf>,
    ) -> Result<(), ScriptError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            ScriptError::ArtifactNotFound(format!("cannot read {}: {}", dir.display(), e))
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?
                .path();

            if path.is_dir() {
                if path.file_name().is_some_and(|name| name == BUILD_INFO_DIR) {
                    continue;
                }
                self.find(&path, file_name, found)?;
            } else if path.file_name().is_some_and(|name| name == file_name) {
                found.push(path);
            }
        }

        Ok(())
    }

    /// Read and parse the artifact at the given path
    fn load(path: &Path) -> Result<Artifact, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        let artifact: HardhatArtifact = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        artifact.try_into()
    }
}

impl ArtifactRegistry for HardhatArtifacts {
    fn resolve(&self, name: &str) -> Result<Artifact, ScriptError> {
        // A fully qualified name maps directly onto a path
        if let Some((source_name, contract_name)) = name.rsplit_once(':') {
            let path = self
                .root
                .join(source_name)
                .join(format!("{contract_name}.{ARTIFACT_EXTENSION}"));
            if !path.is_file() {
                return Err(ScriptError::ArtifactNotFound(name.to_string()));
            }
            return Self::load(&path);
        }

        let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
        if name.is_empty() || file_name.ends_with(DEBUG_FILE_SUFFIX) {
            return Err(ScriptError::ArtifactNotFound(name.to_string()));
        }

        let mut found = Vec::new();
        self.find(&self.root, &file_name, &mut found)?;

        match found.as_slice() {
            [] => Err(ScriptError::ArtifactNotFound(name.to_string())),
            [path] => Self::load(path),
            _ => {
                let candidates = found
                    .iter()
                    .filter_map(|path| path.strip_prefix(&self.root).ok())
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ScriptError::ArtifactNotFound(format!(
                    "{name} is ambiguous, use a fully qualified name ({candidates})"
                )))
            }
        }
    }
}
