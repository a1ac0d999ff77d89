//! Artifact and code list loading from disk.

use std::fs;
use std::path::Path;

use crate::artifacts::{ArtifactError, ArtifactSet, ContractArtifact};
use crate::contracts::ContractKind;

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one contract from `<dir>/<stem>/`.
pub fn load_artifact(dir: &Path, kind: ContractKind) -> Result<ContractArtifact, ArtifactError> {
    let base = dir.join(kind.file_stem());
    let wasm = read(&base.join(format!("{}.wasm", kind.file_stem())))?;

    let metadata_path = base.join("metadata.json");
    let metadata = serde_json::from_slice(&read(&metadata_path)?).map_err(|source| {
        ArtifactError::Json {
            path: metadata_path.clone(),
            source,
        }
    })?;

    let artifact = ContractArtifact::from_parts(kind, wasm, metadata)?;
    tracing::debug!(
        contract = kind.name(),
        code_hash = %artifact.code_hash,
        constructor = %artifact.constructor,
        size = artifact.wasm.len(),
        "Artifact loaded"
    );
    Ok(artifact)
}

/// Load every contract this tool deploys, in deployment order.
pub fn load_artifacts(dir: &Path) -> Result<ArtifactSet, ArtifactError> {
    let artifacts = ContractKind::ALL
        .into_iter()
        .map(|kind| load_artifact(dir, kind))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(dir = %dir.display(), count = artifacts.len(), "Artifacts loaded");
    Ok(ArtifactSet::new(artifacts))
}

/// Read a newline-separated code list. Lines are trimmed; blank lines dropped.
pub fn load_code_list(path: &Path) -> Result<Vec<String>, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::CodeHash;
    use serde_json::json;

    fn write_artifact(dir: &Path, kind: ContractKind, wasm: &[u8]) {
        let base = dir.join(kind.file_stem());
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join(format!("{}.wasm", kind.file_stem())), wasm).unwrap();
        let metadata = json!({
            "source": { "hash": CodeHash::of(wasm).to_string() },
            "V3": { "spec": { "constructors": [{ "label": "new", "selector": "0x9bae9d5e" }] } }
        });
        fs::write(base.join("metadata.json"), metadata.to_string()).unwrap();
    }

    #[test]
    fn test_load_all_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for kind in ContractKind::ALL {
            write_artifact(dir.path(), kind, kind.file_stem().as_bytes());
        }

        let set = load_artifacts(dir.path()).unwrap();
        let names: Vec<_> = set.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["FatBadges", "EasyOracle", "AdvancedJudger"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), ContractKind::FatBadges, b"fat");

        let err = load_artifacts(dir.path()).unwrap_err();
        match err {
            ArtifactError::Io { path, .. } => assert!(path.ends_with("easy_oracle/easy_oracle.wasm")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), ContractKind::FatBadges, b"fat");
        fs::write(dir.path().join("fat_badges/metadata.json"), "{ not json").unwrap();

        let err = load_artifact(dir.path(), ContractKind::FatBadges).unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }

    #[test]
    fn test_code_list_trims_and_drops_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.csv");
        fs::write(&path, "easy1\n  easy2  \n\n\r\neasy3\r\n").unwrap();
        assert_eq!(load_code_list(&path).unwrap(), vec!["easy1", "easy2", "easy3"]);
    }
}
