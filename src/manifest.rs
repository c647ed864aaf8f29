//! Render Manifest - SHA-256 Record of a Run
//!
//! Written next to the generated sources so a poster can be traced back to
//! the configuration and grid that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PosterConfig;
use crate::error::{PosterError, Result};
use crate::layout::GridPlan;
use crate::ENGINE_VERSION;

pub const MANIFEST_FILE: &str = "poster-manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderManifest {
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub job_hash: String,
    pub config: PosterConfig,
    pub grid: Vec<Vec<String>>,
    pub artifacts: Vec<ArtifactRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Relative to the output directory.
    pub path: PathBuf,
    pub sha256: String,
}

impl RenderManifest {
    pub fn new(config: &PosterConfig, grid: &GridPlan) -> Result<Self> {
        Ok(Self {
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            job_hash: compute_job_hash(config, ENGINE_VERSION)?,
            config: config.clone(),
            grid: grid.to_paths(),
            artifacts: vec![],
        })
    }

    /// Hash `output_dir/relative` and record it.
    pub fn record_artifact(&mut self, output_dir: &Path, relative: impl Into<PathBuf>) -> Result<()> {
        let relative = relative.into();
        let full = output_dir.join(&relative);
        let data = fs::read(&full).map_err(|e| PosterError::io(&full, e))?;
        self.artifacts.push(ArtifactRecord {
            path: relative,
            sha256: sha256_hex(&data),
        });
        Ok(())
    }

    pub fn write(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| PosterError::io(&path, e))?;
        Ok(path)
    }
}

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// job_hash = sha256(canonical_config + ":" + engine_version)
///
/// Identical configurations rendered by the same engine share a job hash.
pub fn compute_job_hash(config: &PosterConfig, engine_version: &str) -> Result<String> {
    let canonical = canonical_json(config)?;
    Ok(sha256_hex(format!("{canonical}:{engine_version}").as_bytes()))
}
