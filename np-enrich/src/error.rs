//! Erreurs fatales du run

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs qui arrêtent le run avant toute écriture
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Dataset not found: {0}")]
    DatasetMissing(PathBuf),

    #[error("Boundary layers missing: {}. Place them next to the dataset or run `np-enrich fetch`", join_paths(.0))]
    LayersMissing(Vec<PathBuf>),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PipelineError {
    /// Code de sortie du processus
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DatasetMissing(_) => 1,
            Self::LayersMissing(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_missing_message() {
        let err = PipelineError::LayersMissing(vec![
            PathBuf::from("fylker2018.geojson"),
            PathBuf::from("kommuner2018.geojson"),
        ]);
        assert!(err
            .to_string()
            .starts_with("Boundary layers missing: fylker2018.geojson, kommuner2018.geojson."));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(PipelineError::DatasetMissing(PathBuf::new()).exit_code(), 1);
    }
}
