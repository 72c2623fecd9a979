use crate::config::{LabelsConfig, Validatable};
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to load labels: {0}")]
    Labels(#[from] io::Error),
    #[error("Labels file {0:?} contains no labels")]
    NoLabels(std::path::PathBuf),
}

pub trait State: Send + Sync + 'static {
    fn new(labels_cfg: &LabelsConfig) -> Result<Self, StateError>
    where
        Self: Sized;
    fn get_labels(&self) -> &Vec<String>;
}

#[derive(Debug)]
pub struct ServiceState {
    level_labels: Vec<String>,
}

impl State for ServiceState {
    fn new(labels_cfg: &LabelsConfig) -> Result<ServiceState, StateError> {
        let path = labels_cfg.get_path();
        let level_labels = load_level_labels(&path)?;
        if level_labels.is_empty() {
            return Err(StateError::NoLabels(path));
        }

        tracing::info!("Loaded {} focus level labels", level_labels.len());
        Ok(ServiceState { level_labels })
    }

    fn get_labels(&self) -> &Vec<String> {
        &self.level_labels
    }
}

/// Reads one label per line, in class-index order. Blank lines are skipped.
pub fn load_level_labels(filepath: &Path) -> io::Result<Vec<String>> {
    let file = File::open(filepath)?;
    let reader = io::BufReader::new(file);
    let mut labels = Vec::new();

    for line_result in reader.lines() {
        let line = line_result?;
        let label = line.trim();
        if !label.is_empty() {
            labels.push(label.to_string());
        }
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_labels(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("focus_labels_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_level_labels() {
        let path = write_labels("labels.txt", "Very Low\n  Low \n\nHigh\nVery High\n");
        let labels = load_level_labels(&path).unwrap();

        assert_eq!(labels, vec!["Very Low", "Low", "High", "Very High"]);
    }

    #[test]
    fn test_service_state_rejects_empty_labels() {
        let path = write_labels("empty.txt", "\n\n");
        let labels_cfg = LabelsConfig {
            labels_file: "empty.txt".to_string(),
            labels_dir: path.parent().unwrap().to_path_buf(),
        };

        assert!(matches!(
            ServiceState::new(&labels_cfg),
            Err(StateError::NoLabels(_))
        ));
    }

    #[test]
    fn test_service_state_missing_file() {
        let labels_cfg = LabelsConfig {
            labels_file: "missing.txt".to_string(),
            labels_dir: PathBuf::from("./does_not_exist"),
        };

        assert!(matches!(
            ServiceState::new(&labels_cfg),
            Err(StateError::Labels(_))
        ));
    }
}
