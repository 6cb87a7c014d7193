// Configuration Storage Service
// Handles config file read/write and version backup

use crate::services::detection::{ConfidenceGate, DetectionSensitivity, GateThresholds, PipelineOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    /// Only the settings the user chose; everything else falls through.
    #[serde(default)]
    pub detection: DetectionOverrides,
}

/// One layer of gate and guard settings: CLI flags, the user config, or a
/// model directory's `config.json` (whose snake_case keys are accepted as
/// aliases). Unset fields defer to the next layer down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<DetectionSensitivity>,
    #[serde(default, alias = "min_words", skip_serializing_if = "Option::is_none")]
    pub min_words: Option<usize>,
    #[serde(
        default,
        alias = "human_confidence_threshold",
        alias = "binary_confidence_floor",
        skip_serializing_if = "Option::is_none"
    )]
    pub binary_confidence_floor: Option<f64>,
    #[serde(
        default,
        alias = "attrib_confidence_gap",
        alias = "gap_threshold",
        skip_serializing_if = "Option::is_none"
    )]
    pub gap_threshold: Option<f64>,
    #[serde(default, alias = "min_score_threshold", skip_serializing_if = "Option::is_none")]
    pub min_score_threshold: Option<f64>,
    #[serde(default, alias = "top_k", skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, alias = "human_class_is_human", skip_serializing_if = "Option::is_none")]
    pub human_class_is_human: Option<bool>,
}

impl DetectionOverrides {
    /// Fields set on `self` win; the rest are taken from `lower`.
    pub fn or(self, lower: &DetectionOverrides) -> DetectionOverrides {
        DetectionOverrides {
            sensitivity: self.sensitivity.or(lower.sensitivity),
            min_words: self.min_words.or(lower.min_words),
            binary_confidence_floor: self.binary_confidence_floor.or(lower.binary_confidence_floor),
            gap_threshold: self.gap_threshold.or(lower.gap_threshold),
            min_score_threshold: self.min_score_threshold.or(lower.min_score_threshold),
            top_k: self.top_k.or(lower.top_k),
            human_class_is_human: self.human_class_is_human.or(lower.human_class_is_human),
        }
    }

    /// Fill whatever is still unset with built-in defaults.
    pub fn resolve(&self) -> DetectionConfig {
        DetectionConfig {
            sensitivity: self.sensitivity.unwrap_or_default(),
            min_words: self.min_words.unwrap_or(DEFAULT_MIN_WORDS),
            binary_confidence_floor: self.binary_confidence_floor,
            gap_threshold: self.gap_threshold,
            min_score_threshold: self.min_score_threshold,
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
            human_class_is_human: self.human_class_is_human.unwrap_or(false),
        }
    }
}

const DEFAULT_MIN_WORDS: usize = 30;
const DEFAULT_TOP_K: usize = 3;

/// Effective gate and guard settings after layering.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    pub sensitivity: DetectionSensitivity,
    pub min_words: usize,
    pub binary_confidence_floor: Option<f64>,
    pub gap_threshold: Option<f64>,
    pub min_score_threshold: Option<f64>,
    pub top_k: usize,
    pub human_class_is_human: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionOverrides::default().resolve()
    }
}

impl DetectionConfig {
    /// Sensitivity preset with any explicit threshold layered on top.
    pub fn gate_thresholds(&self) -> GateThresholds {
        let preset = GateThresholds::for_sensitivity(self.sensitivity);
        GateThresholds {
            binary_confidence_floor: self.binary_confidence_floor.unwrap_or(preset.binary_confidence_floor),
            gap_threshold: self.gap_threshold.unwrap_or(preset.gap_threshold),
            min_score_threshold: self.min_score_threshold.unwrap_or(preset.min_score_threshold),
        }
    }

    pub fn gate(&self) -> ConfidenceGate {
        ConfidenceGate::new(self.gate_thresholds()).with_human_class_override(self.human_class_is_human)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            min_words: self.min_words,
            top_k: self.top_k.max(1),
        }
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stylotrace"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn exists(&self) -> bool {
        self.config_file.exists()
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        // Create backup if file exists
        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Create a backup of current config
    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)?;

        Ok(())
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first; names embed the timestamp so they break mtime ties.
        entries.sort_by_key(|e| {
            (
                e.metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH),
                e.file_name(),
            )
        });

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Update detection settings in place
    pub fn update_detection<F>(&self, apply: F) -> Result<AppConfig, String>
    where
        F: FnOnce(&mut DetectionOverrides),
    {
        let mut config = self.load()?;
        apply(&mut config.detection);
        if config.version.is_empty() {
            config.version = env!("CARGO_PKG_VERSION").to_string();
        }
        self.save(&config)?;
        Ok(config)
    }

    pub fn set_model_dir(&self, dir: &Path) -> Result<(), String> {
        let mut config = self.load()?;
        config.model_dir = Some(dir.to_path_buf());
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection, DetectionOverrides::default());
        let resolved = config.detection.resolve();
        assert_eq!(resolved.sensitivity, DetectionSensitivity::Medium);
        assert_eq!(resolved.min_words, 30);
        assert_eq!(resolved.gate_thresholds(), GateThresholds::default());
    }

    #[test]
    fn test_model_dir_config_aliases() {
        let json = r#"{"min_words": 12, "human_confidence_threshold": 0.7, "attrib_confidence_gap": 0.2}"#;
        let layer: DetectionOverrides = serde_json::from_str(json).unwrap();
        let config = layer.resolve();
        assert_eq!(config.min_words, 12);
        let thresholds = config.gate_thresholds();
        assert_eq!(thresholds.binary_confidence_floor, 0.7);
        assert_eq!(thresholds.gap_threshold, 0.2);
        assert_eq!(thresholds.min_score_threshold, 0.0);
    }

    #[test]
    fn test_unknown_sensitivity_is_rejected() {
        let err = serde_json::from_str::<DetectionOverrides>(r#"{"sensitivity": "extreme"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_overrides_layer_on_preset() {
        let config = DetectionOverrides {
            sensitivity: Some(DetectionSensitivity::Low),
            gap_threshold: Some(0.05),
            ..DetectionOverrides::default()
        }
        .resolve();
        let preset = GateThresholds::for_sensitivity(DetectionSensitivity::Low);
        let thresholds = config.gate_thresholds();
        assert_eq!(thresholds.gap_threshold, 0.05);
        assert_eq!(thresholds.binary_confidence_floor, preset.binary_confidence_floor);
    }

    #[test]
    fn test_unset_fields_fall_through_layers() {
        let model = DetectionOverrides {
            min_words: Some(5),
            gap_threshold: Some(0.15),
            binary_confidence_floor: Some(0.5),
            ..DetectionOverrides::default()
        };
        let user = DetectionOverrides { gap_threshold: Some(0.3), ..DetectionOverrides::default() };
        let flags = DetectionOverrides { top_k: Some(1), ..DetectionOverrides::default() };

        let config = flags.or(&user).or(&model).resolve();
        assert_eq!(config.min_words, 5);
        assert_eq!(config.gap_threshold, Some(0.3));
        assert_eq!(config.binary_confidence_floor, Some(0.5));
        assert_eq!(config.top_k, 1);
        assert_eq!(config.sensitivity, DetectionSensitivity::Medium);

        // An empty user layer changes nothing.
        let config = DetectionOverrides::default().or(&model).resolve();
        assert_eq!(config, model.resolve());
    }

    #[test]
    fn test_config_serialization_omits_unset_fields() {
        let config = AppConfig {
            version: "1.0.0".to_string(),
            model_dir: Some(PathBuf::from("saved_models")),
            detection: DetectionOverrides { min_words: Some(8), ..DetectionOverrides::default() },
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["detection"], serde_json::json!({"minWords": 8}));
        let parsed: AppConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.version, "1.0.0");
        assert_eq!(parsed.detection, config.detection);
    }

    #[test]
    fn test_save_load_and_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path().join("cfg"));
        assert!(!store.exists());
        assert_eq!(store.load().unwrap().detection.min_words, None);

        store.update_detection(|d| d.min_words = Some(5)).unwrap();
        let updated = store.update_detection(|d| d.gap_threshold = Some(0.4)).unwrap();
        assert_eq!(updated.detection.min_words, Some(5));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.detection.gap_threshold, Some(0.4));
        assert_eq!(loaded.version, env!("CARGO_PKG_VERSION"));

        let backups = fs::read_dir(tmp.path().join("cfg").join("backups")).unwrap().count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_setting_model_dir_leaves_detection_unset() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path().to_path_buf());
        store.set_model_dir(Path::new("models/v2")).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.model_dir, Some(PathBuf::from("models/v2")));
        assert_eq!(loaded.detection, DetectionOverrides::default());
    }

    #[test]
    fn test_backups_are_capped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path().to_path_buf());
        for i in 0..14 {
            store.update_detection(|d| d.min_words = Some(i)).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let backups = fs::read_dir(tmp.path().join("backups")).unwrap().count();
        assert_eq!(backups, 10);
    }
}
