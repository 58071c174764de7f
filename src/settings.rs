//! Crop settings files: the selection, per-page view state and applied crop
//! boxes of a document, saved as pretty JSON so a crop can be reused on
//! another run or another document.

use crate::error::Result;
use crate::geometry::Rect;
use crate::models::{PageSize, PageState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CropSettings {
    pub crop_rect: Option<Rect>,
    #[serde(default)]
    pub page_states: BTreeMap<usize, PageState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cropboxes: BTreeMap<usize, Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
}

impl CropSettings {
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = Self::from_json(&data)?;
        info!(path = %path.display(), pages = settings.page_states.len(), "crop settings loaded");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "crop settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CropError;
    use crate::geometry::Rotation;

    #[test]
    fn test_json_layout() {
        let mut page_states = BTreeMap::new();
        page_states.insert(0, PageState::default());
        page_states.insert(
            1,
            PageState {
                scale_factor: 2.0,
                x_offset: 15.0,
                y_offset: -4.0,
                rotation: Rotation::Cw90,
            },
        );
        let settings = CropSettings {
            crop_rect: Some(Rect::new(10.0, 20.0, 300.0, 400.0)),
            page_states,
            cropboxes: BTreeMap::new(),
            page_size: None,
        };

        insta::assert_snapshot!(settings.to_json().unwrap(), @r#"
        {
          "crop_rect": [
            10.0,
            20.0,
            300.0,
            400.0
          ],
          "page_states": {
            "0": {
              "scale_factor": 1.0,
              "x_offset": 0.0,
              "y_offset": 0.0,
              "rotation": 0
            },
            "1": {
              "scale_factor": 2.0,
              "x_offset": 15.0,
              "y_offset": -4.0,
              "rotation": 90
            }
          }
        }
        "#);
    }

    #[test]
    fn test_reads_files_without_cropboxes() {
        let data = r#"{
            "crop_rect": [12.5, 30, 200, 410.75],
            "page_states": {
                "0": {"scale_factor": 1.0, "x_offset": 0, "y_offset": 0, "rotation": 0},
                "3": {"scale_factor": 1.21, "x_offset": -20, "y_offset": 5, "rotation": 180}
            }
        }"#;
        let settings = CropSettings::from_json(data).unwrap();
        assert_eq!(settings.crop_rect, Some(Rect::new(12.5, 30.0, 200.0, 410.75)));
        assert_eq!(settings.page_states[&3].rotation, Rotation::Cw180);
        assert!(settings.cropboxes.is_empty());
        assert!(settings.page_size.is_none());
    }

    #[test]
    fn test_null_crop_rect() {
        let settings = CropSettings::from_json(r#"{"crop_rect": null, "page_states": {}}"#).unwrap();
        assert!(settings.crop_rect.is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            CropSettings::from_json("{\"crop_rect\": [1, 2"),
            Err(CropError::Json(_))
        ));
        assert!(matches!(
            CropSettings::from_json(r#"{"crop_rect": [1, 2, 3]}"#),
            Err(CropError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crop.json");
        let mut settings = CropSettings {
            crop_rect: Some(Rect::new(1.0, 2.0, 3.0, 4.0)),
            page_size: Some(PageSize::Letter),
            ..CropSettings::default()
        };
        settings.cropboxes.insert(2, Rect::new(0.0, 0.0, 100.0, 50.0));
        settings.save(&path).unwrap();

        let loaded = CropSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CropSettings::load(&dir.path().join("nope.json")),
            Err(CropError::Io(_))
        ));
    }
}
