use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{FlowError, Result};

const BUILTIN_CATALOG: &str = include_str!("catalog.json");

/// Static genre list and genre → mood mapping, loaded once and never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    genres: Vec<String>,
    #[serde(default)]
    moods: HashMap<String, Vec<String>>,
}

impl Catalog {
    /// Build a catalog, rejecting mood entries for genres that are not listed.
    pub fn new(genres: Vec<String>, moods: HashMap<String, Vec<String>>) -> Result<Self> {
        let catalog = Self { genres, moods };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_CATALOG).expect("builtin catalog is valid JSON")
    }

    /// Load a catalog from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Catalog(format!("cannot read {}: {}", path.display(), e)))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let catalog: Catalog = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
                .map_err(|e| FlowError::Catalog(format!("invalid YAML catalog: {}", e)))?,
            Some("json") => serde_json::from_str(&raw)
                .map_err(|e| FlowError::Catalog(format!("invalid JSON catalog: {}", e)))?,
            _ => {
                return Err(FlowError::Catalog(format!(
                    "unsupported catalog format: {}",
                    path.display()
                )));
            }
        };

        catalog.validate()?;
        info!(
            path = %path.display(),
            genres = catalog.genres.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.genres.is_empty() {
            return Err(FlowError::Catalog("catalog lists no genres".into()));
        }
        if let Some(orphan) = self.moods.keys().find(|g| !self.contains_genre(g)) {
            return Err(FlowError::Catalog(format!(
                "moods mapped for unlisted genre: {}",
                orphan
            )));
        }
        Ok(())
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Moods offered for `genre`, in catalog order. Empty when the genre has no mapping.
    pub fn moods_for(&self, genre: &str) -> &[String] {
        self.moods.get(genre).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn offers_mood(&self, genre: &str, mood: &str) -> bool {
        self.moods_for(genre).iter().any(|m| m == mood)
    }

    pub fn moods(&self) -> &HashMap<String, Vec<String>> {
        &self.moods
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn builtin_catalog_is_consistent() {
        let catalog = Catalog::builtin();
        assert!(catalog.contains_genre("Fiction"));
        assert_eq!(
            catalog.moods_for("Fiction"),
            ["Happy", "Sad", "Reflective", "Adventurous"]
        );
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn unmapped_genre_has_no_moods() {
        let catalog = Catalog::new(
            vec!["Poetry".into(), "Fiction".into()],
            HashMap::from([("Fiction".to_string(), vec!["Happy".to_string()])]),
        )
        .unwrap();

        assert!(catalog.moods_for("Poetry").is_empty());
        assert!(catalog.moods_for("").is_empty());
        assert!(catalog.moods_for("Unknown").is_empty());
    }

    #[test]
    fn rejects_moods_for_unlisted_genre() {
        let err = Catalog::new(
            vec!["Fiction".into()],
            HashMap::from([("Horror".to_string(), vec!["Scared".to_string()])]),
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::Catalog(_)));
    }

    #[test]
    fn loads_yaml_catalog() {
        let path = write_temp(
            "catalog.yaml",
            "genres:\n  - Poetry\n  - Drama\nmoods:\n  Drama:\n    - Tense\n    - Tragic\n",
        );
        let catalog = Catalog::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.genres(), ["Poetry", "Drama"]);
        assert_eq!(catalog.moods_for("Drama"), ["Tense", "Tragic"]);
        assert!(catalog.offers_mood("Drama", "Tragic"));
        assert!(!catalog.offers_mood("Poetry", "Tragic"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let path = write_temp("catalog.txt", "genres: []");
        let err = Catalog::from_path(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, FlowError::Catalog(_)));
    }
}
