use std::collections::HashSet;
use std::io;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("Failed to read gazetteer {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("Failed to create gazetteer {path}: {source}")]
    Create { path: String, source: io::Error },
}

/// Known place-name tokens, stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    words: HashSet<String>,
}

impl Gazetteer {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// One token per line; blank lines are ignored.
    pub fn parse(content: &str) -> Self {
        Self::new(content.lines())
    }

    pub fn load(path: &Path) -> Result<Self, GazetteerError> {
        let content = std::fs::read_to_string(path).map_err(|source| GazetteerError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Load `path`, creating an empty file (and its directory) when missing.
    pub fn load_or_create(path: &Path) -> Result<Self, GazetteerError> {
        if !path.exists() {
            let create_err = |source| GazetteerError::Create { path: path.display().to_string(), source };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(create_err)?;
            }
            std::fs::write(path, "").map_err(create_err)?;
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Every whitespace-separated word of `place` is a known token.
    ///
    /// Vacuously true for a place with no words.
    pub fn contains_all_words(&self, place: &str) -> bool {
        place.split_whitespace().all(|w| self.contains(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_lowercases_and_skips_blanks() {
        let g = Gazetteer::parse("Quito\n  SANTO \n\ndomingo\r\n");
        assert_eq!(g.len(), 3);
        assert!(g.contains("quito"));
        assert!(g.contains("Santo"));
        assert!(g.contains("DOMINGO"));
    }

    #[test]
    fn all_words_must_be_known() {
        let g = Gazetteer::new(["santo", "domingo", "quito"]);
        assert!(g.contains_all_words("SANTO DOMINGO"));
        assert!(g.contains_all_words("QUITO"));
        assert!(!g.contains_all_words("SANTO TOMAS"));
    }

    #[test]
    fn empty_place_matches_vacuously() {
        let g = Gazetteer::new(["quito"]);
        assert!(g.contains_all_words(""));
        assert!(g.contains_all_words("   "));
        assert!(Gazetteer::default().contains_all_words(""));
    }

    #[test]
    fn load_or_create_makes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("territories.txt");
        let g = Gazetteer::load_or_create(&path).unwrap();
        assert!(g.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn load_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("territories.txt");
        std::fs::write(&path, "guayaquil\nloja\n").unwrap();
        let g = Gazetteer::load_or_create(&path).unwrap();
        assert_eq!(g.len(), 2);
        assert!(g.contains_all_words("LOJA"));
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Gazetteer::load(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, GazetteerError::Read { .. }));
    }
}
