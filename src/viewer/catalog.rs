use std::path::PathBuf;

/// Character models shipped with the viewer, in display order.
const MODEL_IDS: [&str; 18] = [
    "character-a",
    "character-b",
    "character-c",
    "character-d",
    "character-e",
    "character-f",
    "character-g",
    "character-h",
    "character-i",
    "character-j",
    "character-k",
    "character-l",
    "character-m",
    "character-n",
    "character-o",
    "character-p",
    "character-q",
    "character-r",
];

const MODEL_EXTENSION: &str = "glb";

/// Ordered, immutable catalog of selectable models plus the directory their
/// assets load from.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    asset_root: PathBuf,
}

impl ModelCatalog {
    pub fn new() -> Self {
        // Anchored to the crate root so `cargo run` works from any directory.
        Self {
            asset_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models"),
        }
    }

    pub fn ids(&self) -> &'static [&'static str] {
        &MODEL_IDS
    }

    pub fn first(&self) -> &'static str {
        MODEL_IDS[0]
    }

    pub fn contains(&self, id: &str) -> bool {
        MODEL_IDS.iter().any(|known| *known == id)
    }

    pub fn asset_path(&self, id: &str) -> PathBuf {
        self.asset_root.join(format!("{id}.{MODEL_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ModelCatalog;

    #[test]
    fn first_entry_is_a_member() {
        let catalog = ModelCatalog::new();
        assert!(catalog.contains(catalog.first()));
        assert_eq!(catalog.first(), "character-a");
    }

    #[test]
    fn membership_is_exact() {
        let catalog = ModelCatalog::new();
        assert!(catalog.contains("character-r"));
        assert!(!catalog.contains("character-z"));
        assert!(!catalog.contains("character"));
    }

    #[test]
    fn asset_paths_follow_the_layout() {
        let catalog = ModelCatalog::new();
        let path = catalog.asset_path("character-c");
        assert!(path.is_absolute());
        assert!(path.ends_with("models/character-c.glb"));
    }
}
