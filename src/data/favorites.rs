//! Favorite recipes persisted as a JSON array
//!
//! Every call re-reads the file; nothing is kept in memory between calls.
//! Order of insertion is preserved and ids are unique.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::Recipe;

/// Favorites list backed by its own file, independent of the cache
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All favorites in insertion order; empty if the file is missing or corrupt
    pub async fn list(&self) -> Vec<Recipe> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt favorites file");
                Vec::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read favorites file");
                Vec::new()
            }
        }
    }

    /// Appends `recipe` unless one with the same id is already saved.
    ///
    /// Returns `true` only when the recipe was added and written.
    pub async fn add(&self, recipe: &Recipe) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.list().await;

        if favorites.iter().any(|f| f.id == recipe.id) {
            debug!(id = %recipe.id, "recipe already a favorite");
            return false;
        }

        favorites.push(recipe.clone());
        self.save(&favorites).await
    }

    /// Removes the recipe with `id`. Returns `true` if one was removed and written.
    pub async fn remove(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.list().await;

        let before = favorites.len();
        favorites.retain(|f| f.id != id);
        if favorites.len() == before {
            return false;
        }

        self.save(&favorites).await
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.list().await.iter().any(|f| f.id == id)
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Recipe> {
        self.list().await.into_iter().find(|f| f.id == id)
    }

    async fn save(&self, favorites: &[Recipe]) -> bool {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                warn!(dir = %parent.display(), error = %e, "cannot create favorites directory");
                return false;
            }
        }

        let json = match serde_json::to_string_pretty(favorites) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "cannot serialize favorites");
                return false;
            }
        };

        match fs::write(&self.path, json).await {
            Ok(()) => {
                debug!(count = favorites.len(), "favorites saved");
                true
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot write favorites file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FavoritesStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FavoritesStore::new(temp_dir.path().join("data").join("favorites.json"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_list_is_empty_without_file() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent_on_id() {
        let (store, _temp_dir) = create_test_store();
        let recipe = Recipe::summary("52772", "Teriyaki Chicken Casserole");
        let renamed = Recipe::summary("52772", "Same id, other name");

        assert!(store.add(&recipe).await);
        assert!(!store.add(&renamed).await);

        let favorites = store.list().await;
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].name, "Teriyaki Chicken Casserole");
    }

    #[tokio::test]
    async fn test_insertion_order_is_preserved() {
        let (store, _temp_dir) = create_test_store();

        for (id, name) in [("3", "C"), ("1", "A"), ("2", "B")] {
            store.add(&Recipe::summary(id, name)).await;
        }

        let names: Vec<_> = store.list().await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_remove_contains_and_find() {
        let (store, _temp_dir) = create_test_store();
        store.add(&Recipe::summary("1", "Pancakes")).await;
        store.add(&Recipe::summary("2", "Waffles")).await;

        assert!(store.contains("1").await);
        assert_eq!(
            store.find_by_id("2").await.map(|r| r.name),
            Some("Waffles".to_string())
        );

        assert!(store.remove("1").await);
        assert!(!store.remove("1").await);
        assert!(!store.contains("1").await);
        assert_eq!(store.find_by_id("1").await, None);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty_and_is_replaced() {
        let (store, _temp_dir) = create_test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not an array").unwrap();

        assert!(store.list().await.is_empty());
        assert!(store.add(&Recipe::summary("1", "Fresh Start")).await);
        assert_eq!(store.list().await.len(), 1);
    }
}
