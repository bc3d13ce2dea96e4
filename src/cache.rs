use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::{loader, Dataset, TrendDataset};
use crate::error::Result;
use crate::predict::{load_model, YieldModel};

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// One cached value and the path it was loaded from.
#[derive(Debug)]
struct Slot<T> {
    entry: Option<(PathBuf, Arc<T>)>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<T> Slot<T> {
    /// Return the cached value for `path`, loading it if the slot is empty
    /// or holds a different path. Failed loads leave the slot untouched.
    fn get_or_load(
        &mut self,
        path: &Path,
        what: &str,
        load: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<Arc<T>> {
        if let Some((cached, value)) = &self.entry {
            if cached == path {
                log::debug!("Cache hit for {what} {}", path.display());
                return Ok(Arc::clone(value));
            }
        }
        let value = Arc::new(load(path)?);
        self.entry = Some((path.to_path_buf(), Arc::clone(&value)));
        Ok(value)
    }

    fn clear(&mut self) {
        self.entry = None;
    }
}

/// Datasets and model for one dashboard session, keyed by source path.
///
/// Owned by the shell and passed to whoever needs a loaded value; entries
/// are immutable and handed out as `Arc`s.
#[derive(Debug, Default)]
pub struct SessionCache {
    dataset: Slot<Dataset>,
    trends: Slot<TrendDataset>,
    model: Slot<YieldModel>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        self.dataset.get_or_load(path, "dataset", loader::load)
    }

    pub fn trends(&mut self, path: &Path) -> Result<Arc<TrendDataset>> {
        self.trends.get_or_load(path, "trend dataset", loader::load_trends)
    }

    pub fn model(&mut self, path: &Path) -> Result<Arc<YieldModel>> {
        self.model.get_or_load(path, "model", load_model)
    }

    /// Drop every entry so the next request reloads from disk.
    pub fn invalidate(&mut self) {
        log::info!("Session cache invalidated");
        self.dataset.clear();
        self.trends.clear();
        self.model.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn dataset_file(rows: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "State,District,Crop,Year,Season,Area,Production,Yield").unwrap();
        write!(file, "{rows}").unwrap();
        file
    }

    #[test]
    fn same_path_is_served_from_cache() {
        let file = dataset_file("X,A,Wheat,2020,Kharif,10,50,5.0\n");
        let mut cache = SessionCache::new();
        let first = cache.dataset(file.path()).unwrap();
        let second = cache.dataset(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn new_path_or_invalidate_reloads() {
        let a = dataset_file("X,A,Wheat,2020,Kharif,10,50,5.0\n");
        let b = dataset_file("X,A,Wheat,2020,Kharif,10,50,5.0\nX,B,Wheat,2020,Kharif,20,80,4.0\n");
        let mut cache = SessionCache::new();

        let first = cache.dataset(a.path()).unwrap();
        let other = cache.dataset(b.path()).unwrap();
        assert_eq!(other.len(), 2);

        let again = cache.dataset(a.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));

        cache.invalidate();
        let reloaded = cache.dataset(a.path()).unwrap();
        assert!(!Arc::ptr_eq(&again, &reloaded));
    }

    #[test]
    fn failed_load_keeps_previous_entry() {
        let good = dataset_file("X,A,Wheat,2020,Kharif,10,50,5.0\n");
        let mut cache = SessionCache::new();
        let first = cache.dataset(good.path()).unwrap();

        assert!(cache.dataset(Path::new("/missing/data.csv")).is_err());
        let still = cache.dataset(good.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &still));
    }
}
