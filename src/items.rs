use std::io;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no images found (accepted extensions: {0})")]
    Empty(String),
}

/// Controls how a batch of paths is expanded into items
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub recursive: bool,
    pub shuffle: bool,
    pub extensions: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            shuffle: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl LoadOptions {
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// One image in the batch, identified by its file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    path: PathBuf,
}

impl Item {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pixel size read from the file header, `None` when the file can't be decoded
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::image_dimensions(&self.path).ok()
    }
}

/// Ordered batch of images under review
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Items without backing files, named as given
    pub fn from_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|n| Item::new(*n, *n)).collect())
    }

    /// Expand files and directories into a batch.
    ///
    /// Files named directly keep their command-line order; the contents of
    /// each directory are sorted in natural filename order. Files with an
    /// unaccepted extension are skipped, even when named directly.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], opts: &LoadOptions) -> Result<Self, LoadError> {
        let mut items = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                return Err(LoadError::NotFound(path.to_path_buf()));
            }

            if path.is_dir() {
                let mut found = Vec::new();
                collect_dir(path, opts, &mut found)?;
                found.sort_by(|a: &Item, b: &Item| {
                    natord::compare(&a.name, &b.name).then_with(|| a.path.cmp(&b.path))
                });
                debug!(dir = %path.display(), count = found.len(), "scanned directory");
                items.extend(found);
            } else if opts.accepts(path) {
                items.push(Item::from_path(path));
            } else {
                debug!(path = %path.display(), "skipping unsupported file");
            }
        }

        if items.is_empty() {
            return Err(LoadError::Empty(opts.extensions.iter().join(", ")));
        }

        let mut set = Self::new(items);
        if opts.shuffle {
            set.shuffle(&mut rand::thread_rng());
        }
        info!(count = set.len(), "loaded images");
        Ok(set)
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.items.shuffle(rng);
    }

    pub fn get(&self, idx: usize) -> Option<&Item> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name()).collect()
    }
}

/// Symlinked directories are not descended into, so a link back to an
/// ancestor can't load the same files twice.
fn collect_dir(dir: &Path, opts: &LoadOptions, out: &mut Vec<Item>) -> Result<(), LoadError> {
    let max_depth = if opts.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(max_depth);

    for entry in walker {
        let entry = entry.map_err(|err| LoadError::Io {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: io::Error::from(err),
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if opts.accepts(path) {
            out.push(Item::from_path(path));
        }
    }
    Ok(())
}
