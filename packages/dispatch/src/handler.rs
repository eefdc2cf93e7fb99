//! Importer trait and registry.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Result type for importers.
pub type ImportResult = Result<(), ImportError>;

/// Failure reported by the host's import capability.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),

    #[error("importer panicked: {0}")]
    Panicked(String),
}

impl ImportError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Trait for the host's "import one file" capability.
///
/// Importers only ever run on the host thread, so they need not be `Send`.
pub trait Importer: 'static {
    /// Lower-case file extensions, without the leading dot, this importer accepts.
    fn extensions(&self) -> &[&str];

    /// Import a single existing file.
    fn import(&self, path: &Path) -> ImportResult;
}

/// Registry of importers keyed by file extension.
#[derive(Default)]
pub struct ImporterRegistry {
    importers: HashMap<String, Rc<dyn Importer>>,
}

impl ImporterRegistry {
    /// 3D scene formats recognized by default.
    pub const SCENE_EXTENSIONS: &'static [&'static str] = &["glb", "gltf"];

    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            importers: HashMap::new(),
        }
    }

    /// Registry routing the default scene formats to a single import function.
    pub fn scenes<F>(import: F) -> Self
    where
        F: Fn(&Path) -> ImportResult + 'static,
    {
        let mut registry = Self::new();
        registry.register(FnImporter::new(Self::SCENE_EXTENSIONS, import));
        registry
    }

    /// Register an importer for every extension it declares.
    ///
    /// A later registration for the same extension replaces the earlier one.
    pub fn register<I: Importer>(&mut self, importer: I) {
        let importer: Rc<dyn Importer> = Rc::new(importer);
        for ext in importer.extensions() {
            self.importers
                .insert(ext.to_ascii_lowercase(), importer.clone());
        }
    }

    /// Get the importer for an extension (case-insensitive, no leading dot).
    pub fn get(&self, extension: &str) -> Option<Rc<dyn Importer>> {
        self.importers
            .get(&extension.to_ascii_lowercase())
            .cloned()
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.importers
            .contains_key(&extension.to_ascii_lowercase())
    }

    /// List all registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.importers.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }
}

/// A simple function-based importer.
pub struct FnImporter<F>
where
    F: Fn(&Path) -> ImportResult + 'static,
{
    extensions: Vec<&'static str>,
    import: F,
}

impl<F> FnImporter<F>
where
    F: Fn(&Path) -> ImportResult + 'static,
{
    /// Create a new function-based importer.
    pub fn new(extensions: &[&'static str], import: F) -> Self {
        Self {
            extensions: extensions.to_vec(),
            import,
        }
    }
}

impl<F> Importer for FnImporter<F>
where
    F: Fn(&Path) -> ImportResult + 'static,
{
    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn import(&self, path: &Path) -> ImportResult {
        (self.import)(path)
    }
}
