use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::font::{FontError, Result, Typeface};

/// Key for identifying a font within the cache.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    /// Path to the font file on disk.
    pub path: PathBuf,
    /// Font index within the file (for collections).
    pub index: u32,
}

impl FontKey {
    pub fn new(path: impl AsRef<Path>, index: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            index: index as u32,
        }
    }
}

/// Simple in-memory font cache keyed by file path and index.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: HashMap<FontKey, Arc<Typeface>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
        }
    }

    /// Get a typeface from the cache or load it from disk.
    pub fn get_or_load(&mut self, path: impl AsRef<Path>, index: usize) -> Result<Arc<Typeface>> {
        let key = FontKey::new(&path, index);
        if let Some(face) = self.fonts.get(&key) {
            return Ok(face.clone());
        }

        let face = Arc::new(Typeface::from_path(&key.path, index)?);
        self.fonts.insert(key, face.clone());
        Ok(face)
    }

    /// Insert an already constructed typeface with an explicit key.
    pub fn insert(&mut self, key: FontKey, face: Arc<Typeface>) {
        self.fonts.insert(key, face);
    }

    /// Retrieve a typeface by key if it exists.
    pub fn get(&self, key: &FontKey) -> Option<Arc<Typeface>> {
        self.fonts.get(key).cloned()
    }
}

/// Load a reasonable system sans-serif typeface via `fontdb`.
pub fn load_system_default_font() -> Result<Arc<Typeface>> {
    use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};

    let mut db = Database::new();
    db.load_system_fonts();

    let id = db
        .query(&Query {
            families: &[
                Family::SansSerif,
                Family::Name("DejaVu Sans".into()),
                Family::Name("Noto Sans".into()),
                Family::Name("Arial".into()),
            ],
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
            ..Query::default()
        })
        .ok_or(FontError::NoSystemFont)?;

    let face = db.face(id).ok_or(FontError::NoSystemFont)?;

    let bytes: Vec<u8> = match &face.source {
        Source::File(path) => std::fs::read(path)?,
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };

    let typeface = Typeface::from_vec(bytes, face.index as usize)?;
    Ok(Arc::new(typeface))
}
