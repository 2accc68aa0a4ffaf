use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use swash::GlyphId;
use tracing::{debug, trace};

use crate::glyph::{Glyph, GlyphImage, GlyphKind, GlyphPath};
use crate::key::{ColorKey, DataKey, GlyphAttributes, GlyphKey};
use crate::rasterizer::{GlyphRasterizer, GlyphSource};

/// Estimated bookkeeping bytes per cache entry (map entry, recency node,
/// shared pointers) counted on top of the payload size.
const ENTRY_OVERHEAD: usize = 64;

/// Default capacity used by [`GlyphCache::with_default_capacity`].
const DEFAULT_CAPACITY: usize = 32 * 1024 * 1024;

type SourceFactory = dyn Fn(&DataKey) -> Arc<dyn GlyphSource> + Send + Sync;

#[derive(Clone)]
enum CacheValue {
    Glyph(Arc<Glyph>),
    Image(Arc<GlyphImage>),
}

impl CacheValue {
    fn size_bytes(&self) -> usize {
        let payload = match self {
            CacheValue::Glyph(glyph) => glyph.size_bytes(),
            CacheValue::Image(image) => image.size_bytes(),
        };
        payload + ENTRY_OVERHEAD
    }
}

struct Entry {
    value: CacheValue,
    size: usize,
    stamp: u64,
}

/// One segment per distinct key. Data segments own the rasterizer for
/// their key; image segments hold color or stroke renderings.
struct Segment {
    rasterizer: Option<Arc<dyn GlyphSource>>,
    entries: HashMap<GlyphId, Entry>,
}

#[derive(Default)]
struct CacheInner {
    segments: HashMap<GlyphKey, Segment>,
    /// Global recency order: lowest stamp is the least recently used
    /// entry across every segment.
    recency: BTreeMap<u64, (GlyphKey, GlyphId)>,
    tick: u64,
    size: usize,
}

impl CacheInner {
    fn next_stamp(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn ensure_data_segment(
        &mut self,
        key: &DataKey,
        factory: &SourceFactory,
    ) -> Arc<dyn GlyphSource> {
        let segment = self
            .segments
            .entry(GlyphKey::Data(key.clone()))
            .or_insert_with(|| Segment {
                rasterizer: Some(factory(key)),
                entries: HashMap::new(),
            });

        segment
            .rasterizer
            .clone()
            .expect("data segments always own a rasterizer")
    }

    fn ensure_image_segment(&mut self, key: &GlyphKey) {
        self.segments.entry(key.clone()).or_insert_with(|| Segment {
            rasterizer: None,
            entries: HashMap::new(),
        });
    }

    /// Look an entry up and promote it to most recently used.
    fn lookup(&mut self, key: &GlyphKey, glyph_id: GlyphId) -> Option<CacheValue> {
        let stamp = self.next_stamp();
        let segment = self.segments.get_mut(key)?;
        let entry = segment.entries.get_mut(&glyph_id)?;

        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, (key.clone(), glyph_id));

        Some(entry.value.clone())
    }

    /// Replace (or insert) an entry, adjusting the size accounting.
    fn replace(&mut self, key: &GlyphKey, glyph_id: GlyphId, value: CacheValue) {
        let stamp = self.next_stamp();
        let size = value.size_bytes();

        let segment = self
            .segments
            .get_mut(key)
            .expect("segment must be created before insertion");

        if let Some(old) = segment.entries.remove(&glyph_id) {
            self.recency.remove(&old.stamp);
            self.size -= old.size;
        }

        segment.entries.insert(glyph_id, Entry { value, size, stamp });
        self.recency.insert(stamp, (key.clone(), glyph_id));
        self.size += size;
    }

    /// Evict globally least-recently-used entries until the size fits.
    ///
    /// Eviction only removes map entries; segments and their rasterizers
    /// stay alive until the cache is cleared.
    fn trim(&mut self, capacity: usize) {
        while self.size > capacity {
            let Some((_, (key, glyph_id))) = self.recency.pop_first() else {
                break;
            };

            if let Some(segment) = self.segments.get_mut(&key) {
                if let Some(entry) = segment.entries.remove(&glyph_id) {
                    self.size -= entry.size;
                    trace!(?glyph_id, "evicted glyph cache entry");
                }
            }
        }
    }
}

/// Segmented, size-bounded LRU cache of rasterized glyph artifacts.
///
/// Segments are created lazily per rendering-attribute key and share one
/// global capacity; eviction always removes the globally least recently
/// used entry. All map mutation happens under a single mutex, while
/// rasterization runs outside the lock: a thread that loses the
/// compute race discards its own result in favor of the stored one.
pub struct GlyphCache {
    capacity: usize,
    factory: Box<SourceFactory>,
    inner: Mutex<CacheInner>,
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCache")
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .finish()
    }
}

impl GlyphCache {
    /// A cache of the given capacity in bytes, rasterizing through swash.
    pub fn new(capacity: usize) -> Self {
        Self::with_source_factory(
            capacity,
            Box::new(|key| Arc::new(GlyphRasterizer::new(key)) as Arc<dyn GlyphSource>),
        )
    }

    /// A cache with an injected rasterization source per data key.
    pub fn with_source_factory(capacity: usize, factory: Box<SourceFactory>) -> Self {
        Self {
            capacity: capacity.max(1),
            factory,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current estimated size of all cached entries in bytes.
    pub fn size(&self) -> usize {
        self.inner.lock().unwrap().size
    }

    /// Drop every entry and segment, releasing all rasterizer resources.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.segments.clear();
        inner.recency.clear();
        inner.size = 0;
        debug!("cleared glyph cache");
    }

    /// Rasterized image for a glyph, computed at most once per (key,
    /// glyph) pair even under concurrent callers.
    ///
    /// Returns `None` when the glyph has no image; the failure itself is
    /// cached so the rasterizer is not retried on every call.
    pub fn get_glyph_image(
        &self,
        attributes: &GlyphAttributes,
        glyph_id: GlyphId,
    ) -> Option<Arc<GlyphImage>> {
        let data_key = attributes.data_key();

        let (rasterizer, cached) = {
            let mut inner = self.inner.lock().unwrap();
            let rasterizer = inner.ensure_data_segment(&data_key, &self.factory);
            let cached = inner.lookup(&GlyphKey::Data(data_key.clone()), glyph_id);
            (rasterizer, cached)
        };

        let glyph = match cached {
            Some(CacheValue::Glyph(glyph)) if glyph.kind.is_some() => glyph,
            _ => {
                // Compute outside the lock, then re-check: another thread
                // may have inserted first.
                let kind = rasterizer.glyph_kind(glyph_id);
                let image = if kind != GlyphKind::Mixed {
                    rasterizer.glyph_image(glyph_id).map(Arc::new)
                } else {
                    None
                };

                self.update_glyph(&data_key, glyph_id, |current| {
                    if current.kind.is_some() {
                        return None;
                    }
                    Some(Glyph {
                        kind: Some(kind),
                        image: image.clone(),
                        outline: current.outline.clone(),
                        path: current.path.clone(),
                    })
                })
            }
        };

        if glyph.kind == Some(GlyphKind::Mixed) {
            return self.get_colored_image(attributes.color_key(), &rasterizer, glyph_id);
        }

        glyph.image.clone()
    }

    fn get_colored_image(
        &self,
        key: ColorKey,
        rasterizer: &Arc<dyn GlyphSource>,
        glyph_id: GlyphId,
    ) -> Option<Arc<GlyphImage>> {
        let segment_key = GlyphKey::Color(key.clone());

        {
            let mut inner = self.inner.lock().unwrap();
            inner.ensure_image_segment(&segment_key);
            if let Some(CacheValue::Image(image)) = inner.lookup(&segment_key, glyph_id) {
                return Some(image);
            }
        }

        let image = rasterizer
            .color_image(glyph_id, key.foreground_color)
            .map(Arc::new)?;

        Some(self.insert_image_if_absent(&segment_key, glyph_id, image))
    }

    /// Stroked image for a glyph outline, cached per stroke key. The
    /// outline itself is loaded into the data segment on first use.
    pub fn get_stroke_image(
        &self,
        attributes: &GlyphAttributes,
        glyph_id: GlyphId,
    ) -> Option<Arc<GlyphImage>> {
        let data_key = attributes.data_key();

        let (rasterizer, cached) = {
            let mut inner = self.inner.lock().unwrap();
            let rasterizer = inner.ensure_data_segment(&data_key, &self.factory);
            let cached = inner.lookup(&GlyphKey::Data(data_key.clone()), glyph_id);
            (rasterizer, cached)
        };

        let outline = match cached {
            Some(CacheValue::Glyph(glyph)) if glyph.outline.is_some() => glyph.outline.clone(),
            _ => {
                let outline = rasterizer.glyph_outline(glyph_id).map(Arc::new);
                let glyph = self.update_glyph(&data_key, glyph_id, |current| {
                    if current.outline.is_some() {
                        return None;
                    }
                    Some(Glyph {
                        outline: outline.clone(),
                        ..current.clone()
                    })
                });
                glyph.outline.clone()
            }
        }?;

        let stroke_key = attributes.stroke_key();
        let segment_key = GlyphKey::Stroke(stroke_key.clone());

        {
            let mut inner = self.inner.lock().unwrap();
            inner.ensure_image_segment(&segment_key);
            if let Some(CacheValue::Image(image)) = inner.lookup(&segment_key, glyph_id) {
                return Some(image);
            }
        }

        let image = rasterizer
            .stroke_image(&outline, &stroke_key)
            .map(Arc::new)?;

        Some(self.insert_image_if_absent(&segment_key, glyph_id, image))
    }

    /// Fill path for a glyph, loaded into the data segment on first use.
    pub fn get_glyph_path(
        &self,
        attributes: &GlyphAttributes,
        glyph_id: GlyphId,
    ) -> Option<Arc<GlyphPath>> {
        let data_key = attributes.data_key();

        let (rasterizer, cached) = {
            let mut inner = self.inner.lock().unwrap();
            let rasterizer = inner.ensure_data_segment(&data_key, &self.factory);
            let cached = inner.lookup(&GlyphKey::Data(data_key.clone()), glyph_id);
            (rasterizer, cached)
        };

        if let Some(CacheValue::Glyph(glyph)) = cached {
            if let Some(path) = &glyph.path {
                return Some(path.clone());
            }
        }

        let path = rasterizer.glyph_path(glyph_id).map(Arc::new);
        let glyph = self.update_glyph(&data_key, glyph_id, |current| {
            if current.path.is_some() {
                return None;
            }
            Some(Glyph {
                path: path.clone(),
                ..current.clone()
            })
        });

        glyph.path.clone()
    }

    /// Re-check-then-update for the data segment: when `update` returns a
    /// new glyph it replaces the entry; when it returns `None` the entry
    /// another thread inserted wins.
    fn update_glyph<F>(&self, data_key: &DataKey, glyph_id: GlyphId, update: F) -> Arc<Glyph>
    where
        F: FnOnce(&Glyph) -> Option<Glyph>,
    {
        let key = GlyphKey::Data(data_key.clone());
        let mut inner = self.inner.lock().unwrap();

        let current = match inner
            .segments
            .get(&key)
            .and_then(|segment| segment.entries.get(&glyph_id))
        {
            Some(entry) => match &entry.value {
                CacheValue::Glyph(glyph) => glyph.clone(),
                CacheValue::Image(_) => Arc::new(Glyph::default()),
            },
            None => Arc::new(Glyph::default()),
        };

        match update(&current) {
            None => current,
            Some(updated) => {
                let updated = Arc::new(updated);
                inner.replace(&key, glyph_id, CacheValue::Glyph(updated.clone()));
                inner.trim(self.capacity);
                updated
            }
        }
    }

    /// Re-check-then-insert for image segments; the first stored image
    /// wins and later computations are discarded.
    fn insert_image_if_absent(
        &self,
        key: &GlyphKey,
        glyph_id: GlyphId,
        image: Arc<GlyphImage>,
    ) -> Arc<GlyphImage> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(segment) = inner.segments.get(key) {
            if let Some(entry) = segment.entries.get(&glyph_id) {
                if let CacheValue::Image(existing) = &entry.value {
                    return existing.clone();
                }
            }
        }

        inner.replace(key, glyph_id, CacheValue::Image(image.clone()));
        inner.trim(self.capacity);
        image
    }
}
