//! Per-segment caches of decoded shapes, keyed by document.
//!
//! The host engine is abstracted by [`SegmentTerms`]: a segment exposes the
//! indexed terms of a field and the documents posting each term. A
//! [`ShapeFieldCacheProvider`] decodes those terms once per segment and hands
//! out the result as an `Arc` for lock-free reads afterwards. Each segment
//! builds in its own slot, so a slow build never holds up other segments. Owners call
//! [`ShapeFieldCacheProvider::release`] when a segment goes away.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use geo::Point;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::distance::DistanceCalculator;
use crate::prefix::{Cell, SpatialPrefixTree};

/// Identity of an index segment, unique for the segment's lifetime.
pub type SegmentId = u64;

/// One indexed term and the documents that contain it.
#[derive(Debug, Clone, Copy)]
pub struct TermPostings<'a> {
    pub term: &'a [u8],
    pub docs: &'a [u32],
}

/// Read access to the terms of one index segment.
pub trait SegmentTerms {
    fn segment_id(&self) -> SegmentId;

    /// One past the largest document number in the segment.
    fn max_doc(&self) -> u32;

    /// Terms of `field` in ascending byte order.
    fn terms<'a>(&'a self, field: &str) -> Box<dyn Iterator<Item = TermPostings<'a>> + 'a>;
}

/// A simple in-memory segment.
#[derive(Debug, Clone, Default)]
pub struct MemorySegment {
    id: SegmentId,
    max_doc: u32,
    fields: BTreeMap<String, BTreeMap<Vec<u8>, Vec<u32>>>,
}

impl MemorySegment {
    pub fn new(id: SegmentId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Index `tokens` for `doc` under `field`.
    ///
    /// `max_doc` saturates at `u32::MAX`, so that document number is indexed
    /// but never lands in a shape cache.
    pub fn add_document<I, T>(&mut self, doc: u32, field: &str, tokens: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.max_doc = self.max_doc.max(doc.saturating_add(1));
        let postings = self.fields.entry(field.to_string()).or_default();
        for token in tokens {
            let docs = postings.entry(token.as_ref().to_vec()).or_default();
            if docs.last() != Some(&doc) {
                docs.push(doc);
            }
        }
    }

    /// Documents posting `term` under `field`.
    pub fn docs_for_term(&self, field: &str, term: &[u8]) -> &[u32] {
        self.fields
            .get(field)
            .and_then(|p| p.get(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl SegmentTerms for MemorySegment {
    fn segment_id(&self) -> SegmentId {
        self.id
    }

    fn max_doc(&self) -> u32 {
        self.max_doc
    }

    fn terms<'a>(&'a self, field: &str) -> Box<dyn Iterator<Item = TermPostings<'a>> + 'a> {
        match self.fields.get(field) {
            Some(postings) => Box::new(postings.iter().map(|(term, docs)| TermPostings {
                term: term.as_slice(),
                docs: docs.as_slice(),
            })),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Decodes one indexed term into a cached shape.
pub trait ShapeReader: Send + Sync {
    type Shape: Clone + Send + Sync;

    /// Reusable decode state, owned by the single thread building a cache.
    type Scratch: Default;

    /// The shape a term stands for, or `None` for terms that are skipped.
    fn read_shape(&self, term: &[u8], scratch: &mut Self::Scratch) -> Option<Self::Shape>;
}

/// Reads the leaf cells of a point field back into their center points.
#[derive(Debug, Clone)]
pub struct PointPrefixTreeShapeReader {
    tree: Arc<dyn SpatialPrefixTree>,
}

impl PointPrefixTreeShapeReader {
    pub fn new(tree: Arc<dyn SpatialPrefixTree>) -> Self {
        Self { tree }
    }
}

impl ShapeReader for PointPrefixTreeShapeReader {
    type Shape = Point;
    type Scratch = Cell;

    fn read_shape(&self, term: &[u8], scratch: &mut Cell) -> Option<Point> {
        if let Err(e) = self.tree.read_cell_into(term, scratch) {
            log::debug!("skipping undecodable term {:?}: {}", term, e);
            return None;
        }
        scratch.is_leaf().then(|| scratch.center())
    }
}

/// Shapes per document for one segment.
#[derive(Debug, Clone)]
pub struct ShapeFieldCache<T> {
    docs: Vec<Vec<T>>,
    default_len: usize,
    count: usize,
}

impl<T> ShapeFieldCache<T> {
    pub fn new(max_doc: u32, default_len: usize) -> Self {
        let mut docs = Vec::with_capacity(max_doc as usize);
        docs.resize_with(max_doc as usize, Vec::new);
        Self {
            docs,
            default_len,
            count: 0,
        }
    }

    /// Record `shape` for `doc`. Documents beyond `max_doc` are ignored.
    pub fn add(&mut self, doc: u32, shape: T) {
        if let Some(list) = self.docs.get_mut(doc as usize) {
            if list.capacity() == 0 {
                list.reserve_exact(self.default_len);
            }
            list.push(shape);
            self.count += 1;
        }
    }

    /// Shapes of `doc`, or `None` when it has none.
    pub fn shapes(&self, doc: u32) -> Option<&[T]> {
        self.docs
            .get(doc as usize)
            .filter(|list| !list.is_empty())
            .map(Vec::as_slice)
    }

    pub fn max_doc(&self) -> u32 {
        self.docs.len() as u32
    }

    /// Total number of cached shapes.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<T> fmt::Display for ShapeFieldCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShapeFieldCache[max_doc={} shapes={}]",
            self.docs.len(),
            self.count
        )
    }
}

type CacheSlot<T> = Arc<OnceCell<Arc<ShapeFieldCache<T>>>>;

/// Builds and holds the per-segment caches of one field.
pub struct ShapeFieldCacheProvider<R: ShapeReader> {
    field: String,
    default_len: usize,
    reader: R,
    caches: RwLock<FxHashMap<SegmentId, CacheSlot<R::Shape>>>,
}

impl<R: ShapeReader> ShapeFieldCacheProvider<R> {
    pub fn new(field: impl Into<String>, default_len: usize, reader: R) -> Self {
        Self {
            field: field.into(),
            default_len,
            reader,
            caches: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The cache for `segment`, building it on first use.
    ///
    /// Concurrent first calls for the same segment build it exactly once.
    /// The map lock is only held to find or insert the segment's slot; the
    /// build itself runs outside it.
    pub fn get_cache(&self, segment: &dyn SegmentTerms) -> Arc<ShapeFieldCache<R::Shape>> {
        let id = segment.segment_id();
        let existing = self.caches.read().get(&id).map(Arc::clone);
        let slot = match existing {
            Some(slot) => slot,
            None => Arc::clone(self.caches.write().entry(id).or_default()),
        };
        Arc::clone(slot.get_or_init(|| Arc::new(self.build(segment))))
    }

    fn build(&self, segment: &dyn SegmentTerms) -> ShapeFieldCache<R::Shape> {
        let start = Instant::now();
        let max_doc = segment.max_doc();
        log::info!(
            "Building shape cache for field '{}' segment {} [max_doc={}]",
            self.field,
            segment.segment_id(),
            max_doc
        );

        let mut cache = ShapeFieldCache::new(max_doc, self.default_len);
        let mut scratch = R::Scratch::default();
        for postings in segment.terms(&self.field) {
            if let Some(shape) = self.reader.read_shape(postings.term, &mut scratch) {
                for &doc in postings.docs {
                    cache.add(doc, shape.clone());
                }
            }
        }

        log::info!(
            "Cached {} shapes in {:?}: {}",
            cache.len(),
            start.elapsed(),
            cache
        );
        cache
    }

    /// Drop the cache of a segment that is going away.
    pub fn release(&self, segment: SegmentId) -> bool {
        self.caches.write().remove(&segment).is_some()
    }

    /// Segments whose cache has finished building.
    pub fn cached_segments(&self) -> usize {
        self.caches
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }
}

impl<R: ShapeReader> fmt::Debug for ShapeFieldCacheProvider<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeFieldCacheProvider")
            .field("field", &self.field)
            .field("default_len", &self.default_len)
            .field("cached_segments", &self.cached_segments())
            .finish()
    }
}

/// Per-document distance from a point to the nearest cached point.
#[derive(Debug, Clone)]
pub struct CachedDistanceValueSource {
    from: Point,
    calculator: DistanceCalculator,
    cache: Arc<ShapeFieldCache<Point>>,
}

impl CachedDistanceValueSource {
    pub fn new(from: Point, calculator: DistanceCalculator, cache: Arc<ShapeFieldCache<Point>>) -> Self {
        Self {
            from,
            calculator,
            cache,
        }
    }

    /// Minimum distance to the document's points; NaN when it has none.
    pub fn value(&self, doc: u32) -> f64 {
        match self.cache.shapes(doc) {
            Some(points) => points
                .iter()
                .map(|p| self.calculator.distance(&self.from, p))
                .fold(f64::INFINITY, f64::min),
            None => f64::NAN,
        }
    }

    pub fn description(&self) -> String {
        format!("DistanceValueSource({:?})", self.calculator)
    }
}

impl PartialEq for CachedDistanceValueSource {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.calculator == other.calculator
    }
}
