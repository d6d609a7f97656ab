//! Index and query side of a prefix tree field.
//!
//! A [`PrefixTreeStrategy`] turns shapes into the terms stored for a document
//! and query arguments into the terms to look up. Distance sorting reads the
//! indexed leaf cells back through a per-field [`ShapeFieldCacheProvider`].

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use geoprefix_types::operation::SpatialOperation;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::args::{DEFAULT_DIST_PRECISION, SpatialArgs};
use crate::cache::{
    CachedDistanceValueSource, PointPrefixTreeShapeReader, SegmentId, SegmentTerms,
    ShapeFieldCacheProvider,
};
use crate::error::{Result, SpatialError};
use crate::io::{self, DEFAULT_MAX_WKB_BYTES, TYPE_GEOMETRY};
use crate::prefix::{SpatialPrefixTree, cells_to_tokens};
use crate::shape::Shape;

/// Cache provider for fields holding indexed points.
pub type PointCacheProvider = ShapeFieldCacheProvider<PointPrefixTreeShapeReader>;

#[derive(Debug)]
pub struct PrefixTreeStrategy {
    tree: Arc<dyn SpatialPrefixTree>,
    dist_err_pct: f64,
    default_field_values_len: usize,
    max_wkb_bytes: usize,
    providers: RwLock<FxHashMap<String, Arc<PointCacheProvider>>>,
}

impl PrefixTreeStrategy {
    pub fn new(tree: Arc<dyn SpatialPrefixTree>) -> Self {
        Self {
            tree,
            dist_err_pct: DEFAULT_DIST_PRECISION,
            default_field_values_len: 2,
            max_wkb_bytes: DEFAULT_MAX_WKB_BYTES,
            providers: RwLock::new(FxHashMap::default()),
        }
    }

    /// Precision used when indexing; see
    /// [`SpatialPrefixTree::max_level_for_precision`].
    pub fn with_dist_err_pct(mut self, pct: f64) -> Self {
        self.dist_err_pct = pct;
        self
    }

    /// Initial per-document capacity of cached values.
    pub fn with_default_field_values_len(mut self, len: usize) -> Self {
        self.default_field_values_len = len;
        self
    }

    pub fn with_max_wkb_bytes(mut self, bytes: usize) -> Self {
        self.max_wkb_bytes = bytes;
        self
    }

    pub fn tree(&self) -> &Arc<dyn SpatialPrefixTree> {
        &self.tree
    }

    pub fn dist_err_pct(&self) -> f64 {
        self.dist_err_pct
    }

    /// Terms to index for `shape`: every cell down to the precision level,
    /// intermediate cells included, without the world cell.
    pub fn create_field_tokens(&self, shape: &Shape) -> Result<Vec<String>> {
        let detail = self.tree.max_level_for_precision(shape, self.dist_err_pct)?;
        let mut cells = self.tree.get_cells(shape, detail, true)?;
        if cells.first().is_some_and(|c| c.level() == 0) {
            cells.remove(0);
        }
        Ok(cells_to_tokens(&cells))
    }

    /// Stored form of `shape` in the binary shape format. Geometries are
    /// simplified as needed to fit the WKB size budget.
    pub fn stored_value(&self, shape: &Shape) -> Result<Bytes> {
        match shape {
            Shape::Geometry(g) => {
                let wkb = io::encode_wkb_bounded(g.geometry(), self.max_wkb_bytes)?;
                let mut buf = BytesMut::with_capacity(1 + wkb.len());
                buf.put_u8(TYPE_GEOMETRY);
                buf.put_slice(&wkb);
                Ok(buf.freeze())
            }
            other => io::encode_shape(other),
        }
    }

    /// Terms a document must carry to match `args`.
    pub fn query_tokens(&self, args: &SpatialArgs) -> Result<Vec<String>> {
        args.validate()?;
        match args.operation() {
            SpatialOperation::Intersects | SpatialOperation::BBoxIntersects => {}
            op => {
                return Err(SpatialError::UnsupportedOperation(format!(
                    "{} is not supported by {} prefix tree fields",
                    op,
                    self.tree.name()
                )));
            }
        }
        let shape = args.shape();
        let detail = self
            .tree
            .max_level_for_precision(&shape, args.dist_precision())?;
        let cells = self.tree.get_cells(&shape, detail, false)?;
        Ok(cells_to_tokens(&cells))
    }

    /// The cache provider of `field`, created on first use.
    pub fn provider(&self, field: &str) -> Arc<PointCacheProvider> {
        if let Some(p) = self.providers.read().get(field) {
            return Arc::clone(p);
        }
        let mut providers = self.providers.write();
        Arc::clone(providers.entry(field.to_string()).or_insert_with(|| {
            Arc::new(ShapeFieldCacheProvider::new(
                field,
                self.default_field_values_len,
                PointPrefixTreeShapeReader::new(Arc::clone(&self.tree)),
            ))
        }))
    }

    /// Per-document distance from the center of the query shape to the
    /// document's indexed points in `segment`.
    pub fn make_value_source(
        &self,
        args: &SpatialArgs,
        field: &str,
        segment: &dyn SegmentTerms,
    ) -> CachedDistanceValueSource {
        let cache = self.provider(field).get_cache(segment);
        CachedDistanceValueSource::new(
            args.shape().center(),
            self.tree.context().distance_calculator(),
            cache,
        )
    }

    /// Drop every field's cache for a segment that is going away. Returns the
    /// number of caches released.
    pub fn release_segment(&self, segment: SegmentId) -> usize {
        self.providers
            .read()
            .values()
            .filter(|p| p.release(segment))
            .count()
    }
}
