//! Query arguments: an operation, a query shape and precision settings.
//!
//! The text form is `Operation(shape) [key=value ...]` where the shape uses
//! the shape text format and the keys are `distPrec`, `min` and `max`:
//!
//! ```rust
//! use geoprefix::args::SpatialArgs;
//! use geoprefix::context::SpatialContext;
//! use geoprefix_types::operation::SpatialOperation;
//! use geoprefix_types::units::DistanceUnits;
//!
//! let ctx = SpatialContext::geo(DistanceUnits::Kilometers);
//! let args = SpatialArgs::parse("IsWithin(-10 -20 10 20) distPrec=0.1", &ctx)?;
//! assert_eq!(args.operation(), SpatialOperation::IsWithin);
//! assert_eq!(args.dist_precision(), 0.1);
//! # Ok::<(), geoprefix::SpatialError>(())
//! ```

use std::borrow::Cow;

use geoprefix_types::operation::SpatialOperation;

use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::io;
use crate::shape::Shape;

/// Default fraction of the query shape's size accepted as positional error.
pub const DEFAULT_DIST_PRECISION: f64 = 0.025;

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialArgs {
    operation: SpatialOperation,
    shape: Shape,
    dist_precision: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl SpatialArgs {
    pub fn new(operation: SpatialOperation, shape: Shape) -> Self {
        Self {
            operation,
            shape,
            dist_precision: DEFAULT_DIST_PRECISION,
            min: None,
            max: None,
        }
    }

    pub fn with_dist_precision(mut self, dist_precision: f64) -> Self {
        self.dist_precision = dist_precision;
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn operation(&self) -> SpatialOperation {
        self.operation
    }

    /// The shape to query with. BBox operations use the bounding box.
    pub fn shape(&self) -> Cow<'_, Shape> {
        match self.operation {
            SpatialOperation::BBoxIntersects | SpatialOperation::BBoxWithin => {
                Cow::Owned(Shape::Rect(self.shape.bounding_box()))
            }
            _ => Cow::Borrowed(&self.shape),
        }
    }

    pub fn dist_precision(&self) -> f64 {
        self.dist_precision
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Reject combinations that make no sense, such as a point for an
    /// operation that needs an area.
    pub fn validate(&self) -> Result<()> {
        if self.operation.is_target_needs_area() && !self.shape.has_area() {
            return Err(SpatialError::InvalidArgument(format!(
                "{} only supports shapes with area",
                self.operation
            )));
        }
        if !(0.0..=0.5).contains(&self.dist_precision) {
            return Err(SpatialError::InvalidArgument(format!(
                "distPrec must be in [0, 0.5], got {}",
                self.dist_precision
            )));
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(SpatialError::InvalidArgument(format!(
                "min {} is greater than max {}",
                min, max
            )));
        }
        Ok(())
    }

    /// Parse `Operation(shape) [key=value ...]`.
    pub fn parse(value: &str, ctx: &SpatialContext) -> Result<Self> {
        let value = value.trim();
        let open = value.find('(').ok_or_else(|| {
            SpatialError::InvalidArgument(format!("missing '(' in spatial args: {}", value))
        })?;
        let close = matching_paren(value, open).ok_or_else(|| {
            SpatialError::InvalidArgument(format!("unbalanced parentheses in: {}", value))
        })?;

        let operation: SpatialOperation = value[..open].parse()?;
        let body = value[open + 1..close].trim();
        if body.is_empty() {
            return Err(SpatialError::InvalidArgument(format!(
                "{} needs a shape",
                operation
            )));
        }
        let mut args = SpatialArgs::new(operation, io::read_shape(body, ctx)?);

        for pair in value[close + 1..].split_whitespace() {
            let (key, raw) = pair.split_once('=').ok_or_else(|| {
                SpatialError::InvalidArgument(format!("expected key=value, got {}", pair))
            })?;
            let num = raw.parse::<f64>().map_err(|_| {
                SpatialError::InvalidArgument(format!("bad number for {}: {}", key, raw))
            })?;
            match key {
                "distPrec" => args.dist_precision = num,
                "min" => args.min = Some(num),
                "max" => args.max = Some(num),
                other => {
                    return Err(SpatialError::InvalidArgument(format!(
                        "unknown spatial args key: {}",
                        other
                    )));
                }
            }
        }
        Ok(args)
    }

    /// Render in the form accepted by [`SpatialArgs::parse`].
    pub fn to_args_string(&self) -> Result<String> {
        let mut out = format!(
            "{}({}) distPrec={}",
            self.operation,
            io::write_shape(&self.shape)?,
            self.dist_precision
        );
        if let Some(min) = self.min {
            out.push_str(&format!(" min={}", min));
        }
        if let Some(max) = self.max {
            out.push_str(&format!(" max={}", max));
        }
        Ok(out)
    }
}

fn matching_paren(value: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in value.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
