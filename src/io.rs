//! Shape serialization: the text format, the binary format and WKB.
//!
//! Text forms:
//!
//! | Shape     | Text                                          |
//! |-----------|-----------------------------------------------|
//! | point     | `x y`                                         |
//! | rectangle | `minX minY maxX maxY`                         |
//! | circle    | `Circle(x y d=R)` or `Circle(x y distance=R)` |
//! | geometry  | well-known text, e.g. `POLYGON((...))`        |
//!
//! Binary form: one type byte followed by big-endian doubles (points,
//! rectangles, circles) or a WKB payload running to the end of the buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use geo::{BoundingRect, Geometry, GeometryCollection, Simplify};
use geozero::wkb::Wkb;
use geozero::wkt::WktStr;
use geozero::{CoordDimensions, ToGeo, ToWkb, ToWkt};

use crate::context::SpatialContext;
use crate::error::{Result, SpatialError};
use crate::shape::{GeometryShape, Rectangle, Shape};

pub const TYPE_POINT: u8 = 0;
pub const TYPE_BBOX: u8 = 1;
pub const TYPE_GEOMETRY: u8 = 2;
pub const TYPE_CIRCLE: u8 = 3;

/// Default WKB size budget for indexed geometries.
pub const DEFAULT_MAX_WKB_BYTES: usize = 32_000;

/// Parse a shape from its text form.
pub fn read_shape(value: &str, ctx: &SpatialContext) -> Result<Shape> {
    let value = value.trim();
    let Some(first) = value.chars().next() else {
        return Err(SpatialError::InvalidShape("empty shape string".to_string()));
    };

    if !first.is_alphabetic() {
        let nums = value
            .split_whitespace()
            .map(|s| parse_f64(s, value))
            .collect::<Result<Vec<_>>>()?;
        return match nums.as_slice() {
            [x, y] => Ok(Shape::Point(ctx.make_point(*x, *y)?)),
            [min_x, min_y, max_x, max_y] => {
                Ok(Shape::Rect(ctx.make_rect(*min_x, *max_x, *min_y, *max_y)?))
            }
            _ => Err(SpatialError::InvalidShape(format!(
                "expected 2 or 4 numbers: {}",
                value
            ))),
        };
    }

    if value
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("circle("))
    {
        return read_circle(value, ctx);
    }

    let geom = WktStr(value).to_geo()?;
    match geom {
        Geometry::Point(p) => Ok(Shape::Point(ctx.make_point(p.x(), p.y())?)),
        other => Ok(Shape::Geometry(GeometryShape::new(other)?)),
    }
}

fn read_circle(value: &str, ctx: &SpatialContext) -> Result<Shape> {
    let inner = value[7..]
        .strip_suffix(')')
        .ok_or_else(|| SpatialError::InvalidShape(format!("unclosed circle: {}", value)))?
        .replace(',', " ");
    let mut tokens = inner.split_whitespace();
    let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
        return Err(SpatialError::InvalidShape(format!(
            "circle needs a center: {}",
            value
        )));
    };
    let center = ctx.make_point(parse_f64(x, value)?, parse_f64(y, value)?)?;

    let rest: String = tokens.collect();
    let radius = match rest.split_once('=') {
        Some((key, dist)) if key == "d" || key == "distance" => parse_f64(dist, value)?,
        _ => {
            return Err(SpatialError::InvalidShape(format!(
                "circle needs d=<radius>: {}",
                value
            )));
        }
    };
    Ok(Shape::Circle(ctx.make_circle(center, radius)?))
}

fn parse_f64(s: &str, whole: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| SpatialError::InvalidShape(format!("bad number '{}' in: {}", s, whole)))
}

/// Render a shape in its text form. Doubles use the shortest exact
/// representation so text round trips losslessly.
pub fn write_shape(shape: &Shape) -> Result<String> {
    match shape {
        Shape::Point(p) => Ok(format!("{} {}", p.x(), p.y())),
        Shape::Rect(r) => Ok(format!(
            "{} {} {} {}",
            r.min_x(),
            r.min_y(),
            r.max_x(),
            r.max_y()
        )),
        Shape::Circle(c) => Ok(format!(
            "Circle({} {} d={})",
            c.center().x(),
            c.center().y(),
            c.radius()
        )),
        Shape::Geometry(g) => Ok(g.geometry().to_wkt()?),
    }
}

/// Encode a shape in the binary format.
pub fn encode_shape(shape: &Shape) -> Result<Bytes> {
    let bytes = match shape {
        Shape::Point(p) => {
            let mut buf = BytesMut::with_capacity(1 + 2 * 8);
            buf.put_u8(TYPE_POINT);
            buf.put_f64(p.x());
            buf.put_f64(p.y());
            buf
        }
        Shape::Rect(r) => {
            let mut buf = BytesMut::with_capacity(1 + 4 * 8);
            buf.put_u8(TYPE_BBOX);
            buf.put_f64(r.min_x());
            buf.put_f64(r.max_x());
            buf.put_f64(r.min_y());
            buf.put_f64(r.max_y());
            buf
        }
        Shape::Circle(c) => {
            let mut buf = BytesMut::with_capacity(1 + 3 * 8);
            buf.put_u8(TYPE_CIRCLE);
            buf.put_f64(c.center().x());
            buf.put_f64(c.center().y());
            buf.put_f64(c.radius());
            buf
        }
        Shape::Geometry(g) => {
            let wkb = g.geometry().to_wkb(CoordDimensions::xy())?;
            let mut buf = BytesMut::with_capacity(1 + wkb.len());
            buf.put_u8(TYPE_GEOMETRY);
            buf.put_slice(&wkb);
            buf
        }
    };
    Ok(bytes.freeze())
}

/// Decode a shape from the binary format.
pub fn decode_shape(bytes: &[u8], ctx: &SpatialContext) -> Result<Shape> {
    let mut buf = bytes;
    if !buf.has_remaining() {
        return Err(SpatialError::InvalidShape("empty shape bytes".to_string()));
    }
    match buf.get_u8() {
        TYPE_POINT => {
            let [x, y] = read_doubles::<2>(&mut buf)?;
            Ok(Shape::Point(geo::Point::new(x, y)))
        }
        TYPE_BBOX => {
            let [min_x, max_x, min_y, max_y] = read_doubles::<4>(&mut buf)?;
            Ok(Shape::Rect(Rectangle::new(min_x, max_x, min_y, max_y)))
        }
        TYPE_CIRCLE => {
            let [x, y, radius] = read_doubles::<3>(&mut buf)?;
            Ok(Shape::Circle(ctx.make_circle(geo::Point::new(x, y), radius)?))
        }
        TYPE_GEOMETRY => {
            let geom = Wkb(buf).to_geo()?;
            Ok(Shape::Geometry(GeometryShape::new(geom)?))
        }
        other => Err(SpatialError::InvalidShape(format!(
            "unknown shape type byte: {}",
            other
        ))),
    }
}

fn read_doubles<const N: usize>(buf: &mut &[u8]) -> Result<[f64; N]> {
    if buf.remaining() < N * 8 {
        return Err(SpatialError::InvalidShape(format!(
            "truncated shape bytes: need {} doubles, have {} bytes",
            N,
            buf.remaining()
        )));
    }
    let mut out = [0.0; N];
    for v in out.iter_mut() {
        *v = buf.get_f64();
    }
    Ok(out)
}

/// Encode a geometry as WKB no larger than `max_bytes`, simplifying it in
/// rounds of growing tolerance when it is too big.
///
/// Fails with [`SpatialError::InvalidShape`] once a round no longer shrinks
/// the payload.
pub fn encode_wkb_bounded(geom: &Geometry<f64>, max_bytes: usize) -> Result<Vec<u8>> {
    let mut wkb = geom.to_wkb(CoordDimensions::xy())?;
    if wkb.len() <= max_bytes {
        return Ok(wkb);
    }

    let envelope = geom
        .bounding_rect()
        .ok_or_else(|| SpatialError::InvalidShape("empty geometry".to_string()))?;
    let min_side = envelope.width().min(envelope.height());
    let mut div = 1000.0;
    let mut last = wkb.len();
    loop {
        let tolerance = min_side / div;
        log::info!(
            "Simplifying long geometry: wkb_len={} tolerance={}",
            wkb.len(),
            tolerance
        );
        wkb = simplify(geom, tolerance).to_wkb(CoordDimensions::xy())?;
        if wkb.len() <= max_bytes {
            return Ok(wkb);
        }
        if wkb.len() >= last {
            return Err(SpatialError::InvalidShape(format!(
                "cannot simplify geometry below {} bytes, stuck at {}",
                max_bytes,
                wkb.len()
            )));
        }
        last = wkb.len();
        div *= 0.7;
    }
}

fn simplify(geom: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    match geom {
        Geometry::LineString(g) => Geometry::LineString(g.simplify(tolerance)),
        Geometry::MultiLineString(g) => Geometry::MultiLineString(g.simplify(tolerance)),
        Geometry::Polygon(g) => Geometry::Polygon(g.simplify(tolerance)),
        Geometry::MultiPolygon(g) => Geometry::MultiPolygon(g.simplify(tolerance)),
        Geometry::GeometryCollection(c) => Geometry::GeometryCollection(GeometryCollection::new_from(
            c.iter().map(|g| simplify(g, tolerance)).collect(),
        )),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use geoprefix_types::units::DistanceUnits;

    fn ctx() -> SpatialContext {
        SpatialContext::geo(DistanceUnits::Kilometers)
    }

    #[test]
    fn test_read_point_and_rect() {
        let ctx = ctx();
        assert_eq!(
            read_shape("10 20", &ctx).unwrap(),
            Shape::Point(geo::Point::new(10.0, 20.0))
        );
        assert_eq!(
            read_shape("-10 -20 10 20", &ctx).unwrap(),
            Shape::Rect(Rectangle::new(-10.0, 10.0, -20.0, 20.0))
        );
        assert!(read_shape("1 2 3", &ctx).is_err());
        assert!(read_shape("", &ctx).is_err());
        assert!(read_shape("1 x", &ctx).is_err());
    }

    #[test]
    fn test_read_circle_forms() {
        let ctx = ctx();
        for text in ["Circle( 1.23 4.56 distance=7.89)", "Circle( 1.23  4.56 d=7.89 )"] {
            let Shape::Circle(c) = read_shape(text, &ctx).unwrap() else {
                panic!("expected a circle from {}", text);
            };
            assert_eq!(c.center(), geo::Point::new(1.23, 4.56));
            assert_eq!(c.radius(), 7.89);
        }
        assert!(read_shape("Circle(1 2)", &ctx).is_err());
        assert!(read_shape("Circle(1 2 r=3)", &ctx).is_err());
    }

    #[test]
    fn test_read_wkt() {
        let ctx = ctx();
        let shape = read_shape("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))", &ctx).unwrap();
        assert!(matches!(shape, Shape::Geometry(_)));
        assert!(shape.has_area());

        let point = read_shape("POINT(3 4)", &ctx).unwrap();
        assert_eq!(point, Shape::Point(geo::Point::new(3.0, 4.0)));

        assert!(matches!(
            read_shape("POLYGON((0 0, 1", &ctx),
            Err(SpatialError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_binary_layout() {
        let bytes = encode_shape(&Shape::Rect(Rectangle::new(1.0, 2.0, 3.0, 4.0))).unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[0], TYPE_BBOX);
        assert_eq!(&bytes[1..9], &1.0f64.to_be_bytes());
        assert_eq!(&bytes[9..17], &2.0f64.to_be_bytes());
    }

    #[test]
    fn test_decode_errors() {
        let ctx = ctx();
        assert!(decode_shape(&[], &ctx).is_err());
        assert!(decode_shape(&[TYPE_POINT, 0, 0], &ctx).is_err());
        assert!(decode_shape(&[9], &ctx).is_err());
    }

    #[test]
    fn test_wkb_bounded_simplifies() {
        // A dense circle-like ring with many nearly collinear vertices.
        let ring: Vec<(f64, f64)> = (0..=4000)
            .map(|i| {
                let a = i as f64 / 4000.0 * std::f64::consts::TAU;
                (a.cos() * 10.0, a.sin() * 10.0)
            })
            .collect();
        let geom = Geometry::Polygon(Polygon::new(LineString::from(ring), vec![]));
        let full = geom.to_wkb(CoordDimensions::xy()).unwrap();
        assert!(full.len() > 32_000);

        let bounded = encode_wkb_bounded(&geom, DEFAULT_MAX_WKB_BYTES).unwrap();
        assert!(bounded.len() <= DEFAULT_MAX_WKB_BYTES);
    }

    #[test]
    fn test_wkb_bounded_fails_when_stuck() {
        let geom = Geometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        ));
        let err = encode_wkb_bounded(&geom, 10).unwrap_err();
        assert!(matches!(err, SpatialError::InvalidShape(_)));
    }
}
