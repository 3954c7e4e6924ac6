//! Display shutter module (PS3.3 C.7.6.11).
//!
//! The shutter is the region of the image left visible,
//! in pixel coordinates where `x` is the column and `y` the row.
//! Several shapes may be named at once,
//! in which case the region is their intersection.

use std::f64::consts::PI;

use dicom_core::DataDictionary;
use geo::{BooleanOps, LineString, MultiPolygon, Polygon, Rect};

use crate::attribute::DataSet;
use crate::color::{dicom_lab_to_rgb, Rgb};
use crate::tags;

/// A primitive shutter shape.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ShutterShape {
    Rectangular,
    Circular,
    Polygonal,
}

/// The order in which shutter shapes are intersected.
pub const SHUTTER_SHAPES: [ShutterShape; 3] = [
    ShutterShape::Rectangular,
    ShutterShape::Circular,
    ShutterShape::Polygonal,
];

impl ShutterShape {
    /// Whether this shape is named in a _Shutter Shape_ value.
    pub fn is_named_in(self, shutter_shape: &str) -> bool {
        match self {
            // RECTANGLE is not standard, but found in the wild
            ShutterShape::Rectangular => {
                shutter_shape.contains("RECTANGULAR") || shutter_shape.contains("RECTANGLE")
            }
            ShutterShape::Circular => shutter_shape.contains("CIRCULAR"),
            ShutterShape::Polygonal => shutter_shape.contains("POLYGONAL"),
        }
    }

    /// Build the region of this shape from its attributes.
    ///
    /// Returns `None` if the attributes defining the shape are missing.
    pub fn region<D>(self, scope: &DataSet<'_, D>, ellipse_segments: usize) -> Option<MultiPolygon<f64>>
    where
        D: DataDictionary + Clone,
    {
        match self {
            ShutterShape::Rectangular => {
                let edge = |tag| scope.int(tag).unwrap_or(0) as f64;
                let rect = Rect::new(
                    (
                        edge(tags::SHUTTER_LEFT_VERTICAL_EDGE),
                        edge(tags::SHUTTER_UPPER_HORIZONTAL_EDGE),
                    ),
                    (
                        edge(tags::SHUTTER_RIGHT_VERTICAL_EDGE),
                        edge(tags::SHUTTER_LOWER_HORIZONTAL_EDGE),
                    ),
                );
                Some(MultiPolygon::new(vec![rect.to_polygon()]))
            }
            ShutterShape::Circular => {
                let center = scope.ints(tags::CENTER_OF_CIRCULAR_SHUTTER)?;
                let (row, column) = match center.as_slice() {
                    [row, column, ..] => (*row as f64, *column as f64),
                    _ => return None,
                };
                let radius = scope.int(tags::RADIUS_OF_CIRCULAR_SHUTTER).unwrap_or(0) as f64;
                Some(MultiPolygon::new(vec![circle(
                    column,
                    row,
                    radius,
                    ellipse_segments,
                )]))
            }
            ShutterShape::Polygonal => {
                let points = scope.ints(tags::VERTICES_OF_THE_POLYGONAL_SHUTTER)?;
                // vertices are given as (row, column) pairs
                let vertices: Vec<(f64, f64)> = points
                    .chunks_exact(2)
                    .map(|pair| (pair[1] as f64, pair[0] as f64))
                    .collect();
                if vertices.len() < 3 {
                    // nothing can be seen through a degenerate polygon
                    return Some(MultiPolygon::new(Vec::new()));
                }
                Some(MultiPolygon::new(vec![Polygon::new(
                    LineString::from(vertices),
                    Vec::new(),
                )]))
            }
        }
    }
}

/// Approximate a circle with a regular polygon.
fn circle(cx: f64, cy: f64, radius: f64, segments: usize) -> Polygon<f64> {
    let segments = segments.max(3);
    let vertices: Vec<(f64, f64)> = (0..segments)
        .map(|i| {
            let angle = 2. * PI * i as f64 / segments as f64;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect();
    Polygon::new(LineString::from(vertices), Vec::new())
}

/// Build the shutter region named by _Shutter Shape_,
/// intersecting the shapes in the order of [`SHUTTER_SHAPES`].
///
/// Returns `None` if there is no shutter.
pub fn build_shutter_region<D>(scope: &DataSet<'_, D>, ellipse_segments: usize) -> Option<MultiPolygon<f64>>
where
    D: DataDictionary + Clone,
{
    let shutter_shape = scope.string(tags::SHUTTER_SHAPE)?;
    SHUTTER_SHAPES
        .iter()
        .filter(|shape| shape.is_named_in(&shutter_shape))
        .filter_map(|shape| shape.region(scope, ellipse_segments))
        .fold(None, |region, next| match region {
            None => Some(next),
            Some(region) => Some(region.intersection(&next)),
        })
}

/// A display shutter.
#[derive(Debug, Clone, PartialEq)]
pub struct Shutter {
    /// the visible region
    pub region: MultiPolygon<f64>,
    /// the gray level of the occluded area, in P-values
    pub presentation_value: Option<i32>,
    /// the color of the occluded area
    pub color: Option<Rgb>,
}

/// Read a display shutter with its presentation value and color.
pub fn read_shutter<D>(scope: &DataSet<'_, D>, ellipse_segments: usize) -> Option<Shutter>
where
    D: DataDictionary + Clone,
{
    let region = build_shutter_region(scope, ellipse_segments)?;
    Some(Shutter {
        region,
        presentation_value: scope.int(tags::SHUTTER_PRESENTATION_VALUE),
        color: scope
            .ints(tags::SHUTTER_PRESENTATION_COLOR_CIE_LAB_VALUE)
            .and_then(|lab| dicom_lab_to_rgb(&lab)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{dicom_value, DataElement, VR};
    use dicom_object::InMemDicomObject;
    use geo::{Area, BoundingRect, Contains, Point};

    fn rectangle_elements(shape: &str) -> Vec<DataElement<InMemDicomObject>> {
        vec![
            DataElement::new(tags::SHUTTER_SHAPE, VR::CS, dicom_value!(Str, shape)),
            DataElement::new(tags::SHUTTER_LEFT_VERTICAL_EDGE, VR::IS, dicom_value!(Str, "10")),
            DataElement::new(tags::SHUTTER_RIGHT_VERTICAL_EDGE, VR::IS, dicom_value!(Str, "110")),
            DataElement::new(tags::SHUTTER_UPPER_HORIZONTAL_EDGE, VR::IS, dicom_value!(Str, "20")),
            DataElement::new(tags::SHUTTER_LOWER_HORIZONTAL_EDGE, VR::IS, dicom_value!(Str, "120")),
        ]
    }

    #[test]
    fn rectangle_covers_its_edges() {
        let obj = InMemDicomObject::from_element_iter(rectangle_elements("RECTANGULAR"));
        let region = build_shutter_region(&DataSet::new(&obj), 64).unwrap();
        let bounds = region.bounding_rect().unwrap();
        assert_eq!(bounds.min().x, 10.);
        assert_eq!(bounds.min().y, 20.);
        assert_eq!(bounds.max().x, 110.);
        assert_eq!(bounds.max().y, 120.);
        assert_eq!(region.unsigned_area(), 10_000.);
    }

    #[test]
    fn shapes_are_intersected() {
        let mut elements = rectangle_elements("RECTANGULAR\\CIRCULAR");
        elements.extend([
            // row 70, column 110
            DataElement::new(tags::CENTER_OF_CIRCULAR_SHUTTER, VR::IS, dicom_value!(Strs, ["70", "110"])),
            DataElement::new(tags::RADIUS_OF_CIRCULAR_SHUTTER, VR::IS, dicom_value!(Str, "50")),
        ]);
        let obj = InMemDicomObject::from_element_iter(elements);
        let region = build_shutter_region(&DataSet::new(&obj), 64).unwrap();

        // in both
        assert!(region.contains(&Point::new(90., 70.)));
        // in the rectangle only
        assert!(!region.contains(&Point::new(30., 70.)));
        // in the circle only
        assert!(!region.contains(&Point::new(130., 70.)));

        // half of the 64-gon inscribed in the circle
        let half_circle = 32. * 2500. * (2. * PI / 64.).sin() / 2.;
        assert!((region.unsigned_area() - half_circle).abs() < 1.);
    }

    #[test]
    fn polygon_vertices_are_row_column_pairs() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(tags::SHUTTER_SHAPE, VR::CS, dicom_value!(Str, "POLYGONAL")),
            DataElement::new(
                tags::VERTICES_OF_THE_POLYGONAL_SHUTTER,
                VR::IS,
                dicom_value!(Strs, ["0", "0", "0", "200", "50", "200", "50", "0"]),
            ),
            DataElement::new(tags::SHUTTER_PRESENTATION_VALUE, VR::US, dicom_value!(U16, [0xFFFF])),
        ]);
        let shutter = read_shutter(&DataSet::new(&obj), 64).unwrap();
        let bounds = shutter.region.bounding_rect().unwrap();
        assert_eq!(bounds.width(), 200.);
        assert_eq!(bounds.height(), 50.);
        assert_eq!(shutter.presentation_value, Some(0xFFFF));
        assert_eq!(shutter.color, None);
    }

    #[test]
    fn no_shutter_without_shape() {
        let obj = InMemDicomObject::from_element_iter([DataElement::new(
            tags::SHUTTER_LEFT_VERTICAL_EDGE,
            VR::IS,
            dicom_value!(Str, "10"),
        )]);
        assert_eq!(build_shutter_region(&DataSet::new(&obj), 64), None);

        // a circle needs its center
        let obj = InMemDicomObject::from_element_iter([DataElement::new(
            tags::SHUTTER_SHAPE,
            VR::CS,
            dicom_value!(Str, "CIRCULAR"),
        )]);
        assert_eq!(build_shutter_region(&DataSet::new(&obj), 64), None);
    }
}
