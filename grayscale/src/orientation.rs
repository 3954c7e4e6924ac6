//! Patient orientation of an image plane,
//! derived from _Image Orientation (Patient)_.

/// The minimum direction cosine for a direction
/// to be considered aligned with a patient axis.
pub const OBLIQUITY_THRESHOLD: f64 = 0.8;

/// A principal axis of the patient coordinate system.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum PatientAxis {
    /// right to left (x)
    LeftRight,
    /// anterior to posterior (y)
    AnteriorPosterior,
    /// feet to head (z)
    HeadFeet,
}

/// The anatomical plane closest to an image plane.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum OrientationPlane {
    Axial,
    Coronal,
    Sagittal,
    Oblique,
}

impl std::fmt::Display for OrientationPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OrientationPlane::Axial => "AXIAL",
            OrientationPlane::Coronal => "CORONAL",
            OrientationPlane::Sagittal => "SAGITTAL",
            OrientationPlane::Oblique => "OBLIQUE",
        })
    }
}

/// Find the patient axis which a direction is aligned with, if any.
pub fn major_axis(direction: [f64; 3]) -> Option<PatientAxis> {
    let [x, y, z] = direction.map(f64::abs);
    if x > OBLIQUITY_THRESHOLD && x > y && x > z {
        Some(PatientAxis::LeftRight)
    } else if y > OBLIQUITY_THRESHOLD && y > x && y > z {
        Some(PatientAxis::AnteriorPosterior)
    } else if z > OBLIQUITY_THRESHOLD && z > x && z > y {
        Some(PatientAxis::HeadFeet)
    } else {
        None
    }
}

/// Split the six values of _Image Orientation (Patient)_
/// into the row and column direction cosines.
fn row_and_column(iop: &[f64]) -> Option<([f64; 3], [f64; 3])> {
    match iop {
        [r0, r1, r2, c0, c1, c2] => Some(([*r0, *r1, *r2], [*c0, *c1, *c2])),
        _ => None,
    }
}

/// Label the plane of an image from its orientation.
///
/// Returns `None` if `iop` does not have exactly six values.
pub fn orientation_plane(iop: &[f64]) -> Option<OrientationPlane> {
    let (row, column) = row_and_column(iop)?;
    use PatientAxis::*;
    let plane = match (major_axis(row), major_axis(column)) {
        (Some(LeftRight), Some(AnteriorPosterior)) | (Some(AnteriorPosterior), Some(LeftRight)) => {
            OrientationPlane::Axial
        }
        (Some(LeftRight), Some(HeadFeet)) | (Some(HeadFeet), Some(LeftRight)) => {
            OrientationPlane::Coronal
        }
        (Some(AnteriorPosterior), Some(HeadFeet)) | (Some(HeadFeet), Some(AnteriorPosterior)) => {
            OrientationPlane::Sagittal
        }
        _ => OrientationPlane::Oblique,
    };
    Some(plane)
}

/// The normal of the image plane,
/// as the cross product of the row and column directions.
pub fn normal_vector(iop: &[f64]) -> Option<[f64; 3]> {
    let (r, c) = row_and_column(iop)?;
    Some([
        r[1] * c[2] - r[2] * c[1],
        r[2] * c[0] - r[0] * c[2],
        r[0] * c[1] - r[1] * c[0],
    ])
}

/// The position of a slice along the normal of its plane,
/// per patient axis.
pub fn slice_position(ipp: &[f64], iop: &[f64]) -> Option<[f64; 3]> {
    let position: [f64; 3] = ipp.try_into().ok()?;
    let normal = normal_vector(iop)?;
    Some([
        normal[0] * position[0],
        normal[1] * position[1],
        normal[2] * position[2],
    ])
}
