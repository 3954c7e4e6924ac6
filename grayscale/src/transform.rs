//! Descriptions of the grayscale transformation stages
//! which are not look-up tables.

use snafu::Snafu;

/// The linear function of the modality stage,
/// `slope * value + intercept`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rescale {
    /// _Rescale Slope_
    pub slope: f64,
    /// _Rescale Intercept_
    pub intercept: f64,
}

impl Rescale {
    #[inline]
    pub fn new(slope: f64, intercept: f64) -> Self {
        Rescale { slope, intercept }
    }

    /// Map a stored value to its modality value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value.mul_add(self.slope, self.intercept)
    }
}

impl Default for Rescale {
    /// The identity function.
    fn default() -> Self {
        Rescale::new(1., 0.)
    }
}

/// The _VOI LUT Function_ applied to the window levels.
#[derive(Debug, Copy, Clone, Default, Eq, Hash, PartialEq)]
pub enum VoiLutFunction {
    /// LINEAR
    #[default]
    Linear,
    /// LINEAR_EXACT
    LinearExact,
    /// SIGMOID
    Sigmoid,
}

/// The VOI LUT Function is not one of the defined terms
#[derive(Debug, Copy, Clone, PartialEq, Snafu)]
pub struct FromVoiLutFunctionError {
    _private: (),
}

impl std::convert::TryFrom<&str> for VoiLutFunction {
    type Error = FromVoiLutFunctionError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim() {
            "LINEAR" => Ok(Self::Linear),
            "LINEAR_EXACT" => Ok(Self::LinearExact),
            "SIGMOID" => Ok(Self::Sigmoid),
            _ => Err(FromVoiLutFunctionError { _private: () }),
        }
    }
}

impl std::fmt::Display for VoiLutFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VoiLutFunction::Linear => "LINEAR",
            VoiLutFunction::LinearExact => "LINEAR_EXACT",
            VoiLutFunction::Sigmoid => "SIGMOID",
        })
    }
}

/// The shape of the presentation LUT,
/// applied when no explicit Presentation LUT Sequence is given.
#[derive(Debug, Copy, Clone, Default, Eq, Hash, PartialEq)]
pub enum PresentationLutShape {
    /// IDENTITY: output values are kept as is
    #[default]
    Identity,
    /// INVERSE: output values are inverted,
    /// as in the MONOCHROME1 photometric interpretation
    Inverse,
}

impl PresentationLutShape {
    /// Whether the output should be inverted.
    #[inline]
    pub fn is_inverse(self) -> bool {
        self == PresentationLutShape::Inverse
    }
}

/// The Presentation LUT Shape is not one of the defined terms
#[derive(Debug, Copy, Clone, PartialEq, Snafu)]
pub struct FromPresentationLutShapeError {
    _private: (),
}

impl std::convert::TryFrom<&str> for PresentationLutShape {
    type Error = FromPresentationLutShapeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim() {
            "IDENTITY" => Ok(Self::Identity),
            "INVERSE" => Ok(Self::Inverse),
            _ => Err(FromPresentationLutShapeError { _private: () }),
        }
    }
}

impl std::fmt::Display for PresentationLutShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PresentationLutShape::Identity => "IDENTITY",
            PresentationLutShape::Inverse => "INVERSE",
        })
    }
}

/// One window of the VOI stage.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WindowLevel {
    /// _Window Width_, expected to be positive
    pub width: f64,
    /// _Window Center_
    pub center: f64,
}

/// Pair up window centers and widths.
///
/// Each pair is an alternative view of the same image.
/// Unpaired trailing values are left out.
pub fn window_levels(centers: &[f64], widths: &[f64]) -> Vec<WindowLevel> {
    centers
        .iter()
        .zip(widths)
        .map(|(&center, &width)| WindowLevel { width, center })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn rescale_defaults_to_identity() {
        let rescale = Rescale::default();
        assert_eq!(rescale.apply(42.), 42.);
        assert_eq!(Rescale::new(2., -100.).apply(10.), -80.);
    }

    #[test]
    fn parse_function_names() {
        assert_eq!(
            VoiLutFunction::try_from("LINEAR_EXACT"),
            Ok(VoiLutFunction::LinearExact)
        );
        assert_eq!(
            VoiLutFunction::try_from("SIGMOID "),
            Ok(VoiLutFunction::Sigmoid)
        );
        assert!(VoiLutFunction::try_from("LOG").is_err());

        assert_eq!(
            PresentationLutShape::try_from("INVERSE"),
            Ok(PresentationLutShape::Inverse)
        );
        assert!(PresentationLutShape::try_from("LIN OD").is_err());
        assert!(!PresentationLutShape::default().is_inverse());
    }

    #[test]
    fn unpaired_windows_are_left_out() {
        let levels = window_levels(&[40., 400.], &[350.]);
        assert_eq!(
            levels,
            vec![WindowLevel {
                center: 40.,
                width: 350.
            }]
        );
    }
}
