//! Structured reports of inconsistent or unusable attribute groups.
//!
//! None of these stop the resolution of the pipeline:
//! the offending group is either skipped or applied as is,
//! and a [`Diagnostic`] is recorded so that the caller
//! can decide whether to surface it.

use dicom_core::Tag;
use snafu::Snafu;

use crate::lut::{LutIssue, ReadLutError};

/// The stage of the grayscale pipeline which a LUT belongs to.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum LutStage {
    /// the Modality LUT
    Modality,
    /// an item of the VOI LUT Sequence
    Voi(usize),
    /// the Presentation LUT
    Presentation,
}

impl std::fmt::Display for LutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LutStage::Modality => f.write_str("Modality LUT"),
            LutStage::Voi(index) => write!(f, "VOI LUT [{}]", index),
            LutStage::Presentation => f.write_str("Presentation LUT"),
        }
    }
}

/// A requirement of the SUV factor computation which was not met.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum SuvRequirement {
    /// a nonzero Patient Weight
    PatientWeight,
    /// the Radiopharmaceutical Information Sequence item
    RadiopharmaceuticalInformation,
    /// the Radionuclide Total Dose
    TotalDose,
    /// the Radionuclide Half Life
    HalfLife,
    /// a Decay Correction of `START`
    DecayCorrectionStart,
    /// the Acquisition Date and Time
    AcquisitionDateTime,
    /// the Series Date and Time
    SeriesDateTime,
    /// the injection date-time, or the Series Date with the injection time
    InjectionDateTime,
    /// the GE private scan date-time, when the series was reassigned
    PrivateScanDateTime,
    /// a positive decay time
    PositiveDecayTime,
    /// the Philips private SUV scale factor
    PrivateSuvFactor,
}

impl std::fmt::Display for SuvRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SuvRequirement::PatientWeight => "patient weight",
            SuvRequirement::RadiopharmaceuticalInformation => "radiopharmaceutical information",
            SuvRequirement::TotalDose => "radionuclide total dose",
            SuvRequirement::HalfLife => "radionuclide half life",
            SuvRequirement::DecayCorrectionStart => "decay correction from START",
            SuvRequirement::AcquisitionDateTime => "acquisition date-time",
            SuvRequirement::SeriesDateTime => "series date-time",
            SuvRequirement::InjectionDateTime => "injection date-time",
            SuvRequirement::PrivateScanDateTime => "private scan date-time",
            SuvRequirement::PositiveDecayTime => "positive decay time",
            SuvRequirement::PrivateSuvFactor => "private SUV scale factor",
        })
    }
}

/// A non-fatal issue found while resolving the grayscale pipeline.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[non_exhaustive]
pub enum Diagnostic {
    #[snafu(display("Cannot build {}", stage))]
    InvalidLut { stage: LutStage, source: ReadLutError },

    #[snafu(display("Inconsistent {}: {}", stage, issue))]
    InconsistentLut { stage: LutStage, issue: LutIssue },

    #[snafu(display(
        "Modality LUT Sequence shall not be applied to {} with Pixel Intensity Relationship {}",
        modality,
        relationship
    ))]
    ModalityLutSuppressed {
        modality: String,
        relationship: String,
    },

    #[snafu(display("Modality LUT Sequence shall not be present if Rescale Intercept is present"))]
    ModalityLutWithRescale,

    #[snafu(display("Modality LUT Type is required if Modality LUT Sequence is present"))]
    MissingModalityLutType,

    #[snafu(display("Rescale Slope is required if Rescale Intercept is present"))]
    MissingRescaleSlope,

    #[snafu(display("Rescale Type is required if Rescale Intercept is present"))]
    MissingRescaleType,

    #[snafu(display("Rescale Intercept is required if Modality LUT Sequence is not present"))]
    MissingModalityTransform,

    #[snafu(display("Cannot apply Modality LUT from {} with inconsistent attributes", parent))]
    InconsistentModalityGroup { parent: Tag },

    #[snafu(display("Cannot read VOI LUT Data [{}]", index))]
    MissingVoiLutData { index: usize },

    #[snafu(display("Window Center is required if Window Width is present"))]
    MissingWindowCenter,

    #[snafu(display("Window Width is required if Window Center is present"))]
    MissingWindowWidth,

    #[snafu(display(
        "Window Center and Width have different number of values: {} // {}",
        centers,
        widths
    ))]
    WindowLengthMismatch { centers: usize, widths: usize },

    #[snafu(display("Unknown VOI LUT Function {:?}", value))]
    UnknownVoiLutFunction { value: String },

    #[snafu(display("Unknown Presentation LUT Shape {:?}", value))]
    UnknownPresentationLutShape { value: String },

    #[snafu(display("Cannot compute SUV factor without {}", missing))]
    SuvUnavailable { missing: SuvRequirement },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_are_readable() {
        let d = Diagnostic::InconsistentModalityGroup {
            parent: Tag(0x0028, 0x9145),
        };
        assert_eq!(
            d.to_string(),
            "Cannot apply Modality LUT from (0028,9145) with inconsistent attributes"
        );

        let d = Diagnostic::InvalidLut {
            stage: LutStage::Voi(1),
            source: ReadLutError::MissingData,
        };
        assert_eq!(d.to_string(), "Cannot build VOI LUT [1]");
        assert!(std::error::Error::source(&d).is_some());

        let d = Diagnostic::SuvUnavailable {
            missing: SuvRequirement::HalfLife,
        };
        assert_eq!(
            d.to_string(),
            "Cannot compute SUV factor without radionuclide half life"
        );
    }
}
