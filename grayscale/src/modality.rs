//! Modality LUT module (PS3.3 C.11.1).
//!
//! The modality stage is either a rescale function
//! or a Modality LUT Sequence holding a single item,
//! but never validly both.

use dicom_core::{DataDictionary, Tag};

use crate::attribute::DataSet;
use crate::diagnostic::{Diagnostic, LutStage};
use crate::pipeline::{set_if_present, PipelineBuilder};
use crate::tags;

/// The attributes required to apply a rescale function.
pub const RESCALE_ATTRIBUTES: [Tag; 2] = [tags::RESCALE_INTERCEPT, tags::RESCALE_SLOPE];

/// The attributes required in a Modality LUT Sequence item.
pub const MODALITY_LUT_ATTRIBUTES: [Tag; 3] =
    [tags::MODALITY_LUT_TYPE, tags::LUT_DESCRIPTOR, tags::LUT_DATA];

/// Read the modality stage from a data set,
/// or from a Pixel Value Transformation functional group
/// identified by `parent`.
///
/// The rescale function only overrides previous values
/// if both the intercept and the slope are present.
/// The Modality LUT is only collected here,
/// to be built by [`PipelineBuilder::build`].
pub fn apply_modality_lut_module<'a, D>(
    scope: &DataSet<'a, D>,
    builder: &mut PipelineBuilder<'a, D>,
    parent: Option<Tag>,
) where
    D: DataDictionary + Clone,
{
    if scope.contains_all(&RESCALE_ATTRIBUTES) {
        let attrs = &mut builder.attrs;
        set_if_present(&mut attrs.rescale_slope, scope.float(tags::RESCALE_SLOPE));
        set_if_present(
            &mut attrs.rescale_intercept,
            scope.float(tags::RESCALE_INTERCEPT),
        );
        set_if_present(&mut attrs.rescale_type, scope.string(tags::RESCALE_TYPE));
    } else if let Some(parent) = parent {
        builder.report(Diagnostic::InconsistentModalityGroup { parent });
    }

    if let Some(item) = scope.item(tags::MODALITY_LUT_SEQUENCE) {
        if item.contains_all(&MODALITY_LUT_ATTRIBUTES) {
            builder.modality_lut_item = Some(item);
        }
    }
}

/// Whether a Modality LUT must not be applied
/// because of the pixel intensity relationship of an X-Ray image
/// (PS3.4 N.2.1.2).
pub fn is_modality_lut_suppressed(modality: &str, pixel_intensity_relationship: Option<&str>) -> bool {
    matches!(modality, "XA" | "XRF")
        && pixel_intensity_relationship.map_or(false, |rel| {
            rel.eq_ignore_ascii_case("LOG") || rel.eq_ignore_ascii_case("DISP")
        })
}

/// Build the collected Modality LUT
/// and check the consistency of the modality stage.
pub(crate) fn materialize<'a, D>(builder: &mut PipelineBuilder<'a, D>, item: Option<DataSet<'a, D>>)
where
    D: DataDictionary + Clone,
{
    if let Some(item) = item {
        let relationship = builder.attrs.pixel_intensity_relationship.clone();
        if is_modality_lut_suppressed(&builder.attrs.modality, relationship.as_deref()) {
            let modality = builder.attrs.modality.clone();
            builder.report(Diagnostic::ModalityLutSuppressed {
                modality,
                relationship: relationship.unwrap_or_default(),
            });
        } else {
            let signed = builder.attrs.pixel_representation.is_signed();
            let lut = builder.build_lut(&item, signed, LutStage::Modality);
            let attrs = &mut builder.attrs;
            set_if_present(&mut attrs.modality_lut, lut);
            set_if_present(
                &mut attrs.modality_lut_type,
                item.string(tags::MODALITY_LUT_TYPE),
            );
            set_if_present(
                &mut attrs.modality_lut_explanation,
                item.string(tags::LUT_EXPLANATION),
            );
        }
    }

    let attrs = &builder.attrs;
    let mut issues = Vec::new();
    if attrs.modality_lut.is_some() {
        if attrs.rescale_intercept.is_some() {
            issues.push(Diagnostic::ModalityLutWithRescale);
        }
        if attrs.modality_lut_type.is_none() {
            issues.push(Diagnostic::MissingModalityLutType);
        }
    } else if attrs.rescale_intercept.is_some() {
        if attrs.rescale_slope.is_none() {
            issues.push(Diagnostic::MissingRescaleSlope);
        } else if attrs.rescale_type.is_none() {
            issues.push(Diagnostic::MissingRescaleType);
        }
    } else {
        issues.push(Diagnostic::MissingModalityTransform);
    }
    for issue in issues {
        builder.report(issue);
    }
}
