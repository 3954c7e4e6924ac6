//! VOI LUT module (PS3.3 C.11.2).
//!
//! Window levels and VOI LUT Sequence items may coexist,
//! each one describing an alternative view of the image.
//! Choosing which one to apply is left to the renderer.

use std::convert::TryFrom;

use dicom_core::{DataDictionary, Tag};

use crate::attribute::DataSet;
use crate::diagnostic::{Diagnostic, LutStage};
use crate::lut::LookupTable;
use crate::pipeline::{set_if_present, ImageAttributes, PipelineBuilder, VoiLut};
use crate::tags;
use crate::transform::VoiLutFunction;

/// The attributes required to apply a window level.
pub const WINDOW_ATTRIBUTES: [Tag; 2] = [tags::WINDOW_CENTER, tags::WINDOW_WIDTH];

/// The attributes required in a LUT item.
pub const LUT_ATTRIBUTES: [Tag; 2] = [tags::LUT_DESCRIPTOR, tags::LUT_DATA];

/// Read the VOI stage from a data set,
/// or from a Frame VOI LUT functional group
/// or Softcopy VOI LUT item identified by `parent`.
///
/// Window attributes only override previous values
/// if both the center and the width are present.
/// VOI LUT items are collected here,
/// to be built by [`PipelineBuilder::build`].
pub fn apply_voi_lut_module<'a, D>(
    scope: &DataSet<'a, D>,
    builder: &mut PipelineBuilder<'a, D>,
    parent: Option<Tag>,
) where
    D: DataDictionary + Clone,
{
    if scope.contains_all(&WINDOW_ATTRIBUTES) {
        let function = scope.string(tags::VOILUT_FUNCTION).and_then(|value| {
            match VoiLutFunction::try_from(value.as_str()) {
                Ok(function) => Some(function),
                Err(_) => {
                    builder.report(Diagnostic::UnknownVoiLutFunction { value });
                    None
                }
            }
        });
        let attrs = &mut builder.attrs;
        set_if_present(&mut attrs.window_width, scope.floats(tags::WINDOW_WIDTH));
        set_if_present(&mut attrs.window_center, scope.floats(tags::WINDOW_CENTER));
        set_if_present(
            &mut attrs.window_explanation,
            scope.strings(tags::WINDOW_CENTER_WIDTH_EXPLANATION),
        );
        set_if_present(&mut attrs.voi_lut_function, function);
    }
    // incomplete groups are tolerated without a diagnostic

    if let Some(items) = scope.items(tags::VOILUT_SEQUENCE) {
        if let Some(parent) = parent {
            tracing::trace!("{} VOI LUT items from {}", items.len(), parent);
        }
        builder.voi_lut_items = Some(items);
    }
}

/// Determine whether the output of the modality stage can be negative,
/// which is the case for the input of the VOI stage.
///
/// With a Modality LUT, this is the sign of the entry
/// mapping the smallest image pixel value, clamped into the table.
/// Otherwise, this is the sign of the rescaled smallest image pixel value.
/// The pixel representation is used when neither is negative.
pub fn modality_output_signed(attrs: &ImageAttributes) -> bool {
    let smallest = attrs.smallest_image_pixel_value.unwrap_or(0);
    let negative = match &attrs.modality_lut {
        Some(lut) => lut.lookup(smallest).map_or(false, |v| v < 0),
        None => attrs.rescale().apply(smallest as f64) < 0.,
    };
    negative || attrs.pixel_representation.is_signed()
}

/// Build the collected VOI LUTs
/// and check the consistency of the window attributes.
pub(crate) fn materialize<'a, D>(
    builder: &mut PipelineBuilder<'a, D>,
    items: Option<Vec<DataSet<'a, D>>>,
    signed: bool,
) where
    D: DataDictionary + Clone,
{
    if let Some(items) = items {
        let mut luts = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if item.contains_all(&LUT_ATTRIBUTES) {
                luts.push(VoiLut {
                    lut: builder.build_lut(item, signed, LutStage::Voi(index)),
                    explanation: item.string(tags::LUT_EXPLANATION),
                });
            } else {
                builder.report(Diagnostic::MissingVoiLutData { index });
                luts.push(VoiLut {
                    lut: None,
                    explanation: None,
                });
            }
        }
        builder.attrs.voi_luts = Some(luts);
    }

    let issue = match (&builder.attrs.window_center, &builder.attrs.window_width) {
        (None, Some(_)) => Some(Diagnostic::MissingWindowCenter),
        (Some(_), None) => Some(Diagnostic::MissingWindowWidth),
        (Some(centers), Some(widths)) if centers.len() != widths.len() => {
            Some(Diagnostic::WindowLengthMismatch {
                centers: centers.len(),
                widths: widths.len(),
            })
        }
        _ => None,
    };
    if let Some(issue) = issue {
        builder.report(issue);
    }
}

/// Collect the VOI LUTs which could be built.
pub fn available_luts(attrs: &ImageAttributes) -> Vec<&LookupTable> {
    attrs
        .voi_luts
        .iter()
        .flatten()
        .filter_map(|voi| voi.lut.as_ref())
        .collect()
}
