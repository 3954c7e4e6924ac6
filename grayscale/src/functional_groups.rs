//! Multi-frame functional group macros (PS3.3 C.7.6.16).
//!
//! The Shared Functional Groups Sequence applies to all frames,
//! the Per-frame Functional Groups Sequence holds one item per frame.
//! Both are resolved in the same way,
//! the per-frame item being applied last.

use dicom_core::{DataDictionary, Tag};

use crate::attribute::DataSet;
use crate::pipeline::{set_if_present, PipelineBuilder};
use crate::{modality, shutter, tags, voi};

/// The modality specific frame type macros,
/// in the order in which they are looked up.
pub const FRAME_TYPE_SEQUENCES: [Tag; 4] = [
    tags::MR_IMAGE_FRAME_TYPE_SEQUENCE,
    tags::CT_IMAGE_FRAME_TYPE_SEQUENCE,
    tags::MR_SPECTROSCOPY_FRAME_TYPE_SEQUENCE,
    tags::PET_FRAME_TYPE_SEQUENCE,
];

/// Apply the macros of a functional groups item.
///
/// Macros are resolved in a fixed order,
/// each one only overriding the attributes it provides.
pub fn write_functional_groups<'a, D>(group: &DataSet<'a, D>, builder: &mut PipelineBuilder<'a, D>)
where
    D: DataDictionary + Clone,
{
    if let Some(macro_item) = group.item(tags::PIXEL_MEASURES_SEQUENCE) {
        let attrs = &mut builder.attrs;
        set_if_present(&mut attrs.pixel_spacing, macro_item.floats(tags::PIXEL_SPACING));
        set_if_present(&mut attrs.slice_thickness, macro_item.float(tags::SLICE_THICKNESS));
    }

    if let Some(macro_item) = group.item(tags::FRAME_CONTENT_SEQUENCE) {
        let attrs = &mut builder.attrs;
        set_if_present(
            &mut attrs.frame_acquisition_number,
            macro_item.int(tags::FRAME_ACQUISITION_NUMBER),
        );
        set_if_present(&mut attrs.stack_id, macro_item.string(tags::STACK_ID));
        set_if_present(
            &mut attrs.instance_number,
            macro_item.int(tags::IN_STACK_POSITION_NUMBER),
        );
    }

    if let Some(macro_item) = group.item(tags::PLANE_POSITION_SEQUENCE) {
        set_if_present(
            &mut builder.attrs.image_position,
            macro_item.floats(tags::IMAGE_POSITION_PATIENT),
        );
    }

    if let Some(macro_item) = group.item(tags::PLANE_ORIENTATION_SEQUENCE) {
        builder.set_image_orientation(macro_item.floats(tags::IMAGE_ORIENTATION_PATIENT));
    }

    if let Some(macro_item) = group.item(tags::FRAME_ANATOMY_SEQUENCE) {
        set_if_present(
            &mut builder.attrs.image_laterality,
            macro_item.string(tags::FRAME_LATERALITY),
        );
    }

    if let Some(macro_item) = group.item(tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE) {
        modality::apply_modality_lut_module(
            &macro_item,
            builder,
            Some(tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE),
        );
    }

    if let Some(macro_item) = group.item(tags::FRAME_VOILUT_SEQUENCE) {
        voi::apply_voi_lut_module(&macro_item, builder, Some(tags::FRAME_VOILUT_SEQUENCE));
    }

    if let Some(macro_item) = group.item(tags::FRAME_DISPLAY_SHUTTER_SEQUENCE) {
        let segments = builder.options.ellipse_segments;
        set_if_present(
            &mut builder.attrs.shutter,
            shutter::read_shutter(&macro_item, segments),
        );
    }

    let frame_type = FRAME_TYPE_SEQUENCES
        .iter()
        .find_map(|tag| group.item(*tag))
        .and_then(|macro_item| macro_item.string(tags::FRAME_TYPE));
    set_if_present(&mut builder.attrs.frame_type, frame_type);
}

/// Apply the Shared Functional Groups Sequence of a data set, if any.
pub fn write_shared_functional_groups<'a, D>(ds: &DataSet<'a, D>, builder: &mut PipelineBuilder<'a, D>)
where
    D: DataDictionary + Clone,
{
    if let Some(group) = ds.item(tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE) {
        write_functional_groups(&group, builder);
    }
}

/// Apply the item of the Per-frame Functional Groups Sequence
/// for the given frame.
///
/// Returns `false` if there is no such item.
pub fn write_per_frame_functional_groups<'a, D>(
    ds: &DataSet<'a, D>,
    builder: &mut PipelineBuilder<'a, D>,
    frame: usize,
) -> bool
where
    D: DataDictionary + Clone,
{
    match ds.item_at(tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE, frame) {
        Some(group) => {
            write_functional_groups(&group, builder);
            true
        }
        None => false,
    }
}
