//! Softcopy Presentation LUT module (PS3.3 C.11.6)
//! and presentation state LUT modules.

use std::convert::TryFrom;

use dicom_core::DataDictionary;
use dicom_dictionary_std::uids;

use crate::attribute::DataSet;
use crate::diagnostic::{Diagnostic, LutStage};
use crate::pipeline::{set_if_present, PipelineBuilder};
use crate::transform::PresentationLutShape;
use crate::{modality, tags, voi};

/// Read the presentation stage from a data set.
///
/// The Presentation LUT Sequence is preferred,
/// otherwise the Presentation LUT Shape is used.
/// Either one replaces whatever stage an earlier scope had set.
pub fn apply_presentation_lut_module<'a, D>(scope: &DataSet<'a, D>, builder: &mut PipelineBuilder<'a, D>)
where
    D: DataDictionary + Clone,
{
    if let Some(item) = scope.item(tags::PRESENTATION_LUT_SEQUENCE) {
        builder.presentation_lut_item = Some(item);
        builder.attrs.presentation_lut_shape = None;
    } else if let Some(value) = scope.string(tags::PRESENTATION_LUT_SHAPE) {
        match PresentationLutShape::try_from(value.as_str()) {
            Ok(shape) => {
                builder.attrs.presentation_lut_shape = Some(shape);
                builder.presentation_lut_item = None;
            }
            Err(_) => builder.report(Diagnostic::UnknownPresentationLutShape { value }),
        }
    }
}

/// Read the LUT modules of a grayscale softcopy presentation state:
/// its modality stage,
/// its VOI stage from the first Softcopy VOI LUT Sequence item,
/// and its presentation stage.
///
/// The presentation stage is only read for
/// Grayscale Softcopy Presentation State Storage objects.
pub fn read_presentation_state<'a, D>(ds: &DataSet<'a, D>, builder: &mut PipelineBuilder<'a, D>)
where
    D: DataDictionary + Clone,
{
    modality::apply_modality_lut_module(ds, builder, None);

    if let Some(item) = ds.item(tags::SOFTCOPY_VOILUT_SEQUENCE) {
        voi::apply_voi_lut_module(&item, builder, Some(tags::SOFTCOPY_VOILUT_SEQUENCE));
    }

    let sop_class = ds.string(tags::SOP_CLASS_UID);
    if sop_class.as_deref() == Some(uids::GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE) {
        apply_presentation_lut_module(ds, builder);
    }
}

/// Build the collected Presentation LUT.
pub(crate) fn materialize<'a, D>(builder: &mut PipelineBuilder<'a, D>, item: Option<DataSet<'a, D>>)
where
    D: DataDictionary + Clone,
{
    if let Some(item) = item {
        // always unsigned
        let lut = builder.build_lut(&item, false, LutStage::Presentation);
        set_if_present(&mut builder.attrs.presentation_lut, lut);
        set_if_present(
            &mut builder.attrs.presentation_lut_explanation,
            item.string(tags::LUT_EXPLANATION),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ResolveOptions;
    use dicom_core::value::{DataSetSequence, PrimitiveValue};
    use dicom_core::{dicom_value, DataElement, VR};
    use dicom_object::InMemDicomObject;

    fn gsps_object(extra: Vec<DataElement<InMemDicomObject>>) -> InMemDicomObject {
        let mut obj = InMemDicomObject::from_element_iter([DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            dicom_value!(Str, uids::GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE),
        )]);
        for elem in extra {
            obj.put(elem);
        }
        obj
    }

    #[test]
    fn presentation_lut_sequence_is_preferred() {
        let lut_item = InMemDicomObject::from_element_iter([
            DataElement::new(tags::LUT_DESCRIPTOR, VR::US, dicom_value!(U16, [256, 0, 12])),
            DataElement::new(tags::LUT_DATA, VR::OW, PrimitiveValue::U16((0..256).collect())),
        ]);
        let obj = gsps_object(vec![
            DataElement::new(
                tags::PRESENTATION_LUT_SEQUENCE,
                VR::SQ,
                DataSetSequence::from(vec![lut_item]),
            ),
            DataElement::new(tags::PRESENTATION_LUT_SHAPE, VR::CS, dicom_value!(Str, "INVERSE")),
        ]);
        let ds = DataSet::new(&obj);
        let mut builder = PipelineBuilder::new(ResolveOptions::default());
        read_presentation_state(&ds, &mut builder);
        let attrs = builder.build();

        let lut = attrs.presentation_lut.as_ref().unwrap();
        assert_eq!(lut.samples().len(), 256);
        assert!(!lut.is_signed());
        assert_eq!(attrs.presentation_lut_shape, None);
    }

    #[test]
    fn presentation_shape() {
        let obj = gsps_object(vec![DataElement::new(
            tags::PRESENTATION_LUT_SHAPE,
            VR::CS,
            dicom_value!(Str, "INVERSE"),
        )]);
        let ds = DataSet::new(&obj);
        let mut builder = PipelineBuilder::new(ResolveOptions::default());
        read_presentation_state(&ds, &mut builder);
        let attrs = builder.build();
        assert_eq!(attrs.presentation_lut, None);
        assert_eq!(
            attrs.presentation_lut_shape,
            Some(PresentationLutShape::Inverse)
        );
    }

    #[test]
    fn other_objects_have_no_presentation_stage() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(
                tags::SOP_CLASS_UID,
                VR::UI,
                dicom_value!(Str, uids::COLOR_SOFTCOPY_PRESENTATION_STATE_STORAGE),
            ),
            DataElement::new(tags::PRESENTATION_LUT_SHAPE, VR::CS, dicom_value!(Str, "INVERSE")),
        ]);
        let ds = DataSet::new(&obj);
        let mut builder = PipelineBuilder::new(ResolveOptions::default());
        read_presentation_state(&ds, &mut builder);
        assert_eq!(builder.build().presentation_lut_shape, None);
    }

    #[test]
    fn softcopy_voi_lut_item() {
        let voi_item = InMemDicomObject::from_element_iter([
            DataElement::new(tags::WINDOW_CENTER, VR::DS, dicom_value!(Str, "40")),
            DataElement::new(tags::WINDOW_WIDTH, VR::DS, dicom_value!(Str, "400")),
        ]);
        let obj = gsps_object(vec![DataElement::new(
            tags::SOFTCOPY_VOILUT_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![voi_item]),
        )]);
        let ds = DataSet::new(&obj);
        let mut builder = PipelineBuilder::new(ResolveOptions::default());
        read_presentation_state(&ds, &mut builder);
        let attrs = builder.build();
        assert_eq!(attrs.window_center, Some(vec![40.]));
        assert_eq!(attrs.window_width, Some(vec![400.]));
    }
}
