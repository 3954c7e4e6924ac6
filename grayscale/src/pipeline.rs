//! The output context of a grayscale pipeline resolution
//! and the top level entry point [`resolve_frame`].
//!
//! Resolution happens in two phases.
//! First, each module reads its attribute group
//! into a [`PipelineBuilder`],
//! where LUT sequence items are only collected.
//! Then, [`PipelineBuilder::build`] materializes the look-up tables
//! once the final state of the modality stage is known,
//! which the signedness of the VOI LUTs depends on.

use dicom_core::{DataDictionary, Tag};
use dicom_dictionary_std::StandardDataDictionary;

use crate::attribute::{DataSet, PixelRepresentation};
use crate::diagnostic::{Diagnostic, LutStage};
use crate::lut::LookupTable;
use crate::orientation::{self, OrientationPlane};
use crate::shutter::Shutter;
use crate::transform::{window_levels, PresentationLutShape, Rescale, VoiLutFunction, WindowLevel};
use crate::{functional_groups, modality, presentation, shutter, suv, tags, voi};

/// The value given to mandatory attributes missing from the source.
pub const NO_VALUE: &str = "UNKNOWN";

/// Options for resolving the pipeline of an image frame.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct ResolveOptions {
    /// The index of the frame whose per-frame functional groups are applied,
    /// if any.
    pub frame: Option<usize>,
    /// The item of the Radiopharmaceutical Information Sequence
    /// used for the SUV factor.
    pub radiopharmaceutical_item: usize,
    /// The number of vertices approximating a circular shutter.
    pub ellipse_segments: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            frame: None,
            radiopharmaceutical_item: 0,
            ellipse_segments: 64,
        }
    }
}

impl ResolveOptions {
    /// Resolve the given frame of a multi-frame image.
    pub fn frame(mut self, frame: usize) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// An alternative VOI look-up table.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiLut {
    /// the table, if it could be built
    pub lut: Option<LookupTable>,
    /// the LUT Explanation
    pub explanation: Option<String>,
}

/// The resolved attributes of one image frame.
///
/// Optional fields are only filled when the source provides them.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttributes {
    /// the Modality, or [`NO_VALUE`]
    pub modality: String,
    pub pixel_representation: PixelRepresentation,
    pub sop_class_uid: Option<String>,
    pub pixel_intensity_relationship: Option<String>,
    pub smallest_image_pixel_value: Option<i32>,
    pub image_type: Option<String>,
    /// the type of the frame, from a modality specific frame type macro
    pub frame_type: Option<String>,
    pub instance_number: Option<i32>,
    pub frame_acquisition_number: Option<i32>,
    pub stack_id: Option<String>,
    pub image_laterality: Option<String>,

    pub pixel_spacing: Option<Vec<f64>>,
    pub slice_thickness: Option<f64>,
    pub image_position: Option<Vec<f64>>,
    pub image_orientation: Option<Vec<f64>>,
    pub orientation_plane: Option<OrientationPlane>,
    pub slice_position: Option<[f64; 3]>,

    pub rescale_slope: Option<f64>,
    pub rescale_intercept: Option<f64>,
    pub rescale_type: Option<String>,
    pub modality_lut: Option<LookupTable>,
    pub modality_lut_type: Option<String>,
    pub modality_lut_explanation: Option<String>,
    /// whether the output of the modality stage may be negative
    pub modality_output_signed: bool,

    pub window_center: Option<Vec<f64>>,
    pub window_width: Option<Vec<f64>>,
    pub window_explanation: Option<Vec<String>>,
    pub voi_lut_function: Option<VoiLutFunction>,
    pub voi_luts: Option<Vec<VoiLut>>,

    pub presentation_lut: Option<LookupTable>,
    pub presentation_lut_explanation: Option<String>,
    pub presentation_lut_shape: Option<PresentationLutShape>,

    pub shutter: Option<Shutter>,
    /// whether the image holds overlay planes (groups 6000 to 601E)
    pub has_overlay: bool,

    /// the factor converting PET pixel values into SUV
    pub suv_factor: Option<f64>,

    /// issues found while resolving
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for ImageAttributes {
    fn default() -> Self {
        ImageAttributes {
            modality: NO_VALUE.to_string(),
            pixel_representation: PixelRepresentation::default(),
            sop_class_uid: None,
            pixel_intensity_relationship: None,
            smallest_image_pixel_value: None,
            image_type: None,
            frame_type: None,
            instance_number: None,
            frame_acquisition_number: None,
            stack_id: None,
            image_laterality: None,
            pixel_spacing: None,
            slice_thickness: None,
            image_position: None,
            image_orientation: None,
            orientation_plane: None,
            slice_position: None,
            rescale_slope: None,
            rescale_intercept: None,
            rescale_type: None,
            modality_lut: None,
            modality_lut_type: None,
            modality_lut_explanation: None,
            modality_output_signed: false,
            window_center: None,
            window_width: None,
            window_explanation: None,
            voi_lut_function: None,
            voi_luts: None,
            presentation_lut: None,
            presentation_lut_explanation: None,
            presentation_lut_shape: None,
            shutter: None,
            has_overlay: false,
            suv_factor: None,
            diagnostics: Vec::new(),
        }
    }
}

impl ImageAttributes {
    /// The rescale function of the modality stage,
    /// with the defaults of the missing parameters.
    pub fn rescale(&self) -> Rescale {
        Rescale::new(
            self.rescale_slope.unwrap_or(1.),
            self.rescale_intercept.unwrap_or(0.),
        )
    }

    /// The window levels of the VOI stage, paired up.
    pub fn window_levels(&self) -> Vec<WindowLevel> {
        match (&self.window_center, &self.window_width) {
            (Some(centers), Some(widths)) => window_levels(centers, widths),
            _ => Vec::new(),
        }
    }
}

/// Overwrite `slot` only when a value is present.
#[inline]
pub(crate) fn set_if_present<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// The mutable context of a pipeline resolution.
///
/// Modules write resolved attributes into it,
/// and register LUT items to be built on [`build`](Self::build).
#[derive(Debug)]
pub struct PipelineBuilder<'a, D = StandardDataDictionary> {
    pub(crate) attrs: ImageAttributes,
    pub(crate) options: ResolveOptions,
    pub(crate) modality_lut_item: Option<DataSet<'a, D>>,
    pub(crate) voi_lut_items: Option<Vec<DataSet<'a, D>>>,
    pub(crate) presentation_lut_item: Option<DataSet<'a, D>>,
}

impl<'a, D> Default for PipelineBuilder<'a, D>
where
    D: DataDictionary + Clone,
{
    fn default() -> Self {
        Self::new(ResolveOptions::default())
    }
}

impl<'a, D> PipelineBuilder<'a, D>
where
    D: DataDictionary + Clone,
{
    /// Create an empty builder.
    pub fn new(options: ResolveOptions) -> Self {
        PipelineBuilder {
            attrs: ImageAttributes::default(),
            options,
            modality_lut_item: None,
            voi_lut_items: None,
            presentation_lut_item: None,
        }
    }

    /// The attributes resolved so far.
    pub fn attributes(&self) -> &ImageAttributes {
        &self.attrs
    }

    /// The options of this resolution.
    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{}", diagnostic);
        self.attrs.diagnostics.push(diagnostic);
    }

    /// Read the image level attributes from the root data set.
    pub fn read_image_attributes(&mut self, ds: &DataSet<'a, D>) {
        let attrs = &mut self.attrs;
        attrs.modality = ds
            .string(tags::MODALITY)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_VALUE.to_string());
        attrs.pixel_representation = ds.pixel_representation();
        set_if_present(&mut attrs.sop_class_uid, ds.string(tags::SOP_CLASS_UID));
        set_if_present(
            &mut attrs.pixel_intensity_relationship,
            ds.string(tags::PIXEL_INTENSITY_RELATIONSHIP),
        );
        let signed = attrs.pixel_representation.is_signed();
        let bits_stored = ds.int(tags::BITS_STORED).unwrap_or(16);
        set_if_present(
            &mut attrs.smallest_image_pixel_value,
            ds.int(tags::SMALLEST_IMAGE_PIXEL_VALUE)
                .map(|v| stored_pixel_value(v, bits_stored, signed)),
        );
        set_if_present(&mut attrs.image_type, ds.string(tags::IMAGE_TYPE));
        set_if_present(&mut attrs.instance_number, ds.int(tags::INSTANCE_NUMBER));
        set_if_present(
            &mut attrs.image_laterality,
            ds.string(tags::IMAGE_LATERALITY)
                .or_else(|| ds.string(tags::LATERALITY)),
        );
        set_if_present(&mut attrs.pixel_spacing, ds.floats(tags::PIXEL_SPACING));
        set_if_present(&mut attrs.slice_thickness, ds.float(tags::SLICE_THICKNESS));
        set_if_present(
            &mut attrs.image_position,
            ds.floats(tags::IMAGE_POSITION_PATIENT),
        );
        self.set_image_orientation(ds.floats(tags::IMAGE_ORIENTATION_PATIENT));
        self.attrs.has_overlay = ds.object().tags().any(is_overlay_tag);
    }

    /// Set the image orientation and its plane label.
    pub(crate) fn set_image_orientation(&mut self, iop: Option<Vec<f64>>) {
        if let Some(iop) = iop {
            set_if_present(
                &mut self.attrs.orientation_plane,
                orientation::orientation_plane(&iop),
            );
            self.attrs.image_orientation = Some(iop);
        }
    }

    /// Derive the slice position from the image position and orientation.
    pub fn compute_slice_position(&mut self) {
        if let (Some(ipp), Some(iop)) = (&self.attrs.image_position, &self.attrs.image_orientation)
        {
            let position = orientation::slice_position(ipp, iop);
            set_if_present(&mut self.attrs.slice_position, position);
        }
    }

    /// Build a LUT from an item, reporting any issue found.
    pub(crate) fn build_lut(
        &mut self,
        item: &DataSet<'a, D>,
        signed: bool,
        stage: LutStage,
    ) -> Option<LookupTable> {
        match LookupTable::from_item(item, signed) {
            Ok(lut) => {
                for issue in lut.issues() {
                    self.report(Diagnostic::InconsistentLut { stage, issue });
                }
                Some(lut)
            }
            Err(source) => {
                self.report(Diagnostic::InvalidLut { stage, source });
                None
            }
        }
    }

    /// Materialize the collected look-up tables
    /// and check the consistency of the pipeline.
    pub fn build(mut self) -> ImageAttributes {
        let modality_lut_item = self.modality_lut_item.take();
        modality::materialize(&mut self, modality_lut_item);

        let signed = voi::modality_output_signed(&self.attrs);
        self.attrs.modality_output_signed = signed;
        let voi_lut_items = self.voi_lut_items.take();
        voi::materialize(&mut self, voi_lut_items, signed);

        let presentation_lut_item = self.presentation_lut_item.take();
        presentation::materialize(&mut self, presentation_lut_item);

        self.attrs
    }
}

/// Resolve the grayscale pipeline of an image.
///
/// The root modules are applied first,
/// then the shared functional groups,
/// then the per-frame functional groups of `options.frame`, if any.
///
/// # Example
///
/// ```
/// # use dicom_core::{dicom_value, DataElement, VR};
/// # use dicom_object::InMemDicomObject;
/// # use dicom_grayscale::{resolve_frame, tags, DataSet, ResolveOptions};
/// let obj = InMemDicomObject::from_element_iter([
///     DataElement::new(tags::MODALITY, VR::CS, dicom_value!(Str, "CT")),
///     DataElement::new(tags::RESCALE_INTERCEPT, VR::DS, dicom_value!(Str, "-1024")),
///     DataElement::new(tags::RESCALE_SLOPE, VR::DS, dicom_value!(Str, "1")),
///     DataElement::new(tags::RESCALE_TYPE, VR::LO, dicom_value!(Str, "HU")),
/// ]);
/// let attrs = resolve_frame(&DataSet::new(&obj), &ResolveOptions::default());
/// assert_eq!(attrs.modality, "CT");
/// assert_eq!(attrs.rescale().apply(1024.), 0.);
/// assert!(attrs.modality_output_signed);
/// ```
pub fn resolve_frame<D>(ds: &DataSet<'_, D>, options: &ResolveOptions) -> ImageAttributes
where
    D: DataDictionary + Clone,
{
    resolve(ds, None, options)
}

/// Resolve the grayscale pipeline of an image
/// displayed through a softcopy presentation state.
///
/// The LUT modules of the presentation state are applied
/// after those of the image, overriding them.
pub fn resolve_presented_frame<'a, D>(
    ds: &DataSet<'a, D>,
    presentation_state: &DataSet<'a, D>,
    options: &ResolveOptions,
) -> ImageAttributes
where
    D: DataDictionary + Clone,
{
    resolve(ds, Some(presentation_state), options)
}

fn resolve<'a, D>(
    ds: &DataSet<'a, D>,
    presentation_state: Option<&DataSet<'a, D>>,
    options: &ResolveOptions,
) -> ImageAttributes
where
    D: DataDictionary + Clone,
{
    let mut builder = PipelineBuilder::new(*options);
    builder.read_image_attributes(ds);

    modality::apply_modality_lut_module(ds, &mut builder, None);
    voi::apply_voi_lut_module(ds, &mut builder, None);
    presentation::apply_presentation_lut_module(ds, &mut builder);
    set_if_present(
        &mut builder.attrs.shutter,
        shutter::read_shutter(ds, options.ellipse_segments),
    );

    functional_groups::write_shared_functional_groups(ds, &mut builder);
    if let Some(frame) = options.frame {
        if !functional_groups::write_per_frame_functional_groups(ds, &mut builder, frame) {
            tracing::debug!("No per-frame functional groups for frame #{}", frame);
        }
    }
    builder.compute_slice_position();

    if let Some(presentation_state) = presentation_state {
        presentation::read_presentation_state(presentation_state, &mut builder);
        set_if_present(
            &mut builder.attrs.shutter,
            shutter::read_shutter(presentation_state, options.ellipse_segments),
        );
    }

    let factor = suv::compute_suv_factor(ds, &mut builder, options.radiopharmaceutical_item);
    builder.attrs.suv_factor = factor;

    builder.build()
}

/// Bring a pixel value into the range of `bits_stored` bits.
///
/// Signed values read as unsigned words are sign extended,
/// anything still out of range is clamped.
/// Bits Stored is kept within 1 to 16.
pub fn stored_pixel_value(value: i32, bits_stored: i32, signed: bool) -> i32 {
    let bits = bits_stored.clamp(1, 16);
    if signed {
        let max = (1 << (bits - 1)) - 1;
        let value = if value > max && value < 1 << bits {
            value - (1 << bits)
        } else {
            value
        };
        value.clamp(-max - 1, max)
    } else {
        value.clamp(0, (1 << bits) - 1)
    }
}

/// Whether a tag belongs to one of the repeating overlay groups.
fn is_overlay_tag(tag: Tag) -> bool {
    let group = tag.group();
    (0x6000..=0x601E).contains(&group) && group % 2 == 0
}
