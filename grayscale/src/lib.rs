//! This crate resolves the grayscale display pipeline of DICOM images:
//! the chain of transformations turning stored pixel values
//! into presentation values.
//!
//! For each frame, the Modality LUT (or rescale),
//! the VOI LUTs (or windows) and the Presentation LUT (or shape)
//! are gathered from the root data set,
//! the functional groups of enhanced multi-frame images
//! and an optional presentation state,
//! and the lookup tables are then built from their item descriptors.
//! Problems found along the way are collected as [`Diagnostic`]s
//! rather than failing the whole resolution.
//!
//! The crate also computes the display shutter region,
//! the SUV factor of PET images,
//! and the patient, study and series records describing an image.
//!
//! # Examples
//! ```no_run
//! # use std::error::Error;
//! use dicom_object::open_file;
//! use dicom_grayscale::{resolve_frame, DataSet, ResolveOptions};
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let obj = open_file("dicom.dcm")?;
//! let ds = DataSet::from_file(&obj);
//! let attrs = resolve_frame(&ds, &ResolveOptions::default().frame(0));
//! if let Some(lut) = &attrs.modality_lut {
//!     println!("modality LUT of {} entries", lut.entry_count());
//! }
//! for diagnostic in &attrs.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! #   Ok(())
//! # }
//! ```

pub mod attribute;
pub mod color;
pub mod diagnostic;
pub mod functional_groups;
pub mod lut;
pub mod metadata;
pub mod modality;
pub mod orientation;
pub mod pipeline;
pub mod presentation;
pub mod shutter;
pub mod suv;
pub mod tags;
pub mod transform;
pub mod voi;

pub use attribute::{DataSet, PixelRepresentation};
pub use diagnostic::{Diagnostic, LutStage, SuvRequirement};
pub use lut::{LookupTable, LutPayload, ReadLutError};
pub use metadata::{PatientRecord, PatientSex, SeriesRecord, StudyRecord};
pub use orientation::OrientationPlane;
pub use pipeline::{
    resolve_frame, resolve_presented_frame, ImageAttributes, PipelineBuilder, ResolveOptions, VoiLut,
    NO_VALUE,
};
pub use presentation::read_presentation_state;
pub use shutter::Shutter;
pub use transform::{PresentationLutShape, Rescale, VoiLutFunction, WindowLevel};
