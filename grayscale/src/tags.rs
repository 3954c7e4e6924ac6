//! Attribute tags read while resolving the grayscale pipeline.
//!
//! All standard attributes are re-exported from the standard dictionary.
//! The vendor private attributes consulted for PET SUV
//! are declared here by number.

use dicom_core::Tag;

pub use dicom_dictionary_std::tags::*;

// Vendor private attributes

/// GE PET private creator (0009,0010), expected to be `GEMS_PETD_01`
pub const GEMS_PETD_PRIVATE_CREATOR: Tag = Tag(0x0009, 0x0010);
/// GE PET private scan date-time (0009,100D)
pub const GEMS_PETD_SCAN_DATE_TIME: Tag = Tag(0x0009, 0x100D);
/// Philips PET private creator (7053,0010), expected to be `Philips PET Private Group`
pub const PHILIPS_PET_PRIVATE_CREATOR: Tag = Tag(0x7053, 0x0010);
/// Philips PET private SUV scale factor (7053,1000)
pub const PHILIPS_PET_SUV_FACTOR: Tag = Tag(0x7053, 0x1000);
