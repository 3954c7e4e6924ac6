//! Utility module for fetching attributes from a DICOM object.
//!
//! Unlike a strict reader, the accessors here never fail:
//! a missing attribute, an empty value,
//! or a value which cannot be converted to the requested type
//! all result in `None`.
//! Conversion failures are logged before being discarded.

use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dicom_core::value::{AsRange, PrimitiveValue};
use dicom_core::{DataDictionary, Tag};
use dicom_dictionary_std::{uids, StandardDataDictionary};
use dicom_encoding::transfer_syntax::Endianness;
use dicom_object::{mem::InMemElement, FileDicomObject, InMemDicomObject};

/// A read-only view over a DICOM data set
/// and the byte order in which its binary values were encoded.
///
/// Nested data set items obtained through this view
/// inherit the byte order of their parent.
#[derive(Debug)]
pub struct DataSet<'a, D = StandardDataDictionary> {
    obj: &'a InMemDicomObject<D>,
    byte_order: Endianness,
}

impl<D> Clone for DataSet<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DataSet<'_, D> {}

impl<'a, D> DataSet<'a, D>
where
    D: DataDictionary + Clone,
{
    /// Create a view over an in-memory object,
    /// assuming a little endian encoding.
    pub fn new(obj: &'a InMemDicomObject<D>) -> Self {
        DataSet {
            obj,
            byte_order: Endianness::Little,
        }
    }

    /// Create a view over a DICOM file object.
    ///
    /// The byte order is derived from the transfer syntax
    /// declared in the file meta group.
    pub fn from_file(file: &'a FileDicomObject<InMemDicomObject<D>>) -> Self {
        let ts = file
            .meta()
            .transfer_syntax()
            .trim_end_matches(|c: char| c == '\0' || c == ' ');
        let byte_order = if ts == uids::EXPLICIT_VR_BIG_ENDIAN {
            Endianness::Big
        } else {
            Endianness::Little
        };
        DataSet {
            obj: &**file,
            byte_order,
        }
    }

    /// Override the byte order of this view.
    pub fn with_byte_order(self, byte_order: Endianness) -> Self {
        DataSet { byte_order, ..self }
    }

    /// The byte order of binary values in this data set.
    #[inline]
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// Whether this data set is encoded in big endian.
    #[inline]
    pub fn is_big_endian(&self) -> bool {
        self.byte_order == Endianness::Big
    }

    /// The underlying DICOM object.
    #[inline]
    pub fn object(&self) -> &'a InMemDicomObject<D> {
        self.obj
    }

    /// Retrieve an element only if it holds a non-empty value.
    fn element(&self, tag: Tag) -> Option<&'a InMemElement<D>> {
        self.obj.element(tag).ok().filter(|e| has_value(e))
    }

    /// Check whether the attribute is present with a non-empty value.
    pub fn contains_value(&self, tag: Tag) -> bool {
        self.element(tag).is_some()
    }

    /// Check whether all of the given attributes have a value.
    ///
    /// Returns `false` if `tags` is empty.
    pub fn contains_all(&self, tags: &[Tag]) -> bool {
        !tags.is_empty() && tags.iter().all(|tag| self.contains_value(*tag))
    }

    /// Retrieve the primitive value of an attribute.
    pub fn primitive(&self, tag: Tag) -> Option<&'a PrimitiveValue> {
        self.element(tag)?.value().primitive()
    }

    /// Retrieve a textual attribute.
    ///
    /// Multiple values are joined with a backslash.
    pub fn string(&self, tag: Tag) -> Option<String> {
        self.strings(tag).map(|values| values.join("\\"))
    }

    /// Retrieve all values of a textual attribute,
    /// each stripped of surrounding padding.
    pub fn strings(&self, tag: Tag) -> Option<Vec<String>> {
        let elem = self.element(tag)?;
        if let Some(PrimitiveValue::U8(bytes)) = elem.value().primitive() {
            // private attributes of unknown VR hold the raw text
            let text = String::from_utf8_lossy(bytes);
            return Some(
                text.split('\\')
                    .map(|s| trim_padding(s).to_string())
                    .collect(),
            );
        }
        tolerate(tag, "text", elem.to_multi_str())
            .map(|values| values.iter().map(|s| trim_padding(s).to_string()).collect())
    }

    /// Retrieve the first value of an integer attribute.
    pub fn int(&self, tag: Tag) -> Option<i32> {
        let elem = self.element(tag)?;
        tolerate(tag, "integer", elem.to_int::<i32>())
    }

    /// Retrieve all values of an integer attribute.
    pub fn ints(&self, tag: Tag) -> Option<Vec<i32>> {
        let elem = self.element(tag)?;
        tolerate(tag, "integer list", elem.to_multi_int::<i32>())
    }

    /// Retrieve the first value of a decimal attribute.
    pub fn float(&self, tag: Tag) -> Option<f64> {
        let elem = self.element(tag)?;
        tolerate(tag, "decimal", elem.to_float64())
    }

    /// Retrieve all values of a decimal attribute.
    pub fn floats(&self, tag: Tag) -> Option<Vec<f64>> {
        let elem = self.element(tag)?;
        tolerate(tag, "decimal list", elem.to_multi_float64())
    }

    /// Retrieve a date (DA) attribute.
    /// A partial date resolves to its first day.
    pub fn date(&self, tag: Tag) -> Option<NaiveDate> {
        let elem = self.element(tag)?;
        let date = tolerate(tag, "date", elem.to_date())?;
        tolerate(tag, "date", date.earliest())
    }

    /// Retrieve a time (TM) attribute.
    /// Missing components are taken as zero.
    pub fn time(&self, tag: Tag) -> Option<NaiveTime> {
        let elem = self.element(tag)?;
        let time = tolerate(tag, "time", elem.to_time())?;
        tolerate(tag, "time", time.earliest())
    }

    /// Retrieve a date-time (DT) attribute,
    /// resolved to the earliest instant it designates.
    /// Any UTC offset suffix is ignored.
    pub fn date_time(&self, tag: Tag) -> Option<NaiveDateTime> {
        let elem = self.element(tag)?;
        let value = tolerate(tag, "date-time", elem.to_datetime())?;
        let date = tolerate(tag, "date-time", value.date().earliest())?;
        let time = match value.time() {
            Some(time) => Some(tolerate(tag, "date-time", time.earliest())?),
            None => None,
        };
        Some(combine_date_time(date, time))
    }

    /// Retrieve the first item of a sequence attribute.
    pub fn item(&self, tag: Tag) -> Option<DataSet<'a, D>> {
        self.item_at(tag, 0)
    }

    /// Retrieve the item at the given index of a sequence attribute.
    pub fn item_at(&self, tag: Tag, index: usize) -> Option<DataSet<'a, D>> {
        let items = self.obj.element(tag).ok()?.value().items()?;
        items.get(index).map(|obj| DataSet {
            obj,
            byte_order: self.byte_order,
        })
    }

    /// Retrieve all items of a non-empty sequence attribute.
    pub fn items(&self, tag: Tag) -> Option<Vec<DataSet<'a, D>>> {
        let items = self.obj.element(tag).ok()?.value().items()?;
        if items.is_empty() {
            return None;
        }
        Some(
            items
                .iter()
                .map(|obj| DataSet {
                    obj,
                    byte_order: self.byte_order,
                })
                .collect(),
        )
    }

    /// Get the Pixel Representation, defaulting to unsigned.
    pub fn pixel_representation(&self) -> PixelRepresentation {
        match self.int(crate::tags::PIXEL_REPRESENTATION) {
            Some(0) | None => PixelRepresentation::Unsigned,
            Some(1) => PixelRepresentation::Signed,
            Some(other) => {
                tracing::warn!("Invalid Pixel Representation {}, assuming unsigned", other);
                PixelRepresentation::Unsigned
            }
        }
    }
}

fn has_value<D>(elem: &InMemElement<D>) -> bool {
    if let Some(items) = elem.value().items() {
        return !items.is_empty();
    }
    match elem.value().primitive() {
        Some(PrimitiveValue::Empty) => false,
        Some(value) => !value.to_bytes().is_empty(),
        // encapsulated pixel data
        None => true,
    }
}

#[inline]
fn trim_padding(s: &str) -> &str {
    s.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

#[inline]
fn tolerate<T, E: Display>(tag: Tag, kind: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Cannot parse {} of {}: {}", kind, tag, e);
            None
        }
    }
}

/// Merge a date with an optional time of day.
/// A missing time means the start of the day.
pub fn combine_date_time(date: NaiveDate, time: Option<NaiveTime>) -> NaiveDateTime {
    date.and_time(time.unwrap_or(NaiveTime::MIN))
}

/// An interpreted representation of the DICOM _Pixel Representation_ attribute.
#[derive(Debug, Copy, Clone, Default, Eq, Hash, PartialEq)]
pub enum PixelRepresentation {
    /// unsigned pixel data sample values
    #[default]
    Unsigned,
    /// signed pixel data sample values
    Signed,
}

impl PixelRepresentation {
    /// Whether sample values are signed.
    #[inline]
    pub fn is_signed(self) -> bool {
        self == PixelRepresentation::Signed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{dicom_value, DataElement, VR};

    #[test]
    fn dates_and_times_of_any_precision() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(crate::tags::STUDY_DATE, VR::DA, dicom_value!(Str, "20240229")),
            DataElement::new(crate::tags::SERIES_DATE, VR::DA, dicom_value!(Str, "202402")),
            DataElement::new(crate::tags::STUDY_TIME, VR::TM, dicom_value!(Str, "101502.25")),
            DataElement::new(crate::tags::SERIES_TIME, VR::TM, dicom_value!(Str, "1015")),
            DataElement::new(crate::tags::ACQUISITION_TIME, VR::TM, dicom_value!(Str, "1x")),
            DataElement::new(
                crate::tags::ACQUISITION_DATE_TIME,
                VR::DT,
                dicom_value!(Str, "20240101083640.5+0100"),
            ),
            DataElement::new(
                crate::tags::RADIOPHARMACEUTICAL_START_DATE_TIME,
                VR::DT,
                dicom_value!(Str, "202401"),
            ),
        ]);
        let ds = DataSet::new(&obj);

        assert_eq!(ds.date(crate::tags::STUDY_DATE), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(ds.date(crate::tags::SERIES_DATE), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(
            ds.time(crate::tags::STUDY_TIME),
            NaiveTime::from_hms_micro_opt(10, 15, 2, 250_000)
        );
        assert_eq!(ds.time(crate::tags::SERIES_TIME), NaiveTime::from_hms_opt(10, 15, 0));
        assert_eq!(ds.time(crate::tags::ACQUISITION_TIME), None);
        assert_eq!(ds.date(crate::tags::PATIENT_BIRTH_DATE), None);

        let jan_1st = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            ds.date_time(crate::tags::ACQUISITION_DATE_TIME),
            jan_1st.and_hms_milli_opt(8, 36, 40, 500)
        );
        assert_eq!(
            ds.date_time(crate::tags::RADIOPHARMACEUTICAL_START_DATE_TIME),
            Some(jan_1st.and_time(NaiveTime::MIN))
        );
    }

    #[test]
    fn untyped_date_time() {
        let obj = InMemDicomObject::from_element_iter([DataElement::new(
            crate::tags::GEMS_PETD_SCAN_DATE_TIME,
            VR::UN,
            PrimitiveValue::from(b"20240101095900 ".to_vec()),
        )]);
        let ds = DataSet::new(&obj);
        assert_eq!(
            ds.date_time(crate::tags::GEMS_PETD_SCAN_DATE_TIME),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 59, 0)
        );
    }

    #[test]
    fn accessors_tolerate_missing_and_malformed_values() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(crate::tags::RESCALE_SLOPE, VR::DS, dicom_value!(Str, "abc")),
            DataElement::new(crate::tags::RESCALE_INTERCEPT, VR::DS, dicom_value!(Str, "-1024")),
            DataElement::new(crate::tags::WINDOW_CENTER, VR::DS, dicom_value!(Strs, ["40", "400"])),
            DataElement::new(crate::tags::MODALITY, VR::CS, PrimitiveValue::Empty),
        ]);
        let ds = DataSet::new(&obj);

        assert_eq!(ds.float(crate::tags::RESCALE_SLOPE), None);
        assert_eq!(ds.float(crate::tags::RESCALE_INTERCEPT), Some(-1024.));
        assert_eq!(ds.floats(crate::tags::WINDOW_CENTER), Some(vec![40., 400.]));
        assert_eq!(ds.string(crate::tags::WINDOW_CENTER).as_deref(), Some("40\\400"));
        assert!(!ds.contains_value(crate::tags::MODALITY));
        assert_eq!(ds.string(crate::tags::MODALITY), None);
        assert_eq!(ds.int(crate::tags::WINDOW_WIDTH), None);
        assert!(ds.contains_all(&[crate::tags::RESCALE_SLOPE, crate::tags::RESCALE_INTERCEPT]));
        assert!(!ds.contains_all(&[]));
        assert_eq!(ds.pixel_representation(), PixelRepresentation::Unsigned);
        assert!(!ds.is_big_endian());
    }

    #[test]
    fn untyped_private_text() {
        let obj = InMemDicomObject::from_element_iter([DataElement::new(
            crate::tags::GEMS_PETD_PRIVATE_CREATOR,
            VR::UN,
            PrimitiveValue::from(b"GEMS_PETD_01\\X \\\0".to_vec()),
        )]);
        let ds = DataSet::new(&obj);
        assert_eq!(
            ds.strings(crate::tags::GEMS_PETD_PRIVATE_CREATOR),
            Some(vec!["GEMS_PETD_01".to_string(), "X".to_string(), "".to_string()])
        );
    }
}
