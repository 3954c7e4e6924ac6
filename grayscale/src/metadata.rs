//! Descriptive patient, study and series records,
//! as consumed by the grouping of images into series.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dicom_core::DataDictionary;

use crate::attribute::{combine_date_time, DataSet};
use crate::pipeline::NO_VALUE;
use crate::tags;

/// The sex of a patient.
#[derive(Debug, Copy, Clone, Default, Eq, Hash, PartialEq)]
pub enum PatientSex {
    Female,
    Male,
    #[default]
    Other,
}

impl PatientSex {
    /// Interpret a _Patient's Sex_ value.
    /// Anything other than female or male is other.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some(code) if code.starts_with('F') => PatientSex::Female,
            Some(code) if code.starts_with('M') => PatientSex::Male,
            _ => PatientSex::Other,
        }
    }
}

impl std::fmt::Display for PatientSex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PatientSex::Female => "F",
            PatientSex::Male => "M",
            PatientSex::Other => "O",
        })
    }
}

/// Format a person name (PN) for reading.
///
/// Components are separated by spaces,
/// prefix and suffix by commas.
/// Ideographic and phonetic groups are kept after an `=`.
///
/// ```
/// # use dicom_grayscale::metadata::format_person_name;
/// assert_eq!(format_person_name("Doe^John^^Dr^Jr"), "Doe John, Dr, Jr");
/// ```
pub fn format_person_name(name: &str) -> String {
    name.split('=')
        .map(|group| {
            let mut out = String::new();
            for (i, component) in group.split('^').enumerate() {
                let component = component.trim();
                if component.is_empty() {
                    continue;
                }
                if !out.is_empty() {
                    out.push_str(if i >= 3 { ", " } else { " " });
                }
                out.push_str(component);
            }
            out
        })
        .collect::<Vec<_>>()
        .join("=")
        .trim_end_matches('=')
        .to_string()
}

/// Format the name of the patient,
/// which is mandatory.
pub fn format_patient_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => format_person_name(name),
        _ => NO_VALUE.to_string(),
    }
}

/// Build an identifier of the patient across issuers.
///
/// The patient ID is qualified by its issuer when known,
/// otherwise by the birth date and the beginning of the name.
pub fn patient_pseudo_uid(
    patient_id: Option<&str>,
    issuer_of_patient_id: Option<&str>,
    patient_name: Option<&str>,
    birth_date: Option<NaiveDate>,
) -> String {
    let mut uid = patient_id.unwrap_or(NO_VALUE).to_string();
    match issuer_of_patient_id.map(str::trim) {
        Some(issuer) if !issuer.is_empty() => uid.push_str(issuer),
        _ => {
            if let Some(date) = birth_date {
                uid.push_str(&date.format("%Y%m%d").to_string());
            }
            if let Some(name) = patient_name {
                uid.extend(name.chars().take(5));
            }
        }
    }
    uid
}

/// The patient level attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    /// the Patient ID, or [`NO_VALUE`]
    pub patient_id: String,
    /// the formatted Patient's Name, or [`NO_VALUE`]
    pub patient_name: String,
    pub pseudo_uid: String,
    pub birth_date: Option<NaiveDate>,
    pub birth_time: Option<NaiveTime>,
    pub sex: PatientSex,
    pub issuer_of_patient_id: Option<String>,
    pub weight: Option<f64>,
    pub comments: Option<String>,
}

impl PatientRecord {
    pub fn from_dataset<D>(ds: &DataSet<'_, D>) -> Self
    where
        D: DataDictionary + Clone,
    {
        let patient_id = ds.string(tags::PATIENT_ID);
        let raw_name = ds.string(tags::PATIENT_NAME);
        let issuer = ds.string(tags::ISSUER_OF_PATIENT_ID);
        let birth_date = ds.date(tags::PATIENT_BIRTH_DATE);
        PatientRecord {
            pseudo_uid: patient_pseudo_uid(
                patient_id.as_deref(),
                issuer.as_deref(),
                raw_name.as_deref(),
                birth_date,
            ),
            patient_id: patient_id.unwrap_or_else(|| NO_VALUE.to_string()),
            patient_name: format_patient_name(raw_name.as_deref()),
            birth_date,
            birth_time: ds.time(tags::PATIENT_BIRTH_TIME),
            sex: PatientSex::from_code(ds.string(tags::PATIENT_SEX).as_deref()),
            issuer_of_patient_id: issuer,
            weight: ds.float(tags::PATIENT_WEIGHT),
            comments: ds.string(tags::PATIENT_COMMENTS),
        }
    }
}

/// The study level attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyRecord {
    pub study_instance_uid: Option<String>,
    pub study_id: Option<String>,
    /// the Study Date merged with the Study Time
    pub study_date_time: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub accession_number: Option<String>,
    pub modalities_in_study: Option<Vec<String>>,
    pub number_of_study_related_instances: Option<i32>,
    pub number_of_study_related_series: Option<i32>,
}

impl StudyRecord {
    pub fn from_dataset<D>(ds: &DataSet<'_, D>) -> Self
    where
        D: DataDictionary + Clone,
    {
        StudyRecord {
            study_instance_uid: ds.string(tags::STUDY_INSTANCE_UID),
            study_id: ds.string(tags::STUDY_ID),
            study_date_time: ds
                .date(tags::STUDY_DATE)
                .map(|date| combine_date_time(date, ds.time(tags::STUDY_TIME))),
            description: ds.string(tags::STUDY_DESCRIPTION),
            comments: ds.string(tags::STUDY_COMMENTS),
            accession_number: ds.string(tags::ACCESSION_NUMBER),
            modalities_in_study: ds.strings(tags::MODALITIES_IN_STUDY),
            number_of_study_related_instances: ds.int(tags::NUMBER_OF_STUDY_RELATED_INSTANCES),
            number_of_study_related_series: ds.int(tags::NUMBER_OF_STUDY_RELATED_SERIES),
        }
    }
}

/// The series level attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    /// the Series Instance UID, or [`NO_VALUE`]
    pub series_instance_uid: String,
    /// the Modality, or [`NO_VALUE`]
    pub modality: String,
    /// the Series Date merged with the Series Time
    pub series_date_time: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub series_number: Option<i32>,
    pub referring_physician_name: Option<String>,
    pub institution_name: Option<String>,
    pub institutional_department_name: Option<String>,
    pub station_name: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_model_name: Option<String>,
    pub kvp: Option<f64>,
    pub laterality: Option<String>,
    pub body_part_examined: Option<String>,
    pub frame_of_reference_uid: Option<String>,
    pub number_of_series_related_instances: Option<i32>,
}

impl SeriesRecord {
    pub fn from_dataset<D>(ds: &DataSet<'_, D>) -> Self
    where
        D: DataDictionary + Clone,
    {
        let mandatory = |tag| ds.string(tag).unwrap_or_else(|| NO_VALUE.to_string());
        SeriesRecord {
            series_instance_uid: mandatory(tags::SERIES_INSTANCE_UID),
            modality: mandatory(tags::MODALITY),
            series_date_time: ds
                .date(tags::SERIES_DATE)
                .map(|date| combine_date_time(date, ds.time(tags::SERIES_TIME))),
            description: ds.string(tags::SERIES_DESCRIPTION),
            series_number: ds.int(tags::SERIES_NUMBER),
            referring_physician_name: ds
                .string(tags::REFERRING_PHYSICIAN_NAME)
                .map(|name| format_person_name(&name)),
            institution_name: ds.string(tags::INSTITUTION_NAME),
            institutional_department_name: ds.string(tags::INSTITUTIONAL_DEPARTMENT_NAME),
            station_name: ds.string(tags::STATION_NAME),
            manufacturer: ds.string(tags::MANUFACTURER),
            manufacturer_model_name: ds.string(tags::MANUFACTURER_MODEL_NAME),
            kvp: ds.float(tags::KVP),
            laterality: ds.string(tags::LATERALITY),
            body_part_examined: ds.string(tags::BODY_PART_EXAMINED),
            frame_of_reference_uid: ds.string(tags::FRAME_OF_REFERENCE_UID),
            number_of_series_related_instances: ds.int(tags::NUMBER_OF_SERIES_RELATED_INSTANCES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{dicom_value, DataElement, VR};
    use dicom_object::InMemDicomObject;
    use rstest::rstest;

    #[rstest]
    #[case("Doe^John", "Doe John")]
    #[case("Doe^John^^Dr^Jr", "Doe John, Dr, Jr")]
    #[case("^John", "John")]
    #[case("Yamada^Tarou=山田^太郎=やまだ^たろう", "Yamada Tarou=山田 太郎=やまだ たろう")]
    #[case("Doe^John==", "Doe John")]
    fn person_names(#[case] raw: &str, #[case] formatted: &str) {
        assert_eq!(format_person_name(raw), formatted);
    }

    #[test]
    fn pseudo_uid() {
        assert_eq!(
            patient_pseudo_uid(Some("123"), Some("HOSP"), Some("Doe^John"), None),
            "123HOSP"
        );
        assert_eq!(
            patient_pseudo_uid(
                Some("123"),
                Some(" "),
                Some("Doe^John"),
                NaiveDate::from_ymd_opt(1970, 1, 2)
            ),
            "12319700102Doe^J"
        );
        assert_eq!(patient_pseudo_uid(None, None, None, None), NO_VALUE);
    }

    #[test]
    fn records_fill_mandatory_values() {
        let obj = InMemDicomObject::from_element_iter([
            DataElement::new(tags::PATIENT_SEX, VR::CS, dicom_value!(Str, "F")),
            DataElement::new(tags::STUDY_DATE, VR::DA, dicom_value!(Str, "20240101")),
            DataElement::new(tags::STUDY_TIME, VR::TM, dicom_value!(Str, "0830")),
            DataElement::new(tags::MODALITIES_IN_STUDY, VR::CS, dicom_value!(Strs, ["CT", "PT"])),
            DataElement::new(tags::REFERRING_PHYSICIAN_NAME, VR::PN, dicom_value!(Str, "Who^Doctor")),
        ]);
        let ds = DataSet::new(&obj);

        let patient = PatientRecord::from_dataset(&ds);
        assert_eq!(patient.patient_id, NO_VALUE);
        assert_eq!(patient.patient_name, NO_VALUE);
        assert_eq!(patient.sex, PatientSex::Female);
        assert_eq!(patient.pseudo_uid, NO_VALUE);

        let study = StudyRecord::from_dataset(&ds);
        assert_eq!(
            study.study_date_time,
            NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(8, 30, 0))
        );
        assert_eq!(
            study.modalities_in_study,
            Some(vec!["CT".to_string(), "PT".to_string()])
        );

        let series = SeriesRecord::from_dataset(&ds);
        assert_eq!(series.series_instance_uid, NO_VALUE);
        assert_eq!(series.modality, NO_VALUE);
        assert_eq!(series.referring_physician_name.as_deref(), Some("Who Doctor"));
    }
}
