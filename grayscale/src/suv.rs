//! Standardized Uptake Value (SUV) factor of PET images.
//!
//! The factor converts the rescaled pixel values of a PET image
//! into body weight normalized SUV.
//! It is only defined for attenuation and decay corrected images.

use dicom_core::DataDictionary;

use crate::attribute::{combine_date_time, DataSet};
use crate::diagnostic::{Diagnostic, SuvRequirement};
use crate::pipeline::PipelineBuilder;
use crate::tags;

/// Expected private creator of the GE PET private group.
pub const GEMS_PETD_CREATOR: &str = "GEMS_PETD_01";

/// Expected private creator of the Philips PET private group.
pub const PHILIPS_PET_CREATOR: &str = "Philips PET Private Group";

/// Compute the SUV factor of an image,
/// reporting why it could not be computed if the image is eligible.
///
/// `item` selects the Radiopharmaceutical Information Sequence item
/// describing the injected dose.
pub fn compute_suv_factor<'a, D>(
    ds: &DataSet<'a, D>,
    builder: &mut PipelineBuilder<'a, D>,
    item: usize,
) -> Option<f64>
where
    D: DataDictionary + Clone,
{
    match suv_factor(ds, &builder.attributes().modality, item) {
        Ok(factor) => factor,
        Err(missing) => {
            builder.report(Diagnostic::SuvUnavailable { missing });
            None
        }
    }
}

/// Compute the SUV factor of an image.
///
/// Returns `Ok(None)` if the image is not a corrected PET image
/// or its units do not support SUV,
/// and the first unmet requirement otherwise.
pub fn suv_factor<D>(
    ds: &DataSet<'_, D>,
    modality: &str,
    item: usize,
) -> Result<Option<f64>, SuvRequirement>
where
    D: DataDictionary + Clone,
{
    if modality != "PT" {
        return Ok(None);
    }
    let corrected = ds
        .string(tags::CORRECTED_IMAGE)
        .map_or(false, |c| c.contains("ATTN") && c.contains("DECY"));
    if !corrected {
        return Ok(None);
    }

    let factor = match ds.string(tags::UNITS).as_deref() {
        Some("BQML") => bqml_factor(ds, item)?,
        Some("CNTS") => {
            let creator = ds.string(tags::PHILIPS_PET_PRIVATE_CREATOR);
            ds.float(tags::PHILIPS_PET_SUV_FACTOR)
                .filter(|f| *f != 0. && creator.as_deref() == Some(PHILIPS_PET_CREATOR))
                .ok_or(SuvRequirement::PrivateSuvFactor)?
        }
        Some("GML") => 1.,
        _ => return Ok(None),
    };
    Ok(Some(factor).filter(|f| *f != 0.))
}

/// Body weight SUV factor of an image in Bq/ml,
/// decaying the injected dose to the start of the scan.
fn bqml_factor<D>(ds: &DataSet<'_, D>, item: usize) -> Result<f64, SuvRequirement>
where
    D: DataDictionary + Clone,
{
    let weight = ds
        .float(tags::PATIENT_WEIGHT)
        .filter(|w| *w != 0.)
        .ok_or(SuvRequirement::PatientWeight)?;
    let radiopharmaceutical = ds
        .item_at(tags::RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE, item)
        .ok_or(SuvRequirement::RadiopharmaceuticalInformation)?;
    let total_dose = radiopharmaceutical
        .float(tags::RADIONUCLIDE_TOTAL_DOSE)
        .ok_or(SuvRequirement::TotalDose)?;
    let half_life = radiopharmaceutical
        .float(tags::RADIONUCLIDE_HALF_LIFE)
        .ok_or(SuvRequirement::HalfLife)?;
    if ds.string(tags::DECAY_CORRECTION).as_deref() != Some("START") {
        return Err(SuvRequirement::DecayCorrectionStart);
    }
    let acquisition = ds
        .date(tags::ACQUISITION_DATE)
        .map(|date| combine_date_time(date, ds.time(tags::ACQUISITION_TIME)))
        .ok_or(SuvRequirement::AcquisitionDateTime)?;

    let injection_time = radiopharmaceutical.time(tags::RADIOPHARMACEUTICAL_START_TIME);
    let injection_date_time =
        radiopharmaceutical.date_time(tags::RADIOPHARMACEUTICAL_START_DATE_TIME);
    let series_date = ds.date(tags::SERIES_DATE);
    if injection_date_time.is_none() && (series_date.is_none() || injection_time.is_none()) {
        return Err(SuvRequirement::InjectionDateTime);
    }
    let series_date = series_date.ok_or(SuvRequirement::SeriesDateTime)?;
    let scan = combine_date_time(series_date, ds.time(tags::SERIES_TIME));

    let injection = match injection_date_time {
        Some(date_time) => date_time,
        None => {
            let injection_date = if scan > acquisition {
                // the series may have been created by post-processing,
                // GE keeps the original scan date in a private attribute
                let creator = ds.string(tags::GEMS_PETD_PRIVATE_CREATOR);
                if creator.as_deref() != Some(GEMS_PETD_CREATOR) {
                    return Err(SuvRequirement::PrivateScanDateTime);
                }
                radiopharmaceutical
                    .date_time(tags::GEMS_PETD_SCAN_DATE_TIME)
                    .or_else(|| ds.date_time(tags::GEMS_PETD_SCAN_DATE_TIME))
                    .ok_or(SuvRequirement::PrivateScanDateTime)?
                    .date()
            } else {
                series_date
            };
            combine_date_time(injection_date, injection_time)
        }
    };

    // negative when crossing midnight without a date
    let decay_time = (scan - injection).num_milliseconds() as f64;
    if decay_time <= 0. {
        return Err(SuvRequirement::PositiveDecayTime);
    }
    Ok(weight * 1000. / decayed_dose(total_dose, half_life, decay_time))
}

/// The dose remaining after `decay_time` milliseconds,
/// given a half life in seconds.
#[inline]
pub fn decayed_dose(total_dose: f64, half_life: f64, decay_time: f64) -> f64 {
    total_dose * 2_f64.powf(-decay_time / (1000. * half_life))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::value::DataSetSequence;
    use dicom_core::{dicom_value, DataElement, Tag, VR};
    use dicom_object::InMemDicomObject;
    use rstest::rstest;

    fn str_element(tag: Tag, vr: VR, value: &str) -> DataElement<InMemDicomObject> {
        DataElement::new(tag, vr, dicom_value!(Str, value))
    }

    // 70 kg over half of the injected dose
    const HALVED_DOSE_FACTOR: f64 = 70. * 1000. / 185e6;

    fn radiopharmaceutical(start_date_time: Option<&str>) -> DataElement<InMemDicomObject> {
        let mut item = InMemDicomObject::from_element_iter([
            str_element(tags::RADIONUCLIDE_TOTAL_DOSE, VR::DS, "370000000"),
            str_element(tags::RADIONUCLIDE_HALF_LIFE, VR::DS, "5000"),
            str_element(tags::RADIOPHARMACEUTICAL_START_TIME, VR::TM, "083640"),
        ]);
        if let Some(start_date_time) = start_date_time {
            item.put(str_element(
                tags::RADIOPHARMACEUTICAL_START_DATE_TIME,
                VR::DT,
                start_date_time,
            ));
        }
        DataElement::new(
            tags::RADIOPHARMACEUTICAL_INFORMATION_SEQUENCE,
            VR::SQ,
            DataSetSequence::from(vec![item]),
        )
    }

    fn pet_object(units: &str) -> InMemDicomObject {
        InMemDicomObject::from_element_iter([
            str_element(tags::MODALITY, VR::CS, "PT"),
            str_element(tags::CORRECTED_IMAGE, VR::CS, "DECY\\ATTN\\SCAT"),
            str_element(tags::UNITS, VR::CS, units),
            str_element(tags::DECAY_CORRECTION, VR::CS, "START"),
            str_element(tags::PATIENT_WEIGHT, VR::DS, "70"),
            str_element(tags::SERIES_DATE, VR::DA, "20240101"),
            str_element(tags::SERIES_TIME, VR::TM, "100000"),
            str_element(tags::ACQUISITION_DATE, VR::DA, "20240101"),
            str_element(tags::ACQUISITION_TIME, VR::TM, "100000"),
            radiopharmaceutical(None),
        ])
    }

    #[test]
    fn bqml_decays_dose_to_scan_start() {
        // 08:36:40 to 10:00:00, the dose is halved
        let obj = pet_object("BQML");
        let factor = suv_factor(&DataSet::new(&obj), "PT", 0).unwrap().unwrap();
        assert!((factor - 3.783_783_783_783_784e-4).abs() < 1e-15);
        assert!((factor - HALVED_DOSE_FACTOR).abs() < 1e-15);
    }

    #[rstest]
    #[case("20240101083640", "100000")]
    // the start time of the item is ignored
    #[case("2024010108", "092320")]
    #[case("20240101073640+0100", "090000")]
    // injected the day before the series
    #[case("20231231233640", "010000")]
    fn explicit_injection_date_time(#[case] start_date_time: &str, #[case] series_time: &str) {
        let mut obj = pet_object("BQML");
        obj.put(radiopharmaceutical(Some(start_date_time)));
        obj.put(str_element(tags::SERIES_TIME, VR::TM, series_time));
        let factor = suv_factor(&DataSet::new(&obj), "PT", 0).unwrap().unwrap();
        assert!((factor - HALVED_DOSE_FACTOR).abs() < 1e-15);
    }

    #[rstest]
    #[case(Some("20240101083640"), SuvRequirement::SeriesDateTime)]
    #[case(None, SuvRequirement::InjectionDateTime)]
    fn missing_series_date(
        #[case] start_date_time: Option<&str>,
        #[case] missing: SuvRequirement,
    ) {
        let mut obj = pet_object("BQML");
        obj.put(radiopharmaceutical(start_date_time));
        assert!(obj.remove_element(tags::SERIES_DATE));
        assert_eq!(suv_factor(&DataSet::new(&obj), "PT", 0), Err(missing));
    }

    #[rstest]
    #[case("GML", Ok(Some(1.)))]
    #[case("CNTS", Err(SuvRequirement::PrivateSuvFactor))]
    #[case("PROPCPS", Ok(None))]
    fn other_units(#[case] units: &str, #[case] expected: Result<Option<f64>, SuvRequirement>) {
        let obj = pet_object(units);
        assert_eq!(suv_factor(&DataSet::new(&obj), "PT", 0), expected);
    }

    #[test]
    fn philips_private_factor() {
        let mut obj = pet_object("CNTS");
        obj.put(str_element(tags::PHILIPS_PET_PRIVATE_CREATOR, VR::LO, PHILIPS_PET_CREATOR));
        obj.put(DataElement::new(
            tags::PHILIPS_PET_SUV_FACTOR,
            VR::FL,
            dicom_value!(F32, [0.000_42]),
        ));
        let factor = suv_factor(&DataSet::new(&obj), "PT", 0).unwrap().unwrap();
        assert!((factor - 0.000_42).abs() < 1e-9);
    }

    #[test]
    fn only_corrected_pet() {
        let obj = pet_object("GML");
        assert_eq!(suv_factor(&DataSet::new(&obj), "CT", 0), Ok(None));

        let mut obj = pet_object("GML");
        obj.put(str_element(tags::CORRECTED_IMAGE, VR::CS, "ATTN"));
        assert_eq!(suv_factor(&DataSet::new(&obj), "PT", 0), Ok(None));
    }

    #[test]
    fn missing_requirements() {
        let mut obj = pet_object("BQML");
        obj.put(str_element(tags::DECAY_CORRECTION, VR::CS, "ADMIN"));
        assert_eq!(
            suv_factor(&DataSet::new(&obj), "PT", 0),
            Err(SuvRequirement::DecayCorrectionStart)
        );

        let obj = pet_object("BQML");
        assert_eq!(
            suv_factor(&DataSet::new(&obj), "PT", 1),
            Err(SuvRequirement::RadiopharmaceuticalInformation)
        );

        // injected after the scan
        let mut obj = pet_object("BQML");
        obj.put(str_element(tags::SERIES_TIME, VR::TM, "080000"));
        assert_eq!(
            suv_factor(&DataSet::new(&obj), "PT", 0),
            Err(SuvRequirement::PositiveDecayTime)
        );
    }

    #[test]
    fn reassigned_series_needs_ge_scan_date() {
        // the series is more recent than the acquisition
        let mut obj = pet_object("BQML");
        obj.put(str_element(tags::SERIES_DATE, VR::DA, "20240102"));
        obj.put(str_element(tags::SERIES_TIME, VR::TM, "011640"));
        assert_eq!(
            suv_factor(&DataSet::new(&obj), "PT", 0),
            Err(SuvRequirement::PrivateScanDateTime)
        );

        obj.put(str_element(tags::GEMS_PETD_PRIVATE_CREATOR, VR::LO, GEMS_PETD_CREATOR));
        obj.put(str_element(tags::GEMS_PETD_SCAN_DATE_TIME, VR::DT, "20240101095900"));
        let factor = suv_factor(&DataSet::new(&obj), "PT", 0).unwrap().unwrap();
        // injected on 2024-01-01 at 08:36:40, 12 half lives before the series
        assert!((factor - 0.774_918_918_918_919).abs() < 1e-12);
        assert!((factor - 70. * 1000. * 4096. / 370e6).abs() < 1e-12);
    }
}
