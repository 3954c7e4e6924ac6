//! Conversion of DICOM encoded CIELab colors to sRGB.
//!
//! DICOM stores CIELab values as three unsigned 16-bit integers,
//! scaled so that `L*` spans `0..=100`
//! and `a*`, `b*` span `-128..=127` (PS3.3 C.10.7.1.1).
//! The conversion uses the D65 reference white.

/// An 8-bit sRGB color.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// D65 reference white
const XN: f64 = 0.950_456;
const YN: f64 = 1.0;
const ZN: f64 = 1.088_754;

/// Decode a DICOM encoded CIELab triplet into sRGB.
///
/// Returns `None` if fewer than three values are given.
pub fn dicom_lab_to_rgb(values: &[i32]) -> Option<Rgb> {
    let [l, a, b] = match values {
        [l, a, b, ..] => [*l, *a, *b].map(|v| v.clamp(0, 0xFFFF) as f64),
        _ => return None,
    };
    Some(lab_to_rgb(
        l * 100. / 65535.,
        a * 255. / 65535. - 128.,
        b * 255. / 65535. - 128.,
    ))
}

/// Convert a CIELab color into sRGB,
/// clamping out of gamut components.
pub fn lab_to_rgb(l: f64, a: f64, b: f64) -> Rgb {
    let fy = (l + 16.) / 116.;
    let fx = fy + a / 500.;
    let fz = fy - b / 200.;

    let x = XN * lab_f_inv(fx);
    let y = YN * lab_f_inv(fy);
    let z = ZN * lab_f_inv(fz);

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_992 * y + 0.041_556 * z;
    let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    Rgb {
        r: to_srgb_byte(r),
        g: to_srgb_byte(g),
        b: to_srgb_byte(b),
    }
}

fn lab_f_inv(t: f64) -> f64 {
    const DELTA: f64 = 6. / 29.;
    if t > DELTA {
        t * t * t
    } else {
        3. * DELTA * DELTA * (t - 4. / 29.)
    }
}

fn to_srgb_byte(linear: f64) -> u8 {
    let linear = linear.clamp(0., 1.);
    let v = if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1. / 2.4) - 0.055
    };
    (v * 255.).round().clamp(0., 255.) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_and_black() {
        let white = dicom_lab_to_rgb(&[0xFFFF, 0x8080, 0x8080]).unwrap();
        assert!(white.r >= 254 && white.g >= 254 && white.b >= 254);

        let black = dicom_lab_to_rgb(&[0, 0x8080, 0x8080]).unwrap();
        assert_eq!(black, Rgb { r: 0, g: 0, b: 0 });

        assert_eq!(dicom_lab_to_rgb(&[0xFFFF]), None);
    }

    #[test]
    fn red_is_mostly_red() {
        // L* 53, a* 80, b* 67
        let red = lab_to_rgb(53.24, 80.09, 67.2);
        assert!(red.r > 240);
        assert!(red.g < 20);
        assert!(red.b < 20);
    }
}
