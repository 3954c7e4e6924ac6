//! A CLI tool for inspecting the grayscale pipeline
//! resolved from a DICOM file.
use clap::Parser;
use dicom_grayscale::{
    resolve_frame, resolve_presented_frame, DataSet, ImageAttributes, LookupTable,
    PatientRecord, ResolveOptions, SeriesRecord, StudyRecord,
};
use dicom_object::open_file;
use snafu::{Report, ResultExt, Whatever};
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::Level;

/// Exit code for when an error emerged while reading a DICOM file.
const ERROR_READ: i32 = -2;
/// Exit code for any other error.
const ERROR_OTHER: i32 = -128;

/// Resolve the grayscale pipeline of a DICOM image
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    file: PathBuf,

    /// The frame whose per-frame functional groups are applied
    #[clap(short = 'f', long = "frame")]
    frame: Option<usize>,

    /// A grayscale softcopy presentation state to display the image with
    #[clap(long = "ps")]
    presentation_state: Option<PathBuf>,

    /// The Radiopharmaceutical Information Sequence item used for SUV
    #[clap(long = "radiopharmaceutical", default_value = "0")]
    radiopharmaceutical_item: usize,

    /// The number of vertices approximating circular shutters
    #[clap(long = "ellipse-segments", default_value = "64")]
    ellipse_segments: usize,

    /// Also print the patient, study and series records
    #[clap(short = 'm', long = "metadata")]
    metadata: bool,

    /// Verbose mode
    #[clap(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    run().unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(ERROR_OTHER);
    });
}

fn run() -> Result<(), Whatever> {
    let App {
        file,
        frame,
        presentation_state,
        radiopharmaceutical_item,
        ellipse_segments,
        metadata,
        verbose,
    } = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
            .finish(),
    )
    .unwrap_or_else(|e| {
        eprintln!("{}", snafu::Report::from_error(e));
    });

    let obj = open_file(&file).unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(ERROR_READ);
    });
    let ps_obj = presentation_state
        .map(|path| {
            open_file(&path)
                .with_whatever_context(|_| format!("Could not open {}", path.display()))
        })
        .transpose()?;

    let options = ResolveOptions {
        frame,
        radiopharmaceutical_item,
        ellipse_segments,
    };
    let ds = DataSet::from_file(&obj);
    let attrs = match &ps_obj {
        Some(ps_obj) => resolve_presented_frame(&ds, &DataSet::from_file(ps_obj), &options),
        None => resolve_frame(&ds, &options),
    };

    if metadata {
        println!("{:#?}", PatientRecord::from_dataset(&ds));
        println!("{:#?}", StudyRecord::from_dataset(&ds));
        println!("{:#?}", SeriesRecord::from_dataset(&ds));
    }
    print_attributes(&attrs);

    Ok(())
}

fn print_attributes(attrs: &ImageAttributes) {
    println!("Modality: {}", attrs.modality);
    print_field("Frame type", &attrs.frame_type);
    print_field("Instance number", &attrs.instance_number);
    if let Some(plane) = attrs.orientation_plane {
        println!("Orientation: {}", plane);
    }
    print_field("Slice position", &attrs.slice_position);

    match &attrs.modality_lut {
        Some(lut) => print_lut("Modality LUT", lut),
        None => {
            let rescale = attrs.rescale();
            println!(
                "Rescale: slope {} intercept {}",
                rescale.slope, rescale.intercept
            );
        }
    }
    println!(
        "Modality output: {}",
        if attrs.modality_output_signed {
            "signed"
        } else {
            "unsigned"
        }
    );

    for (i, window) in attrs.window_levels().iter().enumerate() {
        println!("Window #{}: center {} width {}", i, window.center, window.width);
    }
    if let Some(function) = attrs.voi_lut_function {
        println!("VOI LUT function: {}", function);
    }
    for (i, voi) in attrs.voi_luts.iter().flatten().enumerate() {
        match &voi.lut {
            Some(lut) => print_lut(&format!("VOI LUT #{}", i), lut),
            None => println!("VOI LUT #{}: invalid", i),
        }
    }

    match (&attrs.presentation_lut, attrs.presentation_lut_shape) {
        (Some(lut), _) => print_lut("Presentation LUT", lut),
        (None, Some(shape)) => println!("Presentation LUT shape: {}", shape),
        (None, None) => {}
    }

    if let Some(shutter) = &attrs.shutter {
        println!("Shutter: {} polygon(s)", shutter.region.0.len());
    }
    if attrs.has_overlay {
        println!("Overlays: present");
    }
    print_field("SUV factor", &attrs.suv_factor);

    for diagnostic in &attrs.diagnostics {
        println!("Warning: {}", diagnostic);
    }
}

fn print_field<T: Debug>(label: &str, value: &Option<T>) {
    if let Some(value) = value {
        println!("{}: {:?}", label, value);
    }
}

fn print_lut(label: &str, lut: &LookupTable) {
    println!(
        "{}: {} entries of {} bits from {}{}",
        label,
        lut.entry_count(),
        lut.bits_per_entry(),
        lut.offset(),
        if lut.is_signed() { ", signed" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use crate::App;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        App::command().debug_assert();
    }
}
