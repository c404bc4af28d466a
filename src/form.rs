//! Mapping of extracted metadata onto the documentation form.
//!
//! The form is the ReMInD microscopy documentation sheet. Only the labels
//! that can be prefilled from image metadata are produced; everything else
//! on the sheet is left to the user.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::formats::{Extraction, FileFormat};
use crate::schema::fields::*;
use crate::schema::{Field, FieldValue, MetadataOutput};
use crate::units::immersion_from_refractive_index;

/// Form labels in the order they appear on the sheet.
pub const FORM_LABELS: &[&str] = &[
    "Date and time",
    "Experimentor Name(s)",
    "Microscope name",
    "Objective",
    "Immersion",
    "Imaging mode",
    "Channel info",
    "Image format",
    "Z stack",
    "Time series",
    "Notes",
];

/// Prefilled values for the documentation form. Unknown values are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPrefill {
    /// Acquisition or document creation date
    pub date_and_time: String,
    /// Who acquired the data
    pub experimenter_names: String,
    /// Microscope or acquisition system
    pub microscope_name: String,
    /// Objective description
    pub objective: String,
    /// Immersion medium
    pub immersion: String,
    /// Imaging mode (confocal, widefield, ...)
    pub imaging_mode: String,
    /// Channel names, comma separated
    pub channel_info: String,
    /// File extension of the source image
    pub image_format: String,
    /// `Yes` when the image has more than one Z plane
    pub z_stack: String,
    /// `Yes` when the image has more than one time point
    pub time_series: String,
    /// Import note
    pub notes: String,
}

impl FormPrefill {
    /// Prefill the form from an extraction.
    pub fn from_extraction(extraction: &Extraction) -> Self {
        Self::from_output(extraction.format, &extraction.output)
    }

    /// Prefill the form from an output of the given format.
    pub fn from_output(format: FileFormat, output: &MetadataOutput) -> Self {
        let imaging_mode = match output.single(DATA_SOURCE_TYPE_NAME).and_then(Field::as_text) {
            Some(source) if source.eq_ignore_ascii_case("confocal") => "Confocal".to_string(),
            _ => first_value(output, ACQUISITION_MODES),
        };

        Self {
            date_and_time: joined(output, DOCUMENT_CREATION_DATE),
            experimenter_names: joined(output, DOCUMENT_USER_NAME),
            microscope_name: joined(output, SYSTEM_NAME),
            objective: objective(format, output),
            immersion: immersion(output),
            imaging_mode,
            channel_info: joined(output, CHANNEL_NAMES),
            image_format: format.extension().to_string(),
            z_stack: more_than_one(output, SIZE_Z),
            time_series: more_than_one(output, SIZE_T),
            notes: format!("[Imported from {}]", format),
        }
    }

    /// `(label, value)` pairs in sheet order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let values = [
            &self.date_and_time,
            &self.experimenter_names,
            &self.microscope_name,
            &self.objective,
            &self.immersion,
            &self.imaging_mode,
            &self.channel_info,
            &self.image_format,
            &self.z_stack,
            &self.time_series,
            &self.notes,
        ];
        FORM_LABELS
            .iter()
            .copied()
            .zip(values.into_iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for FormPrefill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.entries() {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

impl Serialize for FormPrefill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (label, value) in entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Present values of a field as text; lists are joined with `", "` and
/// their missing entries dropped.
fn joined(output: &MetadataOutput, name: &str) -> String {
    match output.get(name) {
        Some(FieldValue::Single(field)) => field.as_text().map(|t| t.into_owned()).unwrap_or_default(),
        Some(FieldValue::PerChannel(items)) => items
            .iter()
            .filter_map(Field::as_text)
            .collect::<Vec<_>>()
            .join(", "),
        None => String::new(),
    }
}

fn first_value(output: &MetadataOutput, name: &str) -> String {
    match output.get(name) {
        Some(FieldValue::PerChannel(items)) => items
            .iter()
            .find_map(Field::as_text)
            .map(|t| t.into_owned())
            .unwrap_or_default(),
        _ => joined(output, name),
    }
}

/// ND2 objectives are described as `{mag}x/{na} {model}`; the other
/// formats carry a full model string.
fn objective(format: FileFormat, output: &MetadataOutput) -> String {
    let model = joined(output, OBJECTIVE_MODEL);
    if format != FileFormat::Nd2 {
        return model;
    }
    let magnification = output.single(OBJECTIVE_MAGNIFICATION).filter(|f| !f.is_missing());
    let aperture = output.single(OBJECTIVE_NA).filter(|f| !f.is_missing());
    match (magnification, aperture) {
        (Some(mag), Some(na)) if model.is_empty() => format!("{}x/{}", mag, na),
        (Some(mag), Some(na)) => format!("{}x/{} {}", mag, na, model),
        _ => model,
    }
}

/// The recorded medium, or the category implied by the refractive index.
fn immersion(output: &MetadataOutput) -> String {
    let medium = joined(output, OBJECTIVE_MEDIUM);
    if !medium.is_empty() {
        return medium;
    }
    output
        .single(OBJECTIVE_REFRACTIVE_INDEX)
        .and_then(Field::as_f64)
        .map(|ri| immersion_from_refractive_index(ri).to_string())
        .unwrap_or_default()
}

fn more_than_one(output: &MetadataOutput, name: &str) -> String {
    match output.single(name).and_then(Field::as_f64) {
        Some(n) if n > 1.0 => "Yes".to_string(),
        Some(_) => "No".to_string(),
        None => String::new(),
    }
}
