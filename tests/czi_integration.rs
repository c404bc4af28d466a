//! Integration tests for Zeiss CZI extraction
//!
//! These tests write synthetic ZISRAW files to a temporary directory and go
//! through the public entry points:
//! 1. Extension-based dispatch and the full field order
//! 2. Flat text and JSON exports of a real extraction
//! 3. Errors that carry the offending path

mod common;

use common::{czi_bytes, write_file, CZI_XML};
use remind::error::ExtractionCause;
use remind::prelude::*;
use remind::schema::fields::*;
use tempfile::tempdir;

#[test]
fn test_extract_czi_file() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "wing_disc.czi", &czi_bytes(CZI_XML));

    let extraction = extract_file(&path).unwrap();
    assert_eq!(extraction.format, FileFormat::Czi);

    let output = &extraction.output;
    assert_eq!(output.names().next(), Some(DOCUMENT_NAME));
    assert_eq!(output.single(DOCUMENT_NAME), Some(&Field::text("wing_disc")));
    assert_eq!(output.single(SYSTEM_NAME), Some(&Field::text("LSM 900")));
    assert_eq!(output.single(SIZE_X), Some(&Field::int(256)));
    assert_eq!(output.single(PIXEL_SIZE_X), Some(&Field::float(0.1)));
    assert_eq!(output.single(PIXEL_SIZE_Z), Some(&Field::float(0.5)));
    assert_eq!(output.single(IMAGE_SIZE_X), Some(&Field::float(25.6)));
    assert_eq!(output.single(IMAGE_SIZE_Z), Some(&Field::float(2.0)));
    assert_eq!(output.single(TIME_INTERVAL), Some(&Field::Missing));
    assert_eq!(output.list(CHANNEL_NAMES), Some(&[Field::text("DAPI")][..]));
    assert_eq!(output.list(EXCITATION_WAVELENGTHS), Some(&[Field::float(405.0)][..]));
}

#[test]
fn test_extension_is_case_insensitive() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "WING.CZI", &czi_bytes(CZI_XML));
    assert_eq!(extract_file(&path).unwrap().format, FileFormat::Czi);
}

#[test]
fn test_czi_flat_text_export() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "wing_disc.czi", &czi_bytes(CZI_XML));
    let extraction = extract_file(&path).unwrap();

    let text = to_flat_text(&extraction.output);
    assert!(text.starts_with(FLAT_TEXT_HEADER));
    assert!(text.contains("\nSystem Name: LSM 900\n"));
    assert!(text.contains("\nTime Interval (s): N/A\n"));

    let parsed = parse_flat_text(&text);
    assert_eq!(parsed.len(), extraction.output.len());
    assert_eq!(parsed.single(SIZE_Y), Some(&Field::int(128)));
}

#[test]
fn test_czi_json_export_with_raw_tree() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "wing_disc.czi", &czi_bytes(CZI_XML));
    let extraction = extract_file(&path).unwrap();

    let json = ExportDocument::new(&path, &extraction, true).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["format"], "CZI");
    assert_eq!(value["metadata"]["Pixel Type"], "Gray8");
    assert_eq!(
        value["raw"]["ImageDocument"]["Metadata"]["Information"]["Document"]["UserName"],
        "operator"
    );
}

#[test]
fn test_czi_form_prefill() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "wing_disc.czi", &czi_bytes(CZI_XML));
    let form = FormPrefill::from_extraction(&extract_file(&path).unwrap());

    assert_eq!(form.microscope_name, "LSM 900");
    assert_eq!(form.objective, "Plan-Apochromat 20x/0.8");
    assert_eq!(form.immersion, "Air");
    assert_eq!(form.channel_info, "DAPI");
    assert_eq!(form.z_stack, "Yes");
    assert_eq!(form.time_series, "");
}

#[test]
fn test_corrupt_czi_reports_path() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "broken.czi", b"this is not a zisraw file at all, just text");

    let err = extract_file(&path).unwrap_err();
    assert_eq!(err.path, path);
    assert!(matches!(err.cause, ExtractionCause::InvalidContainer(_)));
    assert!(err.to_string().contains("broken.czi"));
}

#[test]
fn test_truncated_czi_xml() {
    let dir = tempdir().unwrap();
    let mut bytes = czi_bytes(CZI_XML);
    bytes.truncate(bytes.len() - 100);
    let path = write_file(dir.path(), "short.czi", &bytes);

    let err = extract_file(&path).unwrap_err();
    assert!(matches!(err.cause, ExtractionCause::InvalidContainer(_)));
}

#[test]
fn test_malformed_czi_xml() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "bad_xml.czi",
        &czi_bytes("<ImageDocument><Metadata></ImageDocument>"),
    );

    let err = extract_file(&path).unwrap_err();
    assert!(matches!(err.cause, ExtractionCause::Xml(_)));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.czi");

    let err = extract_file(&path).unwrap_err();
    assert_eq!(err.path, path);
    assert!(matches!(err.cause, ExtractionCause::Io(_)));
}
