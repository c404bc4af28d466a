//! Reduction of decoded ND2 chunks to the common schema.
//!
//! Fields are gathered by independent probe groups, one per metadata chunk.
//! A group either contributes all of its fields or, when its chunk is absent
//! or malformed, none of them; the failure is logged and the remaining
//! groups still run.

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::error::ExtractionCause;
use crate::formats::FileFormat;
use crate::schema::fields::*;
use crate::schema::{assemble, Field, FieldSet, MetadataOutput};
use crate::tree::{attr, descendants, RawNode};
use crate::units::{
    image_extent, immersion_from_refractive_index, round_scalar, seconds_from_interval, to_int,
};

/// Names of the chunks the extractor reads.
pub mod chunk {
    /// Image geometry and pixel format
    pub const ATTRIBUTES: &str = "ImageAttributesLV!";
    /// Free-text descriptions entered at acquisition
    pub const TEXT_INFO: &str = "ImageTextInfoLV!";
    /// Experiment loops (time, positions, Z)
    pub const EXPERIMENT: &str = "ImageMetadataLV!";
    /// Objective, optical planes and camera settings of the first frame
    pub const PICTURE: &str = "ImageMetadataSeqLV|0!";
    /// Pixel calibration
    pub const CALIBRATION: &str = "ImageCalibrationLV|0!";
    /// Acquisition software, stored as XML
    pub const APP_INFO: &str = "AppInfo_V1_0!";

    /// Every chunk decoded with the binary descriptor decoder.
    pub const DESCRIPTOR_CHUNKS: &[&str] = &[ATTRIBUTES, TEXT_INFO, EXPERIMENT, PICTURE, CALIBRATION];
}

/// Experiment loop kinds (`eType`).
mod loop_kind {
    pub const TIME: i64 = 1;
    pub const XY_POSITIONS: i64 = 2;
    pub const Z_STACK: i64 = 4;
    pub const NE_TIME: i64 = 8;
}

/// Julian day number of the Unix epoch.
const UNIX_EPOCH_JDN: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;
const MAX_LOOP_DEPTH: usize = 16;

type Probe = fn(&RawNode, &FieldSet) -> Result<FieldSet, ExtractionCause>;

const PROBES: &[(&str, Probe)] = &[
    ("attributes", attributes),
    ("experiment", experiment),
    ("calibration", calibration),
    ("picture", picture),
    ("text info", text_info),
    ("application", application),
];

/// Extract the ND2 schema from a tree of decoded chunks keyed by chunk name.
pub fn extract_from_tree(tree: &RawNode, fallback_name: Option<&str>) -> MetadataOutput {
    assemble(FileFormat::Nd2, extract_fields(tree, fallback_name))
}

/// Extract the ND2 fields without ordering them.
pub fn extract_fields(tree: &RawNode, fallback_name: Option<&str>) -> FieldSet {
    let mut set = FieldSet::new();
    set.set(DOCUMENT_NAME, Field::from_text(fallback_name));

    for (name, probe) in PROBES {
        match probe(tree, &set) {
            Ok(staged) => set.merge(staged),
            Err(e) => warn!("ND2 {} metadata unavailable: {}", name, e),
        }
    }

    for (size, pixel, extent) in [
        (SIZE_X, PIXEL_SIZE_X, IMAGE_SIZE_X),
        (SIZE_Y, PIXEL_SIZE_Y, IMAGE_SIZE_Y),
        (SIZE_Z, PIXEL_SIZE_Z, IMAGE_SIZE_Z),
    ] {
        let value = image_extent(&single(&set, size), &single(&set, pixel));
        set.set(extent, value);
    }
    set
}

fn single(set: &FieldSet, name: &str) -> Field {
    set.get(name)
        .and_then(|value| value.as_single())
        .cloned()
        .unwrap_or(Field::Missing)
}

fn group<'a>(tree: &'a RawNode, chunk: &str, root: &str) -> Result<&'a RawNode, ExtractionCause> {
    tree.path(&[chunk, root])
        .filter(|node| node.as_map().is_some())
        .ok_or_else(|| ExtractionCause::MissingMetadata(format!("no {} in {}", root, chunk)))
}

fn number(node: &RawNode, key: &str) -> Option<f64> {
    node.get(key).and_then(RawNode::as_f64)
}

fn text(node: Option<&RawNode>) -> Option<String> {
    node.and_then(RawNode::as_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn attributes(tree: &RawNode, _: &FieldSet) -> Result<FieldSet, ExtractionCause> {
    let attrs = group(tree, chunk::ATTRIBUTES, "SLxImageAttributes")?;

    let mut set = FieldSet::new();
    set.set(SIZE_X, to_int(&attrs.get("uiWidth")));
    set.set(SIZE_Y, to_int(&attrs.get("uiHeight")));
    set.set(SIZE_C, to_int(&attrs.get("uiComp")));

    let bits = number(attrs, "uiBpcSignificant")
        .filter(|&b| b > 0.0)
        .or_else(|| number(attrs, "uiBpcInMemory"))
        .filter(|&b| b > 0.0);
    set.set(PIXEL_TYPE, Field::from_text(bits.map(|b| format!("uint{}", b as i64))));
    Ok(set)
}

fn experiment(tree: &RawNode, _: &FieldSet) -> Result<FieldSet, ExtractionCause> {
    let mut level = Some(group(tree, chunk::EXPERIMENT, "SLxExperiment")?);

    let mut set = FieldSet::new();
    // Loops the experiment does not declare have a single plane
    set.set(SIZE_Z, Field::int(1));
    set.set(SIZE_T, Field::int(1));
    set.set(SIZE_M, Field::int(1));

    let mut depth = 0;
    while let Some(node) = level {
        if depth == MAX_LOOP_DEPTH {
            return Err(ExtractionCause::InvalidContainer(
                "experiment loops nested too deeply".to_string(),
            ));
        }
        let pars = node.get("uLoopPars").unwrap_or(node);
        let count = to_int(&pars.get("uiCount"));

        match number(node, "eType").map(|kind| kind as i64) {
            Some(loop_kind::TIME) | Some(loop_kind::NE_TIME) => {
                set.set(SIZE_T, count);
                let period = descendants(pars, "dPeriod")
                    .into_iter()
                    .find_map(RawNode::as_f64)
                    .filter(|&ms| ms > 0.0);
                set.set(TIME_INTERVAL, seconds_from_interval(&period, Some("ms")));
            }
            Some(loop_kind::XY_POSITIONS) => set.set(SIZE_M, count),
            Some(loop_kind::Z_STACK) => {
                set.set(SIZE_Z, count);
                let step = number(pars, "dZStep").map(f64::abs).filter(|&s| s > 0.0);
                set.set(PIXEL_SIZE_Z, round_scalar(&step));
            }
            other => debug!("Skipping ND2 experiment loop of type {:?}", other),
        }

        level = node.path(&["ppNextLevelEx", "i0000000000"]);
        depth += 1;
    }
    Ok(set)
}

fn calibration(tree: &RawNode, _: &FieldSet) -> Result<FieldSet, ExtractionCause> {
    let calibration = group(tree, chunk::CALIBRATION, "SLxCalibration")?;
    let microns = number(calibration, "dCalibration")
        .filter(|&c| c > 0.0)
        .ok_or_else(|| ExtractionCause::MissingMetadata("no pixel calibration".to_string()))?;

    let mut set = FieldSet::new();
    set.set(PIXEL_SIZE_X, round_scalar(&microns));
    set.set(PIXEL_SIZE_Y, round_scalar(&microns));
    Ok(set)
}

fn picture(tree: &RawNode, _: &FieldSet) -> Result<FieldSet, ExtractionCause> {
    let picture = group(tree, chunk::PICTURE, "SLxPictureMetadata")?;
    let mut set = FieldSet::new();

    set.set(OBJECTIVE_MODEL, Field::from_text(text(picture.get("wsObjectiveName"))));
    set.set(OBJECTIVE_MAGNIFICATION, round_scalar(&number(picture, "dObjectiveMag")));
    set.set(OBJECTIVE_NA, round_scalar(&number(picture, "dObjectiveNA")));
    let refractive_index = number(picture, "dRefractIndex1").filter(|&ri| ri > 0.0);
    set.set(OBJECTIVE_REFRACTIVE_INDEX, round_scalar(&refractive_index));
    set.set(
        OBJECTIVE_MEDIUM,
        Field::from_text(refractive_index.map(immersion_from_refractive_index)),
    );
    set.set(ZOOM, round_scalar(&number(picture, "dZoom")));

    if let Some(microns) = number(picture, "dCalibration").filter(|&c| c > 0.0) {
        set.set(PIXEL_SIZE_X, round_scalar(&microns));
        set.set(PIXEL_SIZE_Y, round_scalar(&microns));
    }

    let planes = planes(picture);
    if !planes.is_empty() {
        set.set(SIZE_C, Field::int(planes.len() as i64));
        set.set(
            CHANNEL_NAMES,
            planes
                .iter()
                .map(|plane| Field::from_text(text(plane.get("sDescription"))))
                .collect::<Vec<_>>(),
        );
        set.set(EXCITATION_WAVELENGTHS, wavelengths(&planes, "dExcitationWL"));
        set.set(EMISSION_WAVELENGTHS, wavelengths(&planes, "dEmissionWL"));
    }

    let camera = picture.path(&["sPicturePlanes", "sSampleSetting", "a0", "pCameraSetting", "CameraUserName"]);
    if let Some(name) = text(camera) {
        set.set(SYSTEM_NAME, Field::text(name));
    }

    if let Some(started) = number(picture, "dTimeAbsolute").and_then(julian_day_to_timestamp) {
        set.set(DOCUMENT_CREATION_DATE, Field::text(started));
    }
    Ok(set)
}

/// Optical plane descriptions (`a0`, `a1`, ...) in key order.
fn planes(picture: &RawNode) -> Vec<&RawNode> {
    let container = picture
        .path(&["sPicturePlanes", "sPlaneNew"])
        .or_else(|| picture.path(&["sPicturePlanes", "sPlane"]));
    let Some(map) = container.and_then(RawNode::as_map) else {
        return Vec::new();
    };
    let mut planes: Vec<(usize, &RawNode)> = map
        .iter()
        .filter_map(|(key, node)| {
            let index = key.strip_prefix('a')?.parse::<usize>().ok()?;
            Some((index, node))
        })
        .collect();
    planes.sort_by_key(|(index, _)| *index);
    planes.into_iter().map(|(_, node)| node).collect()
}

fn wavelengths(planes: &[&RawNode], key: &str) -> Vec<Field> {
    planes
        .iter()
        .map(|plane| {
            let nm = descendants(plane, key)
                .into_iter()
                .find_map(RawNode::as_f64)
                .filter(|&nm| nm > 0.0);
            round_scalar(&nm)
        })
        .collect()
}

/// Convert a Julian day number to an ISO 8601 UTC timestamp.
pub fn julian_day_to_timestamp(jdn: f64) -> Option<String> {
    if !jdn.is_finite() || jdn <= 0.0 {
        return None;
    }
    let seconds = (jdn - UNIX_EPOCH_JDN) * SECONDS_PER_DAY;
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos)
        .map(|time| time.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn text_info(tree: &RawNode, current: &FieldSet) -> Result<FieldSet, ExtractionCause> {
    let info = group(tree, chunk::TEXT_INFO, "SLxImageTextInfo")?;
    let item = |n: u32| text(info.get(&format!("TextInfoItem_{n}")));

    let mut set = FieldSet::new();
    set.set(DOCUMENT_USER_NAME, Field::from_text(item(4)));
    set.set(EXPERIMENT_DESCRIPTION, Field::from_text(item(5)));
    set.set(OPTICS, Field::from_text(item(13)));
    if let Some(date) = item(9) {
        set.set(DOCUMENT_CREATION_DATE, Field::text(date));
    }

    if !current.is_set(SYSTEM_NAME) {
        let camera = item(6).and_then(|capturing| {
            capturing.lines().find_map(|line| {
                line.trim()
                    .strip_prefix("Camera Name:")
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
            })
        });
        if let Some(camera) = camera {
            debug!("ND2 system name taken from capture description");
            set.set(SYSTEM_NAME, Field::text(camera));
        }
    }
    Ok(set)
}

fn application(tree: &RawNode, _: &FieldSet) -> Result<FieldSet, ExtractionCause> {
    let info = tree
        .get(chunk::APP_INFO)
        .ok_or_else(|| ExtractionCause::MissingMetadata(format!("no {}", chunk::APP_INFO)))?;
    let value = |tag: &str| {
        descendants(info, tag)
            .into_iter()
            .find_map(|node| attr(node, "value"))
    };

    let mut set = FieldSet::new();
    set.set(APPLICATION_NAME, Field::from_text(value("SWNameString")));
    set.set(APPLICATION_VERSION, Field::from_text(value("VersionString")));
    Ok(set)
}
