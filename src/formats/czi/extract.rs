//! Reduction of a CZI metadata tree to the common schema.

use std::collections::HashSet;

use log::debug;

use crate::formats::correlate::{correlate, correlate_where, DetectorRecord};
use crate::formats::FileFormat;
use crate::schema::fields::*;
use crate::schema::{assemble, Field, FieldSet, MetadataOutput};
use crate::tree::{as_list, attr, text_at, RawNode};
use crate::units::{
    image_extent, meters_to_microns, meters_to_nanometers, nonzero_meters_to_microns, round_scalar,
    seconds_from_interval, to_int,
};

static ABSENT: RawNode = RawNode::Absent;

/// Channel-name marker of Airyscan anti-aliased channels.
const AIRYSCAN_CHANNEL_MARKER: &str = "ChA";
/// Detector name carrying the Airyscan virtual pinhole.
const AIRYSCAN_DETECTOR: &str = "Airyscan";

/// Extract the CZI schema from a parsed metadata tree.
///
/// `fallback_name` names the document when the tree does not.
pub fn extract_from_tree(tree: &RawNode, fallback_name: Option<&str>) -> MetadataOutput {
    assemble(FileFormat::Czi, extract_fields(tree, fallback_name))
}

/// Extract the CZI fields without ordering them.
pub fn extract_fields(tree: &RawNode, fallback_name: Option<&str>) -> FieldSet {
    let meta = tree.path(&["ImageDocument", "Metadata"]).unwrap_or(&ABSENT);
    let info = meta.path(&["Information"]).unwrap_or(&ABSENT);
    let image = info.path(&["Image"]).unwrap_or(&ABSENT);
    let block = as_list(meta.path(&["Experiment", "ExperimentBlocks", "AcquisitionBlock"]))
        .into_iter()
        .next()
        .unwrap_or(&ABSENT);

    let mut set = FieldSet::new();

    set.set(
        DOCUMENT_NAME,
        Field::from_text(text_at(info, &["Document", "Name"]).or_else(|| fallback_name.map(str::to_string))),
    );
    set.set(DOCUMENT_USER_NAME, Field::from_text(text_at(info, &["Document", "UserName"])));
    set.set(
        DOCUMENT_CREATION_DATE,
        Field::from_text(text_at(info, &["Document", "CreationDate"])),
    );
    set.set(APPLICATION_NAME, Field::from_text(text_at(info, &["Application", "Name"])));
    set.set(APPLICATION_VERSION, Field::from_text(text_at(info, &["Application", "Version"])));
    set.set(SYSTEM_NAME, Field::from_text(system_name(meta, info)));

    set.set(PIXEL_TYPE, Field::from_text(text_at(image, &["PixelType"])));
    let size_x = to_int(&image.path(&["SizeX"]));
    let size_y = to_int(&image.path(&["SizeY"]));
    let size_z = to_int(&image.path(&["SizeZ"]));
    set.set(SIZE_M, to_int(&image.path(&["SizeM"])));
    set.set(SIZE_T, to_int(&image.path(&["SizeT"])));
    set.set(SIZE_S, to_int(&image.path(&["SizeS"])));
    set.set(SIZE_C, channel_count(image));

    let pixel_x = pixel_size(meta, block, "X");
    let pixel_y = pixel_size(meta, block, "Y");
    let pixel_z = pixel_size(meta, block, "Z");
    set.set(IMAGE_SIZE_X, image_extent(&size_x, &pixel_x));
    set.set(IMAGE_SIZE_Y, image_extent(&size_y, &pixel_y));
    set.set(IMAGE_SIZE_Z, image_extent(&size_z, &pixel_z));
    set.set(SIZE_X, size_x);
    set.set(SIZE_Y, size_y);
    set.set(SIZE_Z, size_z);
    set.set(PIXEL_SIZE_X, pixel_x);
    set.set(PIXEL_SIZE_Y, pixel_y);
    set.set(PIXEL_SIZE_Z, pixel_z);

    set.set(TIME_INTERVAL, time_interval(block));

    let objective = as_list(info.path(&["Instrument", "Objectives", "Objective"]))
        .into_iter()
        .next()
        .unwrap_or(&ABSENT);
    set.set(OBJECTIVE_MODEL, Field::from_text(text_at(objective, &["Manufacturer", "Model"])));
    set.set(OBJECTIVE_NA, round_scalar(&objective.path(&["LensNA"])));
    set.set(
        OBJECTIVE_MAGNIFICATION,
        round_scalar(&objective.path(&["NominalMagnification"])),
    );
    set.set(
        OBJECTIVE_REFRACTIVE_INDEX,
        round_scalar(&image.path(&["ObjectiveSettings", "RefractiveIndex"])),
    );
    set.set(
        OBJECTIVE_MEDIUM,
        Field::from_text(text_at(image, &["ObjectiveSettings", "Medium"])),
    );

    let channels = as_list(image.path(&["Dimensions", "Channels", "Channel"]));
    let names: Vec<Option<String>> = channels.iter().map(|ch| attr(ch, "Name")).collect();
    let per_channel_text = |key: &str| -> Vec<Field> {
        channels
            .iter()
            .map(|ch| Field::from_text(text_at(ch, &[key])))
            .collect()
    };
    let per_channel_number = |keys: &[&str]| -> Vec<Field> {
        channels
            .iter()
            .map(|ch| round_scalar(&ch.path(keys)))
            .collect()
    };

    set.set(ILLUMINATION_TYPES, per_channel_text("IlluminationType"));
    set.set(CONTRAST_METHODS, per_channel_text("ContrastMethod"));
    set.set(ACQUISITION_MODES, per_channel_text("AcquisitionMode"));
    set.set(DYE_NAMES, per_channel_text("Fluor"));
    set.set(EXCITATION_WAVELENGTHS, per_channel_number(&["ExcitationWavelength"]));
    set.set(EMISSION_WAVELENGTHS, per_channel_number(&["EmissionWavelength"]));
    set.set(PINHOLE_SIZES_AIRY, per_channel_number(&["PinholeSizeAiry"]));
    set.set(ZOOM, per_channel_number(&["LaserScanInfo", "ZoomX"]));
    set.set(
        TOTAL_MAGNIFICATION,
        per_channel_number(&["CustomAttributes", "MM.TotalMagnification"]),
    );

    let detectors = detector_records(block);
    let mut ranges = Vec::with_capacity(names.len());
    let mut pinholes = Vec::with_capacity(names.len());
    let mut virtual_pinholes = Vec::with_capacity(names.len());
    for name in &names {
        let name = name.as_deref().unwrap_or("");
        let detector = correlate(name, &detectors);

        let mut range = detector
            .map(|d| wavelength_range(d.node))
            .unwrap_or(Field::Missing);
        if name.contains(AIRYSCAN_CHANNEL_MARKER) {
            // First ChA detector with a filter set, whatever the channel is called
            if let Some(filters) = detectors
                .iter()
                .filter(|d| d.channel_name.contains(AIRYSCAN_CHANNEL_MARKER))
                .find_map(|d| filter_set(d.node))
            {
                debug!("Channel {:?}: filter set {:?} replaces wavelength range", name, filters);
                range = Field::text(filters);
            }
        }
        ranges.push(range);

        pinholes.push(
            detector
                .map(|d| meters_to_microns(&d.node.path(&["PinholeDiameter"])))
                .unwrap_or(Field::Missing),
        );

        virtual_pinholes.push(
            correlate_where(name, &detectors, |d| {
                attr(d.node, "Name").as_deref() == Some(AIRYSCAN_DETECTOR)
            })
            .map(|d| meters_to_microns(&d.node.path(&["AiryScanVirtualPinholeSize"])))
            .unwrap_or(Field::Missing),
        );
    }
    set.set(EMISSION_WAVELENGTH_RANGE, ranges);
    set.set(PINHOLE_DIAMETERS, pinholes);
    set.set(AIRYSCAN_VIRTUAL_PINHOLE, virtual_pinholes);
    set.set(CHANNEL_NAMES, names.into_iter().map(Field::from_text).collect::<Vec<_>>());

    set
}

/// Microscope system name, falling back to the hardware configuration.
fn system_name(meta: &RawNode, info: &RawNode) -> Option<String> {
    let microscope = as_list(info.path(&["Instrument", "Microscopes", "Microscope"]));
    if let Some(system) = microscope.iter().find_map(|m| text_at(m, &["System"])) {
        return Some(system);
    }

    let devices = as_list(meta.path(&["HardwareSetting", "Configuration", "Device"]));
    let named = devices
        .iter()
        .find(|d| attr(d, "Id").as_deref() == Some("Microscope"))
        .and_then(|d| attr(d, "Name"))
        .or_else(|| devices.iter().find_map(|d| attr(d, "Name")));
    if let Some(name) = &named {
        debug!("System name taken from hardware device {:?}", name);
    }
    named
}

/// Number of distinct channel references across all tracks.
fn channel_count(image: &RawNode) -> Field {
    let mut seen = HashSet::new();
    for track in as_list(image.path(&["Dimensions", "Tracks", "Track"])) {
        for reference in as_list(track.path(&["ChannelRefs", "ChannelRef"])) {
            if let Some(id) = attr(reference, "Id") {
                seen.insert(id);
            }
        }
    }

    if seen.is_empty() {
        debug!("No channel references; using Image/SizeC");
        to_int(&image.path(&["SizeC"]))
    } else {
        Field::int(seen.len() as i64)
    }
}

/// Pixel size of one axis in microns.
///
/// Scan-mode scaling is preferred; the scaling distance list is the
/// fallback. Zero means "not set" on both paths.
fn pixel_size(meta: &RawNode, block: &RawNode, axis: &str) -> Field {
    let key = format!("Scaling{axis}");
    let primary = nonzero_meters_to_microns(&block.path(&["AcquisitionModeSetup", key.as_str()]));
    primary.or_else(|| {
        let distance = as_list(meta.path(&["Scaling", "Items", "Distance"]))
            .into_iter()
            .find(|d| attr(d, "Id").as_deref() == Some(axis))
            .and_then(|d| d.path(&["Value"]));
        debug!("Pixel size {} from scaling distance list", axis);
        nonzero_meters_to_microns(&distance)
    })
}

/// Time interval in seconds, from the time-series setup or, failing that,
/// from the interval switch action.
fn time_interval(block: &RawNode) -> Field {
    let primary = block.path(&["SubDimensionSetups", "TimeSeriesSetup", "Interval", "TimeSpan"]);
    interval_from_span(primary).or_else(|| {
        as_list(block.path(&["TimeSeriesSetup", "Switches", "Switch"]))
            .into_iter()
            .map(|switch| {
                interval_from_span(switch.path(&[
                    "SwitchAction",
                    "SetIntervalAction",
                    "Interval",
                    "TimeSpan",
                ]))
            })
            .find(|field| !field.is_missing())
            .unwrap_or(Field::Missing)
    })
}

fn interval_from_span(span: Option<&RawNode>) -> Field {
    match span {
        Some(span) => {
            let unit = text_at(span, &["DefaultUnitFormat"]);
            seconds_from_interval(&span.path(&["Value"]), unit.as_deref())
        }
        None => Field::Missing,
    }
}

/// All detectors of all tracks of the acquisition block, in document order.
fn detector_records(block: &RawNode) -> Vec<DetectorRecord<'_>> {
    as_list(block.path(&["MultiTrackSetup", "TrackSetup"]))
        .into_iter()
        .flat_map(|track| as_list(track.path(&["Detectors", "Detector"])))
        .map(|detector| {
            DetectorRecord::new(
                text_at(detector, &["ImageChannelName"]).unwrap_or_default(),
                detector,
            )
        })
        .collect()
}

/// Detection wavelength range(s) of a detector in nm, as `"start - end"`.
fn wavelength_range(detector: &RawNode) -> Field {
    let ranges: Vec<String> = as_list(
        detector.path(&["DetectorWavelengthRanges", "DetectorWavelengthRange"]),
    )
    .into_iter()
    .filter_map(|range| {
        let start = meters_to_nanometers(&range.path(&["WavelengthStart"]));
        let end = meters_to_nanometers(&range.path(&["WavelengthEnd"]));
        (!start.is_missing() && !end.is_missing()).then(|| format!("{start} - {end}"))
    })
    .collect();

    if ranges.is_empty() {
        Field::Missing
    } else {
        Field::text(ranges.join(", "))
    }
}

/// Filter-set description of a detector; several values are joined.
fn filter_set(detector: &RawNode) -> Option<String> {
    let node = detector.path(&["Filtersets", "Filterset"])?;
    let text = match node {
        RawNode::Seq(items) => items
            .iter()
            .filter_map(|item| item.as_text().map(|t| t.trim().to_string()))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.as_text()?.trim().to_string(),
    };
    (!text.is_empty()).then_some(text)
}
