//! Reduction of a LIF XML header to the common schema.
//!
//! Leica spreads per-channel optics across unrelated element kinds, so each
//! list field is harvested from its own element kind within the image's
//! `Data` subtree, in document order.

use log::debug;

use crate::formats::FileFormat;
use crate::schema::fields::*;
use crate::schema::{assemble, Field, FieldSet, MetadataOutput};
use crate::tree::{as_list, attr, descendants, find_attr, RawNode};
use crate::units::{image_extent, meters_to_microns, round_scalar, round_to, to_int};

/// One image element of a LIF project.
#[derive(Debug, Clone, Copy)]
pub struct LifImage<'a> {
    /// Position among the project's images, in document order (0-based)
    pub index: usize,
    /// The `Element` node
    pub node: &'a RawNode,
}

impl<'a> LifImage<'a> {
    /// Image name (`@Name` of the element).
    pub fn name(&self) -> Option<String> {
        attr(self.node, "Name")
    }

    fn data(&self) -> &'a RawNode {
        self.node.path(&["Data"]).unwrap_or(self.node)
    }

    fn description(&self) -> Option<&'a RawNode> {
        self.node.path(&["Data", "Image", "ImageDescription"])
    }
}

/// All image elements of a LIF header tree, depth first in document order.
pub fn find_images(tree: &RawNode) -> Vec<LifImage<'_>> {
    let mut nodes = Vec::new();
    for root in as_list(tree.path(&["LMSDataContainerHeader", "Element"])) {
        collect_images(root, &mut nodes);
    }
    nodes
        .into_iter()
        .enumerate()
        .map(|(index, node)| LifImage { index, node })
        .collect()
}

fn collect_images<'a>(element: &'a RawNode, found: &mut Vec<&'a RawNode>) {
    let is_image = element.path(&["Data", "Image", "ImageDescription"]).is_some();
    let empty = attr(element.path(&["Memory"]).unwrap_or(element), "Size").as_deref() == Some("0");
    if is_image && !empty {
        found.push(element);
    }
    for child in as_list(element.path(&["Children", "Element"])) {
        collect_images(child, found);
    }
}

/// Extract the LIF schema for one image.
///
/// Document-level identity (user, system, dates) is looked up in the image
/// first and then in the whole header.
pub fn extract_image(
    tree: &RawNode,
    image: &LifImage<'_>,
    fallback_name: Option<&str>,
) -> MetadataOutput {
    assemble(FileFormat::Lif, extract_fields(tree, image, fallback_name))
}

/// Extract the LIF fields for one image without ordering them.
pub fn extract_fields(tree: &RawNode, image: &LifImage<'_>, fallback_name: Option<&str>) -> FieldSet {
    let scope = image.data();
    let lookup = |name: &str| find_attr(scope, name).or_else(|| find_attr(tree, name));

    let mut set = FieldSet::new();
    set.set(IMAGE_INDEX, Field::int(image.index as i64 + 1));
    set.set(IMAGE_NAME, Field::from_text(image.name()));

    let project = as_list(tree.path(&["LMSDataContainerHeader", "Element"]))
        .into_iter()
        .next()
        .and_then(|root| attr(root, "Name"));
    set.set(
        DOCUMENT_NAME,
        Field::from_text(project.or_else(|| fallback_name.map(str::to_string))),
    );
    set.set(DOCUMENT_USER_NAME, Field::from_text(lookup("UserName")));
    set.set(DOCUMENT_CREATION_DATE, Field::from_text(lookup("CreationDate")));

    let (application, software) = application(tree);
    set.set(APPLICATION_NAME, Field::from_text(application));
    set.set(APPLICATION_VERSION, Field::from_text(software));

    let system_type = lookup("SystemTypeName");
    set.set(SYSTEM_NAME, Field::from_text(system_type.clone()));
    set.set(SYSTEM_TYPE_NAME, Field::from_text(system_type));
    set.set(
        DATA_SOURCE_TYPE_NAME,
        Field::from_text(
            lookup("DataSourceTypeName")
                .or_else(|| descendants(tree, "DataSourceTypeName").into_iter().find_map(text)),
        ),
    );
    set.set(
        ACQUISITION_DATE,
        Field::from_text(
            descendants(scope, "AcquisitionDate")
                .into_iter()
                .find_map(text)
                .or_else(|| lookup("AcquisitionDate")),
        ),
    );

    let channel_descriptions: Vec<&RawNode> = image
        .description()
        .map(|d| as_list(d.path(&["Channels", "ChannelDescription"])))
        .unwrap_or_default();
    set.set(
        PIXEL_TYPE,
        Field::from_text(lookup("PixelType").or_else(|| {
            channel_descriptions
                .first()
                .and_then(|c| attr(c, "Resolution"))
                .map(|bits| format!("{bits} bit"))
        })),
    );
    set.set(
        SIZE_C,
        if channel_descriptions.is_empty() {
            Field::Missing
        } else {
            Field::int(channel_descriptions.len() as i64)
        },
    );
    set.set(SIZE_S, Field::Missing);

    geometry(&mut set, image, scope);

    set.set(OBJECTIVE_MODEL, Field::from_text(lookup("ObjectiveName")));
    set.set(OBJECTIVE_NA, round_scalar(&lookup("NumericalAperture")));
    set.set(OBJECTIVE_MAGNIFICATION, round_scalar(&lookup("Magnification")));
    set.set(OBJECTIVE_REFRACTIVE_INDEX, round_scalar(&lookup("RefractionIndex")));
    set.set(OBJECTIVE_MEDIUM, Field::from_text(lookup("Immersion")));

    set.set(ILLUMINATION_TYPES, Field::from_text(lookup("IlluminationType")));
    set.set(CONTRAST_METHODS, Field::from_text(lookup("ContrastMethod")));
    set.set(ACQUISITION_MODES, Field::from_text(lookup("AcquisitionMode")));
    set.set(TOTAL_MAGNIFICATION, round_scalar(&lookup("TotalMagnification")));

    channels(&mut set, scope);

    set
}

fn text(node: &RawNode) -> Option<String> {
    node.as_text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Application name and software version; the last attachment declaring
/// each one wins.
fn application(tree: &RawNode) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut version = None;
    for attachment in descendants(tree, "Attachment") {
        if let Some(value) = attr(attachment, "Application") {
            name = Some(value);
        }
        if let Some(value) = attr(attachment, "Software") {
            version = Some(value);
        }
    }
    (name, version)
}

/// Dimension ids used by `DimensionDescription/@DimID`.
mod dim {
    pub const X: &str = "1";
    pub const Y: &str = "2";
    pub const Z: &str = "3";
    pub const T: &str = "4";
    pub const M: &str = "10";
}

/// Sizes, pixel sizes, image extents and the frame interval.
fn geometry(set: &mut FieldSet, image: &LifImage<'_>, scope: &RawNode) {
    let dimensions: Vec<&RawNode> = image
        .description()
        .map(|d| as_list(d.path(&["Dimensions", "DimensionDescription"])))
        .unwrap_or_default();
    let find = |id: &str| {
        dimensions
            .iter()
            .copied()
            .find(|d| attr(d, "DimID").as_deref() == Some(id))
    };
    // Axes other than X and Y that an image does not declare have one plane
    let count = |id: &str| match find(id) {
        Some(d) => to_int(&attr(d, "NumberOfElements")),
        None if !dimensions.is_empty() && id != dim::X && id != dim::Y => Field::int(1),
        None => Field::Missing,
    };

    for (id, size_key, pixel_key, extent_key) in [
        (dim::X, SIZE_X, PIXEL_SIZE_X, IMAGE_SIZE_X),
        (dim::Y, SIZE_Y, PIXEL_SIZE_Y, IMAGE_SIZE_Y),
        (dim::Z, SIZE_Z, PIXEL_SIZE_Z, IMAGE_SIZE_Z),
    ] {
        let size = count(id);
        let pixel = find(id).map(step_microns).unwrap_or(Field::Missing);
        set.set(extent_key, image_extent(&size, &pixel));
        set.set(size_key, size);
        set.set(pixel_key, pixel);
    }
    set.set(SIZE_T, count(dim::T));
    set.set(SIZE_M, count(dim::M));

    let interval = find(dim::T)
        .map(step_seconds)
        .unwrap_or(Field::Missing)
        .or_else(|| {
            debug!("No time dimension step; looking for a TimeInterval attribute");
            round_seconds(find_attr(scope, "TimeInterval"))
        });
    set.set(TIME_INTERVAL, interval);
}

/// Physical length of the dimension divided by the number of steps.
fn step(dimension: &RawNode) -> Option<f64> {
    let n = attr(dimension, "NumberOfElements")?.trim().parse::<f64>().ok()?;
    let length = attr(dimension, "Length")?.trim().parse::<f64>().ok()?;
    (n > 1.0 && length.is_finite() && length != 0.0).then(|| length.abs() / (n - 1.0))
}

fn step_microns(dimension: &RawNode) -> Field {
    let Some(step) = step(dimension) else {
        return Field::Missing;
    };
    let unit = attr(dimension, "Unit").unwrap_or_else(|| "m".to_string());
    let microns = match unit.as_str() {
        "m" => step * 1e6,
        "mm" => step * 1e3,
        "um" | "µm" | "\u{3bc}m" => step,
        "nm" => step * 1e-3,
        other => {
            debug!("Unknown length unit {:?}, assuming metres", other);
            step * 1e6
        }
    };
    round_scalar(&microns)
}

fn step_seconds(dimension: &RawNode) -> Field {
    match (step(dimension), attr(dimension, "Unit").as_deref()) {
        (Some(step), Some("s") | None) => Field::float(round_to(step, 6)),
        (Some(step), Some("ms")) => Field::float(round_to(step / 1000.0, 6)),
        _ => Field::Missing,
    }
}

fn round_seconds(value: Option<String>) -> Field {
    match value.as_deref().and_then(|v| v.trim().parse::<f64>().ok()) {
        Some(v) if v.is_finite() => Field::float(round_to(v, 6)),
        _ => Field::Missing,
    }
}

/// Per-channel lists harvested from the different element kinds.
fn channels(set: &mut FieldSet, scope: &RawNode) {
    let descriptions = descendants(scope, "ChannelDescription");
    let confocal = descendants(scope, "ATLConfocalSettingDefinition");
    let bands = descendants(scope, "MultiBand");
    let laser_lines = descendants(scope, "LaserLineSetting");
    let detectors = descendants(scope, "Detector");

    let mut names: Vec<Option<String>> = Vec::new();
    for description in &descriptions {
        let name = attr(description, "LUTName")
            .or_else(|| attr(description, "ChannelName"))
            .or_else(|| attr(description, "NameOfMeasuredQuantity"));
        if !names.contains(&name) {
            names.push(name);
        }
    }
    set.set(CHANNEL_NAMES, names.into_iter().map(Field::from_text).collect::<Vec<_>>());

    let attrs_of = |nodes: &[&RawNode], key: &str, convert: fn(Option<String>) -> Field| -> Vec<Field> {
        nodes
            .iter()
            .filter_map(|node| attr(node, key))
            .map(|value| convert(Some(value)))
            .collect()
    };
    let number = |v: Option<String>| round_scalar(&v);
    let microns = |v: Option<String>| meters_to_microns(&v);

    let mut airy = attrs_of(&descriptions[..], "PinholeAiry", number);
    airy.extend(attrs_of(&confocal[..], "PinholeAiry", number));
    set.set(PINHOLE_SIZES_AIRY, airy);

    let mut diameters = attrs_of(&descriptions[..], "Pinhole", microns);
    diameters.extend(attrs_of(&confocal[..], "Pinhole", microns));
    set.set(PINHOLE_DIAMETERS, diameters);

    set.set(AIRYSCAN_VIRTUAL_PINHOLE, attrs_of(&confocal[..], "AiryScanVirtualPinholeSize", microns));
    set.set(ZOOM, attrs_of(&confocal[..], "Zoom", number));

    set.set(
        DYE_NAMES,
        bands
            .iter()
            .map(|band| Field::from_text(attr(band, "DyeName")))
            .collect::<Vec<_>>(),
    );
    set.set(EXCITATION_ALL, attrs_of(&bands[..], "TargetWaveLengthBegin", number));
    set.set(EMISSION_ALL, attrs_of(&bands[..], "TargetWaveLengthEnd", number));
    set.set(
        EMISSION_WAVELENGTH_RANGE,
        bands
            .iter()
            .map(|band| {
                let left = round_scalar(&attr(band, "LeftWorld"));
                let right = round_scalar(&attr(band, "RightWorld"));
                if left.is_missing() || right.is_missing() {
                    Field::Missing
                } else {
                    Field::text(format!("{left} - {right}"))
                }
            })
            .collect::<Vec<_>>(),
    );

    let mut active_lines = Vec::new();
    for setting in &laser_lines {
        if attr(setting, "IsLineChecked").as_deref() != Some("1") {
            continue;
        }
        let Some(line) = attr(setting, "LaserLine") else {
            continue;
        };
        let value = round_scalar(&line);
        if !active_lines.contains(&value) {
            active_lines.push(value);
        }
    }
    set.set(EXCITATION_ACTIVE, active_lines);

    let mut active_channels = Vec::new();
    for detector in &detectors {
        if attr(detector, "IsActive").as_deref() != Some("1") {
            continue;
        }
        if let Some(name) = attr(detector, "ChannelName") {
            let value = Field::text(name);
            if !active_channels.contains(&value) {
                active_channels.push(value);
            }
        }
    }
    set.set(EMISSION_CHANNELS_ACTIVE, active_channels);
}
