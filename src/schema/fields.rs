//! Field names and per-vendor field orders.
//!
//! Names are part of the public contract: documentation forms and exported
//! ReadMe files key on them, so they are kept verbatim even where the
//! spelling is irregular (`Illumination_Types`).

use crate::formats::FileFormat;

pub const DOCUMENT_NAME: &str = "Document Name";
pub const DOCUMENT_USER_NAME: &str = "Document User Name";
pub const DOCUMENT_CREATION_DATE: &str = "Document Creation Date";
pub const APPLICATION_NAME: &str = "Application Name";
pub const APPLICATION_VERSION: &str = "Application Version";
pub const SYSTEM_NAME: &str = "System Name";
pub const PIXEL_TYPE: &str = "Pixel Type";

pub const SIZE_X: &str = "Size X";
pub const SIZE_Y: &str = "Size Y";
pub const SIZE_Z: &str = "Size Z";
pub const SIZE_M: &str = "Size M";
pub const SIZE_T: &str = "Size T";
pub const SIZE_C: &str = "Size C";
pub const SIZE_S: &str = "Size S";

pub const PIXEL_SIZE_X: &str = "Pixel Size X (um)";
pub const PIXEL_SIZE_Y: &str = "Pixel Size Y (um)";
pub const PIXEL_SIZE_Z: &str = "Pixel Size Z (um)";
pub const IMAGE_SIZE_X: &str = "Image Size X (um)";
pub const IMAGE_SIZE_Y: &str = "Image Size Y (um)";
pub const IMAGE_SIZE_Z: &str = "Image Size Z (um)";
pub const TIME_INTERVAL: &str = "Time Interval (s)";

pub const OBJECTIVE_MODEL: &str = "Objective Model";
pub const OBJECTIVE_NA: &str = "Objective NA";
pub const OBJECTIVE_MAGNIFICATION: &str = "Objective Magnification";
pub const OBJECTIVE_REFRACTIVE_INDEX: &str = "Objective Refractive Index";
pub const OBJECTIVE_MEDIUM: &str = "Objective Medium";

pub const ILLUMINATION_TYPES: &str = "Illumination_Types";
pub const CONTRAST_METHODS: &str = "Contrast Methods";
pub const ACQUISITION_MODES: &str = "Acquisition Modes";
pub const CHANNEL_NAMES: &str = "Channel Names";
pub const DYE_NAMES: &str = "Dye Names";
pub const EXCITATION_WAVELENGTHS: &str = "Excitation Wavelengths";
pub const EMISSION_WAVELENGTHS: &str = "Emission Wavelengths";
pub const EMISSION_WAVELENGTH_RANGE: &str = "Emission Wavelength Range (nm)";
pub const PINHOLE_SIZES_AIRY: &str = "Pinhole Sizes (Airy Units)";
pub const PINHOLE_DIAMETERS: &str = "Pinhole Diameters (um)";
pub const AIRYSCAN_VIRTUAL_PINHOLE: &str = "AiryScan Virtual Pinhole Size (um)";
pub const ZOOM: &str = "Zoom";
pub const TOTAL_MAGNIFICATION: &str = "MM.TotalMagnification (per channel)";

pub const IMAGE_INDEX: &str = "Image Index";
pub const IMAGE_NAME: &str = "Image Name";
pub const EXCITATION_ACTIVE: &str = "Excitation Wavelengths (active)";
pub const EMISSION_CHANNELS_ACTIVE: &str = "Emission Channels (active)";
pub const EXCITATION_ALL: &str = "Excitation Wavelengths (all)";
pub const EMISSION_ALL: &str = "Emission Wavelengths (all)";
pub const DATA_SOURCE_TYPE_NAME: &str = "DataSourceTypeName";
pub const SYSTEM_TYPE_NAME: &str = "System Type Name";
pub const ACQUISITION_DATE: &str = "Acquisition Date";

pub const EXPERIMENT_DESCRIPTION: &str = "Experiment Description";
pub const OPTICS: &str = "Optics";

/// Zeiss CZI output order.
pub const CZI_FIELDS: &[&str] = &[
    DOCUMENT_NAME,
    DOCUMENT_USER_NAME,
    DOCUMENT_CREATION_DATE,
    APPLICATION_NAME,
    APPLICATION_VERSION,
    SYSTEM_NAME,
    PIXEL_TYPE,
    SIZE_X,
    SIZE_Y,
    SIZE_Z,
    SIZE_M,
    SIZE_T,
    SIZE_C,
    SIZE_S,
    PIXEL_SIZE_X,
    PIXEL_SIZE_Y,
    PIXEL_SIZE_Z,
    IMAGE_SIZE_X,
    IMAGE_SIZE_Y,
    IMAGE_SIZE_Z,
    TIME_INTERVAL,
    OBJECTIVE_MODEL,
    OBJECTIVE_NA,
    OBJECTIVE_MAGNIFICATION,
    OBJECTIVE_REFRACTIVE_INDEX,
    OBJECTIVE_MEDIUM,
    ILLUMINATION_TYPES,
    CONTRAST_METHODS,
    ACQUISITION_MODES,
    CHANNEL_NAMES,
    DYE_NAMES,
    EXCITATION_WAVELENGTHS,
    EMISSION_WAVELENGTHS,
    EMISSION_WAVELENGTH_RANGE,
    PINHOLE_SIZES_AIRY,
    PINHOLE_DIAMETERS,
    AIRYSCAN_VIRTUAL_PINHOLE,
    ZOOM,
    TOTAL_MAGNIFICATION,
];

/// Leica LIF output order (one output per image).
pub const LIF_FIELDS: &[&str] = &[
    IMAGE_INDEX,
    IMAGE_NAME,
    DOCUMENT_NAME,
    DOCUMENT_USER_NAME,
    DOCUMENT_CREATION_DATE,
    APPLICATION_NAME,
    APPLICATION_VERSION,
    SYSTEM_NAME,
    PIXEL_TYPE,
    SIZE_X,
    SIZE_Y,
    SIZE_Z,
    SIZE_M,
    SIZE_T,
    SIZE_C,
    SIZE_S,
    PIXEL_SIZE_X,
    PIXEL_SIZE_Y,
    PIXEL_SIZE_Z,
    IMAGE_SIZE_X,
    IMAGE_SIZE_Y,
    IMAGE_SIZE_Z,
    TIME_INTERVAL,
    OBJECTIVE_MODEL,
    OBJECTIVE_NA,
    OBJECTIVE_MAGNIFICATION,
    OBJECTIVE_REFRACTIVE_INDEX,
    OBJECTIVE_MEDIUM,
    ILLUMINATION_TYPES,
    CONTRAST_METHODS,
    ACQUISITION_MODES,
    CHANNEL_NAMES,
    DYE_NAMES,
    EXCITATION_ACTIVE,
    EMISSION_CHANNELS_ACTIVE,
    EXCITATION_ALL,
    EMISSION_ALL,
    EMISSION_WAVELENGTH_RANGE,
    PINHOLE_SIZES_AIRY,
    PINHOLE_DIAMETERS,
    AIRYSCAN_VIRTUAL_PINHOLE,
    ZOOM,
    TOTAL_MAGNIFICATION,
    DATA_SOURCE_TYPE_NAME,
    SYSTEM_TYPE_NAME,
    ACQUISITION_DATE,
];

/// Nikon ND2 output order.
pub const ND2_FIELDS: &[&str] = &[
    DOCUMENT_NAME,
    DOCUMENT_USER_NAME,
    DOCUMENT_CREATION_DATE,
    APPLICATION_NAME,
    APPLICATION_VERSION,
    SYSTEM_NAME,
    PIXEL_TYPE,
    SIZE_X,
    SIZE_Y,
    SIZE_Z,
    SIZE_M,
    SIZE_T,
    SIZE_C,
    PIXEL_SIZE_X,
    PIXEL_SIZE_Y,
    PIXEL_SIZE_Z,
    IMAGE_SIZE_X,
    IMAGE_SIZE_Y,
    IMAGE_SIZE_Z,
    TIME_INTERVAL,
    OBJECTIVE_MODEL,
    OBJECTIVE_NA,
    OBJECTIVE_MAGNIFICATION,
    OBJECTIVE_REFRACTIVE_INDEX,
    OBJECTIVE_MEDIUM,
    CHANNEL_NAMES,
    EXCITATION_WAVELENGTHS,
    EMISSION_WAVELENGTHS,
    ZOOM,
    EXPERIMENT_DESCRIPTION,
    OPTICS,
];

/// The declared field order for a vendor.
pub fn field_order(format: FileFormat) -> &'static [&'static str] {
    match format {
        FileFormat::Czi => CZI_FIELDS,
        FileFormat::Lif => LIF_FIELDS,
        FileFormat::Nd2 => ND2_FIELDS,
    }
}
