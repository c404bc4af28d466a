//! Writers for small synthetic CZI, LIF and ND2 files.
//!
//! The fixtures carry only the bytes the readers look at; pixel data is
//! never written.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Position of the metadata segment in generated CZI files.
const CZI_METADATA_POSITION: usize = 544;

fn czi_segment(buf: &mut Vec<u8>, id: &str, size: i64) {
    let mut raw_id = [0u8; 16];
    raw_id[..id.len()].copy_from_slice(id.as_bytes());
    buf.write_all(&raw_id).unwrap();
    buf.write_i64::<LittleEndian>(size).unwrap();
    buf.write_i64::<LittleEndian>(size).unwrap();
}

/// Bytes of a CZI file whose metadata segment holds `xml`.
pub fn czi_bytes(xml: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    czi_segment(&mut buf, "ZISRAWFILE", 512);
    buf.write_i32::<LittleEndian>(1).unwrap();
    buf.write_i32::<LittleEndian>(0).unwrap();
    buf.write_all(&[0u8; 8 + 32 + 4]).unwrap();
    buf.write_i64::<LittleEndian>(0).unwrap();
    buf.write_i64::<LittleEndian>(CZI_METADATA_POSITION as i64).unwrap();
    buf.write_i32::<LittleEndian>(0).unwrap();
    buf.write_i64::<LittleEndian>(0).unwrap();
    buf.resize(CZI_METADATA_POSITION, 0);

    czi_segment(&mut buf, "ZISRAWMETADATA", 256 + xml.len() as i64);
    buf.write_i32::<LittleEndian>(xml.len() as i32).unwrap();
    buf.write_i32::<LittleEndian>(0).unwrap();
    buf.write_all(&[0u8; 248]).unwrap();
    buf.write_all(xml.as_bytes()).unwrap();
    buf
}

/// Bytes of a LIF file whose header holds `xml`.
pub fn lif_bytes(xml: &str) -> Vec<u8> {
    let units: Vec<u16> = xml.encode_utf16().collect();
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(0x70).unwrap();
    buf.write_u32::<LittleEndian>(5 + units.len() as u32 * 2).unwrap();
    buf.write_u8(0x2A).unwrap();
    buf.write_u32::<LittleEndian>(units.len() as u32).unwrap();
    for unit in units {
        buf.write_u16::<LittleEndian>(unit).unwrap();
    }
    buf
}

const ND2_CHUNK_MAGIC: u32 = 0x0ABE_CEDA;
const ND2_MAP_SIGNATURE: &[u8; 32] = b"ND2 CHUNK MAP SIGNATURE 0000001!";

fn nd2_chunk(buf: &mut Vec<u8>, name: &str, data: &[u8]) -> u64 {
    let offset = buf.len() as u64;
    buf.write_u32::<LittleEndian>(ND2_CHUNK_MAGIC).unwrap();
    buf.write_u32::<LittleEndian>(name.len() as u32).unwrap();
    buf.write_u64::<LittleEndian>(data.len() as u64).unwrap();
    buf.write_all(name.as_bytes()).unwrap();
    buf.write_all(data).unwrap();
    offset
}

/// Bytes of a chunked ND2 file holding the named chunks.
pub fn nd2_bytes(chunks: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut map = Vec::new();
    for (name, data) in chunks {
        let offset = nd2_chunk(&mut buf, name, data);
        map.write_all(name.as_bytes()).unwrap();
        map.write_u64::<LittleEndian>(offset).unwrap();
        map.write_u64::<LittleEndian>(data.len() as u64).unwrap();
    }
    map.write_all(ND2_MAP_SIGNATURE).unwrap();
    let map_offset = nd2_chunk(&mut buf, "ND2 FILEMAP SIGNATURE NAME 0001!", &map);
    buf.write_all(ND2_MAP_SIGNATURE).unwrap();
    buf.write_u64::<LittleEndian>(map_offset).unwrap();
    buf
}

/// One CLX descriptor item.
#[derive(Debug, Clone)]
pub enum Clx {
    UInt(&'static str, u32),
    Double(&'static str, f64),
    Text(&'static str, &'static str),
    Level(&'static str, Vec<Clx>),
}

fn clx_name(buf: &mut Vec<u8>, kind: u8, name: &str) {
    let units: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    buf.write_u8(kind).unwrap();
    buf.write_u8(units.len() as u8).unwrap();
    for unit in units {
        buf.write_u16::<LittleEndian>(unit).unwrap();
    }
}

/// Encode CLX items as an uncompressed descriptor.
pub fn clx(items: &[Clx]) -> Vec<u8> {
    let mut buf = Vec::new();
    for item in items {
        match item {
            Clx::UInt(n, v) => {
                clx_name(&mut buf, 3, n);
                buf.write_u32::<LittleEndian>(*v).unwrap();
            }
            Clx::Double(n, v) => {
                clx_name(&mut buf, 6, n);
                buf.write_f64::<LittleEndian>(*v).unwrap();
            }
            Clx::Text(n, v) => {
                clx_name(&mut buf, 8, n);
                for unit in v.encode_utf16().chain(std::iter::once(0)) {
                    buf.write_u16::<LittleEndian>(unit).unwrap();
                }
            }
            Clx::Level(n, children) => {
                let start = buf.len();
                clx_name(&mut buf, 11, n);
                let nested = clx(children);
                let header_len = (buf.len() - start) + 12;
                buf.write_u32::<LittleEndian>(children.len() as u32).unwrap();
                buf.write_u64::<LittleEndian>((header_len + nested.len()) as u64)
                    .unwrap();
                buf.extend_from_slice(&nested);
                for _ in children {
                    buf.write_u64::<LittleEndian>(0).unwrap();
                }
            }
        }
    }
    buf
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// A small confocal CZI document.
pub const CZI_XML: &str = r#"<ImageDocument>
  <Metadata>
    <Experiment>
      <ExperimentBlocks>
        <AcquisitionBlock>
          <AcquisitionModeSetup>
            <ScalingX>1e-07</ScalingX>
            <ScalingY>1e-07</ScalingY>
            <ScalingZ>5e-07</ScalingZ>
          </AcquisitionModeSetup>
        </AcquisitionBlock>
      </ExperimentBlocks>
    </Experiment>
    <Information>
      <Application>
        <Name>ZEN</Name>
        <Version>3.4</Version>
      </Application>
      <Document>
        <Name>wing_disc</Name>
        <UserName>operator</UserName>
        <CreationDate>2022-11-02T14:00:00</CreationDate>
      </Document>
      <Image>
        <PixelType>Gray8</PixelType>
        <SizeX>256</SizeX>
        <SizeY>128</SizeY>
        <SizeZ>4</SizeZ>
        <SizeC>1</SizeC>
        <ObjectiveSettings>
          <Medium>Air</Medium>
          <RefractiveIndex>1.0</RefractiveIndex>
        </ObjectiveSettings>
        <Dimensions>
          <Channels>
            <Channel Id="Channel:0" Name="DAPI">
              <Fluor>DAPI</Fluor>
              <ExcitationWavelength>405</ExcitationWavelength>
              <EmissionWavelength>461</EmissionWavelength>
            </Channel>
          </Channels>
        </Dimensions>
      </Image>
      <Instrument>
        <Microscopes>
          <Microscope>
            <System>LSM 900</System>
          </Microscope>
        </Microscopes>
        <Objectives>
          <Objective>
            <Manufacturer>
              <Model>Plan-Apochromat 20x/0.8</Model>
            </Manufacturer>
            <LensNA>0.8</LensNA>
            <NominalMagnification>20</NominalMagnification>
          </Objective>
        </Objectives>
      </Instrument>
    </Information>
  </Metadata>
</ImageDocument>"#;

/// A LIF project with two images, the second one nested in a folder.
pub const LIF_XML: &str = r#"<LMSDataContainerHeader Version="2">
  <Element Name="screen.lif">
    <Data><Experiment UserName="imager" CreationDate="2021-07-01T08:30:00"/></Data>
    <Memory Size="0"/>
    <Children>
      <Element Name="Position 1">
        <Data>
          <Image>
            <ImageDescription>
              <Channels>
                <ChannelDescription Resolution="16" LUTName="Green"/>
              </Channels>
              <Dimensions>
                <DimensionDescription DimID="1" NumberOfElements="101" Length="2e-05" Unit="m"/>
                <DimensionDescription DimID="2" NumberOfElements="51" Length="1e-05" Unit="m"/>
              </Dimensions>
            </ImageDescription>
          </Image>
        </Data>
        <Memory Size="10000"/>
      </Element>
      <Element Name="Plate">
        <Data/>
        <Memory Size="0"/>
        <Children>
          <Element Name="Position 2">
            <Data>
              <Image>
                <ImageDescription>
                  <Channels>
                    <ChannelDescription Resolution="8" LUTName="Red"/>
                    <ChannelDescription Resolution="8" LUTName="Gray"/>
                  </Channels>
                  <Dimensions>
                    <DimensionDescription DimID="1" NumberOfElements="32" Length="3.1e-06" Unit="m"/>
                    <DimensionDescription DimID="2" NumberOfElements="32" Length="3.1e-06" Unit="m"/>
                  </Dimensions>
                </ImageDescription>
              </Image>
            </Data>
            <Memory Size="2048"/>
          </Element>
        </Children>
      </Element>
    </Children>
  </Element>
</LMSDataContainerHeader>"#;

/// Chunks of a small time-lapse ND2 file.
pub fn nd2_chunks(text_info: Vec<u8>) -> Vec<(&'static str, Vec<u8>)> {
    use Clx::*;

    vec![
        (
            "ImageAttributesLV!",
            clx(&[Level(
                "SLxImageAttributes",
                vec![
                    UInt("uiWidth", 2048),
                    UInt("uiHeight", 2048),
                    UInt("uiComp", 1),
                    UInt("uiBpcSignificant", 16),
                ],
            )]),
        ),
        (
            "ImageMetadataLV!",
            clx(&[Level(
                "SLxExperiment",
                vec![
                    UInt("eType", 1),
                    Level("uLoopPars", vec![UInt("uiCount", 10), Double("dPeriod", 60000.0)]),
                ],
            )]),
        ),
        (
            "ImageMetadataSeqLV|0!",
            clx(&[Level(
                "SLxPictureMetadata",
                vec![
                    Text("wsObjectiveName", "Plan Fluor 10x"),
                    Double("dObjectiveMag", 10.0),
                    Double("dObjectiveNA", 0.3),
                    Double("dRefractIndex1", 1.0),
                    Double("dCalibration", 0.65),
                    Level(
                        "sPicturePlanes",
                        vec![Level(
                            "sPlaneNew",
                            vec![Level(
                                "a0",
                                vec![
                                    Text("sDescription", "Brightfield"),
                                    Double("dEmissionWL", 0.0),
                                ],
                            )],
                        )],
                    ),
                ],
            )]),
        ),
        ("ImageTextInfoLV!", text_info),
    ]
}

/// A well-formed text-info descriptor.
pub fn nd2_text_info() -> Vec<u8> {
    clx(&[Clx::Level(
        "SLxImageTextInfo",
        vec![
            Clx::Text("TextInfoItem_4", "B. Scientist"),
            Clx::Text("TextInfoItem_5", "Growth curve"),
        ],
    )])
}
