//! Conversion of length prefixed H.264 samples into start code delimited streams.
//!
//! Samples coming from the host prefix every NAL unit with a 4 byte big endian length. The CDM
//! expects each unit to start with `00 00 00 01` instead, and expects SPS/PPS in band before
//! every key frame.

use crate::{Error, Reader, Result, engine::Subsample};
use log::debug;

pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Size of the length prefix in front of every NAL unit.
pub const NAL_LENGTH_SIZE: usize = 4;

/// A NAL unit located inside a length prefixed sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// Offset of the length prefix inside the sample.
    pub offset: usize,
    pub data: &'a [u8],
}

impl NalUnit<'_> {
    /// `nal_unit_type` from the unit header, if the unit is not empty.
    pub fn unit_type(&self) -> Option<u8> {
        self.data.first().map(|header| header & 0x1f)
    }
}

/// Split a length prefixed sample into its NAL units. Up to three trailing bytes that cannot
/// hold a length prefix are ignored.
pub fn nal_units(data: &[u8]) -> Result<Vec<NalUnit<'_>>> {
    let mut units = Vec::new();
    let mut offset = 0;

    while data.len() - offset >= NAL_LENGTH_SIZE {
        let length = unit_length(data, offset)?;
        let start = offset + NAL_LENGTH_SIZE;
        units.push(NalUnit {
            offset,
            data: &data[start..start + length],
        });
        offset = start + length;
    }

    Ok(units)
}

/// Overwrite every 4 byte length prefix of `data` with a start code. The length of `data` does
/// not change.
pub fn to_start_codes(data: &mut [u8]) -> Result<()> {
    let mut offset = 0;

    while data.len() - offset >= NAL_LENGTH_SIZE {
        let length = unit_length(data, offset)?;
        data[offset..offset + NAL_LENGTH_SIZE].copy_from_slice(&START_CODE);
        offset += NAL_LENGTH_SIZE + length;
    }

    Ok(())
}

fn unit_length(data: &[u8], offset: usize) -> Result<usize> {
    let prefix = [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ];
    let length = u32::from_be_bytes(prefix) as usize;
    let available = data.len() - offset - NAL_LENGTH_SIZE;

    if length > available {
        return Err(Error::TruncatedNalUnit {
            offset,
            length,
            available,
        });
    }

    Ok(length)
}

/// Parsed `AVCDecoderConfigurationRecord` (avcC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcConfig {
    pub version: u8,
    pub profile_idc: u8,
    pub profile_compatibility: u8,
    pub level_idc: u8,
    pub nal_length_size: u8,
    pub sps: Vec<Vec<u8>>,
    pub pps: Vec<Vec<u8>>,
}

impl AvcConfig {
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::read(&mut Reader::new(data)).map_err(|e| Error::InvalidCodecConfig(e.to_string()))
    }

    fn read(reader: &mut Reader<'_>) -> std::io::Result<Self> {
        let version = reader.read_u8()?;
        let profile_idc = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_idc = reader.read_u8()?;
        let nal_length_size = (reader.read_u8()? & 0x03) + 1;

        let sps_count = reader.read_u8()? & 0x1f;
        let mut sps = Vec::with_capacity(sps_count as usize);
        for _ in 0..sps_count {
            let length = reader.read_u16()? as usize;
            sps.push(reader.read_slice(length)?.to_vec());
        }

        let pps_count = reader.read_u8()?;
        let mut pps = Vec::with_capacity(pps_count as usize);
        for _ in 0..pps_count {
            let length = reader.read_u16()? as usize;
            pps.push(reader.read_slice(length)?.to_vec());
        }

        // High profile extensions (chroma format, bit depth, SPS ext) may follow.
        if reader.has_more_data() {
            debug!("Ignoring {} trailing avcC bytes.", reader.remaining());
        }

        Ok(Self {
            version,
            profile_idc,
            profile_compatibility,
            level_idc,
            nal_length_size,
            sps,
            pps,
        })
    }

    /// Every SPS followed by every PPS, each behind a start code.
    pub fn to_start_codes(&self) -> Vec<u8> {
        let size = self
            .sps
            .iter()
            .chain(&self.pps)
            .map(|unit| START_CODE.len() + unit.len())
            .sum();
        let mut out = Vec::with_capacity(size);

        for unit in self.sps.iter().chain(&self.pps) {
            out.extend_from_slice(&START_CODE);
            out.extend_from_slice(unit);
        }

        out
    }
}

/// Host codec specific data: one metadata byte followed by the avcC record.
pub fn split_codec_specific(codec_specific: &[u8]) -> Result<&[u8]> {
    match codec_specific.split_first() {
        Some((_, avcc)) if !avcc.is_empty() => Ok(avcc),
        _ => Err(Error::InvalidCodecConfig(
            "codec specific data holds no avcC record".to_owned(),
        )),
    }
}

/// The avcC record carried in host codec specific data, with its parsed form.
///
/// Fails unless the record uses 4 byte NAL length prefixes.
pub fn parse_codec_specific(codec_specific: &[u8]) -> Result<(&[u8], AvcConfig)> {
    let avcc = split_codec_specific(codec_specific)?;
    let config = AvcConfig::parse(avcc)?;

    if config.nal_length_size as usize != NAL_LENGTH_SIZE {
        return Err(Error::UnsupportedNalLengthSize(config.nal_length_size));
    }

    Ok((avcc, config))
}

/// Put `config` in front of an already reframed key frame payload and move the clear/cipher
/// boundary of the first subsample past it.
pub fn inject_config(payload: Vec<u8>, subsamples: &mut [Subsample], config: &[u8]) -> Vec<u8> {
    if config.is_empty() {
        return payload;
    }

    if let Some(first) = subsamples.first_mut() {
        first.clear_bytes = first
            .clear_bytes
            .saturating_add(u32::try_from(config.len()).unwrap_or(u32::MAX));
    }

    let mut out = Vec::with_capacity(config.len() + payload.len());
    out.extend_from_slice(config);
    out.extend_from_slice(&payload);
    out
}
