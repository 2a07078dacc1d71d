//! Copy planes out of a CDM video frame into a host frame.
//!
//! Plane offsets are derived from the strides and the picture height. The offsets reported by
//! the CDM are only compared against them.

use crate::{
    Error, Result,
    buffer::{VideoFormat, VideoFrame, VideoPlane},
    host::{DecodedFrame, DecodedPlane},
};
use log::{debug, warn};

/// Byte range of one plane inside the frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlaneRange {
    pub(crate) offset: usize,
    pub(crate) length: usize,
}

/// Ranges of the Y, U and V planes, in that index order.
pub(crate) fn plane_layout(frame: &VideoFrame) -> Result<[PlaneRange; 3]> {
    let height = frame.size().height as usize;
    let chroma_height = height.div_ceil(2);

    // Geometry comes from the CDM, sizes that do not fit in memory cannot be backed.
    let oversized = || Error::FrameBufferTooSmall {
        expected: usize::MAX,
        actual: frame.frame_buffer().map_or(0, |b| b.size() as usize),
    };

    let length = |plane: VideoPlane, rows: usize| {
        (frame.stride(plane) as usize)
            .checked_mul(rows)
            .ok_or_else(oversized)
    };

    let y = length(VideoPlane::Y, height)?;
    let u = length(VideoPlane::U, chroma_height)?;
    let v = length(VideoPlane::V, chroma_height)?;

    // YV12 stores V before U.
    let v_first = match frame.format() {
        VideoFormat::Yv12 => true,
        VideoFormat::I420 => false,
        VideoFormat::Unknown => {
            warn!("Decoded frame has no pixel format, assuming I420.");
            false
        }
    };

    let (first, second) = if v_first { (v, u) } else { (u, v) };
    let second_offset = y.checked_add(first).ok_or_else(oversized)?;
    second_offset.checked_add(second).ok_or_else(oversized)?;

    let (u_offset, v_offset) = if v_first {
        (second_offset, y)
    } else {
        (y, second_offset)
    };

    Ok([
        PlaneRange {
            offset: 0,
            length: y,
        },
        PlaneRange {
            offset: u_offset,
            length: u,
        },
        PlaneRange {
            offset: v_offset,
            length: v,
        },
    ])
}

/// Build the host frame, releasing the CDM frame buffer.
pub(crate) fn decoded_frame(frame: &mut VideoFrame, duration: u64) -> Result<DecodedFrame> {
    let layout = plane_layout(frame)?;
    let buffer = frame.take_frame_buffer().ok_or(Error::MissingFrameBuffer)?;
    let data = buffer.data();

    // plane_layout checked that every plane end fits in usize.
    let expected = layout
        .iter()
        .map(|range| range.offset.saturating_add(range.length))
        .max()
        .unwrap_or(0);

    if data.len() < expected {
        return Err(Error::FrameBufferTooSmall {
            expected,
            actual: data.len(),
        });
    }

    for plane in VideoPlane::ALL {
        let reported = frame.plane_offset(plane) as usize;
        let computed = layout[plane.index()].offset;

        if reported != computed {
            debug!(
                "{:?} plane offset reported as {} but computed as {}.",
                plane, reported, computed
            );
        }
    }

    let planes = VideoPlane::ALL.map(|plane| {
        let range = layout[plane.index()];
        DecodedPlane {
            data: data[range.offset..][..range.length].to_vec(),
            stride: frame.stride(plane),
        }
    });

    let size = frame.size();
    Ok(DecodedFrame {
        width: size.width,
        height: size.height,
        planes,
        timestamp: u64::try_from(frame.timestamp()).unwrap_or(0),
        duration,
    })
}
