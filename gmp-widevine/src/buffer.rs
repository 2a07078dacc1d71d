//! Buffer, decrypted block and video frame objects handed to the CDM.
//!
//! These are plain data holders. Every buffer has exactly one owner and is released when that
//! owner drops it.

/// Growable byte buffer allocated on behalf of the CDM.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Allocate an empty buffer that can hold at least `capacity` bytes without reallocating.
    pub fn allocate(capacity: u32) -> Self {
        Self {
            data: Vec::with_capacity(capacity as usize),
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn capacity(&self) -> u32 {
        u32::try_from(self.data.capacity()).unwrap_or(u32::MAX)
    }

    pub fn size(&self) -> u32 {
        u32::try_from(self.data.len()).unwrap_or(u32::MAX)
    }

    /// Resize to `size` bytes, zero filling any new space.
    pub fn set_size(&mut self, size: u32) {
        self.data.resize(size as usize, 0);
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

/// Output of a decrypt-only call.
#[derive(Debug, Default)]
pub struct DecryptedBlock {
    buffer: Option<Buffer>,
    timestamp: i64,
}

impl DecryptedBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the decrypted data. The block owns the buffer from here on and releases any
    /// buffer that was attached before.
    pub fn set_decrypted_buffer(&mut self, buffer: Buffer) {
        self.buffer = Some(buffer);
    }

    pub fn decrypted_buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    pub fn take_decrypted_buffer(&mut self) -> Option<Buffer> {
        self.buffer.take()
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFormat {
    #[default]
    Unknown,
    Yv12,
    I420,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The fixed set of planes a decoded frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoPlane {
    Y = 0,
    U = 1,
    V = 2,
}

impl VideoPlane {
    pub const ALL: [VideoPlane; 3] = [VideoPlane::Y, VideoPlane::U, VideoPlane::V];

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(VideoPlane::Y),
            1 => Some(VideoPlane::U),
            2 => Some(VideoPlane::V),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Decoded frame written by the CDM during decrypt-and-decode.
#[derive(Debug, Default)]
pub struct VideoFrame {
    format: VideoFormat,
    size: Size,
    frame_buffer: Option<Buffer>,
    plane_offsets: [u32; 3],
    strides: [u32; 3],
    timestamp: i64,
}

impl VideoFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_format(&mut self, format: VideoFormat) {
        self.format = format;
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Attach the frame's pixel data, taking ownership of the buffer.
    pub fn set_frame_buffer(&mut self, buffer: Buffer) {
        self.frame_buffer = Some(buffer);
    }

    pub fn frame_buffer(&self) -> Option<&Buffer> {
        self.frame_buffer.as_ref()
    }

    pub fn take_frame_buffer(&mut self) -> Option<Buffer> {
        self.frame_buffer.take()
    }

    pub fn set_plane_offset(&mut self, plane: VideoPlane, offset: u32) {
        self.plane_offsets[plane.index()] = offset;
    }

    pub fn plane_offset(&self, plane: VideoPlane) -> u32 {
        self.plane_offsets[plane.index()]
    }

    pub fn set_stride(&mut self, plane: VideoPlane, stride: u32) {
        self.strides[plane.index()] = stride;
    }

    pub fn stride(&self, plane: VideoPlane) -> u32 {
        self.strides[plane.index()]
    }

    /// Offset lookup by raw plane index. Unknown planes report `0`.
    pub fn plane_offset_at(&self, index: u32) -> u32 {
        VideoPlane::from_index(index).map_or(0, |plane| self.plane_offset(plane))
    }

    /// Stride lookup by raw plane index. Unknown planes report `0`.
    pub fn stride_at(&self, index: u32) -> u32 {
        VideoPlane::from_index(index).map_or(0, |plane| self.stride(plane))
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}
