//! Interface of the media host that loads this plugin.
//!
//! The host calls into [`Decryptor`](crate::Decryptor) and
//! [`VideoDecoder`](crate::VideoDecoder) and receives results through the callback traits
//! defined here.

use crate::buffer::VideoPlane;
use crate::engine::Subsample;
use std::{
    io,
    thread::{self, JoinHandle},
    time::Duration,
};

/// Host result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GmpErr {
    NoErr,
    GenericErr,
    ClosedErr,
    RecordInUseErr,
    StorageErr,
    NotImplementedErr,
    InvalidArgErr,
    AllocErr,
    NoKeyErr,
    CryptoErr,
    DecodeErr,
}

/// DOM exception codes used to reject host promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomException {
    NotSupportedError,
    InvalidStateError,
    InvalidAccessError,
    QuotaExceededError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSessionType {
    Temporary,
    Persistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostMessageType {
    LicenseRequest,
    LicenseRenewal,
    LicenseRelease,
    IndividualizationRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKeyStatus {
    Usable,
    Expired,
    OutputDownscaled,
    OutputRestricted,
    InternalError,
    Unknown,
    Released,
    StatusPending,
}

pub const CAP_DECRYPT_AUDIO: u64 = 1 << 0;
pub const CAP_DECRYPT_VIDEO: u64 = 1 << 1;
pub const CAP_DECRYPT_AND_DECODE_AUDIO: u64 = 1 << 2;
pub const CAP_DECRYPT_AND_DECODE_VIDEO: u64 = 1 << 3;

/// How NAL units inside an encoded frame are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    Single,
    Length8,
    Length16,
    Length24,
    Length32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostVideoCodecType {
    Vp8,
    H264,
    Vp9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Key,
    Delta,
    Golden,
    AltRef,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoCodecSettings {
    pub codec_type: HostVideoCodecType,
    pub width: u32,
    pub height: u32,
}

/// Encryption parameters of one host buffer or frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EncryptedBufferMetadata {
    pub key_id: Vec<u8>,
    pub iv: Vec<u8>,
    pub clear_bytes: Vec<u16>,
    pub cipher_bytes: Vec<u32>,
}

impl EncryptedBufferMetadata {
    /// Pair up clear and cipher counts. Extra entries on either side are ignored.
    pub fn subsamples(&self) -> Vec<Subsample> {
        self.clear_bytes
            .iter()
            .zip(&self.cipher_bytes)
            .map(|(&clear, &cipher)| Subsample::new(u32::from(clear), cipher))
            .collect()
    }
}

/// Host owned buffer passed through the decrypt-only path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostBuffer {
    pub id: u32,
    pub data: Vec<u8>,
}

impl HostBuffer {
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self { id, data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn resize(&mut self, size: usize) {
        self.data.resize(size, 0);
    }
}

/// Encoded video frame submitted to [`VideoDecoder::decode`](crate::VideoDecoder::decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub buffer_type: BufferType,
    pub frame_type: FrameType,
    pub data: Vec<u8>,
    /// Microseconds.
    pub timestamp: u64,
    /// Microseconds.
    pub duration: u64,
    pub metadata: Option<EncryptedBufferMetadata>,
}

/// One plane of a [`DecodedFrame`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedPlane {
    pub data: Vec<u8>,
    pub stride: u32,
}

/// Planar I420 picture delivered to [`VideoDecoderCallback::decoded`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub planes: [DecodedPlane; 3],
    /// Microseconds.
    pub timestamp: u64,
    /// Microseconds.
    pub duration: u64,
}

impl DecodedFrame {
    pub fn plane(&self, plane: VideoPlane) -> &DecodedPlane {
        &self.planes[plane.index()]
    }
}

/// Decryptor results and session events.
pub trait DecryptorCallback: Send + Sync {
    fn set_capabilities(&self, capabilities: u64);

    fn set_session_id(&self, create_session_token: u32, session_id: &str);

    fn resolve_load_session_promise(&self, promise_id: u32, success: bool);

    fn resolve_promise(&self, promise_id: u32);

    fn reject_promise(&self, promise_id: u32, exception: DomException, message: &str);

    fn session_message(&self, session_id: &str, message_type: HostMessageType, message: &[u8]);

    /// `expiry_time` is in milliseconds since the epoch.
    fn expiration_change(&self, session_id: &str, expiry_time: f64);

    fn session_closed(&self, session_id: &str);

    fn key_status_changed(&self, session_id: &str, key_id: &[u8], status: HostKeyStatus);

    fn decrypted(&self, buffer: HostBuffer, result: GmpErr);
}

/// Video decoder results. Always invoked on the host's main thread.
pub trait VideoDecoderCallback: Send + Sync {
    fn decoded(&self, frame: DecodedFrame);

    fn input_data_exhausted(&self);

    fn drain_complete(&self);

    fn reset_complete(&self);

    fn error(&self, error: GmpErr);
}

/// Notified once asynchronous shutdown has finished.
pub trait AsyncShutdownHost: Send + Sync {
    fn shutdown_complete(&self);
}

/// Named storage record.
pub trait Record: Send {
    fn open(&mut self) -> Result<(), GmpErr>;
    fn read(&mut self) -> Result<Vec<u8>, GmpErr>;
    fn write(&mut self, data: &[u8]) -> Result<(), GmpErr>;
    fn close(&mut self);
}

pub type MainThreadTask = Box<dyn FnOnce() + Send + 'static>;

/// Services provided by the host process.
pub trait Platform: Send + Sync {
    /// Queue `task` to run on the host's main thread. Tasks run in submission order.
    fn run_on_main_thread(&self, task: MainThreadTask);

    /// Run `task` on the main thread after `delay`.
    fn set_timer(&self, delay: Duration, task: MainThreadTask);

    /// Milliseconds since the epoch.
    fn current_time_ms(&self) -> i64;

    fn create_record(&self, name: &str) -> Result<Box<dyn Record>, GmpErr>;

    /// Start a named background thread running `body`.
    fn spawn_thread(
        &self,
        name: &str,
        body: Box<dyn FnOnce() + Send + 'static>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name(name.to_owned()).spawn(body)
    }
}
