//! Interface of the content decryption module (CDM) this crate drives.
//!
//! The CDM is opaque. It is created once through a [`CdmFactory`], receives requests through
//! [`ContentDecryptionModule`] and answers asynchronously through the [`CdmHost`] table that
//! this crate implements.

use crate::buffer::{Buffer, DecryptedBlock, Size, VideoFormat, VideoFrame};
use std::sync::Arc;

/// Key system requested from the CDM.
pub const WIDEVINE_KEY_SYSTEM: &str = "com.widevine.alpha";

/// Interface version of the [`ContentDecryptionModule`] this crate speaks.
pub const CDM_INTERFACE_VERSION: i32 = 8;

/// Result codes returned by synchronous CDM calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    NeedMoreData,
    NoKey,
    SessionError,
    DecryptError,
    DecodeError,
    DeferredInitialization,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Success,
        Status::NeedMoreData,
        Status::NoKey,
        Status::SessionError,
        Status::DecryptError,
        Status::DecodeError,
        Status::DeferredInitialization,
    ];
}

/// Exception carried by a rejected promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    NotSupportedError,
    InvalidStateError,
    InvalidAccessError,
    QuotaExceededError,
    UnknownError,
    ClientError,
    OutputError,
}

impl Exception {
    pub const ALL: [Exception; 7] = [
        Exception::NotSupportedError,
        Exception::InvalidStateError,
        Exception::InvalidAccessError,
        Exception::QuotaExceededError,
        Exception::UnknownError,
        Exception::ClientError,
        Exception::OutputError,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitDataType {
    Cenc,
    KeyIds,
    WebM,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    Temporary,
    PersistentLicense,
    PersistentKeyRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    LicenseRequest,
    LicenseRenewal,
    LicenseRelease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStatus {
    Usable,
    InternalError,
    Expired,
    OutputRestricted,
    OutputDownscaled,
    StatusPending,
    Released,
}

impl KeyStatus {
    pub const ALL: [KeyStatus; 7] = [
        KeyStatus::Usable,
        KeyStatus::InternalError,
        KeyStatus::Expired,
        KeyStatus::OutputRestricted,
        KeyStatus::OutputDownscaled,
        KeyStatus::StatusPending,
        KeyStatus::Released,
    ];
}

/// Status of one key after a session's key set changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInformation {
    pub key_id: Vec<u8>,
    pub status: KeyStatus,
    pub system_code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    Unknown,
    Vp8,
    H264,
    Vp9,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodecProfile {
    Unknown,
    ProfileNotNeeded,
    H264Baseline,
    H264Main,
    H264Extended,
    H264High,
    H264High10,
    H264High422,
    H264High444Predictive,
}

impl VideoCodecProfile {
    /// Profile for an H.264 `profile_idc` value.
    pub fn from_h264_profile_idc(profile_idc: u8) -> Self {
        match profile_idc {
            66 => VideoCodecProfile::H264Baseline,
            77 => VideoCodecProfile::H264Main,
            88 => VideoCodecProfile::H264Extended,
            100 => VideoCodecProfile::H264High,
            110 => VideoCodecProfile::H264High10,
            122 => VideoCodecProfile::H264High422,
            244 => VideoCodecProfile::H264High444Predictive,
            _ => VideoCodecProfile::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDecoderConfig {
    pub codec: VideoCodec,
    pub profile: VideoCodecProfile,
    pub format: VideoFormat,
    pub coded_size: Size,
    pub extra_data: Vec<u8>,
}

/// A clear/cipher byte count pair describing one span of a sample.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subsample {
    pub clear_bytes: u32,
    pub cipher_bytes: u32,
}

impl Subsample {
    pub fn new(clear_bytes: u32, cipher_bytes: u32) -> Self {
        Self {
            clear_bytes,
            cipher_bytes,
        }
    }
}

/// Encrypted input handed to [`ContentDecryptionModule::decrypt`] and
/// [`ContentDecryptionModule::decrypt_and_decode_frame`].
#[derive(Debug, Clone, Copy)]
pub struct InputBuffer<'a> {
    pub data: &'a [u8],
    pub key_id: &'a [u8],
    pub iv: &'a [u8],
    pub subsamples: &'a [Subsample],
    /// Presentation time in microseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileIoStatus {
    Success,
    InUse,
    Error,
}

/// Receives the results of [`FileIo`] operations.
pub trait FileIoClient: Send {
    fn on_open_complete(&mut self, status: FileIoStatus);
    fn on_read_complete(&mut self, status: FileIoStatus, data: &[u8]);
    fn on_write_complete(&mut self, status: FileIoStatus);
}

/// Persistent storage handle requested by the CDM.
pub trait FileIo: Send {
    fn open(&mut self, name: &str);
    fn read(&mut self);
    fn write(&mut self, data: &[u8]);
    fn close(self: Box<Self>);
}

/// The CDM's request surface.
pub trait ContentDecryptionModule: Send + Sync {
    fn initialize(&self, allow_distinctive_identifier: bool, allow_persistent_state: bool);

    fn set_server_certificate(&self, promise_id: u32, certificate: &[u8]);

    fn create_session_and_generate_request(
        &self,
        promise_id: u32,
        session_type: SessionType,
        init_data_type: InitDataType,
        init_data: &[u8],
    );

    fn load_session(&self, promise_id: u32, session_type: SessionType, session_id: &str);

    fn update_session(&self, promise_id: u32, session_id: &str, response: &[u8]);

    fn close_session(&self, promise_id: u32, session_id: &str);

    fn remove_session(&self, promise_id: u32, session_id: &str);

    fn timer_expired(&self, context: u64);

    fn decrypt(&self, input: &InputBuffer<'_>, output: &mut DecryptedBlock) -> Status;

    fn initialize_video_decoder(&self, config: &VideoDecoderConfig) -> Status;

    fn deinitialize_decoder(&self, stream: StreamType);

    fn reset_decoder(&self, stream: StreamType);

    fn decrypt_and_decode_frame(&self, input: &InputBuffer<'_>, frame: &mut VideoFrame) -> Status;

    fn on_query_output_protection_status(&self, succeeded: bool, link_mask: u32, protection_mask: u32);
}

/// Callback table the CDM uses to reach its host.
pub trait CdmHost: Send + Sync {
    fn allocate(&self, capacity: u32) -> Buffer;

    /// Ask for [`ContentDecryptionModule::timer_expired`] with `context` after `delay_ms`.
    fn set_timer(&self, delay_ms: i64, context: u64);

    /// Seconds since the epoch.
    fn current_wall_time(&self) -> f64;

    fn on_resolve_new_session_promise(&self, promise_id: u32, session_id: &str);

    fn on_resolve_promise(&self, promise_id: u32);

    fn on_reject_promise(&self, promise_id: u32, exception: Exception, system_code: u32, message: &str);

    fn on_session_message(&self, session_id: &str, message_type: MessageType, message: &[u8]);

    fn on_session_keys_change(
        &self,
        session_id: &str,
        has_additional_usable_key: bool,
        keys: &[KeyInformation],
    );

    /// `new_expiry_time` is in seconds since the epoch.
    fn on_expiration_change(&self, session_id: &str, new_expiry_time: f64);

    fn on_session_closed(&self, session_id: &str);

    fn enable_output_protection(&self, desired_protection_mask: u32);

    fn query_output_protection_status(&self);

    fn on_deferred_initialization_done(&self, stream: StreamType, status: Status);

    fn create_file_io(&self, client: Box<dyn FileIoClient>) -> Box<dyn FileIo>;
}

/// Loads the CDM module and creates instances of it.
pub trait CdmFactory: Send + Sync {
    /// Module wide setup, called once before the first [`CdmFactory::create`].
    fn initialize_module(&self) {}

    /// Module wide teardown, called once after the last instance was released.
    fn deinitialize_module(&self) {}

    fn version(&self) -> String;

    /// Create an instance speaking `interface_version` for `key_system`, or `None` when the
    /// module refuses.
    fn create(
        &self,
        interface_version: i32,
        key_system: &str,
        host: Arc<dyn CdmHost>,
    ) -> Option<Arc<dyn ContentDecryptionModule>>;
}
