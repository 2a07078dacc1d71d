use crate::{
    decoder::DecoderState,
    engine::Status,
    host::{BufferType, GmpErr, HostVideoCodecType},
};
use thiserror::Error;

/// The error type returned by adapter operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no content decryption module instance is available")]
    EngineUnavailable,

    #[error("content decryption module failed to {operation} ({status:?})")]
    Engine {
        operation: &'static str,
        status: Status,
    },

    #[error("decryptor callback is not set, init must be called first")]
    NotInitialized,

    #[error("{0:?} video is not supported (only H.264 is)")]
    UnsupportedCodec(HostVideoCodecType),

    #[error("{0:?} framing is not supported (only 4 byte length prefixes are)")]
    UnsupportedFraming(BufferType),

    #[error("{0} byte NAL length prefixes are not supported (only 4 byte prefixes are)")]
    UnsupportedNalLengthSize(u8),

    #[error("NAL unit at offset {offset} declares {length} bytes but only {available} remain")]
    TruncatedNalUnit {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("invalid codec configuration: {0}")]
    InvalidCodecConfig(String),

    #[error("decoder cannot accept this call while {0:?}")]
    InvalidState(DecoderState),

    #[error("decoded frame carries no frame buffer")]
    MissingFrameBuffer,

    #[error("decoded frame buffer holds {actual} bytes but its planes need {expected}")]
    FrameBufferTooSmall { expected: usize, actual: usize },

    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),

    #[error("decode worker is no longer running")]
    WorkerGone,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Host result code reported for this error at the plugin boundary.
    pub fn gmp_err(&self) -> GmpErr {
        match self {
            Error::UnsupportedCodec(_)
            | Error::UnsupportedFraming(_)
            | Error::UnsupportedNalLengthSize(_) => GmpErr::NotImplementedErr,
            Error::InvalidCodecConfig(_) | Error::InvalidConfig(_) => GmpErr::InvalidArgErr,
            Error::TruncatedNalUnit { .. }
            | Error::MissingFrameBuffer
            | Error::FrameBufferTooSmall { .. } => GmpErr::DecodeErr,
            Error::Engine { status, .. } => match GmpErr::from(*status) {
                GmpErr::NoErr => GmpErr::GenericErr,
                err => err,
            },
            Error::Io(_) => GmpErr::AllocErr,
            Error::EngineUnavailable
            | Error::NotInitialized
            | Error::InvalidState(_)
            | Error::WorkerGone => GmpErr::GenericErr,
        }
    }
}
