//! Translation of CDM codes into host codes.
//!
//! Every status, exception, message type and key status crossing the boundary goes through the
//! conversions in this module.

use crate::{
    engine::{Exception, InitDataType, KeyStatus, MessageType, SessionType, Status},
    host::{DomException, GmpErr, HostKeyStatus, HostMessageType, HostSessionType},
};
use log::warn;

impl From<Status> for GmpErr {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => GmpErr::NoErr,
            Status::NeedMoreData | Status::SessionError | Status::DeferredInitialization => {
                GmpErr::GenericErr
            }
            Status::NoKey => GmpErr::NoKeyErr,
            Status::DecryptError => GmpErr::CryptoErr,
            Status::DecodeError => GmpErr::DecodeErr,
        }
    }
}

impl From<Exception> for DomException {
    fn from(exception: Exception) -> Self {
        match exception {
            Exception::NotSupportedError => DomException::NotSupportedError,
            Exception::InvalidStateError => DomException::InvalidStateError,
            Exception::InvalidAccessError => DomException::InvalidAccessError,
            Exception::QuotaExceededError => DomException::QuotaExceededError,
            Exception::UnknownError | Exception::ClientError | Exception::OutputError => {
                DomException::InvalidStateError
            }
        }
    }
}

impl From<MessageType> for HostMessageType {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::LicenseRequest => HostMessageType::LicenseRequest,
            MessageType::LicenseRenewal => HostMessageType::LicenseRenewal,
            MessageType::LicenseRelease => HostMessageType::LicenseRelease,
        }
    }
}

impl From<KeyStatus> for HostKeyStatus {
    fn from(status: KeyStatus) -> Self {
        match status {
            KeyStatus::Usable => HostKeyStatus::Usable,
            KeyStatus::InternalError => HostKeyStatus::InternalError,
            KeyStatus::Expired => HostKeyStatus::Expired,
            KeyStatus::OutputRestricted => HostKeyStatus::OutputRestricted,
            KeyStatus::OutputDownscaled => HostKeyStatus::OutputDownscaled,
            KeyStatus::StatusPending => HostKeyStatus::StatusPending,
            KeyStatus::Released => HostKeyStatus::Released,
        }
    }
}

impl From<HostSessionType> for SessionType {
    fn from(session_type: HostSessionType) -> Self {
        match session_type {
            HostSessionType::Temporary => SessionType::Temporary,
            HostSessionType::Persistent => SessionType::PersistentLicense,
        }
    }
}

impl InitDataType {
    /// Init data type for an EME init data type name. Unknown names fall back to CENC.
    pub fn from_name(name: &str) -> Self {
        match name {
            "cenc" => InitDataType::Cenc,
            "keyids" => InitDataType::KeyIds,
            "webm" => InitDataType::WebM,
            _ => {
                warn!("Unknown init data type '{}', assuming cenc.", name);
                InitDataType::Cenc
            }
        }
    }
}
