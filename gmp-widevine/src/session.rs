//! Promise and session id bookkeeping between the host and the CDM.
//!
//! Every create or load request is remembered under its promise id until the CDM answers with
//! a new session, a plain resolve or a reject. The CDM echoes the promise id on each of those
//! callbacks, so several requests may be in flight at once.

use crate::{
    engine::{ContentDecryptionModule, Exception, InitDataType, SessionType},
    host::{DecryptorCallback, DomException, HostSessionType},
};
use log::{debug, warn};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    Create { token: u32 },
    Load,
}

#[derive(Debug, Default)]
pub(crate) struct SessionBridge {
    pending: Mutex<HashMap<u32, PendingRequest>>,
}

impl SessionBridge {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_session(
        &self,
        engine: &dyn ContentDecryptionModule,
        host: &dyn DecryptorCallback,
        token: u32,
        promise_id: u32,
        init_data_type: &str,
        init_data: &[u8],
        session_type: HostSessionType,
    ) {
        let init_data_type = InitDataType::from_name(init_data_type);

        if !self.track(host, promise_id, PendingRequest::Create { token }) {
            return;
        }

        engine.create_session_and_generate_request(
            promise_id,
            session_type.into(),
            init_data_type,
            init_data,
        );
    }

    pub(crate) fn load_session(
        &self,
        engine: &dyn ContentDecryptionModule,
        host: &dyn DecryptorCallback,
        promise_id: u32,
        session_id: &str,
    ) {
        if !self.track(host, promise_id, PendingRequest::Load) {
            return;
        }

        engine.load_session(promise_id, SessionType::PersistentLicense, session_id);
    }

    pub(crate) fn on_new_session(
        &self,
        host: &dyn DecryptorCallback,
        promise_id: u32,
        session_id: &str,
    ) {
        match self.take(promise_id) {
            Some(PendingRequest::Create { token }) => {
                debug!("Session {} created for token {}.", session_id, token);
                host.set_session_id(token, session_id);
                host.resolve_load_session_promise(promise_id, true);
            }
            Some(PendingRequest::Load) => {
                host.resolve_load_session_promise(promise_id, !session_id.is_empty());
            }
            None => warn!(
                "New session {} for unknown promise {}, ignoring.",
                session_id, promise_id
            ),
        }
    }

    pub(crate) fn on_resolve(&self, host: &dyn DecryptorCallback, promise_id: u32) {
        match self.take(promise_id) {
            Some(PendingRequest::Load) => host.resolve_load_session_promise(promise_id, false),
            Some(request) => {
                warn!(
                    "Promise {} resolved without a session for {:?}.",
                    promise_id, request
                );
                host.resolve_promise(promise_id);
            }
            None => host.resolve_promise(promise_id),
        }
    }

    pub(crate) fn on_reject(
        &self,
        host: &dyn DecryptorCallback,
        promise_id: u32,
        exception: Exception,
        system_code: u32,
        message: &str,
    ) {
        self.take(promise_id);
        debug!(
            "Promise {} rejected: {:?} (system code {}) {}",
            promise_id, exception, system_code, message
        );
        host.reject_promise(promise_id, exception.into(), message);
    }

    fn track(&self, host: &dyn DecryptorCallback, promise_id: u32, request: PendingRequest) -> bool {
        let mut pending = self.lock();

        if pending.contains_key(&promise_id) {
            drop(pending);
            warn!("Promise {} already has a pending session request.", promise_id);
            host.reject_promise(
                promise_id,
                DomException::InvalidStateError,
                "a session request with this promise id is already pending",
            );
            return false;
        }

        pending.insert(promise_id, request);
        true
    }

    fn take(&self, promise_id: u32) -> Option<PendingRequest> {
        self.lock().remove(&promise_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u32, PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
