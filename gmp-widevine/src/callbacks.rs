use crate::{
    Runtime,
    buffer::Buffer,
    engine::{
        CdmHost, Exception, FileIo, FileIoClient, KeyInformation, MessageType, Status, StreamType,
    },
    host::DecryptorCallback,
    storage::RecordFileIo,
};
use log::{debug, info, trace, warn};
use std::{
    sync::Weak,
    time::Duration,
};

/// The host callback table handed to the CDM.
///
/// Holds the runtime weakly, since the runtime owns the CDM which owns this table.
pub(crate) struct EngineCallbacks {
    runtime: Weak<Runtime>,
}

impl EngineCallbacks {
    pub(crate) fn new(runtime: Weak<Runtime>) -> Self {
        Self { runtime }
    }

    fn with_host<F>(&self, callback: &str, f: F)
    where
        F: FnOnce(&Runtime, &dyn DecryptorCallback),
    {
        let Some(runtime) = self.runtime.upgrade() else {
            warn!("Dropping {}, the plugin is shut down.", callback);
            return;
        };

        let Some(host) = runtime.decryptor_host() else {
            warn!("Dropping {}, no decryptor callback is set.", callback);
            return;
        };

        f(&runtime, host.as_ref());
    }
}

impl CdmHost for EngineCallbacks {
    fn allocate(&self, capacity: u32) -> Buffer {
        trace!("Allocating buffer of {} bytes.", capacity);
        Buffer::allocate(capacity)
    }

    fn set_timer(&self, delay_ms: i64, context: u64) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };

        let weak = self.runtime.clone();
        let delay = Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0));

        runtime.platform().set_timer(
            delay,
            Box::new(move || match weak.upgrade().and_then(|rt| rt.engine()) {
                Some(engine) => engine.timer_expired(context),
                None => debug!("Timer {} fired after the CDM was released.", context),
            }),
        );
    }

    fn current_wall_time(&self) -> f64 {
        self.runtime
            .upgrade()
            .map_or(0.0, |rt| rt.platform().current_time_ms() as f64 / 1000.0)
    }

    fn on_resolve_new_session_promise(&self, promise_id: u32, session_id: &str) {
        self.with_host("new session", |rt, host| {
            rt.sessions().on_new_session(host, promise_id, session_id)
        });
    }

    fn on_resolve_promise(&self, promise_id: u32) {
        self.with_host("resolve", |rt, host| {
            rt.sessions().on_resolve(host, promise_id)
        });
    }

    fn on_reject_promise(&self, promise_id: u32, exception: Exception, system_code: u32, message: &str) {
        self.with_host("reject", |rt, host| {
            rt.sessions()
                .on_reject(host, promise_id, exception, system_code, message)
        });
    }

    fn on_session_message(&self, session_id: &str, message_type: MessageType, message: &[u8]) {
        self.with_host("session message", |_, host| {
            host.session_message(session_id, message_type.into(), message)
        });
    }

    fn on_session_keys_change(
        &self,
        session_id: &str,
        has_additional_usable_key: bool,
        keys: &[KeyInformation],
    ) {
        debug!(
            "Session {} keys changed ({} keys, additional usable key: {}).",
            session_id,
            keys.len(),
            has_additional_usable_key
        );

        self.with_host("key status change", |_, host| {
            for key in keys {
                trace!("Key {} is {:?}.", hex::encode(&key.key_id), key.status);
                host.key_status_changed(session_id, &key.key_id, key.status.into());
            }
        });
    }

    fn on_expiration_change(&self, session_id: &str, new_expiry_time: f64) {
        self.with_host("expiration change", |_, host| {
            host.expiration_change(session_id, new_expiry_time * 1000.0)
        });
    }

    fn on_session_closed(&self, session_id: &str) {
        self.with_host("session closed", |_, host| host.session_closed(session_id));
    }

    fn enable_output_protection(&self, desired_protection_mask: u32) {
        info!(
            "Output protection requested (mask {:#x}), not available.",
            desired_protection_mask
        );
    }

    fn query_output_protection_status(&self) {
        let Some(runtime) = self.runtime.upgrade() else {
            return;
        };

        let weak = self.runtime.clone();
        runtime.platform().run_on_main_thread(Box::new(move || {
            if let Some(engine) = weak.upgrade().and_then(|rt| rt.engine()) {
                engine.on_query_output_protection_status(true, 0, 0);
            }
        }));
    }

    fn on_deferred_initialization_done(&self, stream: StreamType, status: Status) {
        info!("Deferred {:?} initialization finished: {:?}", stream, status);
    }

    fn create_file_io(&self, client: Box<dyn FileIoClient>) -> Box<dyn FileIo> {
        let platform = self.runtime.upgrade().map(|rt| rt.platform().clone());
        Box::new(RecordFileIo::new(platform, client))
    }
}
