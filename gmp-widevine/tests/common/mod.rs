#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender};
use gmp_widevine::{
    AdapterConfig, Runtime,
    buffer::{Buffer, DecryptedBlock, Size, VideoFormat, VideoFrame, VideoPlane},
    engine::{
        CdmFactory, CdmHost, ContentDecryptionModule, InitDataType, InputBuffer, SessionType,
        Status, StreamType, Subsample, VideoDecoderConfig,
    },
    host::{
        AsyncShutdownHost, DecodedFrame, DecryptorCallback, DomException, GmpErr, HostBuffer,
        HostKeyStatus, HostMessageType, MainThreadTask, Platform, Record, VideoDecoderCallback,
    },
};
use std::{
    collections::HashMap,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// avcC record: High profile, 4 byte lengths, one 7 byte SPS and one 4 byte PPS.
pub const AVCC: [u8; 22] = [
    0x01, 0x64, 0x00, 0x1f, 0xff, 0xe1, 0x00, 0x07, 0x67, 0x64, 0x00, 0x1f, 0xac, 0xd9, 0x40,
    0x01, 0x00, 0x04, 0x68, 0xeb, 0xe3, 0xcb,
];

/// Start code form of [`AVCC`].
pub const AVCC_START_CODES: [u8; 19] = [
    0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x1f, 0xac, 0xd9, 0x40, 0x00, 0x00, 0x00, 0x01,
    0x68, 0xeb, 0xe3, 0xcb,
];

/// Host codec specific data: a leading byte followed by [`AVCC`].
pub fn codec_specific() -> Vec<u8> {
    let mut data = vec![0x00];
    data.extend_from_slice(&AVCC);
    data
}

#[derive(Debug, Clone, PartialEq)]
pub enum CdmCall {
    Initialize(bool, bool),
    SetServerCertificate(u32, Vec<u8>),
    CreateSession(u32, SessionType, InitDataType, Vec<u8>),
    LoadSession(u32, SessionType, String),
    UpdateSession(u32, String, Vec<u8>),
    CloseSession(u32, String),
    RemoveSession(u32, String),
    TimerExpired(u64),
    Decrypt {
        data: Vec<u8>,
        key_id: Vec<u8>,
        iv: Vec<u8>,
        subsamples: Vec<Subsample>,
        timestamp: i64,
    },
    InitializeVideoDecoder(VideoDecoderConfig),
    DeinitializeDecoder(StreamType),
    ResetDecoder(StreamType),
    DecryptAndDecode {
        data: Vec<u8>,
        subsamples: Vec<Subsample>,
        timestamp: i64,
    },
    OutputProtectionStatus(bool, u32, u32),
}

/// Scriptable CDM that records every call it receives.
#[derive(Default)]
pub struct MockCdm {
    calls: Mutex<Vec<CdmCall>>,
    host: Mutex<Option<Arc<dyn CdmHost>>>,
    decrypt_status: Mutex<Option<Status>>,
    decrypt_output: Mutex<Option<Vec<u8>>>,
    decoder_status: Mutex<Option<Status>>,
    frame_statuses: Mutex<HashMap<i64, Status>>,
    oversized_frames: Mutex<Vec<i64>>,
    decode_delay: Mutex<Duration>,
}

impl MockCdm {
    pub fn calls(&self) -> Vec<CdmCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn host(&self) -> Arc<dyn CdmHost> {
        self.host.lock().unwrap().clone().expect("CDM was never created")
    }

    pub fn set_decrypt_result(&self, status: Status, output: Option<Vec<u8>>) {
        *self.decrypt_status.lock().unwrap() = Some(status);
        *self.decrypt_output.lock().unwrap() = output;
    }

    pub fn set_decoder_status(&self, status: Status) {
        *self.decoder_status.lock().unwrap() = Some(status);
    }

    /// Status returned for the frame with this timestamp. Frames default to success.
    pub fn set_frame_status(&self, timestamp: i64, status: Status) {
        self.frame_statuses.lock().unwrap().insert(timestamp, status);
    }

    /// The frame with this timestamp decodes with strides and height of `u32::MAX`.
    pub fn set_oversized_frame(&self, timestamp: i64) {
        self.oversized_frames.lock().unwrap().push(timestamp);
    }

    pub fn set_decode_delay(&self, delay: Duration) {
        *self.decode_delay.lock().unwrap() = delay;
    }

    fn record(&self, call: CdmCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ContentDecryptionModule for MockCdm {
    fn initialize(&self, allow_distinctive_identifier: bool, allow_persistent_state: bool) {
        self.record(CdmCall::Initialize(
            allow_distinctive_identifier,
            allow_persistent_state,
        ));
    }

    fn set_server_certificate(&self, promise_id: u32, certificate: &[u8]) {
        self.record(CdmCall::SetServerCertificate(promise_id, certificate.to_vec()));
    }

    fn create_session_and_generate_request(
        &self,
        promise_id: u32,
        session_type: SessionType,
        init_data_type: InitDataType,
        init_data: &[u8],
    ) {
        self.record(CdmCall::CreateSession(
            promise_id,
            session_type,
            init_data_type,
            init_data.to_vec(),
        ));
    }

    fn load_session(&self, promise_id: u32, session_type: SessionType, session_id: &str) {
        self.record(CdmCall::LoadSession(
            promise_id,
            session_type,
            session_id.to_owned(),
        ));
    }

    fn update_session(&self, promise_id: u32, session_id: &str, response: &[u8]) {
        self.record(CdmCall::UpdateSession(
            promise_id,
            session_id.to_owned(),
            response.to_vec(),
        ));
    }

    fn close_session(&self, promise_id: u32, session_id: &str) {
        self.record(CdmCall::CloseSession(promise_id, session_id.to_owned()));
    }

    fn remove_session(&self, promise_id: u32, session_id: &str) {
        self.record(CdmCall::RemoveSession(promise_id, session_id.to_owned()));
    }

    fn timer_expired(&self, context: u64) {
        self.record(CdmCall::TimerExpired(context));
    }

    fn decrypt(&self, input: &InputBuffer<'_>, output: &mut DecryptedBlock) -> Status {
        self.record(CdmCall::Decrypt {
            data: input.data.to_vec(),
            key_id: input.key_id.to_vec(),
            iv: input.iv.to_vec(),
            subsamples: input.subsamples.to_vec(),
            timestamp: input.timestamp,
        });

        let status = self.decrypt_status.lock().unwrap().unwrap_or(Status::Success);
        if let Some(data) = self.decrypt_output.lock().unwrap().clone() {
            output.set_decrypted_buffer(Buffer::from_vec(data));
            output.set_timestamp(input.timestamp);
        }

        status
    }

    fn initialize_video_decoder(&self, config: &VideoDecoderConfig) -> Status {
        self.record(CdmCall::InitializeVideoDecoder(config.clone()));
        self.decoder_status.lock().unwrap().unwrap_or(Status::Success)
    }

    fn deinitialize_decoder(&self, stream: StreamType) {
        self.record(CdmCall::DeinitializeDecoder(stream));
    }

    fn reset_decoder(&self, stream: StreamType) {
        self.record(CdmCall::ResetDecoder(stream));
    }

    /// Successful frames are 2x2 I420 pictures filled with the low timestamp byte.
    fn decrypt_and_decode_frame(&self, input: &InputBuffer<'_>, frame: &mut VideoFrame) -> Status {
        let delay = *self.decode_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        self.record(CdmCall::DecryptAndDecode {
            data: input.data.to_vec(),
            subsamples: input.subsamples.to_vec(),
            timestamp: input.timestamp,
        });

        let status = self
            .frame_statuses
            .lock()
            .unwrap()
            .get(&input.timestamp)
            .copied()
            .unwrap_or(Status::Success);

        if status == Status::Success {
            frame.set_format(VideoFormat::I420);
            frame.set_size(Size::new(2, 2));
            for (plane, (offset, stride)) in VideoPlane::ALL.into_iter().zip([(0, 2), (4, 1), (5, 1)]) {
                frame.set_plane_offset(plane, offset);
                frame.set_stride(plane, stride);
            }
            frame.set_frame_buffer(Buffer::from_vec(vec![input.timestamp as u8; 6]));
            frame.set_timestamp(input.timestamp);

            if self.oversized_frames.lock().unwrap().contains(&input.timestamp) {
                frame.set_size(Size::new(2, u32::MAX));
                for plane in VideoPlane::ALL {
                    frame.set_stride(plane, u32::MAX);
                }
            }
        }

        status
    }

    fn on_query_output_protection_status(&self, succeeded: bool, link_mask: u32, protection_mask: u32) {
        self.record(CdmCall::OutputProtectionStatus(
            succeeded,
            link_mask,
            protection_mask,
        ));
    }
}

#[derive(Default)]
pub struct MockFactory {
    pub cdm: Arc<MockCdm>,
    pub refuse: bool,
    pub events: Mutex<Vec<String>>,
}

impl MockFactory {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl CdmFactory for MockFactory {
    fn initialize_module(&self) {
        self.events.lock().unwrap().push("initialize_module".to_owned());
    }

    fn deinitialize_module(&self) {
        self.events.lock().unwrap().push("deinitialize_module".to_owned());
    }

    fn version(&self) -> String {
        "4.10.0-mock".to_owned()
    }

    fn create(
        &self,
        interface_version: i32,
        key_system: &str,
        host: Arc<dyn CdmHost>,
    ) -> Option<Arc<dyn ContentDecryptionModule>> {
        self.events
            .lock()
            .unwrap()
            .push(format!("create {} {}", interface_version, key_system));

        if self.refuse {
            return None;
        }

        *self.cdm.host.lock().unwrap() = Some(host);
        let cdm: Arc<dyn ContentDecryptionModule> = self.cdm.clone();
        Some(cdm)
    }
}

struct MemoryRecord {
    name: String,
    records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Record for MemoryRecord {
    fn open(&mut self) -> Result<(), GmpErr> {
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>, GmpErr> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&self.name)
            .cloned()
            .unwrap_or_default())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), GmpErr> {
        self.records
            .lock()
            .unwrap()
            .insert(self.name.clone(), data.to_vec());
        Ok(())
    }

    fn close(&mut self) {}
}

/// Host platform with a main thread queue the test drains by hand.
///
/// In inline mode tasks run immediately on whichever thread posted them.
pub struct MockPlatform {
    inline: bool,
    sender: Sender<MainThreadTask>,
    receiver: Receiver<MainThreadTask>,
    timers: Mutex<Vec<(Duration, MainThreadTask)>>,
    now_ms: AtomicI64,
    refuse_threads: AtomicBool,
    pub records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockPlatform {
    pub fn queued() -> Arc<Self> {
        Arc::new(Self::new(false))
    }

    pub fn inline() -> Arc<Self> {
        Arc::new(Self::new(true))
    }

    fn new(inline: bool) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            inline,
            sender,
            receiver,
            timers: Mutex::new(Vec::new()),
            now_ms: AtomicI64::new(0),
            refuse_threads: AtomicBool::new(false),
            records: Arc::default(),
        }
    }

    pub fn set_now_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Make every later thread start fail.
    pub fn refuse_threads(&self) {
        self.refuse_threads.store(true, Ordering::SeqCst);
    }

    /// Run every main thread task posted so far.
    pub fn pump(&self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            count += 1;
        }
        count
    }

    /// Run main thread tasks as they arrive until `done` holds.
    pub fn pump_until<F: Fn() -> bool>(&self, done: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);

        while !done() {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };

            if let Ok(task) = self.receiver.recv_timeout(left) {
                task();
            }
        }

        true
    }

    pub fn timer_delays(&self) -> Vec<Duration> {
        self.timers.lock().unwrap().iter().map(|(d, _)| *d).collect()
    }

    pub fn fire_timers(&self) {
        let timers = std::mem::take(&mut *self.timers.lock().unwrap());
        for (_, task) in timers {
            task();
        }
    }
}

impl Platform for MockPlatform {
    fn run_on_main_thread(&self, task: MainThreadTask) {
        if self.inline {
            task();
        } else {
            let _ = self.sender.send(task);
        }
    }

    fn set_timer(&self, delay: Duration, task: MainThreadTask) {
        self.timers.lock().unwrap().push((delay, task));
    }

    fn current_time_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn create_record(&self, name: &str) -> Result<Box<dyn Record>, GmpErr> {
        Ok(Box::new(MemoryRecord {
            name: name.to_owned(),
            records: self.records.clone(),
        }))
    }

    fn spawn_thread(
        &self,
        name: &str,
        body: Box<dyn FnOnce() + Send + 'static>,
    ) -> io::Result<JoinHandle<()>> {
        if self.refuse_threads.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::OutOfMemory, "no threads left"));
        }

        thread::Builder::new().name(name.to_owned()).spawn(body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecryptorEvent {
    Capabilities(u64),
    SessionId(u32, String),
    LoadSessionResolved(u32, bool),
    Resolved(u32),
    Rejected(u32, DomException, String),
    Message(String, HostMessageType, Vec<u8>),
    Expiration(String, f64),
    Closed(String),
    KeyStatus(String, Vec<u8>, HostKeyStatus),
    Decrypted(HostBuffer, GmpErr),
}

#[derive(Default)]
pub struct RecordingDecryptor {
    events: Mutex<Vec<DecryptorEvent>>,
}

impl RecordingDecryptor {
    pub fn events(&self) -> Vec<DecryptorEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events after the capability report sent by init.
    pub fn session_events(&self) -> Vec<DecryptorEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, DecryptorEvent::Capabilities(_)))
            .collect()
    }

    fn push(&self, event: DecryptorEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DecryptorCallback for RecordingDecryptor {
    fn set_capabilities(&self, capabilities: u64) {
        self.push(DecryptorEvent::Capabilities(capabilities));
    }

    fn set_session_id(&self, create_session_token: u32, session_id: &str) {
        self.push(DecryptorEvent::SessionId(
            create_session_token,
            session_id.to_owned(),
        ));
    }

    fn resolve_load_session_promise(&self, promise_id: u32, success: bool) {
        self.push(DecryptorEvent::LoadSessionResolved(promise_id, success));
    }

    fn resolve_promise(&self, promise_id: u32) {
        self.push(DecryptorEvent::Resolved(promise_id));
    }

    fn reject_promise(&self, promise_id: u32, exception: DomException, message: &str) {
        self.push(DecryptorEvent::Rejected(
            promise_id,
            exception,
            message.to_owned(),
        ));
    }

    fn session_message(&self, session_id: &str, message_type: HostMessageType, message: &[u8]) {
        self.push(DecryptorEvent::Message(
            session_id.to_owned(),
            message_type,
            message.to_vec(),
        ));
    }

    fn expiration_change(&self, session_id: &str, expiry_time: f64) {
        self.push(DecryptorEvent::Expiration(session_id.to_owned(), expiry_time));
    }

    fn session_closed(&self, session_id: &str) {
        self.push(DecryptorEvent::Closed(session_id.to_owned()));
    }

    fn key_status_changed(&self, session_id: &str, key_id: &[u8], status: HostKeyStatus) {
        self.push(DecryptorEvent::KeyStatus(
            session_id.to_owned(),
            key_id.to_vec(),
            status,
        ));
    }

    fn decrypted(&self, buffer: HostBuffer, result: GmpErr) {
        self.push(DecryptorEvent::Decrypted(buffer, result));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    Decoded(DecodedFrame),
    InputDataExhausted,
    DrainComplete,
    ResetComplete,
    Error(GmpErr),
}

#[derive(Default)]
pub struct RecordingDecoder {
    events: Mutex<Vec<DecoderEvent>>,
}

impl RecordingDecoder {
    pub fn events(&self) -> Vec<DecoderEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn has(&self, event: &DecoderEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }

    fn push(&self, event: DecoderEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl VideoDecoderCallback for RecordingDecoder {
    fn decoded(&self, frame: DecodedFrame) {
        self.push(DecoderEvent::Decoded(frame));
    }

    fn input_data_exhausted(&self) {
        self.push(DecoderEvent::InputDataExhausted);
    }

    fn drain_complete(&self) {
        self.push(DecoderEvent::DrainComplete);
    }

    fn reset_complete(&self) {
        self.push(DecoderEvent::ResetComplete);
    }

    fn error(&self, error: GmpErr) {
        self.push(DecoderEvent::Error(error));
    }
}

#[derive(Default)]
pub struct ShutdownHost {
    pub completed: AtomicUsize,
}

impl AsyncShutdownHost for ShutdownHost {
    fn shutdown_complete(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A runtime whose CDM is `factory.cdm`.
pub fn runtime(platform: Arc<MockPlatform>, factory: &MockFactory) -> Arc<Runtime> {
    let runtime = Runtime::new(AdapterConfig::default(), platform);
    runtime
        .create_engine(factory)
        .expect("mock factory creates a CDM");
    runtime
}
