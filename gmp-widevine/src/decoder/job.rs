use crate::{
    engine::{InputBuffer, Subsample},
    host::{BufferType, EncodedFrame, FrameType},
};

/// One host frame, owned by the decode worker until it has been answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncodedFrameJob {
    pub(crate) buffer_type: BufferType,
    pub(crate) key_frame: bool,
    pub(crate) data: Vec<u8>,
    pub(crate) key_id: Vec<u8>,
    pub(crate) iv: Vec<u8>,
    pub(crate) subsamples: Vec<Subsample>,
    pub(crate) timestamp: u64,
    pub(crate) duration: u64,
}

impl EncodedFrameJob {
    pub(crate) fn input(&self) -> InputBuffer<'_> {
        InputBuffer {
            data: &self.data,
            key_id: &self.key_id,
            iv: &self.iv,
            subsamples: &self.subsamples,
            timestamp: i64::try_from(self.timestamp).unwrap_or(i64::MAX),
        }
    }
}

impl From<EncodedFrame> for EncodedFrameJob {
    fn from(frame: EncodedFrame) -> Self {
        let (key_id, iv, subsamples) = match frame.metadata {
            Some(metadata) => {
                let subsamples = metadata.subsamples();
                (metadata.key_id, metadata.iv, subsamples)
            }
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        Self {
            buffer_type: frame.buffer_type,
            key_frame: frame.frame_type == FrameType::Key,
            data: frame.data,
            key_id,
            iv,
            subsamples,
            timestamp: frame.timestamp,
            duration: frame.duration,
        }
    }
}
