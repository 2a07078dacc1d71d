use crate::{
    engine::{FileIo, FileIoClient, FileIoStatus},
    host::{GmpErr, Platform, Record},
};
use log::{debug, warn};
use std::sync::Arc;

fn file_io_status(result: &Result<(), GmpErr>) -> FileIoStatus {
    match result {
        Ok(()) => FileIoStatus::Success,
        Err(GmpErr::RecordInUseErr) => FileIoStatus::InUse,
        Err(_) => FileIoStatus::Error,
    }
}

/// CDM file handle backed by a host storage record.
pub(crate) struct RecordFileIo {
    platform: Option<Arc<dyn Platform>>,
    client: Box<dyn FileIoClient>,
    record: Option<Box<dyn Record>>,
}

impl RecordFileIo {
    pub(crate) fn new(platform: Option<Arc<dyn Platform>>, client: Box<dyn FileIoClient>) -> Self {
        Self {
            platform,
            client,
            record: None,
        }
    }

    fn open_record(&mut self, name: &str) -> Result<(), GmpErr> {
        if self.record.is_some() {
            return Err(GmpErr::RecordInUseErr);
        }

        let platform = self.platform.as_ref().ok_or(GmpErr::ClosedErr)?;
        let mut record = platform.create_record(name)?;
        record.open()?;
        self.record = Some(record);
        Ok(())
    }
}

impl FileIo for RecordFileIo {
    fn open(&mut self, name: &str) {
        let result = self.open_record(name);
        debug!("Opened record '{}': {:?}", name, result);
        self.client.on_open_complete(file_io_status(&result));
    }

    fn read(&mut self) {
        match self.record.as_mut().map(|record| record.read()) {
            Some(Ok(data)) => self.client.on_read_complete(FileIoStatus::Success, &data),
            Some(Err(e)) => {
                warn!("Record read failed: {:?}", e);
                self.client.on_read_complete(file_io_status(&Err(e)), &[]);
            }
            None => self.client.on_read_complete(FileIoStatus::Error, &[]),
        }
    }

    fn write(&mut self, data: &[u8]) {
        let result = match self.record.as_mut() {
            Some(record) => record.write(data),
            None => Err(GmpErr::ClosedErr),
        };

        if let Err(e) = &result {
            warn!("Record write of {} bytes failed: {:?}", data.len(), e);
        }

        self.client.on_write_complete(file_io_status(&result));
    }

    fn close(mut self: Box<Self>) {
        if let Some(mut record) = self.record.take() {
            record.close();
        }
    }
}
