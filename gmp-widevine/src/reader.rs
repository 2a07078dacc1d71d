use std::io::{Cursor, Error, ErrorKind, Read, Result};

/// Big endian reader used for codec configuration records and length prefixed samples.
#[derive(Clone)]
pub struct Reader<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: Cursor::new(data),
        }
    }

    pub fn has_more_data(&self) -> bool {
        self.get_position() < self.get_length()
    }

    pub fn get_length(&self) -> u64 {
        self.inner.get_ref().len() as u64
    }

    pub fn get_position(&self) -> u64 {
        self.inner.position()
    }

    pub fn remaining(&self) -> u64 {
        self.get_length().saturating_sub(self.get_position())
    }

    pub fn skip(&mut self, bytes: u64) -> Result<()> {
        let position = self.get_position() + bytes;

        if position > self.get_length() {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                "Reader skips out of memory bounds.",
            ));
        }

        self.inner.set_position(position);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0; 2];
        self.inner.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Borrow the next `bytes` bytes without copying them.
    pub fn read_slice(&mut self, bytes: usize) -> Result<&'a [u8]> {
        let start = self.get_position() as usize;
        let data: &'a [u8] = *self.inner.get_ref();

        if bytes > data.len() - start {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!("Reader needs {} bytes but only {} remain.", bytes, data.len() - start),
            ));
        }

        self.inner.set_position((start + bytes) as u64);
        Ok(&data[start..start + bytes])
    }
}
