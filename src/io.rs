//! `C1`: generic byte-stream primitives shared by every streaming decoder.
//!
//! This is the `Read`-backed counterpart to [`crate::nbt::Reader`], which
//! instead borrows from an in-memory slice once a document has been
//! fully decompressed. Both expose the same small surface: exact-length
//! reads, skips, and typed integer reads in both endiannesses.

use crate::error::Error;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{ErrorKind, Read};

/// Collapses a short read to [`Error::UnexpectedEof`]; any other I/O
/// failure (permission denied, broken pipe, ...) propagates verbatim as
/// [`Error::Io`], matching the IO-vs-short-read split in the error
/// taxonomy.
fn map_io_err(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::UnexpectedEof
    } else {
        Error::Io(e)
    }
}

/// Wraps any [`Read`] with the fixed-size read/skip helpers the format
/// decoders need. Never seeks; a short read always becomes
/// [`Error::UnexpectedEof`].
pub struct ByteReader<R: Read> {
    inner: R,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        ByteReader { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.inner
            .read_exact(buf)
            .map_err(map_io_err)
    }

    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        let mut remaining = n;
        let mut scratch = [0u8; 256];
        while remaining > 0 {
            let chunk = remaining.min(scratch.len());
            self.read_exact(&mut scratch[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.inner.read_u8().map_err(map_io_err)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        self.inner.read_i8().map_err(map_io_err)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, Error> {
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(map_io_err)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, Error> {
        self.inner
            .read_u16::<BigEndian>()
            .map_err(map_io_err)
    }

    pub fn read_i16_le(&mut self) -> Result<i16, Error> {
        self.inner
            .read_i16::<LittleEndian>()
            .map_err(map_io_err)
    }

    pub fn read_i16_be(&mut self) -> Result<i16, Error> {
        self.inner
            .read_i16::<BigEndian>()
            .map_err(map_io_err)
    }

    pub fn read_i64_be(&mut self) -> Result<i64, Error> {
        self.inner
            .read_i64::<BigEndian>()
            .map_err(map_io_err)
    }

    pub fn read_f64_be(&mut self) -> Result<f64, Error> {
        self.inner
            .read_f64::<BigEndian>()
            .map_err(map_io_err)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(map_io_err)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, Error> {
        self.inner
            .read_u32::<BigEndian>()
            .map_err(map_io_err)
    }

    pub fn read_i32_le(&mut self) -> Result<i32, Error> {
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(map_io_err)
    }

    pub fn read_i32_be(&mut self) -> Result<i32, Error> {
        self.inner
            .read_i32::<BigEndian>()
            .map_err(map_io_err)
    }

    pub fn read_f32_be(&mut self) -> Result<f32, Error> {
        self.inner
            .read_f32::<BigEndian>()
            .map_err(map_io_err)
    }
}

impl<R: Read> Read for ByteReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}
