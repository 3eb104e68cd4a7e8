//! Python bindings.
//!
//! `bytearray` arguments are handled as managed arrays: their storage belongs to
//! the interpreter and may move when they are resized, so their address is only
//! taken while the GIL is held and no Python code can run. Every other object
//! exporting a contiguous byte buffer (`bytes`, `memoryview`, `mmap`, numpy
//! arrays) is handled as an external buffer.

use std::ptr::NonNull;

use pyo3::buffer::PyBuffer;
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyIndexError, PyMemoryError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes};

use crate::buffer::{Buffer, ExternalBuffer, ManagedArray, Region, ReleaseMode};
use crate::{checksum, CompressionFormat, CompressionLevel, Error, Outcome};

/// Default ceiling for `Decompressor.decompress_to_bytes`.
const DEFAULT_OUTPUT_LIMIT: usize = 1 << 30;

create_exception!(
    deflate_bridge,
    DataFormatError,
    PyException,
    "Compressed input is corrupt or does not match the asserted size."
);

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        let message = err.to_string();
        match err {
            Error::OutOfMemory(_) => PyMemoryError::new_err(message),
            Error::OutOfBounds { .. } => PyIndexError::new_err(message),
            ref e if e.is_data_error() => DataFormatError::new_err(message),
            _ => PyValueError::new_err(message),
        }
    }
}

struct ManagedByteArray<'a, 'py>(&'a Bound<'py, PyByteArray>);

// SAFETY: the returned pointer stays valid while the GIL is held and no Python
// code runs, which the critical-section contract guarantees.
unsafe impl ManagedArray for ManagedByteArray<'_, '_> {
    fn capacity(&self) -> usize {
        self.0.len()
    }

    unsafe fn enter_critical(&self) -> Option<NonNull<u8>> {
        // valid until Python code runs again, which cannot happen before exit
        NonNull::new(self.0.data())
    }

    unsafe fn exit_critical(&self, _base: NonNull<u8>, _mode: ReleaseMode) {}
}

struct ExportedBuffer(PyBuffer<u8>);

// SAFETY: the exporter keeps the memory alive and in place until the view is
// released, which happens when `PyBuffer` drops.
unsafe impl ExternalBuffer for ExportedBuffer {
    fn capacity(&self) -> usize {
        self.0.len_bytes()
    }

    fn address(&self) -> Option<NonNull<u8>> {
        if self.0.is_c_contiguous() {
            NonNull::new(self.0.buf_ptr().cast::<u8>())
        } else {
            None
        }
    }

    fn writable(&self) -> bool {
        !self.0.readonly()
    }
}

enum HostBuffer<'a, 'py> {
    Managed(ManagedByteArray<'a, 'py>),
    External(ExportedBuffer),
}

impl<'a, 'py> HostBuffer<'a, 'py> {
    fn from_object(obj: &'a Bound<'py, PyAny>) -> PyResult<Self> {
        match obj.downcast::<PyByteArray>() {
            Ok(array) => Ok(HostBuffer::Managed(ManagedByteArray(array))),
            Err(_) => Ok(HostBuffer::External(ExportedBuffer(PyBuffer::get_bound(obj)?))),
        }
    }

    fn buffer(&self) -> Buffer<'_> {
        match self {
            HostBuffer::Managed(array) => Buffer::managed(array),
            HostBuffer::External(view) => Buffer::external(view),
        }
    }

    /// `offset` defaults to 0 and `length` to everything after `offset`.
    fn region(&self, offset: Option<usize>, length: Option<usize>) -> PyResult<Region<'_>> {
        let buffer = self.buffer();
        let offset = offset.unwrap_or(0);
        let region = match length {
            Some(len) => Region::new(buffer, offset, len)?,
            None => Region::tail(buffer, offset)?,
        };
        Ok(region)
    }
}

fn outcome_to_py(outcome: Outcome) -> Option<(usize, usize)> {
    match outcome {
        Outcome::Success { produced, consumed } => Some((produced, consumed)),
        Outcome::InsufficientSpace => None,
    }
}

/// A libdeflate compressor bound to one compression level.
#[pyclass(name = "Compressor", module = "deflate_bridge")]
struct PyCompressor {
    inner: crate::Compressor,
}

#[pymethods]
impl PyCompressor {
    #[new]
    #[pyo3(signature = (level = 6))]
    fn new(level: i32) -> PyResult<Self> {
        let inner = crate::Compressor::with_level(CompressionLevel::new(level)?)?;
        Ok(Self { inner })
    }

    #[getter]
    fn level(&self) -> i32 {
        self.inner.level().get()
    }

    /// Compresses `input` into `output` and returns the number of bytes written.
    #[pyo3(signature = (
        input, output, format = "deflate", *,
        in_offset = None, in_length = None, out_offset = None, out_length = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn compress(
        &mut self,
        input: &Bound<'_, PyAny>,
        output: &Bound<'_, PyAny>,
        format: &str,
        in_offset: Option<usize>,
        in_length: Option<usize>,
        out_offset: Option<usize>,
        out_length: Option<usize>,
    ) -> PyResult<usize> {
        let format: CompressionFormat = format.parse()?;
        let (input, output) = (HostBuffer::from_object(input)?, HostBuffer::from_object(output)?);
        let src = input.region(in_offset, in_length)?;
        let dst = output.region(out_offset, out_length)?;
        Ok(self.inner.compress_region(&src, &dst, format)?)
    }

    #[pyo3(signature = (data, format = "deflate"))]
    fn compress_to_bytes<'py>(
        &mut self,
        py: Python<'py>,
        data: &[u8],
        format: &str,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let compressed = self.inner.compress_to_vec(data, format.parse()?)?;
        Ok(PyBytes::new_bound(py, &compressed))
    }

    #[pyo3(signature = (length, format = "deflate"))]
    fn compress_bound(&self, length: usize, format: &str) -> PyResult<usize> {
        Ok(self.inner.compress_bound(format.parse()?, length))
    }
}

/// A libdeflate decompressor.
#[pyclass(name = "Decompressor", module = "deflate_bridge")]
struct PyDecompressor {
    inner: crate::Decompressor,
}

#[pymethods]
impl PyDecompressor {
    #[new]
    fn new() -> PyResult<Self> {
        Ok(Self {
            inner: crate::Decompressor::new()?,
        })
    }

    /// Decompresses `input` into `output`.
    ///
    /// Returns `(produced, consumed)`, or `None` when `expected` is not given and
    /// `output` is too small.
    #[pyo3(signature = (
        input, output, format = "deflate", expected = None, *,
        in_offset = None, in_length = None, out_offset = None, out_length = None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn decompress(
        &mut self,
        input: &Bound<'_, PyAny>,
        output: &Bound<'_, PyAny>,
        format: &str,
        expected: Option<usize>,
        in_offset: Option<usize>,
        in_length: Option<usize>,
        out_offset: Option<usize>,
        out_length: Option<usize>,
    ) -> PyResult<Option<(usize, usize)>> {
        let format: CompressionFormat = format.parse()?;
        let (input, output) = (HostBuffer::from_object(input)?, HostBuffer::from_object(output)?);
        let src = input.region(in_offset, in_length)?;
        let dst = output.region(out_offset, out_length)?;
        let outcome = self.inner.decompress_region(&src, &dst, format, expected)?;
        Ok(outcome_to_py(outcome))
    }

    #[pyo3(signature = (data, format = "deflate", limit = DEFAULT_OUTPUT_LIMIT))]
    fn decompress_to_bytes<'py>(
        &mut self,
        py: Python<'py>,
        data: &[u8],
        format: &str,
        limit: usize,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let plain = self.inner.decompress_to_vec(data, format.parse()?, limit)?;
        Ok(PyBytes::new_bound(py, &plain))
    }
}

#[pyfunction]
#[pyo3(signature = (data, seed = 0, *, offset = None, length = None))]
fn crc32(
    data: &Bound<'_, PyAny>,
    seed: u32,
    offset: Option<usize>,
    length: Option<usize>,
) -> PyResult<u32> {
    let data = HostBuffer::from_object(data)?;
    Ok(checksum::crc32(seed, &data.region(offset, length)?)?)
}

#[pyfunction]
#[pyo3(signature = (data, seed = 1, *, offset = None, length = None))]
fn adler32(
    data: &Bound<'_, PyAny>,
    seed: u32,
    offset: Option<usize>,
    length: Option<usize>,
) -> PyResult<u32> {
    let data = HostBuffer::from_object(data)?;
    Ok(checksum::adler32(seed, &data.region(offset, length)?)?)
}

/// Worst-case compressed size of `length` bytes at any level.
#[pyfunction]
#[pyo3(signature = (length, format = "deflate"))]
fn compress_bound(length: usize, format: &str) -> PyResult<usize> {
    Ok(crate::Compressor::generic_compress_bound(format.parse()?, length))
}

/// Routes the crate's log records to stderr, filtered by `RUST_LOG`.
///
/// Returns `False` if a logger was already installed.
#[pyfunction]
fn init_logging() -> bool {
    env_logger::try_init().is_ok()
}

#[pymodule]
fn deflate_bridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCompressor>()?;
    m.add_class::<PyDecompressor>()?;
    m.add_function(wrap_pyfunction!(crc32, m)?)?;
    m.add_function(wrap_pyfunction!(adler32, m)?)?;
    m.add_function(wrap_pyfunction!(compress_bound, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add("DataFormatError", m.py().get_type_bound::<DataFormatError>())?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
