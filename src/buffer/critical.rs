use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr::NonNull;

use super::{Buffer, BufferKind, Region, ReleaseMode};
use crate::error::Side;
use crate::{Error, Result};

thread_local! {
    static CRITICAL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Returns `true` while the current thread holds at least one managed array
/// inside a critical section.
///
/// Code that may allocate or call into a host runtime asserts this is `false`.
pub fn in_critical_section() -> bool {
    CRITICAL_DEPTH.with(|d| d.get() > 0)
}

fn enter() {
    CRITICAL_DEPTH.with(|d| d.set(d.get() + 1));
}

fn leave() {
    CRITICAL_DEPTH.with(|d| d.set(d.get() - 1));
}

/// A region resolved to a raw address.
///
/// Lives only inside [`with_region`] / [`with_pair`]; the closure signature keeps
/// it from escaping, and the raw pointer marker keeps it on this thread.
pub(crate) struct Acquired<'r> {
    buffer: Buffer<'r>,
    base: NonNull<u8>,
    offset: usize,
    len: usize,
    mode: ReleaseMode,
    _thread_bound: PhantomData<*mut u8>,
}

impl Acquired<'_> {
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.as_mut_ptr().cast_const()
    }

    pub(crate) fn as_mut_ptr(&self) -> *mut u8 {
        // SAFETY: the region was bounds-checked against the capacity the base
        // pointer is valid for.
        unsafe { self.base.as_ptr().add(self.offset) }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for Acquired<'_> {
    fn drop(&mut self) {
        if let Buffer::Managed(array) = self.buffer {
            // SAFETY: `base` came from `enter_critical` on this array in `acquire`.
            unsafe { array.exit_critical(self.base, self.mode) };
            leave();
        }
    }
}

fn acquire<'r>(region: &Region<'r>, side: Side) -> Result<Acquired<'r>> {
    let mode = match side {
        Side::Input => ReleaseMode::Discard,
        Side::Output => ReleaseMode::Commit,
    };
    let base = match region.buffer() {
        Buffer::External(buffer) => {
            if side == Side::Output && !buffer.writable() {
                return Err(Error::BufferUnavailable { side });
            }
            buffer.address().ok_or(Error::BufferUnavailable { side })?
        }
        Buffer::Managed(array) => {
            // SAFETY: released exactly once by `Acquired::drop`.
            let base = unsafe { array.enter_critical() }
                .ok_or(Error::OutOfMemory("critical access to managed array"))?;
            enter();
            base
        }
    };
    Ok(Acquired {
        buffer: region.buffer(),
        base,
        offset: region.offset(),
        len: region.len(),
        mode,
        _thread_bound: PhantomData,
    })
}

/// Whether two regions cover at least one common byte.
///
/// Managed arrays are compared by identity since their address is only known
/// inside a critical section. External buffers are compared by native address,
/// so two handles onto the same memory are caught too.
fn overlapping(a: &Region<'_>, b: &Region<'_>) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let (a_start, b_start) = match (a.buffer(), b.buffer()) {
        (Buffer::Managed(x), Buffer::Managed(y)) => {
            if !std::ptr::addr_eq(x, y) {
                return false;
            }
            (a.offset(), b.offset())
        }
        (Buffer::External(x), Buffer::External(y)) => match (x.address(), y.address()) {
            (Some(x), Some(y)) => (
                x.as_ptr() as usize + a.offset(),
                y.as_ptr() as usize + b.offset(),
            ),
            _ => return false,
        },
        _ => return false,
    };
    a_start < b_start + b.len() && b_start < a_start + a.len()
}

/// Resolves one read-only region for the duration of `f`.
pub(crate) fn with_region<R>(region: &Region<'_>, f: impl FnOnce(&Acquired<'_>) -> R) -> Result<R> {
    let acquired = acquire(region, Side::Input)?;
    Ok(f(&acquired))
}

/// Resolves an input and an output region for the duration of `f`.
///
/// External regions are resolved first, so a missing address is reported before
/// any critical section is entered. Whatever was acquired is released when this
/// returns, including when the second acquisition fails. The input is released
/// with [`ReleaseMode::Discard`], the output with [`ReleaseMode::Commit`].
///
/// Overlapping regions of one buffer are rejected with
/// [`Error::OverlappingRegions`] before anything is acquired.
pub(crate) fn with_pair<R>(
    input: &Region<'_>,
    output: &Region<'_>,
    f: impl FnOnce(&Acquired<'_>, &Acquired<'_>) -> R,
) -> Result<R> {
    if overlapping(input, output) {
        log::debug!(
            "rejecting overlapping regions {}+{} and {}+{}",
            input.offset(),
            input.len(),
            output.offset(),
            output.len()
        );
        return Err(Error::OverlappingRegions);
    }
    if input.kind() == BufferKind::Managed && output.kind() == BufferKind::External {
        let out = acquire(output, Side::Output)?;
        let inp = acquire(input, Side::Input)?;
        Ok(f(&inp, &out))
    } else {
        let inp = acquire(input, Side::Input)?;
        let out = acquire(output, Side::Output)?;
        Ok(f(&inp, &out))
    }
}
