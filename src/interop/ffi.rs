//! C ABI entry points.
//!
//! `lle_embed` returns a buffer from the C allocator. Ownership passes to the
//! caller, who releases it with `free()` or, equivalently, [`lle_free`].
//! Errors are reported through a status code and a null return; panics are
//! caught before they reach the caller.

use super::embed_flat_with;
use crate::dimred::lle::LLEBuilder;
use crate::error::LleError;
use log::warn;
use std::mem;
use std::os::raw::{c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LleStatus {
    Ok = 0,
    InvalidArgument = 1,
    ReconstructionFailure = 2,
    DecompositionFailure = 3,
    NullPointer = 4,
    Panic = 5,
    AllocationFailure = 6,
}

impl From<&LleError> for LleStatus {
    fn from(err: &LleError) -> Self {
        match err {
            LleError::InvalidArgument(_) => LleStatus::InvalidArgument,
            LleError::ReconstructionFailure { .. } => LleStatus::ReconstructionFailure,
            LleError::DecompositionFailure { .. } => LleStatus::DecompositionFailure,
        }
    }
}

/// Embeds `num_points` points of dimension `in_dim` into `out_dim` dimensions.
///
/// Returns a `malloc`-allocated buffer of `num_points * out_dim` doubles,
/// point-major, or null on failure. When `status` is not null it receives an
/// [`LleStatus`] code.
///
/// # Safety
/// `data` must be valid for reads of `num_points * in_dim` doubles for the
/// duration of the call. `status`, if not null, must be valid for a write.
/// A non-null result belongs to the caller and must be released exactly once
/// with `free()` or [`lle_free`].
#[no_mangle]
pub unsafe extern "C" fn lle_embed(
    in_dim: c_int,
    out_dim: c_int,
    num_points: c_int,
    k: c_int,
    data: *const f64,
    status: *mut c_int,
) -> *mut f64 {
    embed_with_status(LLEBuilder::new(), in_dim, out_dim, num_points, k, data, status)
}

/// Releases a buffer returned by [`lle_embed`]. Null is ignored.
///
/// # Safety
/// `buffer` must be null or a pointer returned by [`lle_embed`] that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn lle_free(buffer: *mut f64) {
    libc::free(buffer as *mut c_void);
}

unsafe fn embed_with_status(
    builder: LLEBuilder,
    in_dim: c_int,
    out_dim: c_int,
    num_points: c_int,
    k: c_int,
    data: *const f64,
    status: *mut c_int,
) -> *mut f64 {
    let result = catch_unwind(AssertUnwindSafe(|| {
        embed_raw(builder, in_dim, out_dim, num_points, k, data)
    }));

    let (buffer, code) = match result {
        Ok(Ok(values)) => match into_malloc_buffer(&values) {
            Some(buffer) => (buffer, LleStatus::Ok),
            None => {
                warn!("lle_embed could not allocate {} output values", values.len());
                (ptr::null_mut(), LleStatus::AllocationFailure)
            }
        },
        Ok(Err(code)) => (ptr::null_mut(), code),
        Err(_) => {
            warn!("lle_embed panicked; returning null");
            (ptr::null_mut(), LleStatus::Panic)
        }
    };

    if !status.is_null() {
        *status = code as c_int;
    }
    buffer
}

unsafe fn embed_raw(
    builder: LLEBuilder,
    in_dim: c_int,
    out_dim: c_int,
    num_points: c_int,
    k: c_int,
    data: *const f64,
) -> Result<Vec<f64>, LleStatus> {
    if data.is_null() {
        return Err(LleStatus::NullPointer);
    }

    let dims = [
        ("in_dim", in_dim),
        ("out_dim", out_dim),
        ("num_points", num_points),
        ("k", k),
    ]
    .map(|(name, value)| {
        usize::try_from(value)
            .map_err(|_| LleError::invalid(format!("{} must be non-negative, got {}", name, value)))
    });

    let mut sizes = [0usize; 4];
    for (slot, dim) in sizes.iter_mut().zip(dims) {
        *slot = dim.map_err(|e| report(&e))?;
    }
    let [in_dim, out_dim, num_points, k] = sizes;

    let len = num_points
        .checked_mul(in_dim)
        .ok_or_else(|| report(&LleError::invalid("input buffer size overflows")))?;
    let values = std::slice::from_raw_parts(data, len);

    embed_flat_with(builder, in_dim, out_dim, num_points, k, values).map_err(|e| report(&e))
}

fn report(err: &LleError) -> LleStatus {
    warn!("lle_embed failed: {}", err);
    LleStatus::from(err)
}

/// Copies `values` into a fresh `malloc` block, or `None` if allocation fails.
fn into_malloc_buffer(values: &[f64]) -> Option<*mut f64> {
    let bytes = mem::size_of_val(values).max(mem::size_of::<f64>());
    let buffer = unsafe { libc::malloc(bytes) } as *mut f64;
    if buffer.is_null() {
        return None;
    }
    unsafe { ptr::copy_nonoverlapping(values.as_ptr(), buffer, values.len()) };
    Some(buffer)
}
