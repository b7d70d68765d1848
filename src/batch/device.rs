//! Device backend: batched kernel with reference-counted buffer residency.
//!
//! The contract is identical to the host backend; what changes is where the
//! data lives. Each participating buffer (both operand containers and the
//! result matrix) has a "present on device" state with a reference count,
//! tracked in a process-wide registry keyed by `(device id, host buffer
//! identity)`:
//!
//! - an absent operand is allocated on the device, uploaded, and pinned with
//!   a reference count of one;
//! - a resident operand with its `update_*` flag set is overwritten from the
//!   host (no reference-count change);
//! - a resident operand without the flag is reused as-is; the kernel reads
//!   the **device** copy, so host-side mutations made after the upload are
//!   invisible until the caller asks for a refresh;
//! - after the kernel, the result matrix is copied back to the host
//!   unconditionally, and each buffer whose `release_*` flag is set has its
//!   reference count dropped, deallocating the device copy at zero.
//!
//! This lets a caller pin a large reference container once and stream probe
//! containers against it without repeated transfers, which is the whole point
//! of the batch interface.
//!
//! The crate does not bind a vendor accelerator runtime. The device is an
//! in-process emulation with its own memory arena and a SIMT-flavored
//! execution shape: one team per first-operand slot, a pool of workers
//! sweeping the second-operand axis, and a vectorized reduction over the
//! stride words inside each worker. The residency protocol above is
//! observable through [`is_resident`] and [`refcount`] and behaves exactly as
//! a discrete accelerator's would.
//!
//! Releasing a buffer that is not resident is a residency violation and
//! terminates. Dropping a container that is still resident force-releases
//! its device copy with a warning; use `release_*` flags (or [`reset`]) for
//! orderly teardown.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::batch::{check_operands, check_result_len, MAX_WORKERS};
use crate::error::{fatal, BatchError, DeviceError};
use crate::pack::BitsetPack;
use crate::setops::{self, SetOp};

/// Number of emulated accelerator devices.
const DEVICE_COUNT: usize = 1;

/// Cells per worker dispatch along the second-operand axis.
const TEAM_GRAIN: usize = 32;

/// Options bundle for one device-offload call.
#[derive(Debug, Clone)]
pub struct DeviceOptions {
    /// Target device id, in `0..device_count()`.
    pub device: usize,
    /// Refresh the device copy of the first operand even if resident.
    pub update_first: bool,
    /// Refresh the device copy of the second operand even if resident.
    pub update_second: bool,
    /// After the kernel, drop one residency reference of the first operand.
    pub release_first: bool,
    /// After the kernel, drop one residency reference of the second operand.
    pub release_second: bool,
    /// After the kernel, drop one residency reference of the result buffer.
    pub release_counts: bool,
    /// Host-backend worker request; the device backend sizes its own team
    /// pool and ignores this field.
    pub workers: i32,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            device: 0,
            update_first: false,
            update_second: false,
            release_first: false,
            release_second: false,
            release_counts: false,
            workers: 0,
        }
    }
}

/// A pinned device-side copy of a host word buffer.
struct DeviceBuffer {
    words: Vec<u64>,
    refs: usize,
}

/// A pinned device-side result matrix.
struct CountsBuffer {
    cells: Vec<i32>,
    refs: usize,
}

#[derive(Default)]
struct DeviceState {
    operands: HashMap<usize, DeviceBuffer>,
    counts: HashMap<usize, CountsBuffer>,
}

struct Device {
    state: Mutex<DeviceState>,
    pool: OnceLock<ThreadPool>,
}

static DEVICES: OnceLock<Vec<Device>> = OnceLock::new();

fn devices() -> &'static [Device] {
    DEVICES.get_or_init(|| {
        (0..DEVICE_COUNT)
            .map(|_| Device { state: Mutex::new(DeviceState::default()), pool: OnceLock::new() })
            .collect()
    })
}

fn device(id: usize) -> &'static Device {
    let devs = devices();
    if id >= devs.len() {
        fatal(DeviceError::InvalidDevice { device: id, available: devs.len() });
    }
    &devs[id]
}

/// Per-device team pool, built on first kernel launch.
fn team_pool(dev: &'static Device) -> &'static ThreadPool {
    dev.pool.get_or_init(|| {
        ThreadPoolBuilder::new()
            .num_threads(num_cpus::get().clamp(1, MAX_WORKERS))
            .build()
            .unwrap_or_else(|e| fatal(BatchError::pool_build(e.to_string())))
    })
}

/// Number of available devices.
pub fn device_count() -> usize {
    DEVICE_COUNT
}

/// Compute the count matrix for `op` on the device selected by `opts`.
///
/// Allocating form; the returned buffer's device residency follows
/// `opts.release_counts` just as in [`count_matrix_into`]. Callers that
/// stream many calls and want the result buffer to stay device-resident
/// should reuse one buffer through [`count_matrix_into`] instead.
pub fn count_matrix(op: SetOp, a: &BitsetPack, b: &BitsetPack, opts: &DeviceOptions) -> Vec<i32> {
    let mut out = vec![0i32; a.nelem() * b.nelem()];
    count_matrix_into(op, a, b, opts, &mut out);
    out
}

/// As [`count_matrix`], writing into a caller-provided buffer of exactly
/// `a.nelem() * b.nelem()` cells.
pub fn count_matrix_into(
    op: SetOp,
    a: &BitsetPack,
    b: &BitsetPack,
    opts: &DeviceOptions,
    out: &mut [i32],
) {
    if let Err(e) = check_operands(a, b) {
        fatal(e);
    }
    if let Err(e) = check_result_len(a, b, out.len()) {
        fatal(e);
    }

    let dev = device(opts.device);
    let mut guard = dev.state.lock();
    let state = &mut *guard;

    // Residency phase: host→device transfers as dictated by the flags.
    upload_operand(state, opts.device, a, opts.update_first);
    upload_operand(state, opts.device, b, opts.update_second);
    let counts_key = out.as_ptr() as usize;
    ensure_counts(state, opts.device, counts_key, out);

    // Kernel phase: teams over the first-operand axis, workers over the
    // second, reading the device copies only.
    {
        let DeviceState { operands, counts } = &mut *state;
        let a_dev = operand_words(operands, opts.device, a.storage_key());
        let b_dev = operand_words(operands, opts.device, b.storage_key());
        let cells = match counts.get_mut(&counts_key) {
            Some(buf) => buf.cells.as_mut_slice(),
            None => unreachable!("counts buffer pinned above"),
        };

        let stride = a.stride();
        let ncols = b.nelem();
        team_pool(dev).install(|| {
            cells.par_chunks_mut(ncols).enumerate().for_each(|(i, row)| {
                let s = &a_dev[i * stride..(i + 1) * stride];
                row.par_iter_mut().enumerate().with_min_len(TEAM_GRAIN).for_each(|(j, cell)| {
                    let t = &b_dev[j * stride..(j + 1) * stride];
                    *cell = setops::count_pair(op, s, t) as i32;
                });
            });
        });

        // Device→host copy of the result, unconditional.
        out.copy_from_slice(cells);
    }

    // Release phase.
    if opts.release_first {
        release_operand(state, opts.device, a.storage_key());
    }
    if opts.release_second {
        release_operand(state, opts.device, b.storage_key());
    }
    if opts.release_counts {
        release_counts(state, opts.device, counts_key);
    }
}

/// True when `pack` currently has a copy pinned on `device_id`.
pub fn is_resident(device_id: usize, pack: &BitsetPack) -> bool {
    device(device_id).state.lock().operands.contains_key(&pack.storage_key())
}

/// Residency reference count of `pack` on `device_id` (zero when absent).
pub fn refcount(device_id: usize, pack: &BitsetPack) -> usize {
    device(device_id)
        .state
        .lock()
        .operands
        .get(&pack.storage_key())
        .map_or(0, |buf| buf.refs)
}

/// Deallocate every buffer pinned on `device_id`.
pub fn reset(device_id: usize) {
    let mut state = device(device_id).state.lock();
    let dropped = state.operands.len() + state.counts.len();
    state.operands.clear();
    state.counts.clear();
    if dropped > 0 {
        log::debug!("device {device_id}: reset dropped {dropped} buffer(s)");
    }
}

/// Drop hook: force-release a host buffer that died while device-resident.
pub(crate) fn release_dropped(key: usize) {
    let Some(devs) = DEVICES.get() else {
        return;
    };
    for (id, dev) in devs.iter().enumerate() {
        let mut state = dev.state.lock();
        if state.operands.remove(&key).is_some() {
            log::warn!("device {id}: buffer {key:#x} dropped while resident; force-released");
        }
    }
}

fn upload_operand(state: &mut DeviceState, device_id: usize, pack: &BitsetPack, update: bool) {
    let key = pack.storage_key();
    match state.operands.entry(key) {
        Entry::Occupied(mut entry) => {
            let buf = entry.get_mut();
            if buf.words.len() != pack.all_words().len() {
                fatal(DeviceError::residency(
                    device_id,
                    format!("resident buffer {key:#x} has a different shape than its host copy"),
                ));
            }
            if update {
                buf.words.copy_from_slice(pack.all_words());
                log::debug!("device {device_id}: refreshed operand buffer {key:#x}");
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(DeviceBuffer { words: pack.all_words().to_vec(), refs: 1 });
            log::debug!(
                "device {device_id}: uploaded operand buffer {key:#x} ({} words)",
                pack.all_words().len()
            );
        }
    }
}

fn ensure_counts(state: &mut DeviceState, device_id: usize, key: usize, out: &[i32]) {
    match state.counts.entry(key) {
        Entry::Occupied(mut entry) => {
            // Result buffers have no drop hook, so a freed host buffer's
            // address can come back with a different shape; that is a fresh
            // pin, not a violation.
            if entry.get().cells.len() != out.len() {
                log::debug!("device {device_id}: result buffer {key:#x} reshaped, repinning");
                *entry.get_mut() = CountsBuffer { cells: out.to_vec(), refs: 1 };
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(CountsBuffer { cells: out.to_vec(), refs: 1 });
            log::debug!("device {device_id}: pinned result buffer {key:#x} ({} cells)", out.len());
        }
    }
}

fn operand_words<'a>(
    operands: &'a HashMap<usize, DeviceBuffer>,
    device_id: usize,
    key: usize,
) -> &'a [u64] {
    match operands.get(&key) {
        Some(buf) => buf.words.as_slice(),
        None => fatal(DeviceError::residency(
            device_id,
            format!("operand buffer {key:#x} expected resident but absent"),
        )),
    }
}

fn release_operand(state: &mut DeviceState, device_id: usize, key: usize) {
    match state.operands.get_mut(&key) {
        Some(buf) => {
            buf.refs -= 1;
            if buf.refs == 0 {
                state.operands.remove(&key);
                log::debug!("device {device_id}: released operand buffer {key:#x}");
            }
        }
        None => fatal(DeviceError::residency(
            device_id,
            format!("release of non-resident operand buffer {key:#x}"),
        )),
    }
}

fn release_counts(state: &mut DeviceState, device_id: usize, key: usize) {
    match state.counts.get_mut(&key) {
        Some(buf) => {
            buf.refs -= 1;
            if buf.refs == 0 {
                state.counts.remove(&key);
                log::debug!("device {device_id}: released result buffer {key:#x}");
            }
        }
        None => fatal(DeviceError::residency(
            device_id,
            format!("release of non-resident result buffer {key:#x}"),
        )),
    }
}
