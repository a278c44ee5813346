//! Deferred interrupt handling.
//!
//! Interrupt-class signals are recorded, not acted on: the supervision loop
//! notices the pending signal, the runner releases the working directory,
//! and only then is the signal re-raised with its default disposition so
//! the process still dies with the status the scheduler expects.
use std::sync::atomic::{AtomicI32, Ordering};

use nix::libc::c_int;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, raise, sigaction};

use crate::error::Result;

/// Signals that must not skip working-directory cleanup.
const DEFERRED: &[Signal] = &[Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

static PENDING: AtomicI32 = AtomicI32::new(0);

extern "C" fn record(sig: c_int) {
    PENDING.store(sig, Ordering::Release);
}

/// Install the deferring handler for interrupt-class signals. Call once,
/// before any resource is acquired.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(record),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in DEFERRED {
        // SAFETY: the handler only stores into an atomic, which is
        // async-signal-safe.
        unsafe { sigaction(*sig, &action) }.map_err(std::io::Error::from)?;
    }
    Ok(())
}

/// The most recently delivered deferred signal, if any.
pub fn pending() -> Option<Signal> {
    match PENDING.load(Ordering::Acquire) {
        0 => None,
        n => Signal::try_from(n).ok(),
    }
}

/// Restore the default disposition and deliver `sig` to this process.
pub fn reraise(sig: Signal) -> ! {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    // SAFETY: resetting to the default disposition installs no handler.
    let _ = unsafe { sigaction(sig, &default) };
    let _ = raise(sig);
    // Only reachable if the signal is blocked externally; mirror the shell
    // convention instead of hanging.
    std::process::exit(128 + sig as i32);
}
