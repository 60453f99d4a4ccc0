//! Module interfaces
//!
//! Each cyclic module in `fc_exec` (orientation estimation, the flight
//! supervisor) shall implement all the items in this module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// A cyclic module, constructed with `Default` and then initialised once.
pub trait State {
    /// Parameters and shared handles passed to `init`.
    type InitData;
    type InitError;

    /// Everything one cycle consumes, sampled by the caller.
    type InputData;
    type OutputData;
    /// Per-cycle diagnostics, logged at trace level or archived.
    type StatusReport;
    type ProcError;

    /// Validate the init data and prepare the module, opening any archives
    /// inside `session`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle.
    ///
    /// Errors leave the module usable, the caller decides whether to carry
    /// on with the next cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
