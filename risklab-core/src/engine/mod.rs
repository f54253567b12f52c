//! Simulation engine — exit/entry evaluation and the period loop.
//!
//! The driver owns all portfolio mutation; evaluators only decide. Exits run
//! strictly before entries within a period, and every tie-break is fixed, so
//! a run is a pure function of (data, config).

pub mod driver;
pub mod entry;
pub mod exit;
pub mod minute;
pub mod pyramid;

pub use driver::{run_simulation, run_simulation_with_minutes, EngineError, SimulationRun};
pub use entry::select_candidates;
pub use exit::{decide_exit, ExitAction};
pub use minute::{refine_entries, refine_entry, MinuteBar, MinuteData, RefinedEntry};
pub use pyramid::{apply_rebuy, select_rebuy_candidates};
