//! This library implements the core experiment scripting functionality.
//!
//! Programming interface is centered around the [`ScriptWriter`] structure,
//! which owns the generated simulation script and its run log for the
//! duration of a scripting session. Experiments to feed into a writer are
//! produced with [`gen_experiments`], a lazy full-factorial expansion over
//! model names, parameter values and command options. Parameter sets are
//! held in [`ParamDict`], an insertion-ordered map that serializes to
//! Modelica's nested tuple-based modifier syntax.
//!
//! # Engine execution
//!
//! By itself, this library does not talk to any simulation tool. The
//! generated script is plain text meant to be executed by an external engine
//! (Dymola or compatible). The [`engine`] module provides the minimal trait
//! such an engine handle has to expose, together with a helper that drives
//! a handle over a finished script.
//!
//! # Using the library
//!
//! To use `mosim-core` in your Rust project add the following to your
//! `Cargo.toml`:
//!
//! ```toml
//! mosim-core = "0.1.0"
//! ```
//!
//! ## Example
//!
//! Here's a very simple example of how the library can be used inside your
//! program:
//!
//! ```ignore
//! extern crate mosim_core as mosim;
//! use mosim::{gen_experiments, write_script, ScriptSettings};
//!
//! pub fn main() {
//!     let experiments = gen_experiments(
//!         vec!["Modelica.Electrical.Analog.Examples.ChuaCircuit".to_string()],
//!         vec![("L.L".to_string(), vec![15.into(), 21.into()])],
//!         vec![("stopTime".to_string(), vec![2500.into()])],
//!     )
//!     .unwrap();
//!     let settings = ScriptSettings::new("run_sims.mos");
//!     write_script(experiments, settings).unwrap();
//! }
//! ```
//!
//! [`ScriptWriter`]: script/struct.ScriptWriter.html
//! [`gen_experiments`]: exps/fn.gen_experiments.html
//! [`ParamDict`]: param/struct.ParamDict.html

#![allow(unused)]

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use error::{Error, Result};
pub use exps::{gen_experiments, Experiment};
pub use manifest::ExperimentManifest;
pub use param::{ParamDict, ParamValue};
pub use script::{write_script, ScriptSettings, ScriptWriter};

pub mod dsin;
pub mod engine;
pub mod error;
pub mod exps;
pub mod manifest;
pub mod param;
pub mod script;

mod util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

/// Manifest file describing an experiment sweep.
pub const EXPERIMENT_MANIFEST_FILE: &str = "experiment.toml";

/// Default name of the generated script file.
pub const DEFAULT_SCRIPT_FILE: &str = "run_sims.mos";
/// Name of the tab-separated run log written next to the script.
pub const RUN_LOG_FILE: &str = "runs.tsv";

/// Default command issued per run.
pub const DEFAULT_COMMAND: &str = "simulateModel";

/// Files copied into the numbered result directory after each successful
/// run. `%x` expands to `.exe` on Windows and to nothing elsewhere.
pub const DEFAULT_RESULT_FILES: &[&str] = &[
    "dsin.txt",
    "dslog.txt",
    "dsres.mat",
    "dymolalg.txt",
    "dymosim%x",
];
