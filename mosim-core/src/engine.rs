//! External engine interface.
//!
//! The library never links against a simulation tool. [`Engine`] is the
//! minimal surface an external handle (the Dymola interface, or anything
//! compatible) has to expose; [`run_script`] drives such a handle over a
//! finished script.

use std::path::Path;

use crate::error::{Error, Result};
use crate::util;

/// Handle to an external simulation engine.
///
/// Mirrors the three capabilities the vendor interfaces actually provide:
/// execute a command string with a success flag, fetch the error log, and
/// close the handle.
pub trait Engine {
    /// Executes a single command string. `Ok(false)` means the engine ran
    /// the command and reported failure; `Err` means the engine itself
    /// failed.
    fn execute(&mut self, command: &str) -> Result<bool>;

    /// Returns the engine's error log for the last failed command.
    fn last_error_log(&mut self) -> String;

    /// Closes the handle. Called exactly once by [`run_script`].
    fn close(&mut self);
}

/// Executes a generated script on the given engine handle.
///
/// Sets the engine working directory, then runs the script. On a reported
/// failure the engine's error log is written to the log output and
/// `Ok(false)` is returned; there is no retry. An engine-level error is
/// logged and returned as [`Error::EngineError`]. The handle is closed on
/// every path before returning.
pub fn run_script<E: Engine>(engine: &mut E, script: &Path, working_dir: &Path) -> Result<bool> {
    let result = execute_inner(engine, script, working_dir);
    engine.close();
    match result {
        Ok(ok) => Ok(ok),
        Err(e) => {
            error!("engine error: {}", e);
            Err(Error::EngineError(e.to_string()))
        }
    }
}

fn execute_inner<E: Engine>(engine: &mut E, script: &Path, working_dir: &Path) -> Result<bool> {
    engine.execute(&format!(
        "Modelica.Utilities.System.setWorkDirectory(\"{}\")",
        util::posix_str(working_dir)
    ))?;
    let ok = engine.execute(&format!("RunScript(\"{}\", true)", util::posix_str(script)))?;
    if !ok {
        let log = engine.last_error_log();
        error!("script execution failed, engine log:\n{}", log);
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct MockEngine {
        commands: Vec<String>,
        script_result: Result<bool>,
        log_fetched: bool,
        closed: bool,
    }

    impl MockEngine {
        fn new(script_result: Result<bool>) -> Self {
            Self {
                commands: Vec::new(),
                script_result,
                log_fetched: false,
                closed: false,
            }
        }
    }

    impl Engine for MockEngine {
        fn execute(&mut self, command: &str) -> Result<bool> {
            self.commands.push(command.to_string());
            if command.starts_with("RunScript") {
                std::mem::replace(&mut self.script_result, Ok(true))
            } else {
                Ok(true)
            }
        }

        fn last_error_log(&mut self) -> String {
            self.log_fetched = true;
            "translation log".to_string()
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    #[test]
    fn sets_working_dir_then_runs_the_script() {
        let mut engine = MockEngine::new(Ok(true));
        let ok = run_script(
            &mut engine,
            &PathBuf::from("/work/run_sims.mos"),
            &PathBuf::from("/work"),
        )
        .unwrap();
        assert!(ok);
        assert_eq!(
            engine.commands,
            vec![
                "Modelica.Utilities.System.setWorkDirectory(\"/work\")".to_string(),
                "RunScript(\"/work/run_sims.mos\", true)".to_string(),
            ]
        );
        assert!(engine.closed);
        assert!(!engine.log_fetched);
    }

    #[test]
    fn reported_failure_fetches_the_log_and_closes() {
        let mut engine = MockEngine::new(Ok(false));
        let ok = run_script(
            &mut engine,
            &PathBuf::from("/work/run_sims.mos"),
            &PathBuf::from("/work"),
        )
        .unwrap();
        assert!(!ok);
        assert!(engine.log_fetched);
        assert!(engine.closed);
    }

    #[test]
    fn engine_error_still_closes_the_handle() {
        let mut engine = MockEngine::new(Err(Error::Other("connection lost".to_string())));
        let result = run_script(
            &mut engine,
            &PathBuf::from("/work/run_sims.mos"),
            &PathBuf::from("/work"),
        );
        assert!(matches!(result, Err(Error::EngineError(_))));
        assert!(engine.closed);
    }
}
