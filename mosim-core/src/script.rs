//! Script generation.
//!
//! [`ScriptWriter`] owns two files for the duration of a scripting session:
//! the generated `.mos` script and a tab-separated run log next to it. The
//! header goes out on open, one command block per [`ScriptWriter::run`]
//! call, and the terminating `exit();` on [`ScriptWriter::finish`]. Drop
//! finalizes the same way, so the files come out well-formed even when the
//! scope unwinds early. Content written before an abnormal exit is left as
//! written; a partial script is not valid engine input and is not rolled
//! back.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use chrono::Local;

use crate::error::{Error, Result};
use crate::exps::Experiment;
use crate::param::{ParamDict, ParamValue};
use crate::util;
use crate::{DEFAULT_COMMAND, DEFAULT_RESULT_FILES, DEFAULT_SCRIPT_FILE, RUN_LOG_FILE};

/// Configuration for a scripting session.
///
/// Replaces the loose keyword-option surface of older tooling with an
/// explicit struct: unknown option names still pass through to the script
/// verbatim, but they have to be put into `options` deliberately.
#[derive(Debug, Clone)]
pub struct ScriptSettings {
    /// Path of the script file to be written.
    pub fname: PathBuf,
    /// Command issued per run, e.g. `simulateModel`, `linearizeModel` or
    /// `translateModel`.
    pub command: String,
    /// Working directory where the engine creates its output files.
    /// Defaults to the current directory.
    pub working_dir: Option<PathBuf>,
    /// Files copied into the numbered result directory after each
    /// successful run. `%x` expands to `.exe` on Windows.
    pub results: Vec<String>,
    /// Packages to preload, or scripts to run, before the experiments.
    /// A `*.mos` entry is run from its own directory; a `*.mo` file or a
    /// package directory is loaded with `openModel`.
    pub packages: Vec<PathBuf>,
    /// Options passed to every command invocation.
    pub options: ParamDict,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_FILE)
    }
}

impl ScriptSettings {
    pub fn new(fname: impl Into<PathBuf>) -> Self {
        Self {
            fname: fname.into(),
            command: DEFAULT_COMMAND.to_string(),
            working_dir: None,
            results: DEFAULT_RESULT_FILES.iter().map(|s| s.to_string()).collect(),
            packages: Vec::new(),
            options: ParamDict::new(),
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn packages(mut self, packages: Vec<PathBuf>) -> Self {
        self.packages = packages;
        self
    }

    pub fn results(mut self, results: Vec<String>) -> Self {
        self.results = results;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Result<Self> {
        self.options.set(key, value)?;
        Ok(self)
    }
}

/// Writes a simulation script and its run log as a scoped resource.
///
/// The writer moves through three states: open (header written, zero
/// runs), active (one or more runs written) and closed. Closing happens on
/// [`ScriptWriter::finish`] or on drop, whichever comes first, and releases
/// both file handles.
///
/// No validation is performed on parameter or option names; invalid names
/// pass through verbatim and fail only when the engine executes the
/// script.
pub struct ScriptWriter {
    script: Option<BufWriter<File>>,
    run_log: Option<BufWriter<File>>,
    command: String,
    options: ParamDict,
    results: Vec<String>,
    results_dir: PathBuf,
    n_runs: u32,
}

impl ScriptWriter {
    /// Opens the script and run log files and writes the headers.
    ///
    /// Any I/O failure propagates immediately; there is no retry and
    /// nothing to clean up beyond the handles themselves.
    pub fn open(settings: ScriptSettings) -> Result<ScriptWriter> {
        let fname = util::expand_path(&settings.fname)?;
        let working_dir = match &settings.working_dir {
            Some(dir) => util::expand_path(dir)?,
            None => std::env::current_dir()?,
        };
        let results_dir = fname
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let exe = if cfg!(windows) { ".exe" } else { "" };
        let results: Vec<String> = settings
            .results
            .iter()
            .map(|r| r.replace("%x", exe))
            .collect();

        info!("starting to write the Dymola script: {}", fname.display());
        let mut script = BufWriter::new(File::create(&fname)?);

        writeln!(
            script,
            "// Dymola script written by mosim {}",
            Local::now().format("%Y-%m-%d")
        )?;
        writeln!(script, "import Modelica.Utilities.Files.copy;")?;
        writeln!(script, "import Modelica.Utilities.Files.createDirectory;")?;
        writeln!(
            script,
            "Advanced.TranslationInCommandLog = true \"Also include translation log in command log\";"
        )?;
        writeln!(script, "cd(\"{}\");", working_dir.display())?;
        for package in &settings.packages {
            if package.extension().map_or(false, |e| e == "mos") {
                let dir = package.parent().unwrap_or_else(|| Path::new("."));
                writeln!(script, "cd(\"{}\");", dir.display())?;
                let name = package
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                writeln!(script, "RunScript(\"{}\");", name)?;
            } else {
                if package.extension().map_or(false, |e| e == "mo") {
                    writeln!(script, "openModel(\"{}\");", package.display())?;
                } else {
                    writeln!(script, "openModel(\"{}\");", package.join("package.mo").display())?;
                }
                writeln!(script, "cd(\"{}\");", working_dir.display())?;
            }
        }
        writeln!(
            script,
            "destination = \"{}{}\";",
            results_dir.display(),
            MAIN_SEPARATOR
        )?;
        writeln!(script)?;

        let mut run_log = BufWriter::new(File::create(results_dir.join(RUN_LOG_FILE))?);
        writeln!(run_log, "Run #\tCommand\tOptions\tModel & parameters")?;

        Ok(ScriptWriter {
            script: Some(script),
            run_log: Some(run_log),
            command: settings.command,
            options: settings.options,
            results,
            results_dir,
            n_runs: 0,
        })
    }

    /// Number of runs written so far.
    pub fn n_runs(&self) -> u32 {
        self.n_runs
    }

    /// Directory the numbered result folders will be created in.
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn is_closed(&self) -> bool {
        self.script.is_none()
    }

    /// Currently stored command options.
    pub fn options(&self) -> &ParamDict {
        &self.options
    }

    /// Sets a command option for subsequent runs.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Result<()> {
        self.options.set(key, value)
    }

    /// Removes a command option.
    pub fn remove_option(&mut self, key: &str) {
        self.options.remove(key);
    }

    /// Overlays all entries of the given dictionary onto the stored
    /// options.
    pub fn merge_options(&mut self, options: &ParamDict) -> Result<()> {
        self.options.extend_from(options)
    }

    /// Writes the commands to run and save the results of a single
    /// experiment, and appends the corresponding run log record.
    ///
    /// With `model` set to `None` the command is issued without a
    /// `problem` argument (the engine reuses the last translated model)
    /// and `params` is ignored.
    pub fn run(&mut self, model: Option<&str>, params: &ParamDict) -> Result<()> {
        if self.script.is_none() || self.run_log.is_none() {
            return Err(Error::WriterClosed);
        }

        // assemble the full invocation before taking a run number, so a
        // rejected call does not consume one
        let problem = model.map(|m| format!("{}{}", m, params));
        let mut call_args = ParamDict::new();
        if let Some(problem) = &problem {
            call_args.set("problem", format!("\"{}\"", problem))?;
        }
        call_args.extend_from(&self.options)?;
        let call = format!("{}{}", self.command, call_args);

        let script = self.script.as_mut().ok_or(Error::WriterClosed)?;
        let run_log = self.run_log.as_mut().ok_or(Error::WriterClosed)?;
        self.n_runs += 1;
        let n_runs = self.n_runs;

        // the run invocation itself
        writeln!(script, "// Run {}", n_runs)?;
        writeln!(script, "ok = {};", call)?;

        // save the results into the numbered directory and clear the log
        writeln!(script, "if ok then")?;
        writeln!(script, "    savelog();")?;
        writeln!(
            script,
            "    dest = destination + \"{}{}\";",
            n_runs, MAIN_SEPARATOR
        )?;
        writeln!(script, "    createDirectory(dest);")?;
        for result in &self.results {
            writeln!(script, "    copy(\"{}\", dest + \"{}\", true);", result, result)?;
        }
        writeln!(script, "end if;")?;
        writeln!(script, "clearlog();")?;
        writeln!(script)?;

        writeln!(
            run_log,
            "{}\t{}\t{}\t{}",
            n_runs,
            self.command,
            self.options.inner(),
            problem.as_deref().unwrap_or("")
        )?;

        info!("run {}:  {}", n_runs, call);
        Ok(())
    }

    /// Writes the terminating command and closes both files, script first.
    /// A no-op when already closed.
    pub fn finish(&mut self) -> Result<()> {
        let mut script = match self.script.take() {
            Some(s) => s,
            None => return Ok(()),
        };
        // without this the engine hangs until closed manually
        let script_result = script
            .write_all(b"exit();\n")
            .and_then(|_| script.flush())
            .map_err(Error::from);
        drop(script);
        if let Some(mut run_log) = self.run_log.take() {
            run_log.flush()?;
        }
        script_result?;
        info!("finished writing the Dymola script");
        Ok(())
    }
}

impl Drop for ScriptWriter {
    /// Guaranteed-release path: finalize the script even when the owning
    /// scope unwinds.
    fn drop(&mut self) {
        if !self.is_closed() {
            if let Err(e) = self.finish() {
                error!("failed finalizing script on drop: {}", e);
            }
        }
    }
}

/// Drives a [`ScriptWriter`] over a whole sequence of experiments.
///
/// Each experiment's options are overlaid onto the stored options before
/// its run is written. Returns the model names in run order together with
/// the directory the numbered result folders will be created in, which is
/// what downstream result loading needs.
pub fn write_script<I>(experiments: I, settings: ScriptSettings) -> Result<(Vec<String>, PathBuf)>
where
    I: IntoIterator<Item = Experiment>,
{
    let mut writer = ScriptWriter::open(settings)?;
    let results_dir = writer.results_dir().to_path_buf();
    let mut models = Vec::new();
    for experiment in experiments {
        writer.merge_options(&experiment.options)?;
        writer.run(Some(&experiment.model), &experiment.params)?;
        models.push(experiment.model);
    }
    writer.finish()?;
    Ok((models, results_dir))
}
