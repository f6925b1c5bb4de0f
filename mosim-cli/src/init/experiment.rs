use std::collections::HashMap;

use mosim::EXPERIMENT_MANIFEST_FILE;

pub fn collect_template_files(name: &str, template_str: &str) -> Option<HashMap<String, String>> {
    match template_str {
        "commented" => Some(template_commented(name)),
        "barebones" => Some(template_barebones(name)),
        _ => None,
    }
}

// commented template
fn template_commented(name: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(
        EXPERIMENT_MANIFEST_FILE.to_string(),
        format!(
            r##"[experiment]
# name should be snake_case
name = "{name}"
# models to simulate, full Modelica dot notation
models = [
    "Modelica.Electrical.Analog.Examples.ChuaCircuit",
]
# command issued per run; besides 'simulateModel' this can be
# 'linearizeModel' or 'translateModel'
command = "simulateModel"
# script file to generate, relative to this manifest
script = "run_sims.mos"
# working directory where the engine creates its output files
# (defaults to this directory)
#working_dir = "working_dir"
# Modelica packages to preload or scripts to run before the experiments;
# the Modelica Standard Library is loaded automatically
#packages = []
# files copied into the numbered result directory after each run
#results = ["dsin.txt", "dslog.txt", "dsres.mat", "dymolalg.txt", "dymosim%x"]

# candidate values per parameter; a list is expanded full-factorially,
# a scalar counts as a one-element list
[params]
"L.L" = [15, 21]

# command options, expanded the same way; a quoted Modelica string needs
# its quotes in the value, e.g. method = '"Dassl"'
[options]
stopTime = 2500
"##,
            name = name.replace(" ", "_"),
        ),
    );
    map
}

// barebones template
fn template_barebones(name: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(
        EXPERIMENT_MANIFEST_FILE.to_string(),
        format!(
            r##"[experiment]
name = "{name}"
models = []

[params]

[options]
"##,
            name = name.replace(" ", "_"),
        ),
    );
    map
}
