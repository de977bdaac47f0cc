use crate::core::get_config_dir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub launcher: LauncherConfig,
    /// How the reconstruction module is invoked on every rank
    #[serde(default)]
    pub recon: ReconConfig,
    /// Environment handed to the launched job
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LauncherConfig {
    /// MPI launcher binary (default: mpirun)
    #[serde(default = "default_program")]
    pub program: String,
    /// Number of nodes taking part in the job (default: 1)
    #[serde(default = "default_nodes")]
    pub nodes: u32,
    /// Byte transfer layers passed as `--mca btl` (default: self,sm)
    #[serde(default = "default_transports")]
    pub transports: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ReconConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_module")]
    pub module: String,
    /// Arguments selecting the module's run mode, placed before the paths.
    /// The default `-m` asks for the memory usage report.
    #[serde(default = "default_mode_args")]
    pub mode_args: Vec<String>,
    /// The module's `-v` flag is always passed; set to false to drop it
    /// (default: true)
    #[serde(default = "default_true")]
    pub verbose: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    /// Search path variable the module is looked up through
    #[serde(default = "default_search_path_var")]
    pub search_path_var: String,
    /// Installation prepended to `search_path_var` for the job
    #[serde(default)]
    pub install_path: Option<PathBuf>,
    /// Extra fixed variables for the job
    #[serde(default)]
    pub vars: Vec<EnvVar>,
}

/// Kept as a name/value pair so the variable name survives key normalisation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Fail the run instead of assuming 0 when a probe fails
    #[serde(default)]
    pub strict: bool,
    /// Probe for GPUs at all (default: true)
    #[serde(default = "default_true")]
    pub gpus: bool,
}

fn default_program() -> String {
    "mpirun".to_string()
}

fn default_nodes() -> u32 {
    1
}

fn default_transports() -> Vec<String> {
    vec!["self".to_string(), "sm".to_string()]
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_module() -> String {
    "savu.tomo_recon".to_string()
}

fn default_mode_args() -> Vec<String> {
    vec!["-m".to_string()]
}

fn default_search_path_var() -> String {
    "PYTHONPATH".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            nodes: default_nodes(),
            transports: default_transports(),
        }
    }
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            module: default_module(),
            mode_args: default_mode_args(),
            verbose: true,
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            search_path_var: default_search_path_var(),
            install_path: None,
            vars: Vec::new(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            strict: false,
            gpus: true,
        }
    }
}

pub fn load_config(config_path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    let default_config_path = get_config_dir()
        .ok()
        .map(|d| d.join("tomo-launch.toml"));
    load_layered(
        default_config_path.as_ref(),
        config_path,
        environment_source(),
    )
}

/// `TOMO_LAUNCH_<SECTION>__<KEY>`, with comma separated lists.
fn environment_source() -> config::Environment {
    config::Environment::with_prefix("TOMO_LAUNCH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("launcher.transports")
        .with_list_parse_key("recon.mode_args")
}

/// Later sources win: default file, then the explicit file, then the
/// environment.
fn load_layered(
    default_config_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    environment: config::Environment,
) -> Result<Config, config::ConfigError> {
    let mut config_vec = vec![];

    // Default config file
    if let Some(default_config_path) = default_config_path {
        if default_config_path.exists() {
            config_vec.push(default_config_path.clone());
        }
    }

    // User-provided config file
    if let Some(config_path) = config_path {
        if config_path.exists() {
            config_vec.push(config_path.clone());
        } else {
            tracing::warn!("Config file {config_path:?} not found.");
        }
    }

    let settings = config::Config::builder();
    let settings = config_vec.iter().fold(settings, |s, path| {
        s.add_source(config::File::from(path.as_path()))
    });

    settings
        .add_source(environment)
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.launcher.program, "mpirun");
        assert_eq!(config.launcher.nodes, 1);
        assert_eq!(config.launcher.transports, vec!["self", "sm"]);
        assert_eq!(config.recon.module, "savu.tomo_recon");
        assert!(config.recon.verbose);
        assert_eq!(config.environment.search_path_var, "PYTHONPATH");
        assert!(!config.probe.strict);
        assert!(config.probe.gpus);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file
            .write_all(
                br#"
[launcher]
nodes = 2
transports = ["self", "vader"]

[environment]
install_path = "/dls_sw/apps/savu/current"

[[environment.vars]]
name = "OMP_NUM_THREADS"
value = "1"

[probe]
strict = true
"#,
            )
            .unwrap();

        let config = load_config(Some(&temp_file.path().to_path_buf())).unwrap();
        assert_eq!(config.launcher.nodes, 2);
        assert_eq!(config.launcher.program, "mpirun");
        assert_eq!(config.launcher.transports, vec!["self", "vader"]);
        assert_eq!(
            config.environment.install_path,
            Some(PathBuf::from("/dls_sw/apps/savu/current"))
        );
        assert_eq!(
            config.environment.vars,
            vec![EnvVar {
                name: "OMP_NUM_THREADS".to_string(),
                value: "1".to_string(),
            }]
        );
        assert!(config.probe.strict);
        assert!(config.probe.gpus);
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    fn empty_environment() -> config::Environment {
        environment_source().source(Some(config::Map::new()))
    }

    #[test]
    fn test_explicit_file_overrides_default_file() {
        let default_file = toml_file("[launcher]\nnodes = 5\nprogram = \"srun\"\n");
        let explicit_file = toml_file("[launcher]\nnodes = 2\n");

        let config = load_layered(
            Some(&default_file.path().to_path_buf()),
            Some(&explicit_file.path().to_path_buf()),
            empty_environment(),
        )
        .unwrap();

        assert_eq!(config.launcher.nodes, 2);
        assert_eq!(config.launcher.program, "srun");
    }

    #[test]
    fn test_default_file_applies_without_explicit_file() {
        let default_file = toml_file("[launcher]\nnodes = 5\n");

        let config = load_layered(
            Some(&default_file.path().to_path_buf()),
            None,
            empty_environment(),
        )
        .unwrap();

        assert_eq!(config.launcher.nodes, 5);
    }

    #[test]
    fn test_environment_overrides_files() {
        let explicit_file = toml_file("[launcher]\nnodes = 2\n");
        let env = config::Map::from([
            ("TOMO_LAUNCH_LAUNCHER__NODES".to_string(), "3".to_string()),
            (
                "TOMO_LAUNCH_LAUNCHER__TRANSPORTS".to_string(),
                "self,vader".to_string(),
            ),
            (
                "TOMO_LAUNCH_RECON__MODE_ARGS".to_string(),
                "-m,--stats".to_string(),
            ),
            ("OTHER_LAUNCHER__NODES".to_string(), "9".to_string()),
        ]);

        let config = load_layered(
            None,
            Some(&explicit_file.path().to_path_buf()),
            environment_source().source(Some(env)),
        )
        .unwrap();

        assert_eq!(config.launcher.nodes, 3);
        assert_eq!(config.launcher.transports, vec!["self", "vader"]);
        assert_eq!(config.recon.mode_args, vec!["-m", "--stats"]);
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let config = load_config(Some(&PathBuf::from("/tmp/does-not-exist.toml"))).unwrap();
        assert_eq!(config.recon.interpreter, "python");
        assert_eq!(config.recon.mode_args, vec!["-m"]);
    }

    #[test]
    fn test_load_config_rejects_malformed_file() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        temp_file.write_all(b"[launcher]\nnodes = \"many\"\n").unwrap();

        assert!(load_config(Some(&temp_file.path().to_path_buf())).is_err());
    }
}
