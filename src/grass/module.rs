//! Invocation of individual GRASS modules.

use super::GrassError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// A single GRASS module invocation: module name, arguments and any extra
/// environment the module needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCall {
    module: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ModuleCall {
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Adds a `key=value` option.
    pub fn option(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.args.push(format!("{}={}", key, value.as_ref()));
        self
    }

    /// Adds single-letter flags, e.g. `flags("ln")` for `-ln`.
    pub fn flags(mut self, flags: &str) -> Self {
        self.args.push(format!("-{}", flags));
        self
    }

    pub fn overwrite(mut self) -> Self {
        self.args.push("--overwrite".to_string());
        self
    }

    /// Adds a positional argument verbatim.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets an environment variable for this invocation only.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn extra_env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Runs the module at `program` with `session_env` applied and returns its
    /// standard output.
    ///
    /// A non-zero exit status is an error carrying the exit code and whatever
    /// the module printed.
    pub fn run(&self, program: &Path, session_env: &[(String, OsString)]) -> Result<String, GrassError> {
        tracing::debug!("{} {}", self.module, self.args.join(" "));

        let output = Command::new(program)
            .args(&self.args)
            .envs(session_env.iter().map(|(k, v)| (k, v)))
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|source| GrassError::Spawn {
                module: self.module.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(GrassError::Failed {
                module: self.module.clone(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
                stdout: stdout.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_arguments_in_order() {
        let call = ModuleCall::new("r.stats")
            .flags("ln")
            .option("input", "stats_map")
            .overwrite()
            .env("GRASS_OVERWRITE", "1");

        assert_eq!(call.module(), "r.stats");
        assert_eq!(call.args(), ["-ln", "input=stats_map", "--overwrite"]);
        assert_eq!(
            call.extra_env(),
            [("GRASS_OVERWRITE".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let call = ModuleCall::new("r.nonexistent");
        let err = call
            .run(Path::new("/definitely/not/here/r.nonexistent"), &[])
            .unwrap_err();

        assert!(matches!(err, GrassError::Spawn { ref module, .. } if module == "r.nonexistent"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_code_and_stderr() {
        let call = ModuleCall::new("sh")
            .arg("-c")
            .arg("echo 'ERROR: raster not found' >&2; exit 3");
        let err = call.run(Path::new("sh"), &[]).unwrap_err();

        match err {
            GrassError::Failed {
                module,
                code,
                stderr,
                ..
            } => {
                assert_eq!(module, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "ERROR: raster not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_passes_environment() {
        let session_env = vec![("ZONAL_TEST_VALUE".to_string(), OsString::from("42"))];
        let call = ModuleCall::new("sh")
            .arg("-c")
            .arg("echo \"$ZONAL_TEST_VALUE $EXTRA\"")
            .env("EXTRA", "x");

        let stdout = call.run(Path::new("sh"), &session_env).unwrap();
        assert_eq!(stdout, "42 x\n");
    }
}
