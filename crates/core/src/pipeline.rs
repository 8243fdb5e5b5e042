//! The rebuild pipeline.
//!
//! Steps run strictly in order and the first failure stops the run. Nothing
//! is rolled back: a failed run leaves whatever the failing step produced.

use crate::audit::{AuditEntry, AuditLog};
use crate::config::RebuildConfig;
use crate::console::Console;
use crate::executor::{ToolCommand, ToolRunner};
use crate::locator::{Tool, ToolLocator};
use crate::manifest;
use crate::messages;
use apkrebuild_common::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Unpack,
    PatchManifest,
    WriteSecurityConfig,
    Build,
    Align,
    Cleanup,
    Rename,
    Keystore,
    Sign,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::Unpack,
        Step::PatchManifest,
        Step::WriteSecurityConfig,
        Step::Build,
        Step::Align,
        Step::Cleanup,
        Step::Rename,
        Step::Keystore,
        Step::Sign,
    ];

    /// 1-based position in the pipeline.
    pub fn index(&self) -> usize {
        Step::ALL
            .iter()
            .position(|step| step == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Unpack => "unpack",
            Step::PatchManifest => "patch manifest",
            Step::WriteSecurityConfig => "write security config",
            Step::Build => "build",
            Step::Align => "align",
            Step::Cleanup => "cleanup",
            Step::Rename => "rename",
            Step::Keystore => "keystore",
            Step::Sign => "sign",
        }
    }
}

/// Every path a run touches, derived from the input, output and config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub unpacked: PathBuf,
    pub manifest: PathBuf,
    pub security_config: PathBuf,
    pub aligned: PathBuf,
    pub keystore: PathBuf,
}

impl RebuildPaths {
    pub fn new(input: &Path, output: &Path, config: &RebuildConfig) -> Self {
        let unpacked = config.unpacked_dir(input);
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            manifest: unpacked.join("AndroidManifest.xml"),
            security_config: unpacked
                .join("res")
                .join("xml")
                .join("network_security_config.xml"),
            aligned: config.aligned_path(output),
            keystore: config.keystore.clone(),
            unpacked,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub paths: RebuildPaths,
    pub keystore_created: bool,
    pub commands: Vec<AuditEntry>,
}

/// Unpacks, patches, rebuilds, aligns and signs a package.
pub struct Rebuilder<R: ToolRunner> {
    config: RebuildConfig,
    locator: ToolLocator,
    runner: R,
}

impl<R: ToolRunner> Rebuilder<R> {
    pub fn new(config: RebuildConfig, locator: ToolLocator, runner: R) -> Self {
        Self {
            config,
            locator,
            runner,
        }
    }

    /// Run the whole pipeline for `input`, producing a signed `output`.
    pub fn rebuild<W: Write>(
        &self,
        input: &Path,
        output: &Path,
        console: &mut Console<W>,
    ) -> Result<RebuildReport> {
        let paths = RebuildPaths::new(input, output, &self.config);
        let mut audit = AuditLog::new();
        info!("Rebuilding {:?} into {:?}", paths.input, paths.output);

        console.success(messages::unpacking(&paths.input, &paths.unpacked));
        step(Step::Unpack, || {
            let apktool = self.locator.require(Tool::Apktool)?;
            let command = ToolCommand::new(apktool)
                .arg("d")
                .arg(&paths.input)
                .arg("-f")
                .arg("-o")
                .arg(&paths.unpacked);
            self.invoke(Step::Unpack, &command, &mut audit)
        })?;

        console.success(messages::change_manifest(&paths.manifest));
        step(Step::PatchManifest, || manifest::patch_manifest(&paths.manifest))?;

        console.success(messages::create_resources(&paths.security_config));
        step(Step::WriteSecurityConfig, || {
            write_file(&paths.security_config, &self.config.security_config)
        })?;

        console.success(messages::building(&paths.output, &paths.unpacked));
        step(Step::Build, || {
            let apktool = self.locator.require(Tool::Apktool)?;
            let command = ToolCommand::new(apktool)
                .arg("b")
                .arg(&paths.unpacked)
                .arg("--use-aapt2")
                .arg("-o")
                .arg(&paths.output);
            self.invoke(Step::Build, &command, &mut audit)
        })?;

        console.success(messages::zipalign(&paths.output, &paths.aligned));
        step(Step::Align, || {
            let zipalign = self.locator.require(Tool::Zipalign)?;
            let command = ToolCommand::new(zipalign)
                .args(["-f", "-v"])
                .arg(self.config.alignment.to_string())
                .arg(&paths.output)
                .arg(&paths.aligned);
            self.invoke(Step::Align, &command, &mut audit)
        })?;

        step(Step::Cleanup, || {
            console.success(messages::remove_file(&paths.output));
            fs::remove_file(&paths.output)?;
            console.success(messages::remove_folder(&paths.unpacked));
            remove_dir_if_present(&paths.unpacked)
        })?;

        console.success(messages::rename_file(&paths.aligned, &paths.output));
        step(Step::Rename, || Ok(fs::rename(&paths.aligned, &paths.output)?))?;

        console.success(messages::keystore(&paths.keystore));
        let keystore_created = step(Step::Keystore, || {
            self.ensure_keystore(&paths.keystore, &mut audit)
        })?;

        console.success(messages::sign(&paths.output));
        step(Step::Sign, || {
            let apksigner = self.locator.require(Tool::Apksigner)?;
            let command = ToolCommand::new(apksigner)
                .arg("sign")
                .arg("--ks")
                .arg(&paths.keystore)
                .arg(&paths.output);
            self.invoke(Step::Sign, &command, &mut audit)
        })?;

        console.success(messages::REBUILD_COMPLETED);
        info!("Rebuild of {:?} complete", paths.output);

        Ok(RebuildReport {
            paths,
            keystore_created,
            commands: audit.into_entries(),
        })
    }

    /// Generate the signing keystore unless one is already there.
    ///
    /// Returns whether a new keystore was generated.
    fn ensure_keystore(&self, keystore: &Path, audit: &mut AuditLog) -> Result<bool> {
        if keystore.is_file() {
            debug!("Reusing keystore {:?}", keystore);
            return Ok(false);
        }

        let keytool = self.locator.require(Tool::Keytool)?;
        let command = ToolCommand::new(keytool)
            .args(["-genkey", "-v", "-keystore"])
            .arg(keystore)
            .args(["-keyalg", "RSA", "-keysize", "2048", "-validity", "10000"]);
        self.invoke(Step::Keystore, &command, audit)?;
        Ok(true)
    }

    /// Run `command`, record it, and fail on a non-zero exit.
    fn invoke(&self, step: Step, command: &ToolCommand, audit: &mut AuditLog) -> Result<()> {
        let started_at = Utc::now();
        let result = self.runner.run(command);
        let completed_at = Utc::now();

        let exit_code = match result {
            Ok(code) => code,
            Err(e) => {
                audit.add(AuditEntry::new(
                    step.name(),
                    command.to_string(),
                    started_at,
                    completed_at,
                    None,
                ));
                return Err(e);
            }
        };

        let entry = AuditEntry::new(
            step.name(),
            command.to_string(),
            started_at,
            completed_at,
            exit_code,
        );
        let success = entry.success;
        audit.add(entry);

        if !success {
            return Err(Error::CommandFailed {
                cmd: command.to_string(),
                code: exit_code,
            });
        }
        Ok(())
    }
}

/// Run one step, tagging any failure with its position.
fn step<T>(step: Step, body: impl FnOnce() -> Result<T>) -> Result<T> {
    debug!("Step {}: {}", step.index(), step.name());
    body().map_err(|e| e.at_step(step.index(), step.name()))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => Ok(other?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{SearchStrategy, ToolLayout};
    use std::cell::RefCell;
    use tempfile::tempdir;

    struct NoTools;

    impl ToolLayout for NoTools {
        fn strategy(&self, tool: Tool) -> SearchStrategy {
            SearchStrategy::Walk {
                roots: Vec::new(),
                file_name: tool.name().to_string(),
            }
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        commands: RefCell<Vec<ToolCommand>>,
    }

    impl ToolRunner for RecordingRunner {
        fn run(&self, command: &ToolCommand) -> Result<Option<i32>> {
            self.commands.borrow_mut().push(command.clone());
            Ok(Some(0))
        }
    }

    #[test]
    fn test_step_indices() {
        let indices: Vec<usize> = Step::ALL.iter().map(Step::index).collect();
        assert_eq!(indices, (1..=9).collect::<Vec<_>>());
        assert_eq!(Step::Align.index(), 5);
        assert_eq!(Step::Sign.name(), "sign");
    }

    #[test]
    fn test_derived_paths() {
        let paths = RebuildPaths::new(
            Path::new("in.apk"),
            Path::new("out.apk"),
            &RebuildConfig::default(),
        );

        assert_eq!(paths.unpacked, PathBuf::from("in.apk_unpacked"));
        assert_eq!(
            paths.manifest,
            PathBuf::from("in.apk_unpacked").join("AndroidManifest.xml")
        );
        assert_eq!(
            paths.security_config,
            PathBuf::from("in.apk_unpacked/res/xml/network_security_config.xml")
        );
        assert_eq!(paths.aligned, PathBuf::from("out.apk_aligned"));
        assert_eq!(paths.keystore, PathBuf::from("my.keystore"));
    }

    #[test]
    fn test_missing_decompiler_fails_first_step() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.apk");
        fs::write(&input, b"apk").unwrap();

        let runner = RecordingRunner::default();
        let rebuilder = Rebuilder::new(
            RebuildConfig::default(),
            ToolLocator::new(Box::new(NoTools)),
            &runner,
        );
        let mut console = Console::new(Vec::new(), false);

        let err = rebuilder
            .rebuild(&input, &dir.path().join("out.apk"), &mut console)
            .unwrap_err();

        assert_eq!(err.step_index(), Some(1));
        assert!(matches!(err.root(), Error::ToolNotFound(name) if name == "apktool"));
        assert!(runner.commands.borrow().is_empty());

        let shown = String::from_utf8(console.into_inner()).unwrap();
        assert!(shown.starts_with("Unpacking "));
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("res").join("xml").join("config.xml");

        write_file(&path, "<config/>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<config/>");
    }

    #[test]
    fn test_remove_dir_if_present() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("unpacked");
        fs::create_dir_all(target.join("res")).unwrap();

        remove_dir_if_present(&target).unwrap();
        assert!(!target.exists());
        remove_dir_if_present(&target).unwrap();
    }
}
