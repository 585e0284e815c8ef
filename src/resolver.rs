//! Resolver + Executor
//!
//! Post-order traversal of the dependency graph: rebuild every dependency
//! before deciding whether the target itself is stale, run the target's
//! commands in order when it is, and check the file actually showed up
//! afterwards. A single synchronous walk, no job pool: targets build one
//! at a time in dependency order.

use crate::error::{Result, XmkErrorKind};
use crate::fileprobe::FileProbe;
use crate::model::Model;
use crate::process::ShellRunner;

pub struct Resolver<'a, P, S> {
    model: &'a Model,
    probe: &'a P,
    shell: &'a S,
    quiet: bool,
}

impl<'a, P: FileProbe, S: ShellRunner> Resolver<'a, P, S> {
    pub fn new(model: &'a Model, probe: &'a P, shell: &'a S, quiet: bool) -> Self {
        Self { model, probe, shell, quiet }
    }

    /// Build `name`, recursing into its dependencies first. Returns whether
    /// `name` needed (and got) a rebuild, which a caller one level up can
    /// use purely for reporting. The freshness decision at each level is
    /// made from mtimes, not from the child's returned flag, since
    /// rebuilding a child already gives it a fresh mtime that the parent's
    /// own comparison will see.
    #[track_caller]
    pub fn execute(&self, name: &str) -> Result<bool> {
        if !self.model.is_target(name) {
            if self.probe.exists(name) {
                return Ok(false);
            }
            return Err(crate::fatal!(XmkErrorKind::UnknownTarget { name: name.to_string() }));
        }

        let index = self.model.target_index(name).expect("is_target just confirmed this");
        let deps = self.model.dependencies(index).to_vec();
        let cmds = self.model.commands(index).to_vec();

        if deps.is_empty() && cmds.is_empty() {
            return Err(crate::fatal!(XmkErrorKind::EmptyTarget { name: name.to_string() }));
        }

        let target_mtime = self.probe.mtime(name);
        let mut update_pending = target_mtime.is_none();

        for dep in &deps {
            self.execute(dep)?;
            let dep_mtime = self.probe.mtime(dep);
            match (dep_mtime, target_mtime) {
                (Some(d), Some(t)) if d <= t => {}
                _ => update_pending = true,
            }
        }

        if update_pending {
            for cmd in &cmds {
                if !self.quiet {
                    println!("{}", cmd);
                }
                let code = self.shell.run(cmd);
                if code != 0 {
                    return Err(crate::fatal!(XmkErrorKind::CommandFailed {
                        command: cmd.clone(),
                        code,
                    }));
                }
            }
            if !self.probe.exists(name) {
                return Err(crate::fatal!(XmkErrorKind::PostBuildMissing { target: name.to_string() }));
            }
        }

        Ok(update_pending)
    }
}
