//! Process Spawn Primitive
//!
//! Runs a command line through the host shell and reports its exit status.
//! Deliberately thin: the resolver places no further requirements on how
//! this is realized.

use std::process::Command;

/// Run `cmdline` via the host shell, inheriting stdio, and return its exit
/// code. A spawn failure (shell not found, etc.) is reported as exit code
/// 127, matching the shell convention for "command not found".
pub trait ShellRunner {
    fn run(&self, cmdline: &str) -> i32;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HostShell;

impl ShellRunner for HostShell {
    fn run(&self, cmdline: &str) -> i32 {
        match Command::new("sh").arg("-c").arg(cmdline).status() {
            Ok(status) => status.code().unwrap_or(1),
            Err(_) => 127,
        }
    }
}
