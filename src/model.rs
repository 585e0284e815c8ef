//! Model Store
//!
//! Tables of targets, per-target dependency/command lists, and defines.
//! The target table uses `indexmap::IndexSet` so lookup-by-name and stable
//! insertion-order indexing are both O(1)-ish without hand-rolling either.

use indexmap::IndexSet;

use crate::error::{Result, XmkErrorKind};

#[derive(Debug, Default)]
pub struct Model {
    /// Ordered `(name, value)` pairs. Insertion order is preserved; lookup
    /// scans from the most recently inserted entry backwards so a later
    /// `define X as ...` shadows an earlier one with the same name.
    defines: Vec<(String, String)>,

    targets: IndexSet<String>,
    dependencies: Vec<Vec<String>>,
    commands: Vec<Vec<String>>,

    build_target: Option<String>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // -- defines ----------------------------------------------------------

    pub fn add_define(&mut self, name: String, value: String) {
        self.defines.push((name, value));
    }

    pub fn lookup_define(&self, name: &str) -> Option<&str> {
        self.defines.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    // -- build target -------------------------------------------------------

    #[track_caller]
    pub fn set_build_target(&mut self, name: String) -> Result<()> {
        if let Some(existing) = &self.build_target {
            return Err(crate::fatal!(XmkErrorKind::DuplicateBuild { existing: existing.clone() }));
        }
        self.build_target = Some(name);
        Ok(())
    }

    pub fn build_target(&self) -> Option<&str> {
        self.build_target.as_deref()
    }

    // -- targets ------------------------------------------------------------

    /// Register `name` as a target, growing the parallel dependency/command
    /// tables to match. Fatal if `name` was already registered.
    #[track_caller]
    pub fn register_target(&mut self, name: String) -> Result<usize> {
        if self.targets.contains(&name) {
            return Err(crate::fatal!(XmkErrorKind::DuplicateTarget { name }));
        }
        let (index, _) = self.targets.insert_full(name);
        debug_assert_eq!(index, self.dependencies.len());
        debug_assert_eq!(index, self.commands.len());
        self.dependencies.push(Vec::new());
        self.commands.push(Vec::new());
        Ok(index)
    }

    pub fn target_index(&self, name: &str) -> Option<usize> {
        self.targets.get_index_of(name)
    }

    pub fn target_name(&self, index: usize) -> Option<&str> {
        self.targets.get_index(index).map(|s| s.as_str())
    }

    pub fn is_target(&self, name: &str) -> bool {
        self.targets.contains(name)
    }

    pub fn add_dependency(&mut self, index: usize, dep: String) {
        self.dependencies[index].push(dep);
    }

    pub fn add_command(&mut self, index: usize, cmd: String) {
        self.commands[index].push(cmd);
    }

    pub fn dependencies(&self, index: usize) -> &[String] {
        &self.dependencies[index]
    }

    pub fn commands(&self, index: usize) -> &[String] {
        &self.commands[index]
    }

    #[track_caller]
    pub fn dependency_at(&self, index: usize, n: usize) -> Result<&str> {
        let deps = &self.dependencies[index];
        deps.get(n).map(|s| s.as_str()).ok_or_else(|| {
            crate::fatal!(XmkErrorKind::IndexOutOfRange {
                target: self.target_name(index).unwrap_or_default().to_string(),
                index: n,
                count: deps.len(),
            })
        })
    }

    /// True once every target's dependency/command slots are allocated.
    /// The tables never actually fall out of sync since `register_target`
    /// grows them atomically; this just checks the invariant holds.
    pub fn tables_in_sync(&self) -> bool {
        self.targets.len() == self.dependencies.len() && self.targets.len() == self.commands.len()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
