//! # Worker runtime record.
//!
//! One [`WorkerRuntime`] exists per successfully launched worker. It is created
//! by the launch phase, mutated in place by the monitor on restart, and lives
//! until the supervisor returns.

use std::path::{Path, PathBuf};

use crate::process::{Launched, ProcessId};
use crate::workers::WorkerDefinition;

/// Mutable state of a launched worker.
#[derive(Clone, Debug)]
pub struct WorkerRuntime {
    def: WorkerDefinition,
    /// Executable path validated at launch time.
    path: PathBuf,
    pid: ProcessId,
    one_shot: bool,
    /// Consecutive restart launches that failed.
    restart_failures: u32,
}

impl WorkerRuntime {
    pub(crate) fn new(def: WorkerDefinition, path: PathBuf, launched: Launched) -> Self {
        Self {
            def,
            path,
            pid: launched.pid(),
            one_shot: launched.is_one_shot(),
            restart_failures: 0,
        }
    }

    pub fn definition(&self) -> &WorkerDefinition {
        &self.def
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier of the most recently started process for this worker.
    #[inline]
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// True for interpreter-dispatched workers whose exit was observed at launch.
    #[inline]
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    #[inline]
    pub fn restart_failures(&self) -> u32 {
        self.restart_failures
    }

    #[inline]
    pub fn label(&self) -> &str {
        self.def.label()
    }

    /// Records a successful restart: the old identifier is replaced.
    pub(crate) fn restarted(&mut self, launched: Launched) {
        self.pid = launched.pid();
        self.one_shot = launched.is_one_shot();
        self.restart_failures = 0;
    }

    /// Records a failed restart launch and returns the new consecutive count.
    pub(crate) fn restart_failed(&mut self) -> u32 {
        self.restart_failures = self.restart_failures.saturating_add(1);
        self.restart_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> WorkerRuntime {
        WorkerRuntime::new(
            WorkerDefinition::new("/bin/app").with_description("app"),
            PathBuf::from("/bin/app"),
            Launched::Running(ProcessId::new(10)),
        )
    }

    #[test]
    fn restart_overwrites_pid_and_resets_failures() {
        let mut rt = runtime();
        assert_eq!(rt.restart_failed(), 1);
        assert_eq!(rt.restart_failed(), 2);

        rt.restarted(Launched::Running(ProcessId::new(11)));
        assert_eq!(rt.pid(), ProcessId::new(11));
        assert_eq!(rt.restart_failures(), 0);
        assert!(!rt.is_one_shot());
    }

    #[test]
    fn completed_launch_marks_one_shot() {
        let rt = WorkerRuntime::new(
            WorkerDefinition::new("/srv/setup.sh"),
            PathBuf::from("/srv/setup.sh"),
            Launched::Completed {
                pid: ProcessId::new(5),
                code: Some(0),
            },
        );
        assert!(rt.is_one_shot());
        assert_eq!(rt.pid(), ProcessId::new(5));
    }
}
