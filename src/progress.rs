// src/progress.rs
/// Progress reporting for a pipeline run.
/// Frontends implement this to surface status to users; every method has a
/// no-op default.
pub trait Progress {
    /// Called at the start with the number of stages.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Called when one stage completes.
    fn stage_done(&mut self, _stage: Stage) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// Pipeline stages in run order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Login,
    Render,
    Extract,
    Diff,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 5] = [Stage::Login, Stage::Render, Stage::Extract, Stage::Diff, Stage::Report];
}

/// Prints one line per stage to stderr.
pub struct CliProgress {
    total: usize,
    done: usize,
}

impl CliProgress {
    pub fn new() -> Self {
        Self { total: 0, done: 0 }
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for CliProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn stage_done(&mut self, stage: Stage) {
        self.done += 1;
        eprintln!("[{}/{}] {stage:?}", self.done, self.total);
    }
}
