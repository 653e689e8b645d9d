/// Work the engine defers to the host's scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Clear the "programmatic change in progress" flag.
    EndProgrammaticChange,
    Recluster,
    InvalidateSize,
}

/// When a task runs: after the current task completes, or on the next animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tick,
    Frame,
}

/// Pending deferred work. A task is queued at most once per phase, so
/// repeated requests before the queue drains collapse into one run.
#[derive(Debug, Clone, Default)]
pub struct Deferred {
    tick: Vec<Task>,
    frame: Vec<Task>,
}

impl Deferred {
    fn queue_mut(&mut self, phase: Phase) -> &mut Vec<Task> {
        match phase {
            Phase::Tick => &mut self.tick,
            Phase::Frame => &mut self.frame,
        }
    }

    fn queue(&self, phase: Phase) -> &[Task] {
        match phase {
            Phase::Tick => &self.tick,
            Phase::Frame => &self.frame,
        }
    }

    /// Queue `task`; returns false when it was already pending.
    pub fn schedule(&mut self, phase: Phase, task: Task) -> bool {
        let queue = self.queue_mut(phase);
        if queue.contains(&task) {
            return false;
        }
        queue.push(task);
        true
    }

    /// Drain one phase in scheduling order.
    pub fn take(&mut self, phase: Phase) -> Vec<Task> {
        std::mem::take(self.queue_mut(phase))
    }

    pub fn has_pending(&self, phase: Phase) -> bool {
        !self.queue(phase).is_empty()
    }
}
