//! Deferred actions
//!
//! Long-running effects (wait for a sound, then destroy; wait, then load a
//! scene) are queued here and resumed on a later frame. Each component owns
//! its own queue. Tasks carry the entity they act on and can be cancelled
//! by handle; handlers still re-check existence when a task resumes.

use super::clock::FrameClock;
use super::world::EntityId;

/// Suspension point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    /// Scaled seconds (frozen while the game is paused)
    Seconds(f32),
    /// Unscaled seconds
    Realtime(f32),
    /// Frame count
    Frames(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Due {
    GameTime(f64),
    RealTime(f64),
    Frame(u64),
}

impl Due {
    fn from_wait(wait: Wait, clock: &FrameClock) -> Self {
        match wait {
            Wait::Seconds(s) => Due::GameTime(clock.game_time + s.max(0.0) as f64),
            Wait::Realtime(s) => Due::RealTime(clock.real_time + s.max(0.0) as f64),
            Wait::Frames(n) => Due::Frame(clock.frame + n as u64),
        }
    }

    fn is_due(&self, clock: &FrameClock) -> bool {
        match *self {
            Due::GameTime(t) => clock.game_time >= t,
            Due::RealTime(t) => clock.real_time >= t,
            Due::Frame(f) => clock.frame >= f,
        }
    }
}

/// Handle for cancelling a queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    id: TaskId,
    due: Due,
    owner: Option<EntityId>,
    task: T,
}

/// A task that became due
#[derive(Debug, Clone, PartialEq)]
pub struct Resumed<T> {
    pub owner: Option<EntityId>,
    pub task: T,
}

#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to resume after `wait`
    pub fn schedule(&mut self, clock: &FrameClock, wait: Wait, owner: Option<EntityId>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            id,
            due: Due::from_wait(wait, clock),
            owner,
            task,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    /// Remove and return due tasks in scheduling order
    pub fn drain_due(&mut self, clock: &FrameClock) -> Vec<Resumed<T>> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due.is_due(clock) {
                let s = self.pending.remove(i);
                due.push(Resumed {
                    owner: s.owner,
                    task: s.task,
                });
            } else {
                i += 1;
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
