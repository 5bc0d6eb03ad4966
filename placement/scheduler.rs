//! Cooperative deferral used by the batched sidebar connector.
//!
//! The engine never blocks on a schedule: callbacks queue here and run when
//! the host pumps [`QueueScheduler::run_pending`], typically once per UI
//! tick. Cancelling a handle drops the callback without running it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tabshell_core::{ScheduleHandle, UpdateScheduler};

struct Scheduled {
    cancelled: Rc<Cell<bool>>,
    job: Box<dyn FnOnce()>,
}

#[derive(Default)]
pub struct QueueScheduler {
    queue: RefCell<Vec<Scheduled>>,
}

impl QueueScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Run everything scheduled so far, in order. Jobs scheduled while the
    /// batch runs wait for the next pump.
    pub fn run_pending(&self) {
        let batch = self.queue.take();
        for scheduled in batch {
            if !scheduled.cancelled.get() {
                (scheduled.job)();
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|scheduled| !scheduled.cancelled.get())
            .count()
    }
}

impl UpdateScheduler for QueueScheduler {
    fn schedule(&self, update: Box<dyn FnOnce()>) -> Box<dyn ScheduleHandle> {
        let cancelled = Rc::new(Cell::new(false));
        self.queue.borrow_mut().push(Scheduled {
            cancelled: cancelled.clone(),
            job: update,
        });
        Box::new(QueueHandle { cancelled })
    }
}

struct QueueHandle {
    cancelled: Rc<Cell<bool>>,
}

impl ScheduleHandle for QueueHandle {
    fn cancel(&self) {
        self.cancelled.set(true);
    }
}
