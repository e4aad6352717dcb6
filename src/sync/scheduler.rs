//! Execution substrates the store submits work to.

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;

/// A unit of work. Once submitted it is expected to run to completion.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Accepts units of work and runs them under its own ordering rules.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: Task);

    /// Blocks until every task scheduled before the call has run.
    ///
    /// Schedulers whose tasks are pumped by their owner cannot wait for them
    /// and return immediately.
    fn flush(&self) {}
}

/// Runs every task synchronously on the caller's thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, task: Task) {
        task()
    }
}

/// Queues tasks until its owner pumps them, like a UI-thread message loop.
#[derive(Default)]
pub struct QueueScheduler {
    queue: Mutex<VecDeque<Task>>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs queued tasks in FIFO order, including tasks enqueued while
    /// draining. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // the queue lock must not be held while a task runs
            let next = self.queue.lock().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, task: Task) {
        self.queue.lock().push_back(task);
    }
}

/// Runs tasks in order on a single dedicated worker thread.
///
/// Dropping the scheduler lets the worker finish the queued tasks, then joins
/// it.
pub struct ThreadScheduler {
    sender: Mutex<Option<Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl ThreadScheduler {
    pub fn new(name: impl Into<String>) -> io::Result<Self> {
        let (sender, receiver) = channel::<Task>();
        let worker = thread::Builder::new().name(name.into()).spawn(move || {
            while let Ok(task) = receiver.recv() {
                task();
            }
        })?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
        })
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, task: Task) {
        let sent = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(task).is_ok(),
            None => false,
        };
        if !sent {
            tracing::warn!("scheduler worker is gone, task dropped");
        }
    }

    fn flush(&self) {
        // the worker would wait on itself
        if thread::current().id() == self.worker_id {
            return;
        }
        let (done, finished) = channel::<()>();
        self.schedule(Box::new(move || {
            let _ = done.send(());
        }));
        // a dropped marker also ends the wait
        let _ = finished.recv();
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            // a task that drops the last handle runs on the worker itself
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}
