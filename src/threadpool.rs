//! Fixed-size worker pool with a bounded task queue.
//!
//! Worker count plus a separate max-queue-depth, an atomic
//! outstanding-task counter distinct from queue occupancy, and a
//! `wait_all` that blocks on that counter reaching zero rather than on
//! the queue being empty. Submitting blocks the caller when the queue
//! is at capacity, providing backpressure against a fast producer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<std::collections::VecDeque<Task>>,
    task_available: Condvar,
    space_available: Condvar,
    all_tasks_done: Condvar,
    done_mutex: Mutex<()>,
    stop: Mutex<bool>,
    max_queue: usize,
    tasks_remaining: AtomicUsize,
}

pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(threads: usize, max_queue: usize) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(std::collections::VecDeque::new()),
            task_available: Condvar::new(),
            space_available: Condvar::new(),
            all_tasks_done: Condvar::new(),
            done_mutex: Mutex::new(()),
            stop: Mutex::new(false),
            max_queue,
            tasks_remaining: AtomicUsize::new(0),
        });

        let mut workers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let shared = Arc::clone(&shared);
            workers.push(std::thread::spawn(move || Self::worker_loop(shared)));
        }

        Self { shared, workers }
    }

    fn worker_loop(shared: Arc<Shared>) {
        loop {
            let task = {
                let mut queue = shared.queue.lock().unwrap();
                loop {
                    if let Some(task) = queue.pop_front() {
                        shared.space_available.notify_one();
                        break Some(task);
                    }
                    if *shared.stop.lock().unwrap() {
                        break None;
                    }
                    queue = shared.task_available.wait(queue).unwrap();
                }
            };
            let Some(task) = task else { break };
            task();
            if shared.tasks_remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                let _guard = shared.done_mutex.lock().unwrap();
                shared.all_tasks_done.notify_all();
            }
        }
    }

    /// Submits `task`, blocking while the queue is at capacity.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.tasks_remaining.fetch_add(1, Ordering::AcqRel);
        let mut queue = self.shared.queue.lock().unwrap();
        while queue.len() >= self.shared.max_queue {
            queue = self.shared.space_available.wait(queue).unwrap();
        }
        queue.push_back(Box::new(task));
        self.shared.task_available.notify_one();
    }

    /// Blocks until every enqueued task has completed.
    pub fn wait_all(&self) {
        let guard = self.shared.done_mutex.lock().unwrap();
        let _guard = self
            .shared
            .all_tasks_done
            .wait_while(guard, |_| self.shared.tasks_remaining.load(Ordering::Acquire) != 0)
            .unwrap();
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        *self.shared.stop.lock().unwrap() = true;
        self.shared.task_available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn runs_all_submitted_tasks() {
        let pool = ThreadPool::new(4, 8);
        let counter = Arc::new(AtomicU32::new(0));
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.enqueue(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.wait_all();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn wait_all_can_be_called_multiple_times() {
        let pool = ThreadPool::new(2, 4);
        let counter = Arc::new(AtomicU32::new(0));
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.enqueue(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.wait_all();
        pool.wait_all();
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }
}
