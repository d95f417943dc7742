use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use tracing::debug;

/// Simple threadpool, joining all threads on drop.
///
/// Heavily inspired by the one in the Rust book:
/// https://doc.rust-lang.org/book/ch20-02-multithreaded.html
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `size` threads.
    ///
    /// 'size' must be greater than 0.
    pub fn new(size: usize) -> ThreadPool {
        assert!(size > 0, "ThreadPool size must be greater than 0");

        let mut workers = Vec::with_capacity(size);
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        for id in 0..size {
            workers.push(Worker::new(id, Arc::clone(&receiver)));
        }
        debug!(size, "threadpool started");
        ThreadPool {
            workers,
            sender: Some(sender),
        }
    }

    /// Queue a task to run on the threadpool when a worker is available.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let job = Box::new(f);
        if let Some(sender) = self.sender.as_ref() {
            // A send error means every worker is gone, which only happens
            // during shutdown
            let _ = sender.send(job);
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(thread) = worker.handle.take() {
                let _ = thread.join();
            }
        }
    }
}

/// Type of jobs to be executed by the threadpool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker struct, holding a thread handle.
struct Worker {
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create a new worker that will execute jobs from the given receiver
    /// until this one is closed.
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Worker {
        let handle = thread::spawn(move || loop {
            let message = match receiver.lock() {
                Ok(guard) => guard.recv(),
                // A poisoned lock means another worker panicked; stop cleanly
                Err(_) => break,
            };
            match message {
                Ok(job) => job(),
                Err(_) => {
                    debug!(worker = id, "worker shutting down");
                    break;
                }
            }
        });
        Worker {
            handle: Some(handle),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_threadpool() {
        let pool = ThreadPool::new(10);
        let results = Arc::new(Mutex::new(Vec::<u64>::new()));

        for i in 0..10 {
            let vec_handle = Arc::clone(&results);
            pool.execute(move || {
                thread::sleep(std::time::Duration::from_millis(10 - i));
                vec_handle.lock().unwrap().push(i);
            });
        }

        while results.lock().unwrap().len() < 10 {
            thread::sleep(std::time::Duration::from_millis(1));
        }

        let results = results.lock().unwrap().clone();
        assert_eq!(results.len(), 10);
        assert_eq!(results, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0])
    }
}
