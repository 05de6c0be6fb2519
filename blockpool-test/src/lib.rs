//! A lockstep test-runner for flushing out data-races and race-conditions.

use std::{
    sync::{Arc, Barrier},
    thread,
};

/// Lockstep is a test-runner for writing tests specializing in flushing out data-races and race-conditions.
///
/// Lockstep coordinates N threads of execution so that each registered step starts as simultaneously as possible on
/// every thread:
///
/// -   A Global state is shared across all threads.
/// -   N instances of a Local state are each dedicated to a single thread.
/// -   S steps run on each thread, separated by barriers: step `i + 1` starts only after every thread finished step
///     `i`.
///
/// #   Example
///
/// ```
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use blockpool_test::Lockstep;
///
/// let mut lockstep = Lockstep::new(AtomicI32::new(0), vec!(1, 10));
///
/// lockstep.add_step(|global: &AtomicI32, local: &mut i32| { global.fetch_add(*local, Ordering::Relaxed); });
/// lockstep.add_step(|global: &AtomicI32, local: &mut i32| { *local = global.load(Ordering::Relaxed); });
///
/// let (global, locals) = lockstep.run();
///
/// assert_eq!(11, global.load(Ordering::Relaxed));
/// assert_eq!(vec!(11, 11), locals);
/// ```
pub struct Lockstep<Global, Local> {
    global: Arc<Global>,
    locals: Vec<Local>,
    steps: Vec<Arc<dyn Fn(&Global, &mut Local) + Send + Sync + 'static>>,
}

impl<Global, Local> Lockstep<Global, Local>
    where
        Global: Send + Sync + 'static,
        Local: Send + 'static,
{
    /// Creates an instance; one thread will be spawned per element of `locals`.
    pub fn new(global: Global, locals: Vec<Local>) -> Self {
        assert!(!locals.is_empty());

        Self { global: Arc::new(global), locals, steps: vec!(), }
    }

    /// Registers a step, to run on every thread in lockstep with the other threads.
    pub fn add_step<F>(&mut self, step: F)
        where
            F: Fn(&Global, &mut Local) + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(step));
    }

    /// Launches the threads, runs all steps on each of them, and joins.
    ///
    /// Returns the Global state and the Local states, the latter in thread creation order.
    ///
    /// #   Panics
    ///
    /// -   If any of the threads panicked.
    pub fn run(self) -> (Arc<Global>, Vec<Local>) {
        let Self { global, locals, steps } = self;

        let barrier = Arc::new(Barrier::new(locals.len()));

        let handles: Vec<_> = locals.into_iter()
            .map(|mut local| {
                let global = global.clone();
                let barrier = barrier.clone();
                let steps = steps.clone();

                thread::spawn(move || {
                    for step in &steps {
                        barrier.wait();
                        step(&global, &mut local);
                    }

                    local
                })
            })
            .collect();

        let locals = handles.into_iter()
            .map(|handle| handle.join().expect("lockstep thread panicked"))
            .collect();

        (global, locals)
    }
}

// mod tests
