//! Observable cells and memoized derivations.
//!
//! A [`Cell`] holds a value, a version counter and a list of subscribers.
//! A [`Derived`] wraps a pure function of other cells. While it computes, every
//! cell (or derived) it reads is recorded together with the version seen at
//! read time; the cached result is reused until one of those versions moves.
//! Recomputation is lazy: it only happens on the next read.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Writing to a cell from
//! inside its own [`Cell::with`] closure panics on the inner borrow.

use std::cell::{Cell as StdCell, RefCell};
use std::fmt;
use std::rc::Rc;

// ─── Dependency tracking ────────────────────────────────────────────────────

trait Source {
    /// Current version; derived sources bring themselves up to date first.
    fn version(&self) -> u64;
}

struct Dependency {
    source: Rc<dyn Source>,
    version: u64,
}

thread_local! {
    static TRACKING: RefCell<Vec<Vec<Dependency>>> = const { RefCell::new(Vec::new()) };
}

fn track(source: Rc<dyn Source>, version: u64) {
    TRACKING.with(|stack| {
        if let Some(frame) = stack.borrow_mut().last_mut() {
            frame.push(Dependency { source, version });
        }
    });
}

/// Runs `f` with dependency tracking suspended, so reads inside it are not
/// recorded by an enclosing [`Derived`].
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let saved = TRACKING.with(|stack| std::mem::take(&mut *stack.borrow_mut()));
    let result = f();
    TRACKING.with(|stack| *stack.borrow_mut() = saved);
    result
}

// ─── Cell ───────────────────────────────────────────────────────────────────

/// Identifier returned by [`Cell::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct CellInner<T> {
    value: RefCell<T>,
    version: StdCell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, Rc<dyn Fn()>)>>,
    next_subscription: StdCell<u64>,
}

impl<T: 'static> Source for CellInner<T> {
    fn version(&self) -> u64 {
        self.version.get()
    }
}

/// An observable value.
///
/// Cloning a `Cell` clones the handle; both handles see the same value.
pub struct Cell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Cell {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: 'static> Cell<T> {
    pub fn new(value: T) -> Self {
        Cell {
            inner: Rc::new(CellInner {
                value: RefCell::new(value),
                version: StdCell::new(0),
                subscribers: RefCell::new(Vec::new()),
                next_subscription: StdCell::new(0),
            }),
        }
    }

    /// Borrows the value, recording the read for an enclosing [`Derived`].
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track(self.inner.clone(), self.inner.version.get());
        f(&self.inner.value.borrow())
    }

    /// Borrows the value without recording a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(T::clone)
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify();
    }

    /// Mutates the value in place and notifies subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.inner.value.borrow_mut());
        self.notify();
        result
    }

    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Registers a callback run after every write.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));
        id
    }

    /// Removes a subscriber. Returns `false` when it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    fn notify(&self) {
        self.inner.version.set(self.inner.version.get() + 1);
        // Callbacks may read or write this cell, so none of its borrows are held.
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

// ─── Derived ────────────────────────────────────────────────────────────────

struct DerivedInner<T> {
    compute: Box<dyn Fn() -> T>,
    cached: RefCell<Option<T>>,
    deps: RefCell<Vec<Dependency>>,
    version: StdCell<u64>,
    computations: StdCell<u64>,
}

impl<T: 'static> DerivedInner<T> {
    fn is_stale(&self) -> bool {
        self.cached.borrow().is_none()
            || self
                .deps
                .borrow()
                .iter()
                .any(|dep| dep.source.version() != dep.version)
    }

    fn refresh(&self) {
        if !self.is_stale() {
            return;
        }

        TRACKING.with(|stack| stack.borrow_mut().push(Vec::new()));
        let value = (self.compute)();
        let deps = TRACKING
            .with(|stack| stack.borrow_mut().pop())
            .unwrap_or_default();

        *self.deps.borrow_mut() = deps;
        *self.cached.borrow_mut() = Some(value);
        self.version.set(self.version.get() + 1);
        self.computations.set(self.computations.get() + 1);
    }
}

impl<T: 'static> Source for DerivedInner<T> {
    fn version(&self) -> u64 {
        self.refresh();
        self.version.get()
    }
}

/// A memoized pure function of other cells.
pub struct Derived<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Derived {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("cached", &*self.inner.cached.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: 'static> Derived<T> {
    /// Creates a derivation. Nothing is computed until the first read.
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Derived {
            inner: Rc::new(DerivedInner {
                compute: Box::new(compute),
                cached: RefCell::new(None),
                deps: RefCell::new(Vec::new()),
                version: StdCell::new(0),
                computations: StdCell::new(0),
            }),
        }
    }

    /// Borrows the current result, recomputing first if a dependency moved.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.refresh();
        track(self.inner.clone(), self.inner.version.get());
        let cached = self.inner.cached.borrow();
        match cached.as_ref() {
            Some(value) => f(value),
            None => f(&(self.inner.compute)()),
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Whether the next read will recompute.
    pub fn is_stale(&self) -> bool {
        self.inner.is_stale()
    }

    /// Number of times the function has run.
    pub fn computations(&self) -> u64 {
        self.inner.computations.get()
    }
}
