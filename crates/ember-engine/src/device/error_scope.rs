//! Scoped validation capture.
//!
//! An [`ErrorScope`] brackets a unit of device work. Dropping it pops the wgpu
//! error scope, but the result is a future: on some backends it resolves only
//! after the device has been polled. Pops are therefore parked in the shared
//! [`ErrorScopes`] queue and reported by [`ErrorScopes::drain`], which the frame
//! loop calls right after `Device::poll`. Errors may thus be logged a tick after
//! the work that caused them.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

type PopFuture = Pin<Box<dyn Future<Output = Option<wgpu::Error>>>>;

struct PendingPop {
    name: Cow<'static, str>,
    future: PopFuture,
}

/// Queue of error-scope pops that have not resolved yet.
///
/// Shared by `Rc` between the owning context and every live [`ErrorScope`], so a
/// scope never holds a reference into a stack frame or into the context itself.
#[derive(Default)]
pub struct ErrorScopes {
    pending: RefCell<Vec<PendingPop>>,
    reported: Cell<u64>,
}

impl ErrorScopes {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Number of pops still waiting for the backend.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Total number of errors logged since creation.
    pub fn reported(&self) -> u64 {
        self.reported.get()
    }

    fn defer(&self, name: Cow<'static, str>, future: PopFuture) {
        self.pending.borrow_mut().push(PendingPop { name, future });
    }

    /// Polls every parked pop once without blocking.
    ///
    /// Resolved pops are removed; those carrying an error are logged with the
    /// scope name and error kind. Returns the number of errors logged by this call.
    pub fn drain(&self) -> usize {
        let mut cx = Context::from_waker(Waker::noop());
        let mut logged = 0;

        self.pending
            .borrow_mut()
            .retain_mut(|pop| match pop.future.as_mut().poll(&mut cx) {
                Poll::Pending => true,
                Poll::Ready(None) => false,
                Poll::Ready(Some(err)) => {
                    log::error!(
                        "error [scope = {}, type = {}]: {err}",
                        pop.name,
                        error_kind(&err)
                    );
                    logged += 1;
                    false
                }
            });

        self.reported.set(self.reported.get() + logged as u64);
        logged
    }
}

/// Validation scope guard.
///
/// Pushes a validation error scope on creation and pops it when dropped, on every
/// exit path. The scope name is owned, so late reports stay meaningful.
#[must_use = "the scope is popped as soon as the guard is dropped"]
pub struct ErrorScope {
    name: Cow<'static, str>,
    guard: Option<wgpu::ErrorScopeGuard>,
    sink: Rc<ErrorScopes>,
}

impl ErrorScope {
    pub fn push(
        device: &wgpu::Device,
        name: impl Into<Cow<'static, str>>,
        sink: &Rc<ErrorScopes>,
    ) -> Self {
        let guard = device.push_error_scope(wgpu::ErrorFilter::Validation);
        Self {
            name: name.into(),
            guard: Some(guard),
            sink: Rc::clone(sink),
        }
    }
}

impl Drop for ErrorScope {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            let name = std::mem::take(&mut self.name);
            self.sink.defer(name, Box::pin(guard.pop()));
        }
    }
}

fn error_kind(err: &wgpu::Error) -> &'static str {
    match err {
        wgpu::Error::OutOfMemory { .. } => "out-of-memory",
        wgpu::Error::Validation { .. } => "validation",
        wgpu::Error::Internal { .. } => "internal",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_pop_without_error_is_dropped_silently() {
        let scopes = ErrorScopes::new();
        scopes.defer("ok".into(), Box::pin(std::future::ready(None)));
        assert_eq!(scopes.pending(), 1);

        assert_eq!(scopes.drain(), 0);
        assert_eq!(scopes.pending(), 0);
        assert_eq!(scopes.reported(), 0);
    }

    #[test]
    fn unresolved_pop_stays_queued() {
        let scopes = ErrorScopes::new();
        scopes.defer("slow".into(), Box::pin(std::future::pending()));
        scopes.defer("ok".into(), Box::pin(std::future::ready(None)));

        assert_eq!(scopes.drain(), 0);
        assert_eq!(scopes.pending(), 1);
        assert_eq!(scopes.drain(), 0);
        assert_eq!(scopes.pending(), 1);
    }
}
