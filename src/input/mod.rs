//! Host event sources and the listeners attached to them.
//!
//! An [`EventSource`] fans events out to subscribed handlers in
//! subscription order. Subscribing returns a [`Subscription`]; dropping it
//! detaches the handler, so a listener lives exactly as long as whatever
//! owns its subscription.

mod drop;
mod keys;

pub use drop::{DropEvent, DropGateway, DropPolicy};
pub use keys::{FocusTarget, KeyInput, TabDirection, TabKeyController, tab_direction};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::workspace::Workspace;

/// What a handler wants done with the event after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Let the host apply its default behavior.
    #[default]
    Continue,
    /// The handler consumed the event.
    PreventDefault,
}

type Handler<E> = Rc<RefCell<dyn FnMut(&E, &mut Workspace) -> Flow>>;

struct Listeners<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
}

pub struct EventSource<E> {
    listeners: Rc<RefCell<Listeners<E>>>,
}

impl<E: 'static> EventSource<E> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn subscribe(
        &self,
        handler: impl FnMut(&E, &mut Workspace) -> Flow + 'static,
    ) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            let handler: Handler<E> = Rc::new(RefCell::new(handler));
            listeners.handlers.push((id, handler));
            id
        };
        let weak: Weak<RefCell<Listeners<E>>> = Rc::downgrade(&self.listeners);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.borrow_mut().handlers.retain(|(h, _)| *h != id);
                }
            })),
        }
    }

    /// Deliver `event` to every handler. Returns
    /// [`Flow::PreventDefault`] if any handler consumed it.
    pub fn dispatch(&self, event: &E, workspace: &mut Workspace) -> Flow {
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let handlers: Vec<Handler<E>> = self
            .listeners
            .borrow()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();

        let mut flow = Flow::Continue;
        for handler in handlers {
            if (&mut *handler.borrow_mut())(event, workspace) == Flow::PreventDefault {
                flow = Flow::PreventDefault;
            }
        }
        flow
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().handlers.len()
    }
}

impl<E: 'static> Default for EventSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("listeners", &self.listeners.borrow().handlers.len())
            .finish()
    }
}

/// Keeps a handler attached to its source. Dropping it detaches the handler.
#[must_use = "dropping a subscription detaches its handler"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Detach now rather than on drop.
    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
