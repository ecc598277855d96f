//! When the materializer runs
//!
//! A page needs one run after it first mounts and one after every
//! client-side navigation. Both are deferred to the host's next tick,
//! because freshly rendered markdown is not attached yet when the
//! triggering event fires. Navigation is observed through the router's
//! post-navigation hook when it has one, and through browser history
//! events otherwise.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, info};

/// Hook registration offered by a client-side router
pub trait NavigationRouter {
    /// Call `hook` after every completed navigation
    fn after_each(&self, hook: Rc<dyn Fn()>);
}

/// The page runtime hosting the materializer
pub trait Host {
    /// True when running in a live page rather than static generation
    fn is_interactive(&self) -> bool;

    /// Run `task` once pending UI updates have been flushed
    fn next_tick(&self, task: Box<dyn FnOnce()>);

    /// The router, if the runtime exposes one with a post-navigation hook
    fn router(&self) -> Option<&dyn NavigationRouter>;

    /// Call `listener` whenever the browser history changes
    fn on_history_change(&self, listener: Rc<dyn Fn()>);
}

/// How navigation is being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSource {
    RouterHook,
    HistoryEvents,
}

impl fmt::Display for NavigationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationSource::RouterHook => write!(f, "router hook"),
            NavigationSource::HistoryEvents => write!(f, "history events"),
        }
    }
}

fn deferred<H: Host + ?Sized + 'static>(host: &Rc<H>, run: &Rc<dyn Fn()>) -> Rc<dyn Fn()> {
    let host: Weak<H> = Rc::downgrade(host);
    let run = Rc::clone(run);
    Rc::new(move || {
        if let Some(host) = host.upgrade() {
            let run = Rc::clone(&run);
            host.next_tick(Box::new(move || run()));
        }
    })
}

/// Schedule `run` after mount and after every navigation
///
/// Returns how navigation is observed, or `None` when the host is not
/// interactive and nothing was scheduled.
pub fn install_triggers<H: Host + ?Sized + 'static>(
    host: &Rc<H>,
    run: Rc<dyn Fn()>,
) -> Option<NavigationSource> {
    if !host.is_interactive() {
        debug!("Host is not interactive, no triggers installed");
        return None;
    }

    let on_mount = Rc::clone(&run);
    host.next_tick(Box::new(move || on_mount()));

    let on_navigate = deferred(host, &run);
    let source = match host.router() {
        Some(router) => {
            router.after_each(on_navigate);
            NavigationSource::RouterHook
        }
        None => {
            host.on_history_change(on_navigate);
            NavigationSource::HistoryEvents
        }
    };
    info!(%source, "Diagram triggers installed");
    Some(source)
}
