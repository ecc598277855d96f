//! A page wired to its triggers on a single-threaded executor
//!
//! The host fakes the page runtime: a tick queue, an optional router and a
//! history listener list, all driven by hand.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::{BoxFuture, FutureExt};
use zoo_diagrams::prelude::*;

#[derive(Default)]
struct FakeRouter {
    hooks: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl FakeRouter {
    fn navigate(&self) {
        let hooks = self.hooks.borrow().clone();
        for hook in hooks {
            hook();
        }
    }
}

impl NavigationRouter for FakeRouter {
    fn after_each(&self, hook: Rc<dyn Fn()>) {
        self.hooks.borrow_mut().push(hook);
    }
}

#[derive(Default)]
struct FakeHost {
    interactive: bool,
    router: Option<FakeRouter>,
    ticks: RefCell<Vec<Box<dyn FnOnce()>>>,
    history: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl FakeHost {
    fn interactive(router: Option<FakeRouter>) -> Rc<Self> {
        Rc::new(Self {
            interactive: true,
            router,
            ..Default::default()
        })
    }

    fn flush(&self) {
        let tasks: Vec<_> = self.ticks.borrow_mut().drain(..).collect();
        for task in tasks {
            task();
        }
    }

    fn pop_state(&self) {
        let listeners = self.history.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}

impl Host for FakeHost {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn next_tick(&self, task: Box<dyn FnOnce()>) {
        self.ticks.borrow_mut().push(task);
    }

    fn router(&self) -> Option<&dyn NavigationRouter> {
        self.router.as_ref().map(|r| r as &dyn NavigationRouter)
    }

    fn on_history_change(&self, listener: Rc<dyn Fn()>) {
        self.history.borrow_mut().push(listener);
    }
}

fn page_html(title: &str, diagrams: usize) -> Document {
    let mut html = format!("<h1>{}</h1>", title);
    for i in 0..diagrams {
        html.push_str(&format!(
            r#"<pre><code class="language-mermaid">graph TD; {}{}</code></pre>"#,
            title, i
        ));
    }
    Document::parse_html(&html).unwrap()
}

fn live_page(doc: Document) -> Rc<LivePage> {
    let materializer =
        Materializer::new(Arc::new(EngineProvider::new(PrerenderLoader::default())));
    LivePage::new(doc, materializer, Environment::Interactive)
}

#[test]
fn test_mount_then_router_navigation() {
    let mut pool = LocalPool::new();
    let host = FakeHost::interactive(Some(FakeRouter::default()));
    let page = live_page(page_html("Home", 1));

    let source = install_triggers(&host, page.runner(pool.spawner()));
    assert_eq!(source, Some(NavigationSource::RouterHook));

    pool.run_until_stalled();
    assert!(page.reports().is_empty(), "mount run waits for the next tick");

    host.flush();
    pool.run_until_stalled();
    assert_eq!(page.document().select_by_class("mermaid").len(), 1);

    page.navigate(page_html("Guide", 2));
    host.router.as_ref().unwrap().navigate();
    host.flush();
    pool.run_until_stalled();

    assert_eq!(page.document().select_by_class("mermaid").len(), 2);
    assert_eq!(
        page.reports(),
        vec![
            MaterializeReport::Rendered {
                converted: 1,
                rendered: 1
            },
            MaterializeReport::Rendered {
                converted: 2,
                rendered: 2
            },
        ]
    );
}

#[test]
fn test_history_fallback_drives_runs() {
    let mut pool = LocalPool::new();
    let host = FakeHost::interactive(None);
    let page = live_page(page_html("Home", 0));

    let source = install_triggers(&host, page.runner(pool.spawner()));
    assert_eq!(source, Some(NavigationSource::HistoryEvents));
    host.flush();
    pool.run_until_stalled();
    assert_eq!(page.reports()[0].converted(), 0);

    page.navigate(page_html("Api", 1));
    host.pop_state();
    host.flush();
    pool.run_until_stalled();

    assert_eq!(page.reports().len(), 2);
    assert_eq!(page.reports()[1].converted(), 1);
    assert!(page.document().to_html().contains(r#"<div class="mermaid""#));
}

#[test]
fn test_taking_reports_drains_them() {
    let mut pool = LocalPool::new();
    let host = FakeHost::interactive(Some(FakeRouter::default()));
    let page = live_page(page_html("Home", 1));

    install_triggers(&host, page.runner(pool.spawner()));
    host.flush();
    pool.run_until_stalled();

    page.navigate(page_html("Guide", 1));
    host.router.as_ref().unwrap().navigate();
    host.flush();
    pool.run_until_stalled();

    let taken = page.take_reports();
    assert_eq!(taken.len(), 2);
    assert!(taken.iter().all(|r| r.converted() == 1));
    assert!(page.reports().is_empty());
    assert!(page.take_reports().is_empty());

    page.navigate(page_html("Api", 0));
    host.router.as_ref().unwrap().navigate();
    host.flush();
    pool.run_until_stalled();
    assert_eq!(page.take_reports().len(), 1);
}

#[test]
fn test_non_interactive_host_never_runs() {
    let mut pool = LocalPool::new();
    let host = Rc::new(FakeHost::default());
    let page = live_page(page_html("Home", 1));
    let before = page.document().clone();

    assert_eq!(install_triggers(&host, page.runner(pool.spawner())), None);
    host.flush();
    pool.run_until_stalled();

    assert!(page.reports().is_empty());
    assert_eq!(*page.document(), before);
}

struct GatedLoader {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl EngineLoader for GatedLoader {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn DiagramEngine>, DiagramError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        async move {
            let gate = gate.ok_or_else(|| DiagramError::engine_unavailable("loaded twice"))?;
            gate.await
                .map_err(|_| DiagramError::engine_unavailable("gate dropped"))?;
            let engine: Arc<dyn DiagramEngine> = Arc::new(PrerenderEngine::new());
            Ok(engine)
        }
        .boxed()
    }
}

#[test]
fn test_overlapping_runs_share_one_load() {
    let (open, gate) = oneshot::channel();
    let loader = Arc::new(GatedLoader {
        gate: Mutex::new(Some(gate)),
        calls: AtomicUsize::new(0),
    });
    let provider = Arc::new(EngineProvider::new(SharedLoader(Arc::clone(&loader))));

    let mut pool = LocalPool::new();
    let host = FakeHost::interactive(Some(FakeRouter::default()));
    let page = LivePage::new(
        page_html("Home", 1),
        Materializer::new(Arc::clone(&provider)),
        Environment::Interactive,
    );
    install_triggers(&host, page.runner(pool.spawner()));

    host.flush();
    pool.run_until_stalled();
    host.router.as_ref().unwrap().navigate();
    host.flush();
    pool.run_until_stalled();
    assert!(page.reports().is_empty(), "both runs wait on the load");

    open.send(()).unwrap();
    pool.run_until_stalled();

    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    assert!(provider.is_loaded());
    let reports = page.reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports.iter().map(|r| r.converted()).sum::<usize>(), 1);
    assert_eq!(page.document().select_by_class("mermaid").len(), 1);
}

struct SharedLoader(Arc<GatedLoader>);

impl EngineLoader for SharedLoader {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn DiagramEngine>, DiagramError>> {
        self.0.load()
    }
}
