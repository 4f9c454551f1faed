use std::sync::Arc;
use std::thread;

use lifetime::prelude::*;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Journal {
    events: Mutex<Vec<String>>,
}

impl Journal {
    fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }
}

#[derive(Clone, Copy)]
struct Config {
    use_b: bool,
    use_c: bool,
    fail_d: bool,
}

struct Graph {
    root: Arc<dyn Lifetime<Arc<Node>>>,
    requests: Arc<Transient<Arc<Node>>>,
    cleanup: CleanupHandle,
}

#[derive(Debug)]
struct Node {
    name: &'static str,
    deps: Vec<Arc<Node>>,
}

fn node(journal: &Arc<Journal>, name: &'static str, deps: Vec<Arc<Node>>) -> Arc<Node> {
    journal.record(format!("create {name}"));
    Arc::new(Node { name, deps })
}

fn cleanup(journal: &Arc<Journal>) -> impl Fn(Arc<Node>) + Send + Sync + 'static {
    let journal = Arc::clone(journal);
    move |node| journal.record(format!("cleanup {}", node.name))
}

fn build(config: Config, journal: &Arc<Journal>) -> Graph {
    let mut teardown = Teardown::new();

    let (d, handle) = Singleton::new_with_cleanup(
        {
            let journal = Arc::clone(journal);
            move || {
                if config.fail_d {
                    Err(String::from("d is unavailable"))
                } else {
                    Ok(node(&journal, "d", Vec::new()))
                }
            }
        },
        cleanup(journal),
    );
    teardown.push(handle);

    let (c, handle) = Singleton::new_with_cleanup(
        {
            let journal = Arc::clone(journal);
            move || d.instance().map(|d| node(&journal, "c", vec![d]))
        },
        cleanup(journal),
    );
    teardown.push(handle);

    let b = Arc::new(Singleton::new({
        let journal = Arc::clone(journal);
        move || Ok::<_, LifetimeError>(node(&journal, "b", Vec::new()))
    }));

    let (a, handle) = Singleton::new_with_cleanup(
        {
            let journal = Arc::clone(journal);
            let c = Arc::clone(&c);
            move || -> Result<_, LifetimeError> {
                let mut deps = Vec::new();
                if config.use_b {
                    deps.push(b.instance()?);
                }
                if config.use_c {
                    deps.push(c.instance()?);
                }
                Ok(node(&journal, "a", deps))
            }
        },
        cleanup(journal),
    );
    teardown.push(handle);

    let (requests, handle) = Transient::new_with_cleanup(
        {
            let journal = Arc::clone(journal);
            let a = Arc::clone(&a);
            move || a.instance().map(|a| node(&journal, "request", vec![a]))
        },
        cleanup(journal),
    );
    teardown.push(handle);

    Graph {
        root: a,
        requests,
        cleanup: teardown.into_callback(),
    }
}

#[test]
fn graph_constructs_each_singleton_once() {
    let journal = Arc::new(Journal::default());
    let graph = build(
        Config {
            use_b: true,
            use_c: true,
            fail_d: false,
        },
        &journal,
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let root = Arc::clone(&graph.root);
            thread::spawn(move || root.must_instance())
        })
        .collect();
    let roots: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Each thread should not `panic!()`"))
        .collect();

    assert!(roots.iter().all(|root| Arc::ptr_eq(root, &roots[0])));
    let root = &roots[0];
    assert_eq!(root.name, "a");
    assert_eq!(
        root.deps.iter().map(|n| n.name).collect::<Vec<_>>(),
        vec!["b", "c"]
    );
    assert_eq!(root.deps[1].deps[0].name, "d");

    for name in ["a", "b", "c", "d"] {
        assert_eq!(journal.count(&format!("create {name}")), 1);
    }
}

#[test]
fn graph_teardown_releases_dependents_first() {
    let journal = Arc::new(Journal::default());
    let graph = build(
        Config {
            use_b: true,
            use_c: true,
            fail_d: false,
        },
        &journal,
    );

    let first = graph.requests.must_instance();
    let second = graph.requests.must_instance();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.deps[0], &second.deps[0]));

    graph.cleanup.run();
    graph.cleanup.run();

    let cleanups: Vec<_> = journal
        .events()
        .into_iter()
        .filter(|e| e.starts_with("cleanup"))
        .collect();
    assert_eq!(
        cleanups,
        vec![
            "cleanup request",
            "cleanup request",
            "cleanup a",
            "cleanup c",
            "cleanup d",
        ]
    );
}

#[test]
fn graph_skips_disabled_dependencies() {
    let journal = Arc::new(Journal::default());
    let graph = build(
        Config {
            use_b: false,
            use_c: false,
            fail_d: false,
        },
        &journal,
    );

    let root = graph.root.must_instance();
    assert!(root.deps.is_empty());
    graph.cleanup.run();

    assert_eq!(journal.events(), vec!["create a", "cleanup a"]);
}

#[test]
fn graph_propagates_construction_error_to_root() {
    let journal = Arc::new(Journal::default());
    let graph = build(
        Config {
            use_b: true,
            use_c: true,
            fail_d: true,
        },
        &journal,
    );

    let err = graph.root.instance().unwrap_err();
    assert!(err.to_string().ends_with("d is unavailable"));
    assert!(graph.requests.instance().is_err());
    assert_eq!(graph.requests.retained(), 0);

    graph.cleanup.run();

    // Only b was built; it has no cleanup and nothing else succeeded.
    assert_eq!(journal.events(), vec!["create b"]);
}

#[test]
#[should_panic(expected = "d is unavailable")]
fn graph_must_instance_panics_with_root_cause() {
    let journal = Arc::new(Journal::default());
    let graph = build(
        Config {
            use_b: false,
            use_c: true,
            fail_d: true,
        },
        &journal,
    );

    graph.root.must_instance();
}
