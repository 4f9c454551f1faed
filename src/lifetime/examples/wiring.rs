use std::sync::Arc;

use lifetime::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config {
        use_b: true,
        use_c: true,
    };

    let (app, cleanup) = new(&config);
    let app = app.must_instance();
    info!(
        with_b = app.b.is_some(),
        with_c = app.c.is_some(),
        "application is ready"
    );

    cleanup.run();
}

struct Config {
    use_b: bool,
    use_c: bool,
}

/// The composition root. Every node's cleanup is collected right after the
/// node is created, so the returned handle releases dependents first.
fn new(config: &Config) -> (Arc<dyn Lifetime<Arc<A>>>, CleanupHandle) {
    let mut teardown = Teardown::new();

    let d = make_d(&mut teardown);
    let c = make_c(d, &mut teardown);
    let b = make_b();
    let a = make_a(config, b, c, &mut teardown);

    (a, teardown.into_callback())
}

fn make_a(
    config: &Config,
    b: Arc<dyn Lifetime<Arc<B>>>,
    c: Arc<dyn Lifetime<Arc<C>>>,
    teardown: &mut Teardown,
) -> Arc<dyn Lifetime<Arc<A>>> {
    let (use_b, use_c) = (config.use_b, config.use_c);
    let (a, cleanup) = Singleton::new_with_cleanup(
        move || -> Result<_, LifetimeError> {
            let b = if use_b { Some(b.instance()?) } else { None };
            let c = if use_c { Some(c.instance()?) } else { None };
            Ok(A::new(b, c))
        },
        |_| info!("cleaning up A"),
    );
    teardown.push(cleanup);
    a
}

fn make_b() -> Arc<dyn Lifetime<Arc<B>>> {
    Arc::new(Singleton::new(|| Ok::<_, LifetimeError>(B::new())))
}

fn make_c(d: Arc<dyn Lifetime<Arc<D>>>, teardown: &mut Teardown) -> Arc<dyn Lifetime<Arc<C>>> {
    let (c, cleanup) = Singleton::new_with_cleanup(
        move || d.instance().map(C::new),
        |_| info!("cleaning up C"),
    );
    teardown.push(cleanup);
    c
}

fn make_d(teardown: &mut Teardown) -> Arc<dyn Lifetime<Arc<D>>> {
    let (d, cleanup) = Singleton::new_with_cleanup(
        || Ok::<_, LifetimeError>(D::new()),
        |_| info!("cleaning up D"),
    );
    teardown.push(cleanup);
    d
}

struct A {
    b: Option<Arc<B>>,
    c: Option<Arc<C>>,
}

impl A {
    fn new(b: Option<Arc<B>>, c: Option<Arc<C>>) -> Arc<Self> {
        info!("creating A");
        Arc::new(Self { b, c })
    }
}

struct B;

impl B {
    fn new() -> Arc<Self> {
        info!("creating B");
        Arc::new(Self)
    }
}

struct C {
    _d: Arc<D>,
}

impl C {
    fn new(d: Arc<D>) -> Arc<Self> {
        info!("creating C");
        Arc::new(Self { _d: d })
    }
}

struct D;

impl D {
    fn new() -> Arc<Self> {
        info!("creating D");
        Arc::new(Self)
    }
}
