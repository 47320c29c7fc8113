use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use wasita_container::descriptor::ServiceArgs;
use wasita_container::middleware::ValueGetter;
use wasita_container::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wasita_container=trace")
        .with_test_writer()
        .try_init();
}

fn counter(
    calls: &Arc<AtomicU32>,
) -> impl Fn(&ServiceProvider, &()) -> Result<u32> + Send + Sync + 'static {
    let calls = calls.clone();
    move |_, _| Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
}

#[test]
fn object_and_scoped_object() {
    let token_a: Token<i32> = Token::named("a");
    let token_b: Token<i32> = Token::named("b");

    let mut registry = ServiceCollection::new();
    registry
        .add_object(&token_a, 1, Lifetime::Transient)
        .add_object(&token_b, 2, Lifetime::Scoped);

    let provider = registry.get_provider();
    let scope = provider.create_scope();

    assert_eq!(*token_a.get(&provider).unwrap(), 1);
    assert!(matches!(
        token_b.get(&provider),
        Err(WasitaError::ScopeNotProvided { .. })
    ));
    assert_eq!(*token_b.get(&scope).unwrap(), 2);
}

#[test]
fn sibling_scopes_get_their_own_scoped_values() {
    let calls = Arc::new(AtomicU32::new(0));
    let token: Token<u32> = Token::named("request_id");

    let mut registry = ServiceCollection::new();
    registry.add_function(&token, counter(&calls), Lifetime::Scoped);

    let provider = registry.get_provider();
    let scope_a = provider.create_scope();
    let scope_b = provider.create_scope();

    assert_eq!(*scope_a.get_service(&token).unwrap(), 1);
    assert_eq!(*scope_a.get_service(&token).unwrap(), 1);
    assert_eq!(*scope_b.get_service(&token).unwrap(), 2);
    assert_eq!(*scope_a.get_service(&token).unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn transient_class_is_built_every_time() {
    static BUILT: AtomicU32 = AtomicU32::new(0);

    struct Handler {
        serial: u32,
    }

    impl Constructible for Handler {
        type Args = ();

        fn construct(_: &ServiceProvider, _: &()) -> Result<Self> {
            Ok(Handler {
                serial: BUILT.fetch_add(1, Ordering::SeqCst),
            })
        }
    }

    let token: Token<Handler> = Token::named("handler");
    let mut registry = ServiceCollection::new();
    registry.add_class(&token, Lifetime::Transient);

    let provider = registry.get_provider();
    let first = provider.get_service(&token).unwrap();
    let second = provider.get_service(&token).unwrap();
    assert_ne!(first.serial, second.serial);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn singleton_constructed_once_for_the_whole_chain() {
    let calls = Arc::new(AtomicU32::new(0));
    let token: Token<u32> = Token::named("pool");

    let mut registry = ServiceCollection::new();
    registry.add_function(&token, counter(&calls), Lifetime::Singleton);

    let provider = registry.get_provider();
    let scopes: Vec<ServiceProvider> = (0..5).map(|_| provider.create_scope()).collect();

    let values: Vec<Arc<u32>> = scopes
        .iter()
        .map(|scope| scope.get_service(&token).unwrap())
        .collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    assert!(provider.is_resolved(&token));
    assert!(scopes.iter().all(|scope| !scope.is_resolved(&token)));
}

#[test]
fn middleware_added_later_runs_first() {
    init_tracing();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let token: Token<u32> = Token::named("value");

    let mut registry = ServiceCollection::new();
    registry.add_function(
        &token,
        {
            let seen = seen.clone();
            move |_, _| {
                seen.lock().push("base");
                Ok(1)
            }
        },
        Lifetime::Transient,
    );

    let record = |label: &'static str| {
        let seen = seen.clone();
        move |_: &ServiceDescriptor, _: &ServiceProvider, next: ValueGetter, _: &ServiceArgs| -> ValueGetter {
            let seen = seen.clone();
            getter(move |descriptor, args| {
                seen.lock().push(label);
                next(descriptor, args)
            })
        }
    };

    let provider = registry.get_provider_with(|pipe| {
        pipe.add_middleware(record("A")).add_middleware(record("B"));
    });

    provider.get_service(&token).unwrap();
    assert_eq!(*seen.lock(), ["B", "A", "base"]);
}

#[test]
fn middleware_can_memoize_transients() {
    let calls = Arc::new(AtomicU32::new(0));
    let token: Token<u32> = Token::named("expensive");
    let mut registry = ServiceCollection::new();
    registry.add_function(&token, counter(&calls), Lifetime::Transient);

    let memo: Arc<Mutex<Option<Arc<dyn std::any::Any + Send + Sync>>>> = Arc::new(Mutex::new(None));
    let provider = registry.get_provider_with(|pipe| {
        let memo = memo.clone();
        pipe.add_middleware(move |_, _, next, _| {
            let memo = memo.clone();
            getter(move |descriptor, args| {
                if let Some(value) = memo.lock().clone() {
                    return Ok(value);
                }
                let value = next(descriptor, args)?;
                *memo.lock() = Some(value.clone());
                Ok(value)
            })
        });
    });

    assert_eq!(*provider.get_service(&token).unwrap(), 1);
    assert_eq!(*provider.get_service(&token).unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn fallthrough_only_when_scope_registry_lacks_descriptor() {
    let token: Token<&'static str> = Token::named("greeting");

    let mut root_registry = ServiceCollection::new();
    root_registry.add_object(&token, "from root", Lifetime::Transient);
    let provider = root_registry.get_provider();

    let mut scope_registry = ServiceCollection::new();
    scope_registry.add_object(&token, "from scope", Lifetime::Transient);
    let overriding = provider.create_scope_with(Some(&scope_registry), None);
    let empty = provider.create_scope_with(Some(&ServiceCollection::new()), None);

    assert_eq!(*token.get(&overriding).unwrap(), "from scope");
    assert_eq!(*token.get(&empty).unwrap(), "from root");
}

#[test]
fn scope_can_swap_middleware() {
    let token: Token<u32> = Token::named("n");
    let mut registry = ServiceCollection::new();
    registry.add_object(&token, 1u32, Lifetime::Transient);

    let provider = registry.get_provider();
    let mut pipe = MiddlewarePipe::new();
    pipe.add_middleware(|_, _, _, _| getter(|_, _| Ok(Arc::new(100u32) as _)));
    let scope = provider.create_scope_with(None, Some(pipe));

    assert_eq!(*token.get(&provider).unwrap(), 1);
    assert_eq!(*token.get(&scope).unwrap(), 100);
}

#[test]
fn singleton_registered_only_in_scope_registry_lives_in_scope() {
    let calls = Arc::new(AtomicU32::new(0));
    let token: Token<u32> = Token::named("local_singleton");

    let provider = ServiceCollection::new().get_provider();
    let mut scope_registry = ServiceCollection::new();
    scope_registry.add_function(&token, counter(&calls), Lifetime::Singleton);
    let scope = provider.create_scope_with(Some(&scope_registry), None);

    assert_eq!(*token.get(&scope).unwrap(), 1);
    assert_eq!(*token.get(&scope).unwrap(), 1);
    assert!(scope.is_resolved(&token));
    assert!(!provider.is_resolved(&token));
}

#[test]
fn cycles_fail_fast() {
    init_tracing();
    let a: Arc<Token<u32>> = Arc::new(Token::named("a"));
    let b: Arc<Token<u32>> = Arc::new(Token::named("b"));

    let mut registry = ServiceCollection::new();
    registry
        .add_function(
            &a,
            {
                let b = b.clone();
                move |provider, _| Ok(*b.get(provider)? + 1)
            },
            Lifetime::Singleton,
        )
        .add_function(
            &b,
            {
                let a = a.clone();
                move |provider, _| Ok(*a.get(provider)? + 1)
            },
            Lifetime::Transient,
        );

    let provider = registry.get_provider();
    match a.get(&provider) {
        Err(WasitaError::CircularDependency(e)) => {
            let names: Vec<String> = e.chain.iter().map(ToString::to_string).collect();
            assert_eq!(names, ["a", "b", "a"]);
        }
        other => panic!("Expected CircularDependency, got: {other:?}"),
    }
    assert!(!provider.is_resolved(&a));
}

#[test]
fn failed_resolution_can_be_retried_on_a_new_provider() {
    let token: Token<u32> = Token::named("late");
    let mut registry = ServiceCollection::new();

    let before = registry.get_provider();
    assert!(matches!(
        token.get(&before),
        Err(WasitaError::DescriptorNotFound(_))
    ));

    registry.add_object(&token, 3u32, Lifetime::Singleton);
    assert_eq!(*token.get(&registry.get_provider()).unwrap(), 3);
}

#[test]
fn not_found_suggests_similar_names() {
    let registered: Token<u32> = Token::named("user_repository");
    let requested: Token<u32> = Token::named("user_repo");

    let mut registry = ServiceCollection::new();
    registry.add_object(&registered, 0u32, Lifetime::Transient);

    let err = requested.get(&registry.get_provider()).unwrap_err();
    assert!(err.to_string().contains("user_repository"));
}

#[test]
fn injected_class_through_scope() {
    init_tracing();
    struct Session {
        user: Option<Arc<String>>,
        request: Option<Arc<u32>>,
    }

    impl Constructible for Session {
        type Args = ();

        fn construct(_: &ServiceProvider, _: &()) -> Result<Self> {
            Ok(Session { user: None, request: None })
        }
    }

    let user: Token<String> = Token::named("user");
    let request: Token<u32> = Token::named("request");
    let session: Token<Session> = Token::named("session");
    injector(&user).field::<Session>("user", |s, v| s.user = Some(v));
    injector(&request).field::<Session>("request", |s, v| s.request = Some(v));

    let calls = Arc::new(AtomicU32::new(0));
    let mut registry = ServiceCollection::new();
    registry
        .add_object(&user, "ada".to_string(), Lifetime::Singleton)
        .add_function(&request, counter(&calls), Lifetime::Scoped)
        .add_class(&session, Lifetime::Scoped);

    let provider = registry.get_provider();
    let scope = provider.create_scope();

    let s = session.get(&scope).unwrap();
    assert_eq!(s.user.as_deref().map(String::as_str), Some("ada"));
    assert_eq!(s.request.as_deref(), Some(&1));
    assert!(Arc::ptr_eq(&s, &session.get(&scope).unwrap()));
}

#[test]
fn settings_travel_with_the_collection() {
    let token: Token<u32, u32> = Token::named("countdown");
    let token = Arc::new(token);

    let mut registry =
        ServiceCollection::new().with_settings(ContainerSettings::default().detect_cycles(false));
    registry.add_function(
        &token,
        {
            let token = token.clone();
            move |provider, n: &u32| match *n {
                0 => Ok(0),
                n => Ok(*token.get_with(provider, n - 1)? + n),
            }
        },
        Lifetime::Transient,
    );

    // Recursion with shrinking arguments is legitimate once cycle checks are off.
    assert_eq!(*token.get_with(&registry.get_provider(), 4).unwrap(), 10);
}

#[test]
fn attached_root_value_wins_over_scope_singleton() {
    let config: Token<u32> = Token::named("config");
    let provider = ServiceCollection::new().get_provider();
    provider.resolve_service(&config, 7u32);

    let calls = Arc::new(AtomicU32::new(0));
    let mut scope_registry = ServiceCollection::new();
    scope_registry.add_function(
        &config,
        {
            let calls = calls.clone();
            move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99u32)
            }
        },
        Lifetime::Singleton,
    );
    let scope = provider.create_scope_with(Some(&scope_registry), None);

    assert_eq!(*config.get(&scope).unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!scope.is_resolved(&config));
}

#[test]
fn deep_acyclic_chain_resolves_with_default_settings() {
    const LINKS: usize = 300;

    // Each link resolves the next one, so the native stack grows with the chain.
    let worker = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let tokens: Vec<Arc<Token<usize>>> = (0..LINKS)
                .map(|i| Arc::new(Token::named(format!("link_{i}"))))
                .collect();

            let mut registry = ServiceCollection::new();
            for (i, token) in tokens.iter().enumerate() {
                match tokens.get(i + 1).cloned() {
                    Some(next) => registry.add_function(
                        token,
                        move |provider, _| Ok(*next.get(provider)? + 1),
                        Lifetime::Transient,
                    ),
                    None => registry.add_object(token, 0usize, Lifetime::Transient),
                };
            }

            let provider = registry.get_provider();
            tokens[0].get(&provider).map(|depth| *depth)
        })
        .unwrap();

    assert_eq!(worker.join().unwrap().unwrap(), LINKS - 1);
}

#[test]
fn opt_in_depth_limit_is_its_own_error() {
    let outer: Arc<Token<u32>> = Arc::new(Token::named("outer"));
    let inner: Arc<Token<u32>> = Arc::new(Token::named("inner"));

    let mut registry =
        ServiceCollection::new().with_settings(ContainerSettings::default().max_depth(1));
    registry
        .add_function(
            &outer,
            {
                let inner = inner.clone();
                move |provider, _| Ok(*inner.get(provider)? + 1)
            },
            Lifetime::Transient,
        )
        .add_function(&inner, |_, _| Ok(1u32), Lifetime::Transient);

    let provider = registry.get_provider();
    assert!(matches!(
        outer.get(&provider),
        Err(WasitaError::DepthLimitExceeded(_))
    ));
    assert_eq!(*inner.get(&provider).unwrap(), 1);
}
