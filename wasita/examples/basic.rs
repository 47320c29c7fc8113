//! Basic example of the Wasita container.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use wasita::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
    debug: bool,
}

struct Database {
    url: String,
    logger: Arc<Box<dyn Logger>>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
    request_id: u64,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        let rows = self.db.query(&format!("SELECT * FROM users WHERE id = {id}"));
        format!("{rows} (request {})", self.request_id)
    }
}

// Built by the container; its logger is injected after construction.
struct UserService {
    repo: Option<Arc<UserRepository>>,
    logger: Option<Arc<Box<dyn Logger>>>,
}

impl Constructible for UserService {
    type Args = ();

    fn construct(_: &ServiceProvider, _: &()) -> Result<Self> {
        Ok(UserService { repo: None, logger: None })
    }
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        if let Some(logger) = &self.logger {
            logger.log(&format!("Getting user {id}"));
        }
        match &self.repo {
            Some(repo) => repo.find_user(id),
            None => "no repository".to_string(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    if wasita::init_logging().is_err() {
        eprintln!("a tracing subscriber was already installed");
    }

    let config: Arc<Token<Config>> = Arc::new(Token::named("config"));
    let logger: Arc<Token<Box<dyn Logger>>> = Arc::new(Token::named("logger"));
    let database: Arc<Token<Database>> = Arc::new(Token::named("database"));
    let request_id: Arc<Token<u64>> = Arc::new(Token::named("request_id"));
    let next_request = Arc::new(AtomicU64::new(1));
    let repository: Arc<Token<UserRepository>> = Arc::new(Token::named("user_repository"));
    let user_service: Token<UserService> = Token::named("user_service");

    injector(&repository).field::<UserService>("repo", |s, repo| s.repo = Some(repo));
    injector(&logger).field::<UserService>("logger", |s, logger| s.logger = Some(logger));

    let mut services = ServiceCollection::new();
    services
        // Config: a ready-made value
        .add_object(
            &config,
            Config {
                database_url: "postgres://localhost/myapp".to_string(),
                debug: true,
            },
            Lifetime::Singleton,
        )
        .add_function(&logger, |_, _| Ok(Box::new(ConsoleLogger) as Box<dyn Logger>), Lifetime::Singleton)
        // Database: singleton (depends on Config + Logger)
        .add_function(
            &database,
            {
                let (config, logger) = (config.clone(), logger.clone());
                move |provider, _| {
                    Ok(Database {
                        url: config.get(provider)?.database_url.clone(),
                        logger: logger.get(provider)?,
                    })
                }
            },
            Lifetime::Singleton,
        )
        // One id per scope
        .add_function(
            &request_id,
            move |_, _| Ok(next_request.fetch_add(1, Ordering::Relaxed)),
            Lifetime::Scoped,
        )
        // UserRepository: scoped (one per request)
        .add_function(
            &repository,
            {
                let (database, request_id) = (database.clone(), request_id.clone());
                move |provider, _| {
                    Ok(UserRepository {
                        db: database.get(provider)?,
                        request_id: *request_id.get(provider)?,
                    })
                }
            },
            Lifetime::Scoped,
        )
        // UserService: transient (new each time)
        .add_class(&user_service, Lifetime::Transient);

    let provider = services.get_provider_with(|pipe| {
        pipe.add_middleware(|descriptor, _provider, next, _args| {
            let name = descriptor.name().to_string();
            getter(move |descriptor, args| {
                let started = Instant::now();
                let value = next(descriptor, args);
                tracing::info!(service = %name, elapsed = ?started.elapsed(), "Built service");
                value
            })
        });
    });

    println!("✅ Provider built successfully!");
    println!("{provider:?}");

    // === Resolve from the root provider ===
    let cfg = config.get(&provider)?;
    println!("📋 Config: database_url={}, debug={}", cfg.database_url, cfg.debug);

    // Scoped services need a scope
    if let Err(e) = repository.get(&provider) {
        println!("⚠️  {e}");
    }

    // === Create a scope (e.g., for an HTTP request) ===
    {
        let scope = provider.create_scope();

        let service = user_service.get(&scope)?;
        println!("👤 {}", service.get_user(42));

        // Resolve again in same scope, UserRepository is reused
        let service2 = user_service.get(&scope)?;
        println!("👤 {}", service2.get_user(7));
    }

    println!("\n🎉 Everything works!");
    Ok(())
}
