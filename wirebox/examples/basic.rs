//! Basic example of a Wirebox container chain.

use std::sync::Arc;

use parking_lot::Mutex;
use wirebox::BoxError;
use wirebox::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

#[derive(Default, Injectable)]
#[injectable(implements = "dyn Logger")]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
}

impl Component for Config {}

#[derive(Injectable)]
#[injectable(constructor(path = "Database::connect"), release)]
struct Database {
    url: String,
    logger: Arc<dyn Logger>,
    open: Mutex<bool>,
}

impl Database {
    fn connect(config: Arc<Config>, logger: Arc<dyn Logger>) -> Self {
        logger.log(&format!("Connecting to {}", config.database_url));
        Self {
            url: config.database_url.clone(),
            logger,
            open: Mutex::new(true),
        }
    }

    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

impl Release for Database {
    fn release(&self) -> std::result::Result<(), BoxError> {
        *self.open.lock() = false;
        self.logger.log("Database connection closed");
        Ok(())
    }
}

#[derive(Injectable)]
#[injectable(constructor(path = "UserService::new"), method(path = "UserService::warm_up"))]
struct UserService {
    db: Arc<Database>,
    #[inject(optional)]
    logger: Option<Arc<dyn Logger>>,
}

impl UserService {
    fn new(db: Arc<Database>) -> Self {
        Self { db, logger: None }
    }

    fn warm_up(&mut self, db: Arc<Database>) {
        db.query("SELECT 1");
    }

    fn get_user(&self, id: u64) -> String {
        if let Some(logger) = &self.logger {
            logger.log(&format!("Getting user {id}"));
        }
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

struct CoreInstaller {
    database_url: String,
}

impl Installer for CoreInstaller {
    fn install_bindings(&self, container: &mut Container) -> Result<()> {
        container.bind_instance::<Config, _>(Arc::new(Config {
            database_url: self.database_url.clone(),
        }))?;
        container.bind_singleton::<dyn Logger, ConsoleLogger>()?;
        container
            .bind_singleton::<Database, Database>()?
            .as_non_lazy(container)
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("wirebox_container=debug")
        .init();

    // Global container: long-lived services
    let mut global = Container::builder().name("global").build();
    global.install(&CoreInstaller {
        database_url: "postgres://localhost/myapp".to_string(),
    })?;
    let global = Arc::new(global);
    println!("{global:?}");

    // Scene container: short-lived services, falls back to the global one
    {
        let mut scene = Container::builder()
            .name("scene")
            .fallback(Arc::clone(&global))
            .build();
        scene.bind_transient::<UserService, UserService>()?;

        let service = scene.resolve::<UserService>()?;
        println!("{}", service.get_user(42));

        let again = scene.resolve::<UserService>()?;
        println!("Same database: {}", Arc::ptr_eq(&service.db, &again.db));
    }
    // scene dropped: it owned nothing releasable

    match Arc::try_unwrap(global) {
        Ok(mut global) => global.dispose()?,
        Err(_) => println!("Global container is still shared"),
    }

    println!("Everything works!");
    Ok(())
}
