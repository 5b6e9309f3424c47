#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::figment::Figment;
use rocket::fs::FileServer;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;

mod boot;
mod config;
mod db;
mod forms;
mod models;
mod pagination;
mod routes;
mod security;
mod slug;
mod store;

#[cfg(test)]
mod tests;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::response::content::RawHtml;

use config::AppConfig;
use store::sqlite::SqliteStore;
use store::Store;

/// Paths whose responses carry per-user content and must never be cached.
const PRIVATE_PREFIXES: &[&str] = &["/dashboard", "/accounts"];

pub struct NoCachePrivate;

#[rocket::async_trait]
impl Fairing for NoCachePrivate {
    fn info(&self) -> Info {
        Info { name: "No-Cache Private Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let path = req.uri().path();
        if PRIVATE_PREFIXES.iter().any(|p| path.starts_with(*p)) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

fn error_page(code: u16, message: &str) -> RawHtml<String> {
    RawHtml(format!(
        "<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>{}</h1><p>{}</p><a href='/'>← Home</a></body></html>",
        code, message
    ))
}

#[catch(403)]
fn forbidden() -> RawHtml<String> {
    error_page(403, "You do not have permission to do that.")
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    error_page(404, "Page not found.")
}

#[catch(422)]
fn unprocessable() -> RawHtml<String> {
    error_page(422, "The submitted form could not be read.")
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    error_page(500, "Internal server error.")
}

/// Assemble the application around an already-migrated store.
pub fn build(store: Arc<dyn Store>, figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(store)
        .attach(Template::fairing())
        .attach(NoCachePrivate)
        .mount("/static", FileServer::from("website/static"))
        .mount("/", routes::routes())
        .register("/", catchers![forbidden, not_found, unprocessable, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    let figment = rocket::Config::figment();
    let config = AppConfig::from_figment(&figment);

    // Boot check: create directories, verify templates
    boot::run(&config);

    let pool = db::init_pool_at(&config.database_path, config.db_pool_size)
        .expect("Failed to initialize database pool");
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));
    store.run_migrations().expect("Failed to run database migrations");
    store.seed_defaults().expect("Failed to seed default settings");

    log::info!("Database ready at {}", config.database_path);

    build(store, figment)
}
