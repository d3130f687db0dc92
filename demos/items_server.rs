//! A small item store served by microroute-rs.
//!
//! Run with `RUST_LOG=debug cargo run --example items_server [addr]`, then:
//!
//! ```text
//! curl -i http://127.0.0.1:8080/items
//! curl -i http://127.0.0.1:8080/items/1
//! curl -i -X POST -H 'Content-Type: application/json' -d '{"name":"lamp"}' http://127.0.0.1:8080/items
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use microroute::{HttpResponse, HttpServer, Method, ServerConfig, ServerError, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
}

type Store = Arc<Mutex<BTreeMap<u64, Item>>>;

fn lock(store: &Store) -> Result<std::sync::MutexGuard<'_, BTreeMap<u64, Item>>, ServerError> {
    store
        .lock()
        .map_err(|_| ServerError::HandlerError("item store poisoned".to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = ServerConfig::default();
    if let Some(addr) = std::env::args().nth(1) {
        config = config.with_addr(addr.parse()?);
    }

    let store: Store = Arc::new(Mutex::new(BTreeMap::from([(
        1,
        Item { id: 1, name: "kettle".to_string() },
    )])));

    let mut server = HttpServer::new(config);

    let list = Arc::clone(&store);
    server.route(Method::GET, "/items", move |_req| {
        let store = Arc::clone(&list);
        async move {
            let items: Vec<Item> = lock(&store)?.values().cloned().collect();
            HttpResponse::new(StatusCode::Ok).with_json(&items)
        }
    });

    // Registered before `/items/:id` so it wins for this one path.
    server.route(Method::GET, "/items/count", {
        let store = Arc::clone(&store);
        move |_req| {
            let store = Arc::clone(&store);
            async move {
                let count = lock(&store)?.len();
                Ok(HttpResponse::new(StatusCode::Ok)
                    .with_content_type("text/plain")
                    .with_body_string(count.to_string()))
            }
        }
    });

    let fetch = Arc::clone(&store);
    server.route(Method::GET, "/items/:id", move |req| {
        let store = Arc::clone(&fetch);
        async move {
            let item = req
                .path_param("id")
                .and_then(|id| id.parse::<u64>().ok())
                .and_then(|id| lock(&store).ok()?.get(&id).cloned());

            match item {
                Some(item) => HttpResponse::new(StatusCode::Ok).with_json(&item),
                None => Ok(HttpResponse::new(StatusCode::NotFound)),
            }
        }
    });

    let create = Arc::clone(&store);
    server.route(Method::POST, "/items", move |req| {
        let store = Arc::clone(&create);
        async move {
            let new_item: NewItem = match req.json() {
                Ok(new_item) => new_item,
                Err(_) => return Ok(HttpResponse::new(StatusCode::BadRequest)),
            };

            let item = {
                let mut items = lock(&store)?;
                let id = items.keys().next_back().map_or(1, |last| last + 1);
                let item = Item { id, name: new_item.name };
                items.insert(id, item.clone());
                item
            };

            HttpResponse::new(StatusCode::Created).with_json(&item)
        }
    });

    server.start().await?;

    Ok(())
}
