//! Serves `./public` on 127.0.0.1:9000, with `/api/whoami` behind a bearer token.
//!
//! ```text
//! cargo run -p bare-web --example static_server [config.json]
//! curl -H 'Authorization: Bearer t0kEn' http://127.0.0.1:9000/api/whoami
//! ```

use bare_http::handler::{HandlerError, make_handler};
use bare_http::protocol::{Request, Response};
use bare_web::middleware::{DateHeader, wrap_auth};
use bare_web::{Router, Server, ServerConfig, make_static_handler};
use http::StatusCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

async fn whoami(request: Request) -> Result<Response, HandlerError> {
    let agent = request.header("user-agent").unwrap_or("unknown");
    info!(agent, "whoami");
    Ok(Response::text(StatusCode::OK, format!("you are {agent}\r\n")))
}

fn load_config() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(ServerConfig::default()),
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(cause = %e, "can't load config");
            return;
        }
    };

    let router = Router::builder()
        .mount("/api/whoami", wrap_auth(make_handler(whoami), "t0kEn"))
        .mount("", make_static_handler("./public"))
        .with_global_decorator(DateHeader)
        .build();

    let server = match Server::builder().config(config).router(router).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server setup");
            return;
        }
    };

    if let Err(e) = server.run().await {
        error!(cause = %e, "server error");
    }
}
