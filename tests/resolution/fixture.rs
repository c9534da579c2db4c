use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use dtmi_resolver::{ClientOptions, Dtmi, ModelsRepositoryClient, ResolutionMode};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) const THERMOSTAT: &str = "dtmi:com:example:Thermostat;1";
pub(crate) const SENSOR: &str = "dtmi:com:example:TemperatureSensor;1";

/// Minimal interface document extending `dependencies`.
pub(crate) fn model_document(id: &str, dependencies: &[&str]) -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "@context": "dtmi:dtdl:context;2",
        "@id": id,
        "@type": "Interface",
        "extends": dependencies,
        "contents": [
            { "@type": "Telemetry", "name": "temperature", "schema": "double" }
        ]
    }))
    .unwrap()
}

/// Expanded document built from already rendered model documents.
pub(crate) fn expanded_document(models: &[String]) -> String {
    format!("[\n{}\n]", models.join(",\n"))
}

pub(crate) fn relative_path(id: &str, expanded: bool) -> String {
    Dtmi::parse(id).unwrap().relative_path(expanded)
}

/// Model repository laid out in a temporary directory.
pub(crate) struct LocalRepository {
    dir: TempDir,
}

impl LocalRepository {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn add_model(&self, id: &str, document: &str) -> &Self {
        self.write(&relative_path(id, false), document)
    }

    pub(crate) fn add_expanded(&self, id: &str, document: &str) -> &Self {
        self.write(&relative_path(id, true), document)
    }

    fn write(&self, relative: &str, document: &str) -> &Self {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, document).unwrap();
        self
    }

    pub(crate) fn client(&self, mode: ResolutionMode) -> ModelsRepositoryClient {
        let options = ClientOptions::default()
            .with_repository_endpoint(self.dir.path().to_string_lossy())
            .with_dependency_resolution(mode);
        ModelsRepositoryClient::with_options(options).expect("Failed to create client")
    }
}

#[derive(Clone)]
pub(crate) enum Route {
    Respond(u16, String),
    Hang,
}

/// HTTP model repository served from memory on a loopback port.
pub(crate) struct HttpRepository {
    base_url: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl HttpRepository {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let base_url = format!("http://{}/repo", listener.local_addr().unwrap());

        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
        let requests: Arc<Mutex<Vec<String>>> = Arc::default();

        let (served_routes, served_requests) = (Arc::clone(&routes), Arc::clone(&requests));
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&served_routes);
                let requests = Arc::clone(&served_requests);
                tokio::spawn(serve(stream, routes, requests));
            }
        });

        Self {
            base_url,
            routes,
            requests,
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn route(&self, id: &str, expanded: bool, route: Route) -> &Self {
        let path = format!("/repo/{}", relative_path(id, expanded));
        self.routes.lock().unwrap().insert(path, route);
        self
    }

    pub(crate) fn add_model(&self, id: &str, document: &str) -> &Self {
        self.route(id, false, Route::Respond(200, document.to_string()))
    }

    pub(crate) fn add_expanded(&self, id: &str, document: &str) -> &Self {
        self.route(id, true, Route::Respond(200, document.to_string()))
    }

    /// Request paths relative to the repository base, in arrival order.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.trim_start_matches("/repo/").to_string())
            .collect()
    }

    pub(crate) fn client(&self, mode: ResolutionMode) -> ModelsRepositoryClient {
        let options = ClientOptions::default()
            .with_repository_endpoint(self.base_url.clone())
            .with_dependency_resolution(mode);
        ModelsRepositoryClient::with_options(options).expect("Failed to create client")
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buffer);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    requests.lock().unwrap().push(path.clone());

    let route = routes
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or(Route::Respond(404, String::new()));

    let (status, body) = match route {
        Route::Respond(status, body) => (status, body),
        Route::Hang => {
            std::future::pending::<()>().await;
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}
