use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubResponse {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.into(),
        }
    }

    pub fn error(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: "stub error".to_owned(),
        }
    }
}

/// Local HTTP server whose routes can be swapped while it runs.
pub struct ComicStub {
    pub base_url: String,
    routes: Arc<Mutex<HashMap<String, StubResponse>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ComicStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start comic stub server");
        let base_url = format!("http://{}", server.server_addr());
        let routes: Arc<Mutex<HashMap<String, StubResponse>>> = Arc::default();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let thread_routes = Arc::clone(&routes);

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().split('?').next().unwrap_or("/").to_owned();
                let route = thread_routes
                    .lock()
                    .expect("lock stub routes")
                    .get(&path)
                    .cloned();
                let Some(route) = route else {
                    let _ = request
                        .respond(tiny_http::Response::from_string("not found").with_status_code(404));
                    continue;
                };

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    route.content_type.as_bytes(),
                )
                .expect("build header");
                let response = tiny_http::Response::from_string(route.body)
                    .with_status_code(route.status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            routes,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn set(&self, path: &str, response: StubResponse) {
        self.routes
            .lock()
            .expect("lock stub routes")
            .insert(path.to_owned(), response);
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for ComicStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[allow(dead_code)]
pub struct Chapter<'a> {
    pub title: &'a str,
    pub href: &'a str,
    pub date: &'a str,
}

/// Index page in the markup the fetcher selects against.
#[allow(dead_code)]
pub fn index_page(series: &str, chapters: &[Chapter<'_>]) -> String {
    let mut out = String::new();
    out.push_str("<!doctype html>\n<html>\n<body>\n");
    out.push_str(&format!("<h2>{series}</h2>\n<ul>\n"));
    for chapter in chapters {
        out.push_str(&format!(
            "<li><h5 class=\"chapter-title-rtl\"><a href=\"{}\">{}</a></h5>\
             <div class=\"date-chapter-title-rtl\">{}</div></li>\n",
            chapter.href, chapter.title, chapter.date
        ));
    }
    out.push_str("</ul>\n</body>\n</html>\n");
    out
}
