//! Serving files from a directory.
//!
//! [`StaticFiles`] maps the request path onto a root directory and streams
//! the file it finds. Paths are normalized lexically before anything
//! touches the disk, and anything that normalizes to outside the root is
//! answered like a missing file.

mod content_type;

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bare_http::handler::{Handler, HandlerError};
use bare_http::protocol::{Request, Response, ResponseBody};
use http::header::{ALLOW, CONTENT_TYPE};
use tokio::fs::File;
use tracing::{debug, warn};

pub use content_type::{ContentTypeGuesser, guess_content_type};

/// Served for `/` and for an empty path.
const INDEX_FILE: &str = "index.html";

/// Handler serving `GET` requests from a root directory.
pub struct StaticFiles {
    root: PathBuf,
    guesser: Box<dyn ContentTypeGuesser>,
}

/// Serves files under `root_directory`.
pub fn make_static_handler(root_directory: impl AsRef<Path>) -> StaticFiles {
    StaticFiles::new(root_directory)
}

impl StaticFiles {
    pub fn new(root_directory: impl AsRef<Path>) -> Self {
        let root = root_directory.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self { root: normalize(&root), guesser: Box::new(guess_content_type) }
    }

    /// Replaces the extension-based content type lookup.
    pub fn with_content_type(mut self, guesser: impl ContentTypeGuesser + 'static) -> Self {
        self.guesser = Box::new(guesser);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `request_path` points under the root, or `None` if it escapes it.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let path = request_path.split(['?', '#']).next().unwrap_or_default();
        let relative = match path.trim_start_matches('/') {
            "" => INDEX_FILE,
            relative => relative,
        };

        let resolved = normalize(&self.root.join(relative));
        resolved.starts_with(&self.root).then_some(resolved)
    }

    fn content_type(&self, path: &Path) -> String {
        let (content_type, encoding) = self.guesser.guess(path);
        let content_type = content_type.unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        match encoding {
            Some(encoding) => format!("{content_type}; charset={encoding}"),
            None => content_type,
        }
    }

    async fn open(&self, path: &Path) -> io::Result<Option<(File, u64)>> {
        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(e),
        };

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some((file, metadata.len())))
    }
}

#[async_trait]
impl Handler for StaticFiles {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        if req.method() != http::Method::GET.as_str() {
            let mut response = Response::method_not_allowed();
            response.headers_mut().set(ALLOW.as_str(), http::Method::GET.as_str());
            return Ok(response);
        }

        let Some(path) = self.resolve(req.path()) else {
            warn!(path = req.path(), "refusing path outside static root");
            return Ok(Response::not_found());
        };

        let Some((file, length)) = self.open(&path).await? else {
            debug!(path = %path.display(), "static file not found");
            return Ok(Response::not_found());
        };

        debug!(path = %path.display(), length, "serving static file");
        Ok(Response::builder().header(CONTENT_TYPE.as_str(), self.content_type(&path)).body(ResponseBody::file(file, length)))
    }
}

impl std::fmt::Debug for StaticFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFiles").field("root", &self.root).finish_non_exhaustive()
    }
}

fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput)
}

/// Resolves `.` and `..` without consulting the filesystem. `..` at the
/// top of an absolute path stays at the top.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use bare_http::protocol::HeaderMap;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// A throwaway directory tree, removed on drop.
    struct Scratch {
        dir: PathBuf,
    }

    impl Scratch {
        fn new() -> Self {
            let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!("bare-web-static-{}-{n}", std::process::id()));
            std::fs::create_dir_all(dir.join("public/docs")).unwrap();
            std::fs::write(dir.join("public/index.html"), "<h1>hi</h1>").unwrap();
            std::fs::write(dir.join("public/docs/guide.txt"), "read me").unwrap();
            std::fs::write(dir.join("public/archive.tar.gz"), [0x1f_u8, 0x8b]).unwrap();
            std::fs::write(dir.join("secret.txt"), "outside the root").unwrap();
            Self { dir }
        }

        fn root(&self) -> PathBuf {
            self.dir.join("public")
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    async fn get(handler: &StaticFiles, path: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = handler.call(Request::builder().path(path).build()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        let mut wire = Vec::new();
        response.send(&mut wire).await.unwrap();
        let body_start = wire.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        (status, headers, wire.split_off(body_start))
    }

    #[tokio::test]
    async fn root_serves_index() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root());

        for path in ["/", ""] {
            let (status, headers, body) = get(&handler, path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers.get("content-type"), Some("text/html"));
            assert_eq!(body, b"<h1>hi</h1>");
        }
    }

    #[tokio::test]
    async fn nested_file_and_query_string() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root());

        let (status, headers, body) = get(&handler, "/docs/guide.txt?version=2#top").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(body, b"read me");
    }

    #[tokio::test]
    async fn missing_file_and_directory_are_404() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root());

        for path in ["/missing.txt", "/docs", "/docs/", "/index.html/nope"] {
            let (status, _, body) = get(&handler, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body, b"Not found");
        }
    }

    #[tokio::test]
    async fn traversal_is_404() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root());

        for path in ["/../secret.txt", "/docs/../../secret.txt", "/../../etc/passwd", "/./../public/../secret.txt"] {
            assert!(handler.resolve(path).is_none(), "{path} must not resolve");
            let (status, _, body) = get(&handler, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body, b"Not found");
        }

        let (status, _, _) = get(&handler, "/docs/../index.html").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn root_is_matched_by_component() {
        let handler = make_static_handler("/srv/www");
        assert!(handler.resolve("/../www-private/key").is_none());
        assert_eq!(handler.resolve("/a/./b/../c.txt"), Some(PathBuf::from("/srv/www/a/c.txt")));
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let handler = make_static_handler("./site/../public");
        assert!(handler.root().is_absolute());
        assert!(handler.root().ends_with("public"));
    }

    #[tokio::test]
    async fn only_get_is_served() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root());

        let response = handler.call(Request::builder().method("POST").path("/index.html").build()).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get("allow"), Some("GET"));
    }

    #[tokio::test]
    async fn encoding_is_appended_as_charset() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root());

        let (_, headers, body) = get(&handler, "/archive.tar.gz").await;
        assert_eq!(headers.get("content-type"), Some("application/x-tar; charset=gzip"));
        assert_eq!(body, [0x1f_u8, 0x8b]);
    }

    #[tokio::test]
    async fn unknown_type_falls_back_to_octet_stream() {
        let scratch = Scratch::new();
        let handler = make_static_handler(scratch.root()).with_content_type(|_: &Path| (None::<String>, None::<String>));

        let (_, headers, _) = get(&handler, "/index.html").await;
        assert_eq!(headers.get("content-type"), Some("application/octet-stream"));
    }
}
