use std::path::Path;

use mime::Mime;

/// Maps a file path to its `(content type, encoding)`.
///
/// Either half may be unknown. Implemented for any matching closure or
/// function, [`guess_content_type`] included.
pub trait ContentTypeGuesser: Send + Sync {
    fn guess(&self, path: &Path) -> (Option<String>, Option<String>);
}

impl<F> ContentTypeGuesser for F
where
    F: Fn(&Path) -> (Option<String>, Option<String>) + Send + Sync,
{
    fn guess(&self, path: &Path) -> (Option<String>, Option<String>) {
        self(path)
    }
}

/// Guesses from the file extension.
///
/// A trailing compression suffix is reported as the encoding and the type
/// comes from the extension before it, so `app.js.gz` is
/// `(text/javascript, gzip)`.
pub fn guess_content_type(path: &Path) -> (Option<String>, Option<String>) {
    let encoding = extension(path).and_then(|ext| encoding_for_extension(&ext));

    let typed_path = match encoding {
        Some(_) => path.file_stem().map(Path::new),
        None => Some(path),
    };
    let content_type = typed_path.and_then(extension).and_then(|ext| mime_for_extension(&ext)).map(|mime| mime.to_string());

    (content_type, encoding.map(str::to_string))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase)
}

fn encoding_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "gz" => Some("gzip"),
        "bz2" => Some("bzip2"),
        "xz" => Some("xz"),
        "br" => Some("br"),
        "z" => Some("compress"),
        _ => None,
    }
}

fn mime_for_extension(ext: &str) -> Option<Mime> {
    let mime = match ext {
        "html" | "htm" => mime::TEXT_HTML,
        "css" => mime::TEXT_CSS,
        "js" | "mjs" => mime::TEXT_JAVASCRIPT,
        "txt" | "text" | "log" => mime::TEXT_PLAIN,
        "csv" => mime::TEXT_CSV,
        "xml" => mime::TEXT_XML,
        "json" => mime::APPLICATION_JSON,
        "pdf" => mime::APPLICATION_PDF,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "woff" => mime::FONT_WOFF,
        "woff2" => mime::FONT_WOFF2,
        "bin" => mime::APPLICATION_OCTET_STREAM,
        other => return mime_without_constant(other),
    };
    Some(mime)
}

fn mime_without_constant(ext: &str) -> Option<Mime> {
    let essence = match ext {
        "ico" => "image/vnd.microsoft.icon",
        "webp" => "image/webp",
        "wasm" => "application/wasm",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "tar" => "application/x-tar",
        "zip" => "application/zip",
        "md" => "text/markdown",
        _ => return None,
    };
    essence.parse().ok()
}
