use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bare_http::codec::{LineDecoder, ResponseEncoder, parse_request};
use bare_http::connection::HttpConnection;
use bare_http::handler::{HandlerError, make_handler};
use bare_http::protocol::{HeaderMap, Request, Response, ResponseHead};
use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use http::StatusCode;
use tokio::io::AsyncWrite;
use tokio::runtime::Runtime;
use tokio_util::codec::{Decoder, Encoder};

const CURL_REQUEST: &[u8] =
    b"GET /static/index.html HTTP/1.1\r\nHost: 127.0.0.1:9000\r\nUser-Agent: curl/7.79.1\r\nAccept: */*\r\n\r\n";

/// Swallows everything written to it.
struct NullWriter;

impl AsyncWrite for NullWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

async fn hello_handler(_req: Request) -> Result<Response, HandlerError> {
    Ok(Response::text(StatusCode::OK, "Hello World!"))
}

fn bench_line_decoder(c: &mut Criterion) {
    c.bench_function("decode_header_lines", |b| {
        b.iter(|| {
            let mut decoder = LineDecoder::new();
            let mut bytes = BytesMut::from(CURL_REQUEST);
            while let Some(line) = decoder.decode(&mut bytes).unwrap() {
                if line.is_empty() {
                    break;
                }
                black_box(line);
            }
        });
    });
}

fn bench_parse_request(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();

    c.bench_function("parse_simple_request", |b| {
        b.to_async(&runtime).iter(|| async { black_box(parse_request(CURL_REQUEST).await.unwrap()) });
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    let headers: HeaderMap = [("content-type", "text/plain"), ("date", "Tue, 14 Oct 2025 08:00:00 GMT")].into_iter().collect();

    c.bench_function("encode_response_head", |b| {
        b.iter(|| {
            let mut bytes = BytesMut::new();
            let head = ResponseHead { status: StatusCode::OK, headers: headers.clone() };
            ResponseEncoder::new().encode((head, 12), &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let handler = make_handler(hello_handler);
    let handler = &handler;

    c.bench_function("process_simple_request", |b| {
        b.to_async(&runtime).iter(|| async move {
            let mut writer = NullWriter;
            HttpConnection::new(CURL_REQUEST, &mut writer).process(handler).await.unwrap();
        });
    });
}

criterion_group!(benches, bench_line_decoder, bench_parse_request, bench_response_encoder, bench_http_connection);
criterion_main!(benches);
