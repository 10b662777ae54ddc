//! Plain HTTP forwarding.
//!
//! The inbound method, headers and body are mirrored onto one outbound
//! request against the selected target. The backend's status, headers and
//! body are then streamed back unchanged. Neither body is buffered.

use axum::{
    body::{Body, HttpBody},
    http::{header::HOST, request::Parts, HeaderMap, Request},
    response::Response,
};
use futures_util::TryStreamExt;
use tracing::{Instrument, Span};
use url::Url;

use crate::http::error::ForwardError;
use crate::load_balancer::Target;
use crate::observability::SpanHook;

/// Forward one request to `target` and relay whatever comes back.
///
/// Backend status codes, including 4xx and 5xx, are passed through as-is.
/// Only transport failures and redirect overflow surface as errors.
pub async fn forward_request(
    client: &reqwest::Client,
    hook: &dyn SpanHook,
    target: &Target,
    request: Request<Body>,
) -> Result<Response, ForwardError> {
    let (parts, body) = request.into_parts();
    let url = outbound_url(target, &parts)?;

    let attempt = hook.begin_attempt(&Span::current(), &url);
    let outbound = mirror_request(client, &parts, body, url.clone());

    match outbound.send().instrument(attempt.clone()).await {
        Ok(upstream) => {
            hook.end_attempt(attempt, Some(upstream.status()));
            relay_response(upstream, url)
        }
        Err(e) => {
            hook.end_attempt(attempt, None);
            Err(e.into())
        }
    }
}

/// Target base URL plus the inbound path and query.
pub(crate) fn outbound_url(target: &Target, parts: &Parts) -> Result<Url, url::ParseError> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    target.join(path_and_query)
}

/// Build an outbound request carrying the inbound method, headers and body.
///
/// An inbound body that is already finished (no payload on the wire) is
/// not attached. Framing headers are not consulted: HTTP/2 requests carry
/// neither `Content-Length` nor `Transfer-Encoding` when streaming.
pub(crate) fn mirror_request(
    client: &reqwest::Client,
    parts: &Parts,
    body: Body,
    url: Url,
) -> reqwest::RequestBuilder {
    let builder = client
        .request(parts.method.clone(), url)
        .headers(copy_headers(&parts.headers));

    if body.is_end_stream() {
        builder
    } else {
        builder.body(reqwest::Body::wrap_stream(body.into_data_stream()))
    }
}

/// Copy every header value, repeated names included.
///
/// `Host` is left out; the client derives it from the target URL.
pub fn copy_headers(source: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if name == HOST {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn relay_response(upstream: reqwest::Response, url: Url) -> Result<Response, ForwardError> {
    let mut builder = Response::builder().status(upstream.status());
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in upstream.headers() {
            headers.append(name.clone(), value.clone());
        }
    }

    let body = upstream.bytes_stream().inspect_err(move |e| {
        tracing::warn!(target = %url, error = %e, "Response body relay failed");
    });
    Ok(builder.body(Body::from_stream(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn copy_headers_keeps_repeats_and_drops_host() {
        let mut source = HeaderMap::new();
        source.insert(HOST, HeaderValue::from_static("proxy.local"));
        source.append("x-multi", HeaderValue::from_static("one"));
        source.append("x-multi", HeaderValue::from_static("two"));
        source.insert("x-test", HeaderValue::from_static("value"));

        let copied = copy_headers(&source);
        assert!(copied.get(HOST).is_none());
        assert_eq!(copied.get("x-test").unwrap(), "value");
        let multi: Vec<_> = copied.get_all("x-multi").iter().collect();
        assert_eq!(multi, ["one", "two"]);
    }

    #[test]
    fn outbound_url_keeps_path_and_query() {
        let target = Target::parse("http://backend:9000").unwrap();
        let (parts, _) = Request::builder()
            .uri("/a/b?c=d&e=f")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(
            outbound_url(&target, &parts).unwrap().as_str(),
            "http://backend:9000/a/b?c=d&e=f"
        );
    }

    #[test]
    fn finished_bodies_are_not_attached() {
        let client = reqwest::Client::new();
        let url = Url::parse("http://backend:9000/x").unwrap();
        let (parts, _) = Request::builder().method("POST").uri("/x").body(()).unwrap().into_parts();

        let empty = mirror_request(&client, &parts, Body::empty(), url.clone())
            .build()
            .unwrap();
        assert!(empty.body().is_none());

        let full = mirror_request(&client, &parts, Body::from("payload"), url)
            .build()
            .unwrap();
        assert!(full.body().is_some());
    }
}
