#[cfg(test)]
mod tests {
    use crate::framework::core::{BridgeConfig, BridgeError, ServerError};
    use crate::framework::runtime::{ChannelRuntime, ScriptStream, parse_script};
    use crate::server::{Listener, Responder};
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use hyper_util::client::legacy::Client as LegacyClient;
    use hyper_util::client::legacy::connect::HttpConnector;
    use hyper_util::rt::TokioExecutor;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    type TestClient = LegacyClient<HttpConnector, Full<Bytes>>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn local_config() -> BridgeConfig {
        BridgeConfig::new()
            .with_host("127.0.0.1")
            .with_port(0)
            .with_verbose(true)
            .with_timeout(Duration::from_secs(5))
    }

    fn client() -> TestClient {
        LegacyClient::builder(TokioExecutor::new()).build_http()
    }

    /// Consumer that answers every request with its own id, method and url
    fn spawn_echo_consumer(mut scripts: ScriptStream, responder: Responder) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(script) = scripts.next().await {
                let Some(call) = parse_script("sages", &script) else {
                    continue;
                };
                let request = call.request;
                let mut headers = HashMap::new();
                headers.insert("X-Request-Id".to_string(), request.id.to_string());
                let body = format!("{} {} {}", request.method, request.url, request.body);
                let _ = responder.respond(request.id, 200, headers, body);
            }
        })
    }

    fn echo_listener(config: BridgeConfig) -> Listener {
        let (runtime, scripts) = ChannelRuntime::new();
        let listener = Listener::new(config, Arc::new(runtime)).unwrap();
        spawn_echo_consumer(scripts, listener.responder());
        listener
    }

    async fn get(client: &TestClient, url: String) -> (StatusCode, HashMap<String, String>, String) {
        let req = Request::builder()
            .method(Method::GET)
            .uri(url)
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = timeout(Duration::from_secs(10), client.request(req))
            .await
            .expect("request should not hang")
            .expect("request should succeed");

        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap().to_string()))
            .collect();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        init_logging();
        let listener = echo_listener(local_config());

        let first = listener.create().await.unwrap();
        let second = listener.create().await.unwrap();

        assert_eq!(first, second);
        assert!(listener.is_running().await);
        assert_eq!(listener.local_addr().await.unwrap().to_string(), first);
        assert_ne!(listener.local_addr().await.unwrap().port(), 0);

        listener.destroy().await;
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let listener = echo_listener(local_config());

        // Never started
        listener.destroy().await;
        assert!(!listener.is_running().await);

        let addr = listener.create().await.unwrap();
        listener.destroy().await;
        listener.destroy().await;

        assert!(!listener.is_running().await);
        assert!(listener.local_addr().await.is_none());
        assert!(tokio::net::TcpStream::connect(&addr).await.is_err());
    }

    #[tokio::test]
    async fn test_restart_after_destroy() {
        let listener = echo_listener(local_config());
        let client = client();

        let addr = listener.create().await.unwrap();
        let (_, headers, _) = get(&client, format!("http://{}/one", addr)).await;
        assert_eq!(headers["x-request-id"], "0");
        listener.destroy().await;

        let addr = listener.create().await.unwrap();
        let (status, headers, _) = get(&client, format!("http://{}/two", addr)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["x-request-id"], "1", "ids keep counting across restarts");

        listener.destroy().await;
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        init_logging();
        let (runtime, mut scripts) = ChannelRuntime::new();
        let listener = Listener::new(local_config(), Arc::new(runtime)).unwrap();
        let responder = listener.responder();
        let addr = listener.create().await.unwrap();

        let consumer = tokio::spawn(async move {
            let script = scripts.next().await.unwrap();
            let call = parse_script("sages", &script).unwrap();
            let mut headers = HashMap::new();
            headers.insert("X-Reply".to_string(), "ok".to_string());
            responder.respond(call.request.id, 201, headers, "world").unwrap();
            call.request
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("http://{}/path?q=1", addr))
            .header("X-Test", "1")
            .body(Full::new(Bytes::from("hello")))
            .unwrap();
        let resp = client().request(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers().get("x-reply").unwrap(), "ok");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"world");

        let request = consumer.await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, format!("http://{}/path?q=1", addr));
        assert_eq!(request.headers["X-Test"], "1");
        assert_eq!(request.body, "hello");
        assert_eq!(listener.pending_requests(), 0);

        listener.destroy().await;
    }

    #[tokio::test]
    async fn test_timeout_returns_bad_gateway() {
        let config = local_config().with_timeout(Duration::from_millis(200));
        let listener = Listener::new(config, Arc::new(|_script: String| {})).unwrap();
        let responder = listener.responder();
        let addr = listener.create().await.unwrap();

        let started = Instant::now();
        let (status, _, body) = get(&client(), format!("http://{}/never", addr)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(listener.pending_requests(), 0);
        assert!(responder.respond(0, 200, HashMap::new(), "too late").is_err());

        listener.destroy().await;
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_distinct_ids() {
        let listener = echo_listener(local_config());
        let addr = listener.create().await.unwrap();
        let client = client();

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let client = client.clone();
                let url = format!("http://{}/req/{}", addr, i);
                tokio::spawn(async move { (i, get(&client, url).await) })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let (i, (status, headers, body)) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK);
            assert!(body.ends_with(&format!("/req/{} ", i)), "body {:?} belongs to request {}", body, i);
            assert!(ids.insert(headers["x-request-id"].clone()));
        }
        assert_eq!(ids.len(), 25);
        assert_eq!(listener.pending_requests(), 0);

        listener.destroy().await;
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let listener = echo_listener(local_config().with_port(port));
        let result = listener.create().await;

        assert!(matches!(
            result,
            Err(BridgeError::Server(ServerError::BindError(_)))
        ));
        assert!(!listener.is_running().await);
    }

    #[tokio::test]
    async fn test_destroy_waits_for_in_flight_request() {
        let (runtime, mut scripts) = ChannelRuntime::new();
        let listener = Arc::new(Listener::new(local_config(), Arc::new(runtime)).unwrap());
        let responder = listener.responder();
        let addr = listener.create().await.unwrap();

        let request = tokio::spawn(async move { get(&client(), format!("http://{}/slow", addr)).await });
        let call = parse_script("sages", &scripts.next().await.unwrap()).unwrap();

        let stopping = listener.clone();
        let destroy = tokio::spawn(async move { stopping.destroy().await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!destroy.is_finished(), "shutdown waits for the pending request");

        // Status queries do not block behind the drain.
        let running = timeout(Duration::from_millis(100), listener.is_running())
            .await
            .expect("is_running answers while draining");
        assert!(!running);
        assert!(timeout(Duration::from_millis(100), listener.local_addr()).await.unwrap().is_none());

        responder.respond(call.request.id, 200, HashMap::new(), "done").unwrap();

        let (status, _, body) = request.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "done");
        timeout(Duration::from_secs(5), destroy).await.unwrap().unwrap();
        assert!(!listener.is_running().await);
    }
}
