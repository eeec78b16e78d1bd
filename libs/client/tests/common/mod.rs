#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use encore_client::{Client, ClientConfig};
use encore_fabric::transport::{MemoryTransport, Transport};
use encore_fabric::Result as FabricResult;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

/// Server end of an in-memory connection, driven step by step by a test
pub struct FakeServer {
    transport: MemoryTransport,
}

impl FakeServer {
    /// Next call sent by the client, as JSON
    pub async fn next_call(&mut self) -> Value {
        let bytes = tokio::time::timeout(Duration::from_secs(5), self.transport.receive())
            .await
            .expect("client sent nothing")
            .expect("transport closed");
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn reply(&mut self, id: &Value, result: Value) {
        self.send(json!({"jsonrpc": "2.0", "id": id, "result": result}))
            .await;
    }

    pub async fn reply_error(&mut self, id: &Value, code: i64, message: &str) {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": code, "message": message}
        }))
        .await;
    }

    pub async fn send(&mut self, message: Value) {
        self.send_raw(&serde_json::to_vec(&message).unwrap()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.transport.send(bytes).await.unwrap();
    }

    pub async fn close(mut self) {
        self.transport.close().await.unwrap();
    }

    /// Answer every call with `answer(method, params)` until the client goes away
    pub fn respond_with<F>(mut self, answer: F) -> JoinHandle<()>
    where
        F: Fn(&str, &Value) -> Value + Send + 'static,
    {
        tokio::spawn(async move {
            while let Ok(bytes) = self.transport.receive().await {
                let call: Value = serde_json::from_slice(&bytes).unwrap();
                let method = call["method"].as_str().unwrap_or_default().to_string();
                let result = answer(&method, &call["params"]);
                self.reply(&call["id"], result).await;
            }
        })
    }

    /// Like `respond_with`, also recording every `(method, params)` received
    pub fn record(self, answer: fn(&str) -> Value) -> Arc<Mutex<Vec<(String, Value)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&log);
        self.respond_with(move |method, params| {
            seen.lock().unwrap().push((method.to_string(), params.clone()));
            answer(method)
        });
        log
    }
}

/// Client end whose `close` takes `delay` before closing the wrapped end
pub struct LingeringClose {
    inner: MemoryTransport,
    delay: Duration,
}

#[async_trait::async_trait]
impl Transport for LingeringClose {
    async fn send(&mut self, bytes: &[u8]) -> FabricResult<()> {
        self.inner.send(bytes).await
    }

    async fn receive(&mut self) -> FabricResult<Vec<u8>> {
        self.inner.receive().await
    }

    async fn close(&mut self) -> FabricResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.close().await
    }
}

/// Connect `client` to a fresh fake server
pub async fn attach(client: &Client) -> FakeServer {
    let (client_end, server_end) = MemoryTransport::pair();
    client.connect_transport(client_end).await.unwrap();
    FakeServer {
        transport: server_end,
    }
}

/// Like `attach`, but closing the client end takes `delay`
pub async fn attach_lingering(client: &Client, delay: Duration) -> FakeServer {
    let (client_end, server_end) = MemoryTransport::pair();
    client
        .connect_transport(LingeringClose {
            inner: client_end,
            delay,
        })
        .await
        .unwrap();
    FakeServer {
        transport: server_end,
    }
}

/// A client connected to a fresh fake server
pub async fn connected(config: ClientConfig) -> (Client, FakeServer) {
    let client = Client::new(config);
    let server = attach(&client).await;
    (client, server)
}

/// Poll `condition` until it holds or a second has passed
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
