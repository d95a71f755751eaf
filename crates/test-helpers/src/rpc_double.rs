// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Canned answers for the three read methods the client uses.
pub struct RpcScript {
    /// Hex return data for any eth_call
    pub call_result: String,
    pub block_number: String,
    /// Body for eth_getTransactionReceipt; null means "not mined yet"
    pub receipt: Value,
}

impl Default for RpcScript {
    fn default() -> Self {
        Self {
            call_result: abi_bool(true),
            block_number: "0x10".to_string(),
            receipt: Value::Null,
        }
    }
}

/// 32-byte ABI encoding of a bool return value.
pub fn abi_bool(value: bool) -> String {
    let mut word = "0".repeat(63);
    word.push(if value { '1' } else { '0' });
    format!("0x{word}")
}

struct RpcState {
    script: RpcScript,
    calls: u32,
    receipt_polls: u32,
}

/// In-process JSON-RPC double for a public read endpoint.
pub struct RpcDouble {
    pub url: String,
    state: Arc<Mutex<RpcState>>,
    handle: actix_web::dev::ServerHandle,
}

impl RpcDouble {
    pub async fn spawn(script: RpcScript) -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(RpcState {
            script,
            calls: 0,
            receipt_polls: 0,
        }));

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .route("/", web::post().to(rpc))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))?;

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);

        Ok(Self {
            url: format!("http://{addr}"),
            state,
            handle,
        })
    }

    /// Number of eth_call requests served
    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls
    }

    /// Number of eth_getTransactionReceipt requests served
    pub fn receipt_polls(&self) -> u32 {
        self.state.lock().unwrap().receipt_polls
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

async fn rpc(state: web::Data<Arc<Mutex<RpcState>>>, body: web::Json<Value>) -> HttpResponse {
    let id = body.get("id").cloned().unwrap_or(Value::from(1));
    let method = body
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut state = state.lock().unwrap();
    let result = match method.as_str() {
        "eth_call" => {
            state.calls += 1;
            Value::from(state.script.call_result.clone())
        }
        "eth_blockNumber" => Value::from(state.script.block_number.clone()),
        "eth_getTransactionReceipt" => {
            state.receipt_polls += 1;
            state.script.receipt.clone()
        }
        _ => Value::Null,
    };

    HttpResponse::Ok().json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    }))
}
