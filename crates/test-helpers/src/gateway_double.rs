// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix_web::{web, App, HttpResponse, HttpServer};
use std::sync::{Arc, Mutex};

/// What the double should serve, in order: `error_rounds` 500s, then
/// `not_ready_rounds` 404s, then the payload (or 404 forever without one).
pub struct GatewayScript {
    pub error_rounds: u32,
    pub not_ready_rounds: u32,
    pub payload: Option<serde_json::Value>,
    pub public_key: String,
}

impl GatewayScript {
    pub fn ready_after(not_ready_rounds: u32, plaintext: &str) -> Self {
        Self {
            error_rounds: 0,
            not_ready_rounds,
            payload: Some(serde_json::json!({
                "handle": "0x01",
                "plaintext": plaintext,
            })),
            public_key: well_formed_gateway_key(),
        }
    }

    pub fn never_ready() -> Self {
        Self {
            error_rounds: 0,
            not_ready_rounds: 0,
            payload: None,
            public_key: well_formed_gateway_key(),
        }
    }
}

pub fn well_formed_gateway_key() -> String {
    format!("0x04{}", "ab".repeat(63))
}

struct ScriptState {
    script: GatewayScript,
    decrypt_hits: u32,
}

/// In-process HTTP double for the decryption gateway. Serves `/decrypt`
/// and `/public-key` on a random local port.
pub struct GatewayDouble {
    pub base_url: String,
    state: Arc<Mutex<ScriptState>>,
    handle: actix_web::dev::ServerHandle,
}

impl GatewayDouble {
    pub async fn spawn(script: GatewayScript) -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(ScriptState {
            script,
            decrypt_hits: 0,
        }));

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .route("/decrypt", web::post().to(decrypt))
                .route("/public-key", web::get().to(public_key))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))?;

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        })
    }

    pub fn decrypt_hits(&self) -> u32 {
        self.state.lock().unwrap().decrypt_hits
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

async fn decrypt(state: web::Data<Arc<Mutex<ScriptState>>>) -> HttpResponse {
    let mut state = state.lock().unwrap();
    state.decrypt_hits += 1;

    if state.script.error_rounds > 0 {
        state.script.error_rounds -= 1;
        return HttpResponse::InternalServerError().body("gateway overloaded");
    }
    if state.script.not_ready_rounds > 0 {
        state.script.not_ready_rounds -= 1;
        return HttpResponse::NotFound().body("decryption not ready");
    }

    match &state.script.payload {
        Some(payload) => HttpResponse::Ok().json(payload),
        None => HttpResponse::NotFound().body("decryption not ready"),
    }
}

async fn public_key(state: web::Data<Arc<Mutex<ScriptState>>>) -> HttpResponse {
    let key = state.lock().unwrap().script.public_key.clone();
    HttpResponse::Ok().content_type("text/plain").body(key)
}
