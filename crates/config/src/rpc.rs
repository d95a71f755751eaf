// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcProtocol {
    Http,
    Https,
}

impl RpcProtocol {
    pub fn is_secure(&self) -> bool {
        matches!(self, RpcProtocol::Https)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RpcProtocol::Http => "http",
            RpcProtocol::Https => "https",
        }
    }
}

/// A validated HTTP JSON-RPC endpoint. Reads fan out over an ordered list of
/// these rather than going through the connected wallet's provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RPC {
    protocol: RpcProtocol,
    url: Url,
}

impl RPC {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context("Invalid URL format")?;
        let protocol = match parsed.scheme() {
            "http" => RpcProtocol::Http,
            "https" => RpcProtocol::Https,
            _ => bail!("Invalid protocol. Expected: http:// or https://"),
        };

        if parsed.host_str().is_none() {
            bail!("URL must contain a host");
        }

        Ok(RPC {
            protocol,
            url: parsed,
        })
    }

    pub fn protocol(&self) -> RpcProtocol {
        self.protocol
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        // Safe: validated in from_url() - http(s) schemes always require a host
        self.url.host_str().expect("RPC URL always has a host")
    }

    pub fn as_http_url(&self) -> String {
        self.url.to_string()
    }

    pub fn is_secure(&self) -> bool {
        self.protocol.is_secure()
    }

    pub fn is_local(&self) -> bool {
        match self.hostname() {
            "localhost" | "127.0.0.1" | "::1" => true,
            host => host.starts_with("127."), // 127.0.0.0/8 is all loopback
        }
    }
}

#[derive(Debug, Hash, Eq, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "credentials")]
pub enum RpcAuth {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

impl Default for RpcAuth {
    fn default() -> Self {
        RpcAuth::None
    }
}
