//! # Transport Kinds
//!
//! Closed set of connection kinds to a chain's RPC endpoint.
//!
//! Every resolved chain carries at most one URL per transport, and the
//! connection cache keys client handles by (chain, transport), so the two
//! kinds never share a handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection kind to a chain's RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Transport {
    /// HTTP(S) JSON-RPC endpoint.
    #[default]
    #[serde(rename = "http")]
    Http,
    /// WebSocket JSON-RPC endpoint.
    #[serde(rename = "ws")]
    WebSocket,
}

impl Transport {
    /// Returns the transport name as used in endpoint specifications.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::WebSocket => "ws",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn transport_default_is_http() {
        assert_eq!(Transport::default(), Transport::Http);
    }

    #[test]
    fn transport_display() {
        assert_eq!(Transport::Http.to_string(), "http");
        assert_eq!(Transport::WebSocket.to_string(), "ws");
    }

    #[test]
    fn transport_serde_names_match_endpoint_fields() {
        assert_eq!(serde_json::to_string(&Transport::Http).unwrap(), "\"http\"");
        assert_eq!(
            serde_json::to_string(&Transport::WebSocket).unwrap(),
            "\"ws\""
        );
        let ws: Transport = serde_json::from_str("\"ws\"").unwrap();
        assert_eq!(ws, Transport::WebSocket);
    }
}
