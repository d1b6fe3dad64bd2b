use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{HostId, InterfaceId};

/// How a task is reachable from the outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum NetworkAttachment {
    /// The task owns an elastic network interface; its public address is
    /// associated once provisioning finishes.
    Interface {
        #[serde(skip_serializing_if = "Option::is_none")]
        interface_id: Option<InterfaceId>,
    },
    /// The task publishes a port on the host carrying it.
    HostBinding { host_id: HostId, host_port: u16 },
}

/// Public address and port a requester can connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Render as an `http://` URL with an optional path/query suffix.
    pub fn url(&self, suffix: &str) -> String {
        format!("http://{}:{}{}", self.address, self.port, suffix)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_appends_suffix_verbatim() {
        let ep = Endpoint::new("203.0.113.7", 8888);
        assert_eq!(ep.url(""), "http://203.0.113.7:8888");
        assert_eq!(ep.url("/lab?token=abc"), "http://203.0.113.7:8888/lab?token=abc");
    }
}
