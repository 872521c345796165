//! Connection target derived from a page origin.

use std::fmt;

use url::Url;

use super::SubscriberError;
use crate::protocol::{DEFAULT_ENGINE_PATH, DEFAULT_NAMESPACE, ENGINE_IO_VERSION};

/// Host/port/path tuple a [`super::Connection`] targets.
///
/// `path` is the Socket.IO namespace (the `/` in `http://host:port/`),
/// `engine_path` the server mount point of the Engine.IO transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Whether the origin was `https`.
    pub secure: bool,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Namespace path, `/` by default.
    pub path: String,
    /// Engine.IO mount path, `/socket.io/` by default.
    pub engine_path: String,
}

impl Endpoint {
    /// Builds an endpoint from an origin such as `http://10.0.0.1:5000`.
    ///
    /// A path on the origin selects the namespace; an empty path maps to `/`.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError::InvalidOrigin`] if the origin does not
    /// parse, is not `http`/`https`/`ws`/`wss`, or has no host.
    pub fn from_origin(origin: &str) -> Result<Self, SubscriberError> {
        let invalid = |reason: String| SubscriberError::InvalidOrigin {
            origin: origin.to_string(),
            reason,
        };

        let url = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
        let secure = match url.scheme() {
            "http" | "ws" => false,
            "https" | "wss" => true,
            other => return Err(invalid(format!("unsupported scheme {other}"))),
        };
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port".to_string()))?;
        let path = match url.path() {
            "" => DEFAULT_NAMESPACE.to_string(),
            p => p.to_string(),
        };

        Ok(Self {
            secure,
            host,
            port,
            path,
            engine_path: DEFAULT_ENGINE_PATH.to_string(),
        })
    }

    /// Overrides the namespace path.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.path = namespace.into();
        self
    }

    /// Overrides the Engine.IO mount path.
    #[must_use]
    pub fn with_engine_path(mut self, engine_path: impl Into<String>) -> Self {
        self.engine_path = engine_path.into();
        self
    }

    /// Socket.IO namespace, with the trailing slash of sub-namespaces removed.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self.path.trim_end_matches('/') {
            "" => DEFAULT_NAMESPACE,
            ns => ns,
        }
    }

    /// WebSocket URL of the Engine.IO transport.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut engine_path = self.engine_path.clone();
        if !engine_path.starts_with('/') {
            engine_path.insert(0, '/');
        }
        if !engine_path.ends_with('/') {
            engine_path.push('/');
        }
        format!(
            "{scheme}://{}:{}{engine_path}?EIO={ENGINE_IO_VERSION}&transport=websocket",
            self.host, self.port
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "https" } else { "http" };
        write!(f, "{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn origin_with_port() {
        let Ok(ep) = Endpoint::from_origin("http://192.168.0.10:5000") else {
            panic!("valid origin");
        };
        assert_eq!(ep.host, "192.168.0.10");
        assert_eq!(ep.port, 5000);
        assert_eq!(ep.path, "/");
        assert_eq!(ep.namespace(), "/");
        assert_eq!(
            ep.websocket_url(),
            "ws://192.168.0.10:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn default_ports_follow_scheme() {
        let Ok(plain) = Endpoint::from_origin("http://dashboard.local") else {
            panic!("valid origin");
        };
        assert_eq!(plain.port, 80);
        let Ok(tls) = Endpoint::from_origin("https://dashboard.local/") else {
            panic!("valid origin");
        };
        assert_eq!(tls.port, 443);
        assert!(tls.websocket_url().starts_with("wss://dashboard.local:443/"));
    }

    #[test]
    fn path_selects_namespace() {
        let Ok(ep) = Endpoint::from_origin("http://localhost:5000/admin/") else {
            panic!("valid origin");
        };
        assert_eq!(ep.namespace(), "/admin");
        assert_eq!(ep.to_string(), "http://localhost:5000/admin/");
    }

    #[test]
    fn engine_path_is_normalized() {
        let Ok(ep) = Endpoint::from_origin("http://localhost:5000") else {
            panic!("valid origin");
        };
        let ep = ep.with_engine_path("rt");
        assert_eq!(
            ep.websocket_url(),
            "ws://localhost:5000/rt/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn rejects_bad_origins() {
        assert!(matches!(
            Endpoint::from_origin("not a url"),
            Err(SubscriberError::InvalidOrigin { .. })
        ));
        assert!(matches!(
            Endpoint::from_origin("ftp://host:21"),
            Err(SubscriberError::InvalidOrigin { .. })
        ));
    }
}
