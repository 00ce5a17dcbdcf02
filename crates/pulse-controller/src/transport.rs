use std::borrow::Cow;
use std::time::Duration;

use reqwest::{Client, Url};

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Reads a resource.
    Get,
    /// Replaces the state of a resource.
    Put,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        })
    }
}

/// A request sent through a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Target path, either absolute or relative to the directory origin.
    pub path: String,
    /// Request payload.
    pub payload: Vec<u8>,
}

impl Request {
    /// Creates a [`Method::Get`] request.
    #[must_use]
    #[inline]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            payload: Vec::new(),
        }
    }

    /// Creates a [`Method::Put`] request with the given payload.
    #[must_use]
    #[inline]
    pub fn put(path: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            payload: payload.into(),
        }
    }
}

/// A response received through a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    code: u16,
    payload: Vec<u8>,
}

impl Response {
    /// Creates a [`Response`] from a status code and a payload.
    #[must_use]
    #[inline]
    pub fn new(code: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    /// Creates a successful [`Response`] with the given payload.
    #[must_use]
    #[inline]
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(200, payload)
    }

    /// Returns the status code.
    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Checks whether the status code reports a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the payload as text.
    ///
    /// Invalid UTF-8 sequences are replaced.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// A request/response service.
///
/// Encoding, retransmission and addressing belong to the implementor. A
/// transport must be usable through a shared reference, since the
/// requests of a stage are in flight at the same time.
pub trait Transport {
    /// Sends a request and waits for its response.
    ///
    /// # Errors
    ///
    /// Network failures or timeouts may prevent the request from being sent
    /// or the response from being received.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

fn config_error(error: impl Into<Cow<'static, str>>) -> Error {
    Error::new(ErrorKind::Config, error)
}

fn resolve_error(path: &str, error: impl std::fmt::Display) -> Error {
    Error::new(
        ErrorKind::Transport,
        format!("Impossible to resolve path `{path}`: {error}"),
    )
}

/// The proxy path used when the directory URI does not embed a target URI.
///
/// It is the default mapping of an HTTP-CoAP proxy (RFC 8075), which
/// forwards `<origin>/hc/<target URI>` to the target URI.
pub const DEFAULT_PROXY_PATH: &str = "/hc/";

// Schemes of the target URIs a proxied directory URI may embed.
const TARGET_SCHEMES: [&str; 2] = ["coap://", "coaps://"];

#[inline]
fn rooted(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// A [`Transport`] which sends requests over HTTP.
///
/// The directory URI decides how paths are resolved:
///
/// - a proxied directory URI embeds its target after the proxy path, as in
///   `http://proxy:8080/hc/coap://[2001:db8::1]/resource-lookup/`. Relative
///   paths are resolved against the embedded target, then sent through
///   the proxy.
/// - a plain directory URI, such as `http://[2001:db8::1]/resource-lookup/`,
///   resolves relative paths against its origin, so links such as
///   `sensors/accel` or `/sensors/accel` both address
///   `<origin>/sensors/accel`.
///
/// Absolute `http` and `https` links are sent as they are. Any other
/// absolute link, for example a `coap://` link returned by a resource
/// directory, is sent through the proxy prefix of a proxied directory URI,
/// or through [`DEFAULT_PROXY_PATH`] on the directory origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    origin: Url,
    proxy: String,
    upstream: Option<Url>,
}

impl HttpTransport {
    /// Creates an [`HttpTransport`] for the given directory URI.
    ///
    /// # Errors
    ///
    /// An error is returned if the directory URI is not an absolute `http`
    /// or `https` URI, if its embedded target URI is invalid, or if the
    /// HTTP client cannot be initialized.
    pub fn new(directory: &str, timeout: Duration) -> Result<Self> {
        let origin = Url::parse(directory)
            .map_err(|e| config_error(format!("Invalid directory URI `{directory}`: {e}")))?;

        if !matches!(origin.scheme(), "http" | "https") {
            return Err(config_error(format!(
                "Unsupported scheme `{}` for directory URI `{directory}`",
                origin.scheme()
            )));
        }

        let target_start = TARGET_SCHEMES
            .iter()
            .filter_map(|scheme| directory.find(scheme))
            .min();

        let (proxy, upstream) = match target_start {
            Some(start) => {
                let target = &directory[start..];
                let upstream = Url::parse(target).map_err(|e| {
                    config_error(format!("Invalid target URI `{target}` in `{directory}`: {e}"))
                })?;
                (directory[..start].to_string(), Some(upstream))
            }
            None => {
                let proxy = origin.join(DEFAULT_PROXY_PATH).map_err(|e| {
                    config_error(format!("Invalid proxy path for `{directory}`: {e}"))
                })?;
                (proxy.to_string(), None)
            }
        };

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            origin,
            proxy,
            upstream,
        })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        let target = match (Url::parse(path), &self.upstream) {
            (Ok(url), _) => url,
            (Err(_), Some(upstream)) => upstream
                .join(&rooted(path))
                .map_err(|e| resolve_error(path, e))?,
            (Err(_), None) => {
                return self
                    .origin
                    .join(&rooted(path))
                    .map_err(|e| resolve_error(path, e));
            }
        };

        if matches!(target.scheme(), "http" | "https") {
            return Ok(target);
        }

        Url::parse(&format!("{}{target}", self.proxy)).map_err(|e| resolve_error(path, e))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let url = self.resolve(&request.path)?;
            debug!("{} {url}", request.method);

            let builder = match request.method {
                Method::Get => self.client.get(url),
                Method::Put => self.client.put(url).body(request.payload),
            };

            let response = builder.send().await?;
            let code = response.status().as_u16();
            let payload = response.bytes().await?;

            Ok(Response::new(code, payload.to_vec()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::DEFAULT_DIRECTORY;
    use crate::error::ErrorKind;

    use super::{HttpTransport, Method, Request, Response};

    const DIRECTORY: &str = "http://[2001:db8::1]:8080/resource-lookup/";

    fn transport() -> HttpTransport {
        HttpTransport::new(DIRECTORY, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn requests() {
        assert_eq!(
            Request::get("/sensors/accel"),
            Request {
                method: Method::Get,
                path: "/sensors/accel".into(),
                payload: Vec::new(),
            }
        );
        assert_eq!(Request::put("/led/color", "255,0,0").payload, b"255,0,0");
    }

    #[test]
    fn responses() {
        let response = Response::ok("x:0, y:10, z:0");
        assert!(response.is_success());
        assert_eq!(response.text(), "x:0, y:10, z:0");

        assert!(!Response::new(404, "").is_success());
        assert!(!Response::new(199, "").is_success());
        assert!(Response::new(204, "").is_success());
        assert_eq!(Response::ok(vec![0xff, b'y']).text(), "\u{fffd}y");
    }

    #[test]
    fn resolve_paths() {
        let transport = transport();

        for path in ["sensors/accel", "/sensors/accel"] {
            assert_eq!(
                transport.resolve(path).unwrap().as_str(),
                "http://[2001:db8::1]:8080/sensors/accel"
            );
        }

        assert_eq!(
            transport.resolve(DIRECTORY).unwrap().as_str(),
            DIRECTORY
        );
        assert_eq!(
            transport
                .resolve("http://[2001:db8::2]/led/color")
                .unwrap()
                .as_str(),
            "http://[2001:db8::2]/led/color"
        );
    }

    #[test]
    fn coap_links_go_through_the_default_proxy_path() {
        assert_eq!(
            transport()
                .resolve("coap://[2001:db8::2]/sensors/accel")
                .unwrap()
                .as_str(),
            "http://[2001:db8::1]:8080/hc/coap://[2001:db8::2]/sensors/accel"
        );
    }

    #[test]
    fn proxied_directory() {
        const PROXIED: &str = "http://[2001:db8::1]:8080/hc/coap://[2001:db8::2]/resource-lookup/";

        let transport = HttpTransport::new(PROXIED, Duration::from_secs(1)).unwrap();

        assert_eq!(transport.resolve(PROXIED).unwrap().as_str(), PROXIED);

        for path in [
            "coap://[2001:db8::2]/led/color",
            "/led/color",
            "led/color",
        ] {
            assert_eq!(
                transport.resolve(path).unwrap().as_str(),
                "http://[2001:db8::1]:8080/hc/coap://[2001:db8::2]/led/color"
            );
        }

        assert_eq!(
            transport
                .resolve("coaps://[2001:db8::3]/sensors/accel")
                .unwrap()
                .as_str(),
            "http://[2001:db8::1]:8080/hc/coaps://[2001:db8::3]/sensors/accel"
        );
    }

    #[test]
    fn default_directory_reaches_the_coap_node() {
        let transport = HttpTransport::new(DEFAULT_DIRECTORY, Duration::from_secs(1)).unwrap();

        assert_eq!(
            transport.resolve("/sensors/accel").unwrap().as_str(),
            "http://localhost:8080/hc/coap://[2001:67c:254:b0b2:affe:2000:0:1]/sensors/accel"
        );
    }

    #[test]
    fn invalid_directory() {
        for directory in ["resource-lookup", "coap://[2001:db8::1]/resource-lookup/"] {
            assert_eq!(
                HttpTransport::new(directory, Duration::from_secs(1))
                    .unwrap_err()
                    .kind(),
                ErrorKind::Config
            );
        }
    }
}
