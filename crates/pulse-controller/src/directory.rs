use std::borrow::Cow;

use pulse::endpoint::{Endpoint, RoleMarkers, Snapshot};

use tracing::{debug, info};

use crate::error::{Error, ErrorKind, Result};
use crate::transport::{Request, Transport};

fn discovery_error(error: impl Into<Cow<'static, str>>) -> Error {
    Error::new(ErrorKind::Discovery, error)
}

/// A resource directory client.
///
/// It fetches the link-format document published at the directory URI and
/// classifies every advertised path through a set of [`RoleMarkers`].
/// Nothing is cached: every call to [`Directory::discover`] performs a new
/// fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    uri: String,
    markers: RoleMarkers,
}

impl Directory {
    /// Creates a [`Directory`] client with the default [`RoleMarkers`].
    #[must_use]
    #[inline]
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            markers: RoleMarkers::default(),
        }
    }

    /// Sets the [`RoleMarkers`] while constructing a [`Directory`].
    #[must_use]
    #[inline]
    pub fn markers(mut self, markers: RoleMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Returns the directory URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Discovers the endpoints advertised by the directory, in document
    /// order.
    ///
    /// Paths which match no marker are dropped. A document without links
    /// produces an empty sequence.
    ///
    /// # Errors
    ///
    /// An error of kind [`ErrorKind::Discovery`] is returned when the request
    /// fails, times out, or the directory answers with a failure status.
    pub async fn discover<T: Transport>(&self, transport: &T) -> Result<Vec<Endpoint>> {
        let response = transport
            .send(Request::get(self.uri.as_str()))
            .await
            .map_err(|e| {
                discovery_error(format!(
                    "Failed to fetch resource directory `{}`: {}",
                    self.uri,
                    e.description()
                ))
            })?;

        if !response.is_success() {
            return Err(discovery_error(format!(
                "Resource directory `{}` answered with code {}",
                self.uri,
                response.code()
            )));
        }

        let document = response.text();
        debug!("Directory document: {document}");

        let endpoints = self.markers.endpoints(&document);
        info!(
            "Discovered {} endpoints at `{}`",
            endpoints.len(),
            self.uri
        );

        Ok(endpoints)
    }

    /// Discovers the endpoints advertised by the directory and splits them
    /// into a [`Snapshot`].
    ///
    /// # Errors
    ///
    /// Same as [`Directory::discover`].
    pub async fn snapshot<T: Transport>(&self, transport: &T) -> Result<Snapshot> {
        self.discover(transport).await.map(Snapshot::new)
    }
}

#[cfg(test)]
mod tests {
    use pulse::endpoint::{Endpoint, Role, RoleMarkers};

    use crate::error::ErrorKind;
    use crate::tests::{DIRECTORY, DOCUMENT, MockTransport};

    use super::Directory;

    #[tokio::test]
    async fn discover_endpoints() {
        let transport = MockTransport::new().reply(DIRECTORY, DOCUMENT);

        let endpoints = Directory::new(DIRECTORY)
            .discover(&transport)
            .await
            .unwrap();

        assert_eq!(
            endpoints,
            vec![
                Endpoint::sensor("sensors/accel/1"),
                Endpoint::sensor("sensors/accel/2"),
                Endpoint::actuator("led/color/1"),
            ]
        );
        assert_eq!(transport.directory_fetches(), 1);
    }

    #[tokio::test]
    async fn custom_markers() {
        let transport = MockTransport::new().reply(
            DIRECTORY,
            "</sensors/light>,</sensors/accel>,</led/color>,</riot/board>",
        );

        let snapshot = Directory::new(DIRECTORY)
            .markers(RoleMarkers::empty().marker("sensors/light", Role::Sensor))
            .snapshot(&transport)
            .await
            .unwrap();

        assert_eq!(snapshot.sensors, vec![Endpoint::sensor("/sensors/light")]);
        assert!(snapshot.actuators.is_empty());
    }

    #[tokio::test]
    async fn empty_document() {
        let transport = MockTransport::new().reply(DIRECTORY, "");

        let snapshot = Directory::new(DIRECTORY)
            .snapshot(&transport)
            .await
            .unwrap();

        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn unreachable_directory() {
        let transport = MockTransport::new().unreachable(DIRECTORY);

        let error = Directory::new(DIRECTORY)
            .discover(&transport)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Discovery);
        assert!(error.description().contains(DIRECTORY));
    }

    #[tokio::test]
    async fn failure_status() {
        let transport = MockTransport::new().status(DIRECTORY, 404, "</led/color>");

        let error = Directory::new(DIRECTORY)
            .discover(&transport)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Discovery);
        assert!(error.description().ends_with("answered with code 404"));
    }

    #[tokio::test]
    async fn every_call_fetches_again() {
        let transport = MockTransport::new().reply(DIRECTORY, DOCUMENT);
        let directory = Directory::new(DIRECTORY);

        for _ in 0..3 {
            let _ = directory.discover(&transport).await.unwrap();
        }

        assert_eq!(transport.directory_fetches(), 3);
    }
}
