use futures_util::future::join_all;

use pulse::endpoint::Endpoint;
use pulse::reading::{DecodeError, ReadError, Reading, extract_y};

use tracing::{info, warn};

use crate::transport::{Request, Transport};

/// The raw outcome of a sensor read, before any value is extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// The source endpoint.
    pub endpoint: Endpoint,
    /// The payload text, or the reason it could not be obtained.
    pub payload: Result<String, ReadError>,
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            Ok(payload) => write!(f, "{} -> {payload}", self.endpoint),
            Err(e) => write!(f, "{} -> ERROR: {e}", self.endpoint),
        }
    }
}

async fn read_payload<T: Transport>(
    transport: &T,
    endpoint: &Endpoint,
) -> Result<String, ReadError> {
    let response = transport
        .send(Request::get(endpoint.path()))
        .await
        .map_err(|e| ReadError::Request(e.description().into()))?;

    if !response.is_success() {
        return Err(ReadError::Status(response.code()));
    }

    Ok(response.text().into_owned())
}

async fn read_value<T, F>(transport: &T, endpoint: &Endpoint, extractor: &F) -> Reading
where
    T: Transport,
    F: Fn(&str) -> Result<i64, DecodeError>,
{
    let outcome = read_payload(transport, endpoint)
        .await
        .and_then(|payload| extractor(&payload).map_err(ReadError::from));

    let reading = Reading::from_outcome(endpoint.clone(), outcome);
    if let Some(e) = reading.error() {
        warn!("{endpoint} -> ERROR: {e}");
    }
    reading
}

/// Reads the raw payload of every endpoint concurrently.
///
/// Completes once every request has resolved. A failing endpoint never
/// prevents the others from being read. Samples are returned in the order
/// of `endpoints`.
pub async fn scan_all<T: Transport>(transport: &T, endpoints: &[Endpoint]) -> Vec<Sample> {
    join_all(endpoints.iter().map(|endpoint| async move {
        Sample {
            endpoint: endpoint.clone(),
            payload: read_payload(transport, endpoint).await,
        }
    }))
    .await
}

/// Reads every endpoint concurrently and extracts a value from each payload.
///
/// Completes once every request has resolved, successfully or not. Each
/// failure, whether a request error, a failure status or a payload the
/// `extractor` rejects, is logged and turned into an invalid [`Reading`]
/// carrying the sentinel value, so exactly one reading is returned per
/// endpoint, in the order of `endpoints`.
pub async fn poll_all<T, F>(transport: &T, endpoints: &[Endpoint], extractor: F) -> Vec<Reading>
where
    T: Transport,
    F: Fn(&str) -> Result<i64, DecodeError>,
{
    let readings = join_all(
        endpoints
            .iter()
            .map(|endpoint| read_value(transport, endpoint, &extractor)),
    )
    .await;

    info!(
        "Polled {} sensors, {} failed",
        readings.len(),
        readings.iter().filter(|reading| !reading.is_valid()).count()
    );

    readings
}

/// Reads every endpoint concurrently and extracts the `y:` value of each
/// payload.
///
/// See [`poll_all`].
pub async fn poll_accelerometers<T: Transport>(
    transport: &T,
    endpoints: &[Endpoint],
) -> Vec<Reading> {
    poll_all(transport, endpoints, extract_y).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pulse::endpoint::Endpoint;
    use pulse::reading::{DecodeError, ReadError, SENTINEL_VALUE};

    use crate::tests::{MockTransport, init_logging};

    use super::{Sample, poll_accelerometers, poll_all, scan_all};

    fn sensors(count: usize) -> Vec<Endpoint> {
        (1..=count)
            .map(|id| Endpoint::sensor(format!("sensors/accel/{id}")))
            .collect()
    }

    #[tokio::test]
    async fn every_endpoint_is_read() {
        let transport = MockTransport::new()
            .reply("sensors/accel/1", "x:0, y:600, z:0")
            .reply("sensors/accel/2", "x:0, y:-10, z:0");

        let readings = poll_accelerometers(&transport, &sensors(2)).await;

        assert_eq!(readings.len(), 2);
        assert!(readings.iter().all(|reading| reading.is_valid()));
        assert_eq!(readings[0].value(), 600);
        assert_eq!(readings[1].value(), -10);
        assert_eq!(transport.reads(), vec!["sensors/accel/1", "sensors/accel/2"]);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        init_logging();

        let transport = MockTransport::new()
            .reply("sensors/accel/1", "x:0 y:600 z:0")
            .unreachable("sensors/accel/2")
            .reply("sensors/accel/3", "x:0 z:0")
            .status("sensors/accel/4", 500, "y:900")
            .reply("sensors/accel/5", "y:7");

        let readings = poll_accelerometers(&transport, &sensors(5)).await;

        // One reading per endpoint, each traceable to its source.
        assert_eq!(readings.len(), 5);
        for (reading, endpoint) in readings.iter().zip(sensors(5)) {
            assert_eq!(reading.endpoint(), &endpoint);
        }

        let values: Vec<i64> = readings.iter().map(|reading| reading.value()).collect();
        assert_eq!(values, vec![600, SENTINEL_VALUE, SENTINEL_VALUE, SENTINEL_VALUE, 7]);

        assert!(matches!(readings[1].error(), Some(ReadError::Request(_))));
        assert_eq!(
            readings[2].error(),
            Some(&ReadError::Decode(DecodeError::MissingValue))
        );
        assert_eq!(readings[3].error(), Some(&ReadError::Status(500)));
        assert_eq!(
            readings.iter().filter(|reading| !reading.is_valid()).count(),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_endpoints_do_not_reorder_results() {
        let transport = MockTransport::new()
            .reply("sensors/accel/1", "y:1")
            .delay("sensors/accel/1", Duration::from_millis(30))
            .unreachable("sensors/accel/2")
            .delay("sensors/accel/2", Duration::from_millis(20))
            .reply("sensors/accel/3", "y:3");

        let readings = poll_accelerometers(&transport, &sensors(3)).await;

        let values: Vec<i64> = readings.iter().map(|reading| reading.value()).collect();
        assert_eq!(values, vec![1, SENTINEL_VALUE, 3]);
        assert!(!readings[1].is_valid());
    }

    #[tokio::test]
    async fn custom_extractor() {
        let transport = MockTransport::new()
            .reply("sensors/light/1", "412 lux")
            .reply("sensors/light/2", "dark");

        let endpoints = vec![
            Endpoint::sensor("sensors/light/1"),
            Endpoint::sensor("sensors/light/2"),
        ];

        let readings = poll_all(&transport, &endpoints, |payload| {
            payload
                .trim_end_matches(" lux")
                .parse()
                .map_err(|_| DecodeError::MissingValue)
        })
        .await;

        assert_eq!(readings[0].value(), 412);
        assert!(!readings[1].is_valid());
    }

    #[tokio::test]
    async fn no_endpoints() {
        let transport = MockTransport::new();

        assert!(poll_accelerometers(&transport, &[]).await.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn raw_samples() {
        let transport = MockTransport::new()
            .reply("sensors/accel/1", "x:1, y:2, z:3")
            .unreachable("sensors/accel/2");

        let samples = scan_all(&transport, &sensors(2)).await;

        assert_eq!(
            samples[0],
            Sample {
                endpoint: Endpoint::sensor("sensors/accel/1"),
                payload: Ok("x:1, y:2, z:3".into()),
            }
        );
        assert_eq!(samples[0].to_string(), "sensors/accel/1 -> x:1, y:2, z:3");
        assert_eq!(
            samples[1].to_string(),
            "sensors/accel/2 -> ERROR: request failed: Request timed out"
        );
    }
}
