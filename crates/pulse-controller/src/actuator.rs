use futures_util::future::join_all;

use pulse::command::Command;
use pulse::endpoint::Endpoint;

use tracing::{error, info};

use crate::error::{Error, ErrorKind, Result};
use crate::transport::{Request, Transport};

/// An acknowledged actuator write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    /// The written endpoint.
    pub endpoint: Endpoint,
    /// The status code of the response.
    pub code: u16,
}

async fn write_one<T: Transport>(
    transport: &T,
    endpoint: &Endpoint,
    payload: &str,
) -> Result<WriteAck> {
    let response = transport
        .send(Request::put(endpoint.path(), payload))
        .await
        .map_err(|e| {
            Error::new(
                ErrorKind::Write,
                format!("Failed to write `{payload}` to `{endpoint}`: {}", e.description()),
            )
        })?;

    if !response.is_success() {
        return Err(Error::new(
            ErrorKind::Write,
            format!(
                "Actuator `{endpoint}` rejected `{payload}` with code {}",
                response.code()
            ),
        ));
    }

    Ok(WriteAck {
        endpoint: endpoint.clone(),
        code: response.code(),
    })
}

/// Writes the payload of a [`Command`] to every endpoint concurrently.
///
/// Writes do not have any relative order. Every write is issued and the
/// stage completes only once all of them have resolved, whatever their
/// outcome. A single failure still fails the stage as a whole, unlike
/// [`crate::poller::poll_all`] where each failure stays confined to its
/// own endpoint.
///
/// # Errors
///
/// An error of kind [`ErrorKind::Write`] naming the first offending
/// endpoint, in endpoint order, is returned when a write fails or the
/// actuator answers with a failure status. Other failures are only logged.
pub async fn apply_all<T: Transport>(
    transport: &T,
    endpoints: &[Endpoint],
    command: Command,
) -> Result<Vec<WriteAck>> {
    let payload = command.payload();

    let results = join_all(
        endpoints
            .iter()
            .map(|endpoint| write_one(transport, endpoint, &payload)),
    )
    .await;

    let mut acks = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(ack) => acks.push(ack),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => error!("{e}"),
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    info!("Command {command} (`{payload}`) applied to {} actuators", acks.len());

    Ok(acks)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pulse::command::Command;
    use pulse::endpoint::Endpoint;

    use tokio::time::Instant;

    use crate::error::ErrorKind;
    use crate::tests::MockTransport;

    use super::{WriteAck, apply_all};

    fn leds() -> Vec<Endpoint> {
        ["led/color/1", "led/color/2", "led/color/3"]
            .into_iter()
            .map(Endpoint::actuator)
            .collect()
    }

    fn writable() -> MockTransport {
        MockTransport::new()
            .reply("led/color/1", "")
            .status("led/color/2", 204, "")
            .reply("led/color/3", "")
    }

    #[tokio::test]
    async fn alert_payload() {
        let transport = writable();

        let acks = apply_all(&transport, &leds(), Command::Alert).await.unwrap();

        assert_eq!(acks.len(), 3);
        assert_eq!(
            acks[1],
            WriteAck {
                endpoint: Endpoint::actuator("led/color/2"),
                code: 204,
            }
        );
        assert_eq!(
            transport.writes(),
            ["led/color/1", "led/color/2", "led/color/3"]
                .map(|path| (path.to_string(), "255,0,0".to_string()))
                .to_vec()
        );
    }

    #[tokio::test]
    async fn normal_payload() {
        let transport = writable();

        let _ = apply_all(&transport, &leds(), Command::Normal).await.unwrap();

        assert!(
            transport
                .writes()
                .iter()
                .all(|(_, payload)| payload == "255,255,255")
        );
        assert_eq!(transport.writes().len(), 3);
    }

    #[tokio::test]
    async fn no_actuators() {
        let transport = MockTransport::new();

        let acks = apply_all(&transport, &[], Command::Alert).await.unwrap();

        assert!(acks.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_stop_other_writes() {
        let transport = MockTransport::new()
            .unreachable("led/color/1")
            .reply("led/color/2", "")
            .unreachable("led/color/3");

        let error = apply_all(&transport, &leds(), Command::Alert)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Write);
        assert!(error.description().contains("led/color/1"));

        let written: Vec<String> = transport.writes().into_iter().map(|(path, _)| path).collect();
        assert_eq!(written, vec!["led/color/1", "led/color/2", "led/color/3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_waits_for_writes_in_flight() {
        let transport = MockTransport::new()
            .unreachable("led/color/1")
            .delay("led/color/1", Duration::from_millis(5))
            .reply("led/color/2", "")
            .delay("led/color/2", Duration::from_millis(50))
            .reply("led/color/3", "");

        let start = Instant::now();
        let error = apply_all(&transport, &leds(), Command::Normal)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Write);
        // The stage is a barrier: the slow write completes before it ends.
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(transport.writes().len(), 3);
    }

    #[tokio::test]
    async fn rejected_write() {
        let transport = writable().status("led/color/3", 400, "Invalid RGB values");

        let error = apply_all(&transport, &leds(), Command::Normal)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Write);
        assert_eq!(
            error.description(),
            "Actuator `led/color/3` rejected `255,255,255` with code 400"
        );
    }
}
