use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::messages::OutboundFrame;

/// Spawns the periodic client liveness probe.
///
/// Pings are advisory: pongs are observed and logged by the session but no
/// timeout closes an unresponsive client. The task ends when the outbound
/// channel closes; the session also aborts it on teardown.
pub fn spawn(outbound: mpsc::Sender<OutboundFrame>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; skip it so pings start one
        // period after connect.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if outbound.send(OutboundFrame::Ping).await.is_err() {
                break;
            }
            debug!("heartbeat ping sent");
        }
        debug!("heartbeat task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pings_on_every_period() {
        let (tx, mut rx) = mpsc::channel(4);
        let _task = spawn(tx, Duration::from_secs(30));

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(30)).await;
            match rx.recv().await {
                Some(OutboundFrame::Ping) => {}
                other => panic!("expected ping, got {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_outbound_closes() {
        let (tx, rx) = mpsc::channel(4);
        let task = spawn(tx, Duration::from_secs(30));
        drop(rx);
        tokio::time::advance(Duration::from_secs(31)).await;
        task.await.expect("heartbeat task should exit cleanly");
    }
}
