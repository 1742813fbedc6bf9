//! Correlated exchanges over the persistent channel against an in-memory agent.

mod common;

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::AsyncWrite;
use tokio::time::Instant;

use common::fake_agent::{fake_agent, serve, MissingAgent};
use vidget_core::channel::{AgentConnector, AgentStream, ChannelAdapter, ChannelState, ChannelTimeouts};
use vidget_core::error::AgentError;
use vidget_core::protocol::{correlation_id, AgentRequest, MediaFormat, Quality};

fn download(url: &str) -> AgentRequest {
    AgentRequest::Download {
        url: url.to_string(),
        quality: Quality::Best,
        format: MediaFormat::Video,
        download_path: None,
    }
}

#[tokio::test]
async fn concurrent_requests_each_get_their_own_reply() {
    const N: usize = 24;
    let (connector, mut agent) = fake_agent();
    let adapter = Arc::new(ChannelAdapter::new(connector, ChannelTimeouts::default()));

    let calls: Vec<_> = (0..N)
        .map(|i| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move {
                let url = format!("https://example.org/v/{i}");
                let reply = adapter.send_correlated(&download(&url)).await;
                (url, reply)
            })
        })
        .collect();

    let mut end = agent.accept().await;
    let mut requests = Vec::with_capacity(N);
    for _ in 0..N {
        requests.push(end.recv().await.expect("request"));
    }
    assert_eq!(adapter.pending_count(), N);
    let mut ids: Vec<u64> = requests.iter().filter_map(correlation_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), N, "ids must be unique");

    // Reply in reverse order, echoing the URL so each caller can check it got its own.
    for request in requests.iter().rev() {
        end.reply(json!({
            "_id": request["_id"],
            "success": true,
            "path": request["url"],
        }))
        .await;
    }

    for call in calls {
        let (url, reply) = call.await.unwrap();
        let reply = reply.expect("reply");
        assert_eq!(reply["path"], Value::from(url));
    }
    assert_eq!(adapter.pending_count(), 0);
    assert_eq!(agent.connects(), 1);
}

#[tokio::test]
async fn channel_loss_sweeps_every_pending_request() {
    const K: usize = 5;
    let (connector, mut agent) = fake_agent();
    let adapter = Arc::new(ChannelAdapter::new(connector, ChannelTimeouts::default()));

    let calls: Vec<_> = (0..K)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.send_correlated(&AgentRequest::GetProgress).await })
        })
        .collect();

    let mut end = agent.accept().await;
    for _ in 0..K {
        end.recv().await.expect("request");
    }
    assert_eq!(adapter.state(), ChannelState::Connected);
    drop(end);

    for call in calls {
        assert_eq!(call.await.unwrap(), Err(AgentError::Disconnected));
    }
    assert_eq!(adapter.state(), ChannelState::Disconnected);
    assert_eq!(adapter.pending_count(), 0);

    // The next request opens a fresh session.
    let serving = serve(agent, |_| Some(json!({ "status": "ok", "version": "2" })));
    let reply = adapter.send_correlated(&AgentRequest::Ping).await.unwrap();
    assert_eq!(reply["version"], "2");
    assert_eq!(adapter.state(), ChannelState::Connected);
    serving.abort();
}

#[tokio::test]
async fn explicit_disconnect_reports_swept_count() {
    let (connector, mut agent) = fake_agent();
    let adapter = Arc::new(ChannelAdapter::new(connector, ChannelTimeouts::default()));

    let calls: Vec<_> = (0..3)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.send_correlated(&AgentRequest::GetProgress).await })
        })
        .collect();
    let mut end = agent.accept().await;
    for _ in 0..3 {
        end.recv().await.expect("request");
    }

    assert_eq!(adapter.disconnect().await, 3);
    for call in calls {
        assert_eq!(call.await.unwrap(), Err(AgentError::Disconnected));
    }
    // Our side was closed, so the agent sees end of stream.
    assert!(end.recv().await.is_none());
    assert_eq!(adapter.disconnect().await, 0);
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_times_out_and_late_reply_is_dropped() {
    let (connector, mut agent) = fake_agent();
    let adapter = Arc::new(ChannelAdapter::new(connector, ChannelTimeouts::default()));
    let started = Instant::now();

    let call = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.send_correlated(&AgentRequest::GetProgress).await }
    });
    let mut end = agent.accept().await;
    let request = end.recv().await.expect("request");
    let late_id = correlation_id(&request).unwrap();

    assert_eq!(call.await.unwrap(), Err(AgentError::Timeout));
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(31));
    assert_eq!(adapter.pending_count(), 0);

    // The late reply is discarded; the session stays up and keeps working.
    end.reply(json!({ "_id": late_id, "status": "complete" })).await;
    let call = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.send_correlated(&AgentRequest::GetProgress).await }
    });
    let request = end.recv().await.expect("second request");
    let id = correlation_id(&request).unwrap();
    assert!(id > late_id);
    end.reply(json!({ "_id": id, "status": "downloading", "percent": 12 })).await;

    let reply = call.await.unwrap().unwrap();
    assert_eq!(reply["percent"], 12);
    assert_eq!(adapter.state(), ChannelState::Connected);
    assert_eq!(agent.connects(), 1);
}

#[tokio::test]
async fn reply_without_known_id_is_ignored() {
    let (connector, mut agent) = fake_agent();
    let adapter = Arc::new(ChannelAdapter::new(connector, ChannelTimeouts::default()));

    let call = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.send_correlated(&AgentRequest::Ping).await }
    });
    let mut end = agent.accept().await;
    let request = end.recv().await.expect("request");

    end.reply(json!({ "status": "ok" })).await;
    end.reply(json!({ "_id": 999_999, "status": "ok" })).await;
    end.reply(json!({ "_id": request["_id"], "status": "ok", "version": "1" }))
        .await;

    assert_eq!(call.await.unwrap().unwrap()["version"], "1");
}

#[tokio::test]
async fn abandoned_caller_leaves_nothing_pending() {
    let (connector, mut agent) = fake_agent();
    let adapter = Arc::new(ChannelAdapter::new(connector, ChannelTimeouts::default()));

    let call = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.send_correlated(&AgentRequest::GetProgress).await }
    });
    let mut end = agent.accept().await;
    end.recv().await.expect("request");
    assert_eq!(adapter.pending_count(), 1);

    call.abort();
    assert!(call.await.unwrap_err().is_cancelled());
    assert_eq!(adapter.pending_count(), 0);
}

#[tokio::test]
async fn connection_failure_is_returned_not_retried() {
    let adapter = ChannelAdapter::new(MissingAgent, ChannelTimeouts::default());
    let err = adapter
        .send_correlated(&AgentRequest::Ping)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(adapter.state(), ChannelState::Disconnected);
    assert_eq!(adapter.pending_count(), 0);
}

/// Write half that always fails, as a dead pipe would.
struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

struct BrokenPipeConnector {
    // Keeps the read side open so only the write fails.
    agent_side: std::sync::Mutex<Vec<tokio::io::DuplexStream>>,
}

impl AgentConnector for BrokenPipeConnector {
    fn connect(&self) -> Result<AgentStream, AgentError> {
        let (client, agent) = tokio::io::duplex(1024);
        self.agent_side.lock().unwrap().push(agent);
        Ok(AgentStream::new(client, BrokenPipe))
    }
}

#[tokio::test]
async fn transmit_failure_resolves_with_transport_fault() {
    let adapter = ChannelAdapter::new(
        BrokenPipeConnector {
            agent_side: std::sync::Mutex::new(Vec::new()),
        },
        ChannelTimeouts::default(),
    );
    let err = adapter
        .send_correlated(&AgentRequest::GetProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::TransportFault(_)), "got {err:?}");
    assert_eq!(adapter.pending_count(), 0);
    assert_eq!(adapter.state(), ChannelState::Disconnected);
}

/// Agent that is alive but never reads its input: the client's writes fill a
/// tiny pipe and then block.
struct StalledAgent {
    held: std::sync::Mutex<Vec<tokio::io::DuplexStream>>,
}

impl AgentConnector for StalledAgent {
    fn connect(&self) -> Result<AgentStream, AgentError> {
        let (client_in, agent_out) = tokio::io::duplex(1024);
        let (client_out, agent_in) = tokio::io::duplex(8);
        self.held.lock().unwrap().extend([agent_out, agent_in]);
        Ok(AgentStream::new(client_in, client_out))
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_write_still_resolves_by_the_deadline() {
    let adapter = Arc::new(ChannelAdapter::new(
        StalledAgent {
            held: std::sync::Mutex::new(Vec::new()),
        },
        ChannelTimeouts::default(),
    ));
    let started = Instant::now();

    let calls: Vec<_> = (0..2)
        .map(|_| {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.send_correlated(&AgentRequest::GetProgress).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for call in calls {
        let outcome = tokio::time::timeout(Duration::from_secs(120), call)
            .await
            .expect("request left unresolved")
            .unwrap();
        outcomes.push(outcome);
    }
    assert!(outcomes.contains(&Err(AgentError::Timeout)), "got {outcomes:?}");
    for outcome in &outcomes {
        assert!(
            matches!(outcome, Err(AgentError::Timeout | AgentError::Disconnected)),
            "got {outcome:?}"
        );
    }
    assert!(started.elapsed() < Duration::from_secs(31));
    assert_eq!(adapter.pending_count(), 0);
    assert_eq!(adapter.state(), ChannelState::Disconnected);

    // Closing the channel does not wait on the stuck writer either.
    let closed = tokio::time::timeout(Duration::from_secs(1), adapter.disconnect()).await;
    assert_eq!(closed, Ok(0));
}
