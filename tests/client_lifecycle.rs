//! Lifecycle tests driving the client against in-memory and loopback
//! transports.

use std::time::Duration;

use gpsd_client::{
    client::{ConnectOptions, ConnectionState, GpsdClient},
    error::GpsdClientError,
    location::Fix,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::compat::TokioAsyncReadCompatExt;

const WATCH_COMMAND: &str = r#"?WATCH={"enable":true,"json":true}"#;

const TPV_3D: &str = concat!(
    r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":3,"#,
    r#""time":"2024-01-01T00:00:00.000Z","lat":48.117,"lon":11.517,"alt":545.4}"#,
    "\n"
);

/// Attaches a fresh client to one end of an in-memory duplex transport and
/// returns the other end as the fake daemon.
async fn attached_client() -> (GpsdClient, DuplexStream) {
    let (local, remote) = tokio::io::duplex(1024);
    let mut client = GpsdClient::new();
    client.open(local.compat()).await.expect("attach transport");
    (client, remote)
}

async fn read_handshake(remote: &mut DuplexStream) -> String {
    let mut buf = vec![0u8; WATCH_COMMAND.len()];
    remote.read_exact(&mut buf).await.expect("handshake bytes");
    String::from_utf8(buf).expect("handshake is utf-8")
}

#[tokio::test]
async fn test_watch_handshake_sent_once() {
    let (mut client, mut remote) = attached_client().await;
    assert_eq!(read_handshake(&mut remote).await, WATCH_COMMAND);
    assert_eq!(client.state(), ConnectionState::Connecting);

    // A second attach is a no-op: the new transport is dropped untouched.
    let (second_local, mut second_remote) = tokio::io::duplex(1024);
    client.open(second_local.compat()).await.expect("idempotent open");

    let mut buf = [0u8; 16];
    let n = second_remote.read(&mut buf).await.expect("read second transport");
    assert_eq!(n, 0, "no second handshake may be written");
}

#[tokio::test]
async fn test_get_location_from_split_report() {
    let (mut client, mut remote) = attached_client().await;
    read_handshake(&mut remote).await;

    // One TPV line delivered in two chunks, cut mid-object.
    let line = br#"{"class":"TPV","time":"2024-01-01T00:00:00Z","mode":3,"lat":"1.0","lon":"2.0"}"#;
    let (head, tail) = line.split_at(27);
    remote.write_all(head).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    remote.write_all(tail).await.unwrap();
    remote.write_all(b"\n").await.unwrap();

    let location = client.get_location().await.expect("fix from split report");
    assert_eq!(location.fix, Fix::ThreeD);
    assert_eq!(location.latitude, Some(1.0));
    assert_eq!(location.longitude, Some(2.0));

    // The one-shot read halts processing once it has resolved.
    assert_eq!(client.state(), ConnectionState::Stopped);
}

#[tokio::test]
async fn test_get_location_without_tpv_in_first_batch() {
    let (mut client, mut remote) = attached_client().await;
    read_handshake(&mut remote).await;

    remote
        .write_all(b"{\"class\":\"SKY\",\"nSat\":11,\"satellites\":[]}\n")
        .await
        .unwrap();

    let err = client.get_location().await.unwrap_err();
    assert!(matches!(err, GpsdClientError::NoFixData), "got {err}");
}

#[tokio::test]
async fn test_get_location_after_stream_ends() {
    let (mut client, remote) = attached_client().await;
    drop(remote);

    let err = client.get_location().await.unwrap_err();
    assert!(matches!(err, GpsdClientError::StreamEnded(_)), "got {err}");
}

#[tokio::test]
async fn test_get_location_before_connect() {
    let mut client = GpsdClient::new();
    let err = client.get_location().await.unwrap_err();
    assert!(matches!(err, GpsdClientError::NotConnected), "got {err}");
}

#[tokio::test]
async fn test_start_and_continuous_updates() {
    let (mut client, mut remote) = attached_client().await;
    read_handshake(&mut remote).await;

    let mut updates = client.updates();
    remote.write_all(TPV_3D.as_bytes()).await.unwrap();

    client.start().await.expect("first fix");
    assert!(client.is_connected());

    let location = client.location().expect("location while connected");
    assert_eq!(location.fix, Fix::ThreeD);
    assert_eq!(location.latitude, Some(48.117));
    assert_eq!(location.longitude, Some(11.517));

    updates.changed().await.expect("first notification");
    assert_eq!(
        updates.borrow_and_update().clone().unwrap().latitude,
        Some(48.117)
    );

    // New coordinates: exactly one more notification.
    remote
        .write_all(b"{\"class\":\"TPV\",\"mode\":3,\"time\":\"2024-01-01T00:00:01Z\",\"lat\":48.2,\"lon\":11.6}\n")
        .await
        .unwrap();
    updates.changed().await.expect("second notification");
    assert_eq!(
        updates.borrow_and_update().clone().unwrap().latitude,
        Some(48.2)
    );

    // Same coordinates with a fresh timestamp: silence.
    remote
        .write_all(b"{\"class\":\"TPV\",\"mode\":3,\"time\":\"2024-01-01T00:00:02Z\",\"lat\":48.2,\"lon\":11.6}\n")
        .await
        .unwrap();
    let quiet = tokio::time::timeout(Duration::from_millis(100), updates.changed()).await;
    assert!(quiet.is_err(), "unchanged report must not notify");
}

#[tokio::test]
async fn test_stop_halts_processing() {
    let (mut client, mut remote) = attached_client().await;
    read_handshake(&mut remote).await;

    remote.write_all(TPV_3D.as_bytes()).await.unwrap();
    client.start().await.expect("first fix");

    client.stop();
    assert_eq!(client.state(), ConnectionState::Stopped);
    assert!(client.location().is_none(), "no location while detached");

    // Later bytes are discarded: no state change, no notification.
    let mut updates = client.updates();
    remote
        .write_all(b"{\"class\":\"TPV\",\"mode\":3,\"lat\":10.0,\"lon\":20.0}\n")
        .await
        .unwrap();
    let quiet = tokio::time::timeout(Duration::from_millis(100), updates.changed()).await;
    assert!(quiet.is_err(), "detached pipeline must not notify");
    assert_eq!(
        updates.borrow().clone().unwrap().latitude,
        Some(48.117),
        "retained location must not move after stop"
    );
}

#[tokio::test]
async fn test_malformed_line_is_skipped() {
    let (mut client, mut remote) = attached_client().await;
    read_handshake(&mut remote).await;

    let mut batch = Vec::new();
    batch.extend_from_slice(b"this is not json\n");
    batch.extend_from_slice(TPV_3D.as_bytes());
    remote.write_all(&batch).await.unwrap();

    let location = client.get_location().await.expect("fix after bad line");
    assert_eq!(location.fix, Fix::ThreeD);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let mut client = GpsdClient::new();
    client.close();
    client.close();
    assert_eq!(client.state(), ConnectionState::Closed);

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, GpsdClientError::ClientClosed), "got {err}");
}

#[tokio::test]
async fn test_connect_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; WATCH_COMMAND.len()];
        socket.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, WATCH_COMMAND.as_bytes());

        socket.write_all(TPV_3D.as_bytes()).await.unwrap();
        // Keep the socket open until the client has read the report.
        tokio::time::sleep(Duration::from_millis(200)).await;
    });

    let mut client = GpsdClient::new();
    let options = ConnectOptions::default().host("127.0.0.1").port(addr.port());
    client.start_with(options).await.expect("fix over tcp");

    assert!(client.is_connected());
    assert_eq!(client.location().unwrap().fix, Fix::ThreeD);

    client.close();
    assert_eq!(client.state(), ConnectionState::Closed);
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused() {
    // Bind then drop to find a loopback port with no listener.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = GpsdClient::new();
    let options = ConnectOptions::default().host("127.0.0.1").port(addr.port());
    let err = client.connect_with(options).await.unwrap_err();

    assert!(matches!(err, GpsdClientError::IoError(_)), "got {err}");
    assert_eq!(client.state(), ConnectionState::Disconnected);
}
