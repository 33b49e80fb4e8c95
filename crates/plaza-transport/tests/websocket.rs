//! Integration tests for the WebSocket transport: a real server and a real
//! client exchanging frames over loopback.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use plaza_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on a random port, connects a client, and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have local addr");

        let server_handle =
            tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let (client_ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");

        let server_conn = server_handle.await.expect("accept task should finish");
        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_text_frames_flow_both_ways() {
        let (server_conn, mut client_ws) = connected_pair().await;

        server_conn
            .send(r#"{"type":"user-left","payload":{"userId":"a"}}"#)
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(
            msg.into_text().unwrap().as_str(),
            r#"{"type":"user-left","payload":{"userId":"a"}}"#
        );

        client_ws
            .send(Message::Text("hello from client".into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have a frame");
        assert_eq!(received, "hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_binary_utf8_frame_is_accepted_as_text() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws
            .send(Message::Binary(b"{\"type\":\"x\"}".to_vec().into()))
            .await
            .unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, "{\"type\":\"x\"}");
    }

    #[tokio::test]
    async fn test_ping_frames_are_skipped() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws
            .send(Message::Ping(b"beat".to_vec().into()))
            .await
            .unwrap();
        client_ws.send(Message::Text("after ping".into())).await.unwrap();

        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, "after ping");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_abrupt_disconnect() {
        let (server_conn, client_ws) = connected_pair().await;

        // Drop the client stream without a close frame.
        drop(client_ws);

        // Abrupt teardown surfaces as either a clean None or a reset
        // error; both end the session the same way.
        match server_conn.recv().await {
            Ok(None) | Err(_) => {}
            Ok(Some(frame)) => panic!("unexpected frame after disconnect: {frame}"),
        }
    }
}
