//! Integration tests for the WebSocket connector.
//!
//! A bare `tokio-tungstenite` server is started on a loopback port and the
//! connector dials it, so frames really cross the network stack.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;
    use wizsync_transport::{Connection, Connector, TransportError, WebSocketConnector};

    type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Binds a loopback listener on an OS-assigned port and accepts one
    /// WebSocket client in the background.
    async fn serve_one() -> (String, tokio::task::JoinHandle<ServerWs>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
        let addr = listener.local_addr().expect("should have addr");
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("should accept");
            tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake should succeed")
        });
        (format!("ws://{addr}/ws/abc123xyz"), handle)
    }

    #[tokio::test]
    async fn test_websocket_connect_send_and_receive() {
        let (url, server) = serve_one().await;

        let conn = WebSocketConnector::new()
            .connect(&url)
            .await
            .expect("client should connect");
        let mut server_ws = server.await.expect("task should complete");

        assert!(conn.id().into_inner() > 0);

        // --- Client sends a text frame ---
        conn.send(r#"{"action":"ready"}"#).await.expect("send should succeed");
        let msg = server_ws.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "actions travel as text frames");
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"action":"ready"}"#);

        // --- Server pushes a snapshot ---
        server_ws
            .send(Message::text(r#"{"turn":true}"#.to_string()))
            .await
            .unwrap();
        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"turn":true}"#);

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_server_close() {
        let (url, server) = serve_one().await;
        let conn = WebSocketConnector::new().connect(&url).await.unwrap();
        let mut server_ws = server.await.unwrap();

        server_ws.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on server close");
    }

    #[tokio::test]
    async fn test_websocket_connect_refused_is_connect_failed() {
        // Grab a free port, then release it so nothing listens there.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = WebSocketConnector::new()
            .connect(&format!("ws://{addr}/ws/abc123xyz"))
            .await;

        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}
