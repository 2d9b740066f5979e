//! End-to-end tests over real TCP connections against an in-process server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::codec::{FramedRead, FramedWrite};

use hiroba_server::{
    domain::{ConnectionId, Member, RoomName, RoomRegistry},
    ui::{Server, ServerContext},
};
use hiroba_shared::protocol::{FrameCodec, MessageType, Request, RoomSummary, ServerMessage};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// In-process server bound to an ephemeral port
struct TestServer {
    addr: SocketAddr,
    context: Arc<ServerContext>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let context = Arc::new(ServerContext::in_memory());
        let server = Server::bind("127.0.0.1:0", context.clone())
            .await
            .expect("Failed to bind test server");
        let addr = server.local_addr().expect("Failed to read local addr");

        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(server.run_until(async {
            let _ = stopped.await;
        }));

        Self {
            addr,
            context,
            stop: Some(stop),
            handle,
        }
    }

    async fn connect(&self) -> TestClient {
        TestClient::connect(self.addr).await
    }

    /// Poll until the room list satisfies `predicate`
    async fn wait_for_rooms(&self, predicate: impl Fn(&[RoomSummary]) -> bool) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let rooms = self.context.registry.list_rooms().await;
            if predicate(&rooms) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "room list never matched, last seen: {:?}",
                rooms
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn wait_for_live_connections(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.context.live_connections() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "live connections stuck at {}",
                self.context.live_connections()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let result = tokio::time::timeout(RECV_TIMEOUT, self.handle)
            .await
            .expect("Server did not shut down in time");
        result.expect("Server task panicked").expect("Server failed");
    }
}

/// Raw protocol client
struct TestClient {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Failed to connect to test server");
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: FramedRead::new(read_half, FrameCodec::new()),
            writer: FramedWrite::new(write_half, FrameCodec::new()),
        }
    }

    async fn send(&mut self, request: Request) {
        self.send_raw(request.encode()).await;
    }

    async fn send_raw(&mut self, body: Bytes) {
        self.writer.send(body).await.expect("Failed to send frame");
    }

    async fn recv(&mut self) -> ServerMessage {
        let frame = tokio::time::timeout(RECV_TIMEOUT, self.reader.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Connection closed")
            .expect("Failed to read frame");
        ServerMessage::decode(&frame).expect("Failed to decode server message")
    }

    /// Next chat message, skipping anything else
    async fn recv_chat(&mut self) -> (String, String) {
        loop {
            if let ServerMessage::Chat(chat) = self.recv().await {
                return (chat.user, chat.msg);
            }
        }
    }

    async fn expect_silence(&mut self) {
        let result = tokio::time::timeout(Duration::from_millis(200), self.reader.next()).await;
        assert!(result.is_err(), "expected no frame, got {:?}", result);
    }
}

#[tokio::test]
async fn test_create_room_then_list() {
    // テスト項目: ルームを作成すると一覧にメンバー数 1 で表示される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;

    // when (操作):
    alice
        .send(Request::CreateRoom {
            room: "lobby".to_string(),
        })
        .await;
    let created = alice.recv().await;
    bob.send(Request::ListRooms).await;
    let listed = bob.recv().await;

    // then (期待する結果):
    assert_eq!(created, ServerMessage::CreatedRoom("lobby".to_string()));
    assert_eq!(
        listed,
        ServerMessage::RoomList(vec![RoomSummary {
            name: "lobby".to_string(),
            user_count: 1,
        }])
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_chat_reaches_every_member() {
    // テスト項目: 2 人目が参加したルームでのチャットが両方に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    alice
        .send(Request::CreateRoom {
            room: "lobby".to_string(),
        })
        .await;
    alice.recv().await;
    bob.send(Request::JoinRoom {
        room: "lobby".to_string(),
    })
    .await;
    assert_eq!(
        bob.recv().await,
        ServerMessage::JoinedRoom("lobby".to_string())
    );

    // when (操作):
    alice
        .send(Request::Chat {
            text: "hey".to_string(),
        })
        .await;

    // then (期待する結果):
    let (alice_sees_user, alice_sees_msg) = alice.recv_chat().await;
    let (bob_sees_user, bob_sees_msg) = bob.recv_chat().await;
    assert_eq!(alice_sees_msg, "hey");
    assert_eq!(bob_sees_msg, "hey");
    assert_eq!(alice_sees_user, bob_sees_user);
    assert!(bob_sees_user.starts_with("user-"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_join_missing_room_fails() {
    // テスト項目: 存在しないルームへの参加は失敗応答になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    // when (操作):
    client
        .send(Request::JoinRoom {
            room: "ghostroom".to_string(),
        })
        .await;

    // then (期待する結果):
    assert_eq!(
        client.recv().await,
        ServerMessage::Failure {
            request: MessageType::JoinRoom,
            reason: "room 'ghostroom' does not exist".to_string(),
        }
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_abrupt_disconnect_removes_empty_room() {
    // テスト項目: 唯一のメンバーが突然切断するとルームが削除される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect().await;
    alice
        .send(Request::CreateRoom {
            room: "lobby".to_string(),
        })
        .await;
    alice.recv().await;

    // when (操作):
    drop(alice);

    // then (期待する結果):
    server.wait_for_rooms(|rooms| rooms.is_empty()).await;
    server.wait_for_live_connections(0).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    // テスト項目: 不正なフレームは破棄され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    // when (操作):
    client.send_raw(Bytes::from_static(b"9garbage")).await;
    client.send_raw(Bytes::new()).await;
    client.send(Request::ListRooms).await;

    // then (期待する結果):
    assert_eq!(client.recv().await, ServerMessage::RoomList(vec![]));

    server.shutdown().await;
}

#[tokio::test]
async fn test_chat_outside_room_fails_without_broadcast() {
    // テスト項目: ルーム未所属のチャットは失敗し、他ルームには何も届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut member = server.connect().await;
    let mut outsider = server.connect().await;
    member
        .send(Request::CreateRoom {
            room: "lobby".to_string(),
        })
        .await;
    member.recv().await;

    // when (操作):
    outsider
        .send(Request::Chat {
            text: "anyone?".to_string(),
        })
        .await;

    // then (期待する結果):
    assert_eq!(
        outsider.recv().await,
        ServerMessage::Failure {
            request: MessageType::Chat,
            reason: "you are not in a chat room".to_string(),
        }
    );
    member.expect_silence().await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_quit_system_closes_connection() {
    // テスト項目: QUIT_SYSTEM で接続が閉じられ、接続数が 0 に戻る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client
        .send(Request::CreateRoom {
            room: "lobby".to_string(),
        })
        .await;
    client.recv().await;

    // when (操作):
    client.send(Request::QuitSystem).await;

    // then (期待する結果):
    let next = tokio::time::timeout(RECV_TIMEOUT, client.reader.next())
        .await
        .expect("Server did not close the connection");
    assert!(next.is_none(), "expected EOF, got {:?}", next);
    server.wait_for_live_connections(0).await;
    server.wait_for_rooms(|rooms| rooms.is_empty()).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    // テスト項目: 最大長を超えるフレーム長を受け取ると接続が閉じられる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();

    // when (操作):
    stream.write_all(&u32::MAX.to_be_bytes()).await.unwrap();

    // then (期待する結果):
    server.wait_for_live_connections(0).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_open_sessions() {
    // テスト項目: サーバー停止時に接続中のセッションが閉じられる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.send(Request::ListRooms).await;
    client.recv().await;

    // when (操作):
    server.shutdown().await;

    // then (期待する結果):
    let next = tokio::time::timeout(RECV_TIMEOUT, client.reader.next())
        .await
        .expect("Session was not closed on shutdown");
    assert!(next.is_none(), "expected EOF, got {:?}", next);
}

#[tokio::test]
async fn test_oversized_room_list_fails_without_closing_connection() {
    // テスト項目: 1 フレームに収まらないルーム一覧は失敗応答になり、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let (tx, _rx) = mpsc::unbounded_channel();
    for i in 0..800 {
        let name = RoomName::new(format!("{:0>64}", i)).unwrap();
        let member = Member::new(ConnectionId::new(10_000 + i), tx.clone());
        server.context.registry.create_room(name, member).await.unwrap();
    }
    let mut client = server.connect().await;

    // when (操作):
    client.send(Request::ListRooms).await;
    let listed = client.recv().await;
    client
        .send(Request::CreateRoom {
            room: "lobby".to_string(),
        })
        .await;
    let created = client.recv().await;

    // then (期待する結果):
    assert!(matches!(
        listed,
        ServerMessage::Failure {
            request: MessageType::ListRooms,
            ..
        }
    ));
    assert_eq!(created, ServerMessage::CreatedRoom("lobby".to_string()));
    assert_eq!(server.context.live_connections(), 1);

    server.shutdown().await;
}
