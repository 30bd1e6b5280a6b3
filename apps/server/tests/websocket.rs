use futures_util::{SinkExt, StreamExt};
use keeper_domain::protocol::CommandMessage;
use keeper_server::Server;
use keeper_session::texts;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (Server, SocketAddr) {
    let server = Server::builder().build().await.expect("server builds against mem://");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = server.router();
    tokio::spawn(async move { axum::serve(listener, router).await });
    (server, addr)
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) =
        connect_async(format!("ws://{addr}/api/v1/command")).await.expect("ws connect");
    socket
}

async fn send(socket: &mut Socket, username: &str, message: &str) {
    let text = serde_json::to_string(&CommandMessage::new(username, message)).expect("encode");
    socket.send(Message::Text(text)).await.expect("ws send");
}

async fn recv(socket: &mut Socket) -> CommandMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("reply in time")
            .expect("stream open")
            .expect("frame");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("decode");
        }
    }
}

#[tokio::test]
async fn command_stream_creates_and_reads_a_record() {
    let (server, addr) = spawn_server().await;
    let mut socket = connect(addr).await;

    send(&mut socket, "alice", "hello").await;
    let menu = recv(&mut socket).await;
    assert_eq!(menu.username, "server");
    assert_eq!(menu.message, texts::MAIN_MENU);

    send(&mut socket, "alice", "2").await;
    assert_eq!(recv(&mut socket).await.message, texts::CREATE_MENU);

    send(&mut socket, "alice", "2").await;
    assert!(recv(&mut socket).await.message.contains("[text]"));

    send(&mut socket, "alice", "diary::dear diary::private").await;
    assert_eq!(recv(&mut socket).await.message, texts::DATA_SAVED);
    assert_eq!(recv(&mut socket).await.message, texts::MAIN_MENU);

    send(&mut socket, "alice", "1").await;
    assert_eq!(recv(&mut socket).await.message, texts::title_list(&["diary".to_owned()]));

    send(&mut socket, "alice", "1").await;
    let record = recv(&mut socket).await.message;
    assert!(record.starts_with("Your data:\n"));
    assert!(record.contains("text: dear diary\n"));
    assert_eq!(server.state().sessions(), 1);
}

#[tokio::test]
async fn closing_the_socket_deregisters_the_session() {
    let (server, addr) = spawn_server().await;
    let mut socket = connect(addr).await;

    send(&mut socket, "bob", "hi").await;
    assert_eq!(recv(&mut socket).await.message, texts::MAIN_MENU);
    assert_eq!(server.state().sessions(), 1);

    socket.close(None).await.expect("close");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while server.state().sessions() != 0 {
        assert!(tokio::time::Instant::now() < deadline, "session still registered");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
