//! TCP transport tested against a plain socket client.

mod common;

use std::sync::Arc;

use tokio::{io::AsyncReadExt, net::TcpStream};
use tuio_server::{
    domain::{OscSender, TuioTime},
    infrastructure::sender::{Endpoint, TcpSender},
};

use common::{TIMEOUT, contains, create_manager, token_at, wait_for_clients};

async fn read_packet(stream: &mut TcpStream) -> Vec<u8> {
    let size = tokio::time::timeout(TIMEOUT, stream.read_i32())
        .await
        .unwrap()
        .unwrap();
    let mut packet = vec![0u8; size as usize];
    stream.read_exact(&mut packet).await.unwrap();
    packet
}

/// Everything the sender wrote until it closed the connection
async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut bytes = Vec::new();
    tokio::time::timeout(TIMEOUT, stream.read_to_end(&mut bytes))
        .await
        .unwrap()
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_token_lifecycle_over_tcp() {
    // テスト項目: TCP クライアントに追加フレームと削除フレームが区切りなしで続けて届く
    // given (前提条件):
    let sender = Arc::new(TcpSender::tcp(&Endpoint::new("127.0.0.1", 0)).await.unwrap());
    let manager = create_manager();
    manager.add_sender(sender.clone()).await;
    let mut client = TcpStream::connect(sender.local_addr().unwrap())
        .await
        .unwrap();
    wait_for_clients(&sender, 1).await;

    // when (操作):
    let session_id = manager.observe(&token_at(0.0, 5, 0.1, 0.1)).await.unwrap();
    manager.observe(&token_at(1.0, 5, 0.2, 0.1)).await.unwrap();
    manager.commit_frame(TuioTime::from_secs_f64(1.0)).await.unwrap();
    manager.retire(session_id).await.unwrap();
    manager.commit_frame(TuioTime::from_secs_f64(1.1)).await.unwrap();
    manager.close().await;

    // then (期待する結果): 2 つのバンドルがそのまま連続している
    let stream = read_until_closed(&mut client).await;
    assert!(stream.starts_with(b"#bundle\0"));
    let second = stream
        .windows(8)
        .skip(1)
        .position(|w| w == b"#bundle\0")
        .map(|at| at + 1)
        .unwrap();
    let (added, removed) = stream.split_at(second);
    assert!(contains(added, b"/tuio2/tok"));
    assert!(!contains(removed, b"/tuio2/tok"));
    assert!(contains(removed, b"/tuio2/alv"));
}

#[tokio::test]
async fn test_token_lifecycle_over_size_prefixed_tcp() {
    // テスト項目: サイズ付き TCP クライアントに追加フレームと削除フレームがサイズ付きで届く
    // given (前提条件):
    let sender = Arc::new(
        TcpSender::tcp_size_prefixed(&Endpoint::new("127.0.0.1", 0))
            .await
            .unwrap(),
    );
    let manager = create_manager();
    manager.add_sender(sender.clone()).await;
    let mut client = TcpStream::connect(sender.local_addr().unwrap())
        .await
        .unwrap();
    wait_for_clients(&sender, 1).await;

    // when (操作):
    let session_id = manager.observe(&token_at(0.0, 5, 0.1, 0.1)).await.unwrap();
    manager.observe(&token_at(1.0, 5, 0.2, 0.1)).await.unwrap();
    manager.commit_frame(TuioTime::from_secs_f64(1.0)).await.unwrap();
    manager.retire(session_id).await.unwrap();
    manager.commit_frame(TuioTime::from_secs_f64(1.1)).await.unwrap();

    // then (期待する結果):
    let added = read_packet(&mut client).await;
    let removed = read_packet(&mut client).await;
    assert!(added.starts_with(b"#bundle\0"));
    assert!(contains(&added, b"/tuio2/tok"));
    assert!(removed.starts_with(b"#bundle\0"));
    assert!(!contains(&removed, b"/tuio2/tok"));
    assert!(contains(&removed, b"/tuio2/alv"));
}

#[tokio::test]
async fn test_closing_manager_closes_senders() {
    // テスト項目: SessionManager を閉じると登録された Sender も閉じられる
    // given (前提条件):
    let sender = Arc::new(TcpSender::tcp(&Endpoint::new("127.0.0.1", 0)).await.unwrap());
    let manager = create_manager();
    manager.add_sender(sender.clone()).await;

    // when (操作):
    manager.close().await;

    // then (期待する結果): リスナーが解放され接続できなくなる
    assert!(!sender.is_open());
    let addr = sender.local_addr().unwrap();
    let mut refused = false;
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_err() {
            refused = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(refused);
}
