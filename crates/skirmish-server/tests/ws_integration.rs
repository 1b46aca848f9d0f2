#[allow(dead_code)]
mod common;

use skirmish_core::net::messages::{
    ClientMessage, CollectPickupMsg, JoinMsg, MoveMsg, PickupCollectedMsg, PlayerLeftMsg,
    PlayerMovedMsg, PlayerShotMsg, ServerMessage, ShootMsg, TookDamageMsg,
};
use skirmish_core::net::protocol::encode_server_message;
use skirmish_server::config::ServerConfig;
use skirmish_world::WorldConfig;

use common::{
    TestServer, http_get, join_player, ws_connect, ws_expect_closed, ws_join, ws_read_server_msg,
    ws_send_client_msg, ws_try_read_server_msg,
};
use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn join_receives_init_snapshot() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;

    let init = ws_join(&mut stream, "Alice").await;
    assert_eq!(init.players.len(), 1);
    let me = &init.players[&init.id];
    assert_eq!(me.name, "Alice");
    assert_eq!(me.hp, 100);
    assert_eq!((me.x, me.y, me.z), (0.0, 2.0, 0.0));
    assert!(!me.is_bot);
    assert_eq!(init.pickups.len(), 8);
}

#[tokio::test]
async fn blank_name_gets_generated() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;

    let init = ws_join(&mut stream, "   ").await;
    assert!(!init.players[&init.id].name.trim().is_empty());
}

#[tokio::test]
async fn second_player_is_announced() {
    let server = TestServer::new().await;
    let (mut alice, a) = join_player(&server, "Alice").await;
    let mut bob = ws_connect(&server.ws_url()).await;
    let init = ws_join(&mut bob, "Bob").await;

    assert_eq!(init.players.len(), 2);
    assert_eq!(init.players[&a].name, "Alice");

    match ws_read_server_msg(&mut alice).await {
        ServerMessage::PlayerJoined(joined) => {
            assert_eq!(joined.id, init.id);
            assert_eq!(joined.data.name, "Bob");
        },
        other => panic!("Expected PlayerJoined, got: {other:?}"),
    }
}

#[tokio::test]
async fn move_is_relayed_to_others() {
    let server = TestServer::new().await;
    let (mut alice, a) = join_player(&server, "Alice").await;
    let (mut bob, _) = join_player(&server, "Bob").await;
    let _ = ws_read_server_msg(&mut alice).await; // PlayerJoined

    let mv = MoveMsg {
        x: 5.0,
        y: 2.0,
        z: -7.5,
        ry: 0.5,
    };
    ws_send_client_msg(&mut alice, &ClientMessage::Move(mv)).await;

    assert_eq!(
        ws_read_server_msg(&mut bob).await,
        ServerMessage::PlayerMoved(PlayerMovedMsg {
            id: a,
            x: 5.0,
            y: 2.0,
            z: -7.5,
            ry: 0.5,
        })
    );
    assert!(ws_try_read_server_msg(&mut alice, 200).await.is_none());
}

#[tokio::test]
async fn shot_reaches_everyone_and_damage_only_the_victim() {
    let server = TestServer::new().await;
    let (mut alice, a) = join_player(&server, "Alice").await;
    let (mut bob, b) = join_player(&server, "Bob").await;
    let _ = ws_read_server_msg(&mut alice).await; // PlayerJoined

    ws_send_client_msg(
        &mut alice,
        &ClientMessage::Shoot(ShootMsg { hit_id: Some(b) }),
    )
    .await;

    assert_eq!(
        ws_read_server_msg(&mut alice).await,
        ServerMessage::PlayerShot(PlayerShotMsg { id: a })
    );
    assert_eq!(
        ws_read_server_msg(&mut bob).await,
        ServerMessage::PlayerShot(PlayerShotMsg { id: a })
    );
    assert_eq!(
        ws_read_server_msg(&mut bob).await,
        ServerMessage::TookDamage(TookDamageMsg { amount: 10 })
    );
    assert!(ws_try_read_server_msg(&mut alice, 200).await.is_none());
}

#[tokio::test]
async fn pickup_collected_once() {
    let server = TestServer::new().await;
    let (mut alice, _) = join_player(&server, "Alice").await;
    let (mut bob, _) = join_player(&server, "Bob").await;
    let _ = ws_read_server_msg(&mut alice).await; // PlayerJoined

    let collect = ClientMessage::CollectPickup(CollectPickupMsg {
        pickup_id: "health1".to_string(),
    });
    ws_send_client_msg(&mut bob, &collect).await;

    let expected = ServerMessage::PickupCollected(PickupCollectedMsg {
        id: "health1".to_string(),
    });
    assert_eq!(ws_read_server_msg(&mut alice).await, expected);
    assert_eq!(ws_read_server_msg(&mut bob).await, expected);

    // Already hidden: nothing happens.
    ws_send_client_msg(&mut alice, &collect).await;
    assert!(ws_try_read_server_msg(&mut bob, 200).await.is_none());

    // A late joiner does not see the hidden pickup.
    let mut carol = ws_connect(&server.ws_url()).await;
    let init = ws_join(&mut carol, "Carol").await;
    assert_eq!(init.pickups.len(), 7);
    assert!(init.pickups.iter().all(|p| p.id != "health1"));
}

#[tokio::test]
async fn disconnect_broadcasts_player_left() {
    let server = TestServer::new().await;
    let (mut alice, a) = join_player(&server, "Alice").await;
    let (mut bob, _) = join_player(&server, "Bob").await;
    let _ = ws_read_server_msg(&mut alice).await; // PlayerJoined

    alice.close(None).await.unwrap();

    assert_eq!(
        ws_read_server_msg(&mut bob).await,
        ServerMessage::PlayerLeft(PlayerLeftMsg { id: a })
    );
}

#[tokio::test]
async fn protocol_mismatch_is_rejected() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;

    let msg = ClientMessage::Join(JoinMsg {
        color: None,
        name: Some("Future".to_string()),
        protocol_version: 99,
    });
    ws_send_client_msg(&mut stream, &msg).await;

    match ws_read_server_msg(&mut stream).await {
        ServerMessage::JoinRejected(rejected) => {
            assert!(rejected.reason.contains("Protocol version mismatch"));
        },
        other => panic!("Expected JoinRejected, got: {other:?}"),
    }
    ws_expect_closed(&mut stream).await;
}

#[tokio::test]
async fn first_frame_must_be_join() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;

    let mv = MoveMsg {
        x: 1.0,
        y: 2.0,
        z: 3.0,
        ry: 0.0,
    };
    ws_send_client_msg(&mut stream, &ClientMessage::Move(mv)).await;
    ws_expect_closed(&mut stream).await;
}

#[tokio::test]
async fn server_only_and_repeated_join_are_ignored() {
    let server = TestServer::new().await;
    let (mut alice, a) = join_player(&server, "Alice").await;
    let (mut bob, b) = join_player(&server, "Bob").await;
    let _ = ws_read_server_msg(&mut alice).await; // PlayerJoined

    // A client forging a server event.
    let forged = encode_server_message(&ServerMessage::PlayerLeft(PlayerLeftMsg { id: b })).unwrap();
    alice.send(Message::Binary(forged.into())).await.unwrap();

    // A second join on the same connection.
    let rejoin = ClientMessage::Join(JoinMsg {
        color: None,
        name: Some("Alice2".to_string()),
        protocol_version: 0,
    });
    ws_send_client_msg(&mut alice, &rejoin).await;

    // Junk bytes.
    alice
        .send(Message::Binary(vec![0xEE, 0x01, 0x02].into()))
        .await
        .unwrap();

    // The connection still works and Bob only sees the real move.
    let mv = MoveMsg {
        x: 1.0,
        y: 2.0,
        z: 1.0,
        ry: 0.0,
    };
    ws_send_client_msg(&mut alice, &ClientMessage::Move(mv)).await;
    match ws_read_server_msg(&mut bob).await {
        ServerMessage::PlayerMoved(moved) => assert_eq!(moved.id, a),
        other => panic!("Expected PlayerMoved, got: {other:?}"),
    }

    let (status, body) = http_get(server.addr, "/health").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["world"]["players"], 2);
}

#[tokio::test]
async fn health_reports_population() {
    let config = ServerConfig {
        world: WorldConfig {
            bot_count: 2,
            obstacle_count: 0,
            ..WorldConfig::default()
        },
        ..ServerConfig::default()
    };
    let server = TestServer::from_config(config).await;
    let (_alice, _) = join_player(&server, "Alice").await;

    let (status, body) = http_get(server.addr, "/health").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["connections"]["websocket"], 1);
    assert_eq!(json["world"]["players"], 1);
    assert_eq!(json["world"]["bots"], 2);

    let (status, body) = http_get(server.addr, "/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body, "ready");
}

#[tokio::test]
async fn bots_appear_in_init() {
    let config = ServerConfig {
        world: WorldConfig {
            bot_count: 3,
            ..WorldConfig::default()
        },
        ..ServerConfig::default()
    };
    let server = TestServer::from_config(config).await;
    let mut stream = ws_connect(&server.ws_url()).await;
    let init = ws_join(&mut stream, "Alice").await;

    let bots: Vec<_> = init.players.values().filter(|p| p.is_bot).collect();
    assert_eq!(bots.len(), 3);
    assert!(bots.iter().all(|b| b.name.starts_with("Bot_")));
}

#[tokio::test]
async fn connection_cap_returns_503() {
    let mut config = ServerConfig::default();
    config.world.bots_enabled = false;
    config.limits.max_ws_connections = 1;
    let server = TestServer::from_config(config).await;

    let (_alice, _) = join_player(&server, "Alice").await;

    let err = tokio_tungstenite::connect_async(server.ws_url())
        .await
        .unwrap_err();
    match err {
        tokio_tungstenite::tungstenite::Error::Http(resp) => {
            assert_eq!(resp.status(), 503);
        },
        other => panic!("Expected HTTP 503, got: {other:?}"),
    }
}
