mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{attach, attach_lingering, connected, eventually};
use encore_client::router::ListenerError;
use encore_client::{Client, ClientConfig, Error, EventKind, Listener, Params};
use serde_json::{json, Value};

#[tokio::test]
async fn call_returns_the_result() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });

    let request = server.next_call().await;
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "core.get_version");
    assert_eq!(request["params"], json!({}));
    assert!(request["id"].is_u64());

    server.reply(&request["id"], json!("3.0.0")).await;

    assert_eq!(call.await.unwrap(), Ok(json!("3.0.0")));
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn concurrent_calls_are_matched_by_id() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let methods = ["core.get_version", "core.mixer.get_volume", "core.playback.get_state"];
    let calls: Vec<_> = methods
        .iter()
        .map(|&method| {
            let client = client.clone();
            tokio::spawn(async move { client.call(method, Params::new()).await })
        })
        .collect();

    let mut requests = Vec::new();
    for _ in 0..methods.len() {
        requests.push(server.next_call().await);
    }

    let ids: Vec<&Value> = requests.iter().map(|request| &request["id"]).collect();
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);

    // Answer in reverse arrival order, echoing the method name
    for request in requests.iter().rev() {
        server.reply(&request["id"], request["method"].clone()).await;
    }

    for (method, call) in methods.iter().zip(calls) {
        assert_eq!(call.await.unwrap(), Ok(json!(method)));
    }
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn duplicate_reply_is_ignored() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.mixer.get_volume", Params::new()).await }
    });

    let request = server.next_call().await;
    server.reply(&request["id"], json!(30)).await;
    server.reply(&request["id"], json!(70)).await;

    assert_eq!(call.await.unwrap(), Ok(json!(30)));
    assert!(eventually(|| client.unmatched_replies() == 1).await);
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn reply_with_unknown_id_does_no_harm() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.playback.get_state", Params::new()).await }
    });

    let request = server.next_call().await;
    server.reply(&json!(987_654), json!("paused")).await;
    assert!(eventually(|| client.unmatched_replies() == 1).await);
    assert_eq!(client.pending_calls(), 1);

    server.reply(&request["id"], json!("playing")).await;
    assert_eq!(call.await.unwrap(), Ok(json!("playing")));
}

#[tokio::test]
async fn malformed_messages_are_skipped() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });

    let request = server.next_call().await;
    server.send_raw(b"this is not json").await;
    server.send(json!({"jsonrpc": "2.0", "unexpected": true})).await;
    server.send(json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "Parse error"}})).await;
    server.reply(&request["id"], json!("3.0.0")).await;

    assert_eq!(call.await.unwrap(), Ok(json!("3.0.0")));
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn remote_error_is_returned_to_the_caller() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.does_not_exist", Params::new()).await }
    });

    let request = server.next_call().await;
    server.reply_error(&request["id"], -32601, "Method not found").await;

    assert_eq!(
        call.await.unwrap(),
        Err(Error::Remote {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        })
    );
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn server_close_fails_pending_calls() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let calls: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.call("core.library.refresh", Params::new()).await })
        })
        .collect();

    for _ in 0..3 {
        server.next_call().await;
    }
    server.close().await;

    for call in calls {
        assert_eq!(call.await.unwrap(), Err(Error::ConnectionClosed));
    }
    assert_eq!(client.pending_calls(), 0);
    assert!(!client.is_connected().await);

    assert_eq!(
        client.call("core.get_version", Params::new()).await,
        Err(Error::NotConnected)
    );
}

#[tokio::test]
async fn disconnect_fails_pending_calls() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.tracklist.get_tl_tracks", Params::new()).await }
    });
    server.next_call().await;

    client.disconnect().await.unwrap();

    assert_eq!(call.await.unwrap(), Err(Error::ConnectionClosed));
    assert_eq!(client.pending_calls(), 0);
    assert!(!client.is_connected().await);

    assert_eq!(
        client.call("core.get_version", Params::new()).await,
        Err(Error::NotConnected)
    );
    assert_eq!(client.disconnect().await, Err(Error::NotConnected));
}

#[tokio::test]
async fn lifecycle_misuse_is_reported() {
    let client = Client::new(ClientConfig::default());

    assert!(!client.is_connected().await);
    assert_eq!(
        client.call("core.get_version", Params::new()).await,
        Err(Error::NotConnected)
    );
    assert_eq!(client.disconnect().await, Err(Error::NotConnected));

    let _server = attach(&client).await;
    let (second, _other) = encore_fabric::transport::MemoryTransport::pair();
    assert_eq!(
        client.connect_transport(second).await,
        Err(Error::AlreadyConnected)
    );
    assert_eq!(client.connect().await, Err(Error::AlreadyConnected));
}

#[tokio::test]
async fn client_reconnects_after_the_server_went_away() {
    let (client, server) = connected(ClientConfig::default()).await;
    server.close().await;
    assert!(eventually_connected(&client, false).await);

    let mut server = attach(&client).await;
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });

    let request = server.next_call().await;
    server.reply(&request["id"], json!("3.0.0")).await;
    assert_eq!(call.await.unwrap(), Ok(json!("3.0.0")));
}

#[tokio::test]
async fn request_ids_keep_increasing_across_connections() {
    let client = Client::new(ClientConfig::default());

    let mut first = attach(&client).await;
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });
    let request = first.next_call().await;
    let first_id = request["id"].as_u64().unwrap();
    first.reply(&request["id"], json!("3.0.0")).await;
    call.await.unwrap().unwrap();

    client.disconnect().await.unwrap();

    let mut second = attach(&client).await;
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });
    let request = second.next_call().await;
    assert!(request["id"].as_u64().unwrap() > first_id);
    second.reply(&request["id"], json!("3.0.0")).await;
    call.await.unwrap().unwrap();
}

#[tokio::test]
async fn reconnect_while_previous_transport_is_still_closing() {
    let client = Client::new(ClientConfig::default());

    let first = attach_lingering(&client, Duration::from_millis(200)).await;
    first.close().await;
    assert!(eventually_connected(&client, false).await);

    let mut second = attach(&client).await;
    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });

    // Answer only after the first transport has certainly finished closing
    let request = second.next_call().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    second.reply(&request["id"], json!("3.0.0")).await;

    assert_eq!(call.await.unwrap(), Ok(json!("3.0.0")));
    assert_eq!(client.unmatched_replies(), 0);
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn teardown_of_an_old_connection_spares_new_calls() {
    let client = Client::new(ClientConfig::default());

    let mut first = attach_lingering(&client, Duration::from_millis(200)).await;
    let stale = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.library.refresh", Params::new()).await }
    });
    first.next_call().await;

    // Disconnect runs concurrently with the reconnect below
    let disconnecting = tokio::spawn({
        let client = client.clone();
        async move { client.disconnect().await }
    });
    assert!(eventually_connected(&client, false).await);

    let mut second = attach(&client).await;
    let fresh = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });
    let request = second.next_call().await;

    assert_eq!(disconnecting.await.unwrap(), Ok(()));
    assert_eq!(stale.await.unwrap(), Err(Error::ConnectionClosed));

    second.reply(&request["id"], json!("3.0.0")).await;
    assert_eq!(fresh.await.unwrap(), Ok(json!("3.0.0")));
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn no_listener_runs_after_disconnect_returns() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let handled = Arc::new(Mutex::new(0));

    let listener = {
        let handled = Arc::clone(&handled);
        Listener::new(move |_event| {
            let handled = Arc::clone(&handled);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                *handled.lock().unwrap() += 1;
                Ok::<(), ListenerError>(())
            }
        })
    };
    client.subscribe("seeked", &listener).unwrap();

    for position in 0..5 {
        server
            .send(json!({"event": "seeked", "time_position": position * 1000}))
            .await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    client.disconnect().await.unwrap();
    let at_return = *handled.lock().unwrap();
    assert!(at_return < 5);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(*handled.lock().unwrap(), at_return);

    // The next connection's events are delivered as usual
    let mut server = attach(&client).await;
    server
        .send(json!({"event": "seeked", "time_position": 0}))
        .await;
    assert!(eventually(|| *handled.lock().unwrap() == at_return + 1).await);
}

#[tokio::test]
async fn events_reach_only_their_subscribers() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let volumes = Arc::new(Mutex::new(Vec::new()));
    let seeks = Arc::new(Mutex::new(0));

    let seen = Arc::clone(&volumes);
    client.on(EventKind::VolumeChanged, move |event| {
        seen.lock().unwrap().push(event.field::<u8>("volume"));
    });
    let counter = Arc::clone(&seeks);
    client.on(EventKind::Seeked, move |_event| *counter.lock().unwrap() += 1);

    server.send(json!({"event": "volume_changed", "volume": 42})).await;

    assert!(eventually(|| volumes.lock().unwrap().len() == 1).await);
    assert_eq!(*volumes.lock().unwrap(), vec![Some(42)]);
    assert_eq!(*seeks.lock().unwrap(), 0);
}

#[tokio::test]
async fn enveloped_event_payload_is_unwrapped() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let positions = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&positions);
    client.on(EventKind::Seeked, move |event| {
        seen.lock().unwrap().push(event.field::<u64>("time_position"));
    });

    server
        .send(json!({"event": "seeked", "data": {"time_position": 31000}}))
        .await;

    assert!(eventually(|| positions.lock().unwrap().len() == 1).await);
    assert_eq!(*positions.lock().unwrap(), vec![Some(31000)]);
}

#[tokio::test]
async fn events_interleave_with_replies() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let titles = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&titles);
    client.on(EventKind::StreamTitleChanged, move |event| {
        seen.lock().unwrap().push(event.field::<String>("title").unwrap_or_default());
    });

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.playback.get_stream_title", Params::new()).await }
    });

    let request = server.next_call().await;
    server.send(json!({"event": "stream_title_changed", "title": "Radio One"})).await;
    server.reply(&request["id"], json!("Radio One")).await;
    server.send(json!({"event": "stream_title_changed", "title": "Radio Two"})).await;

    assert_eq!(call.await.unwrap(), Ok(json!("Radio One")));
    assert!(eventually(|| titles.lock().unwrap().len() == 2).await);
    assert_eq!(*titles.lock().unwrap(), vec!["Radio One", "Radio Two"]);
}

#[tokio::test]
async fn unknown_events_are_ignored_and_rejected_on_subscribe() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let listener = Listener::from_fn(|_| {});

    assert_eq!(
        client.subscribe("bogus_event", &listener),
        Err(Error::UnknownEventKind("bogus_event".to_string()))
    );

    server.send(json!({"event": "bogus_event", "x": 1})).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.get_version", Params::new()).await }
    });
    let request = server.next_call().await;
    server.reply(&request["id"], json!("3.0.0")).await;

    assert_eq!(call.await.unwrap(), Ok(json!("3.0.0")));
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn unsubscribed_listener_is_not_invoked() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let hits = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&hits);
    let removed = Listener::from_fn(move |_| seen.lock().unwrap().push("removed"));
    let seen = Arc::clone(&hits);
    let kept = Listener::from_fn(move |_| seen.lock().unwrap().push("kept"));

    client.subscribe("mute_changed", &removed).unwrap();
    client.subscribe("mute_changed", &kept).unwrap();
    client.unsubscribe("mute_changed", &removed).unwrap();

    server.send(json!({"event": "mute_changed", "mute": true})).await;

    assert!(eventually(|| !hits.lock().unwrap().is_empty()).await);
    assert_eq!(*hits.lock().unwrap(), vec!["kept"]);

    client.clear_subscriptions();
    assert_eq!(client.router().listener_count(EventKind::MuteChanged), 0);
}

#[tokio::test]
async fn listener_can_call_the_server() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let volumes = Arc::new(Mutex::new(Vec::new()));

    let listener = {
        let client = client.clone();
        let volumes = Arc::clone(&volumes);
        Listener::new(move |_event| {
            let client = client.clone();
            let volumes = Arc::clone(&volumes);
            async move {
                let volume = client.mixer().get_volume().await?;
                volumes.lock().unwrap().push(volume);
                Ok::<(), ListenerError>(())
            }
        })
    };
    client.subscribe("volume_changed", &listener).unwrap();

    server.send(json!({"event": "volume_changed", "volume": 12})).await;

    let request = server.next_call().await;
    assert_eq!(request["method"], "core.mixer.get_volume");
    server.reply(&request["id"], json!(12)).await;

    assert!(eventually(|| volumes.lock().unwrap().len() == 1).await);
    assert_eq!(*volumes.lock().unwrap(), vec![Some(12)]);
}

#[tokio::test]
async fn failing_listener_keeps_the_connection_alive() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let hits = Arc::new(Mutex::new(0));

    client.on(EventKind::PlaylistsLoaded, |_| panic!("listener bug"));
    let counter = Arc::clone(&hits);
    client.on(EventKind::PlaylistsLoaded, move |_| *counter.lock().unwrap() += 1);

    server.send(json!({"event": "playlists_loaded"})).await;
    server.send(json!({"event": "playlists_loaded"})).await;

    assert!(eventually(|| *hits.lock().unwrap() == 2).await);
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn call_timeout_abandons_the_call() {
    let config = ClientConfig::builder()
        .call_timeout(Duration::from_millis(50))
        .build();
    let (client, mut server) = connected(config).await;

    let call = tokio::spawn({
        let client = client.clone();
        async move { client.call("core.library.browse", Params::new()).await }
    });

    let request = server.next_call().await;
    assert_eq!(
        call.await.unwrap(),
        Err(Error::Timeout {
            method: "core.library.browse".to_string(),
            after: Duration::from_millis(50),
        })
    );
    assert_eq!(client.pending_calls(), 0);

    // The late reply is dropped
    server.reply(&request["id"], json!([])).await;
    assert!(eventually(|| client.unmatched_replies() == 1).await);
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn dropping_a_call_forgets_it() {
    let (client, mut server) = connected(ClientConfig::default()).await;

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        client.call("core.library.search", Params::new()),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(client.pending_calls(), 0);

    let request = server.next_call().await;
    assert_eq!(request["method"], "core.library.search");
}

#[tokio::test]
async fn clones_share_the_connection() {
    let (client, mut server) = connected(ClientConfig::default()).await;
    let other = client.clone();

    let call = tokio::spawn(async move { other.call("core.get_version", Params::new()).await });
    let request = server.next_call().await;
    server.reply(&request["id"], json!("3.0.0")).await;
    assert_eq!(call.await.unwrap(), Ok(json!("3.0.0")));

    client.disconnect().await.unwrap();
    assert!(!client.clone().is_connected().await);
}

async fn eventually_connected(client: &Client, expected: bool) -> bool {
    for _ in 0..100 {
        if client.is_connected().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
