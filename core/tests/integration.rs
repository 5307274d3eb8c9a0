//! Places lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock Graph server on a random port, then drives every places
//! operation over real HTTP through `UreqTransport`. Validates that request
//! building, the transport, and response parsing agree with the server.

use facebook_graph::{GraphClient, GraphConfig, GraphError, NewCheckin, Page, UreqTransport};

const TOKEN: &str = "someAccessToken";

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_graph::run(listener, TOKEN).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn places_lifecycle() {
    let base_url = start_server();
    let client = GraphClient::new(
        GraphConfig::new(TOKEN).with_base_url(&base_url),
        UreqTransport::new(),
    );
    let places = client.places();

    // Step 1: seeded checkins for the authenticated user.
    let checkins = places.get_checkins().unwrap();
    assert_eq!(checkins.len(), 2);
    assert_eq!(checkins[0].id, "10150431253050580");
    assert_eq!(checkins[1].tags.as_ref().map(Vec::len), Some(1));

    // Step 2: paging.
    let page = places.get_checkins_page(1, 10).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "10150140239512040");

    // Step 3: another user's checkins.
    let theirs = places.get_user_checkins("533477039").unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].from.as_ref().unwrap().name.as_deref(), Some("Raymie Walls"));

    // Step 4: search around Plano.
    let found: Vec<Page> = places.search("coffee", 33.050278, -96.745833, 5280).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].id, "117723491586638");
    assert!(found[1].location.as_ref().unwrap().street.is_none());

    // Step 5: check in at the first result.
    let checkin = NewCheckin::new(found[0].id.clone(), 33.026239, -96.707089)
        .message("My favorite place")
        .tags(["24680", "13579"]);
    let id = places.checkin_with(&checkin).unwrap();
    assert!(!id.is_empty());

    // Step 6: fetch it back.
    let fetched = places.get_checkin(&id).unwrap();
    assert_eq!(fetched.message.as_deref(), Some("My favorite place"));
    assert_eq!(fetched.place.as_ref().unwrap().id, "117723491586638");
    let tagged: Vec<&str> = fetched.tags.as_deref().unwrap().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(tagged, ["24680", "13579"]);

    // Step 7: the new checkin heads the list.
    let checkins = places.get_checkins().unwrap();
    assert_eq!(checkins.len(), 3);
    assert_eq!(checkins[0].id, id);

    // Step 8: a plain checkin without message or tags.
    let plain = places.checkin("169020919798274", 33.027734, -96.795133).unwrap();
    let fetched = places.get_checkin(&plain).unwrap();
    assert!(fetched.message.is_none());
    assert!(fetched.tags.is_none());

    // Step 9: unknown objects are not found.
    let err = places.get_checkin("424242").unwrap_err();
    assert!(matches!(err, GraphError::ResourceNotFound { .. }), "{err:?}");

    // Step 10: the server rejects a bad place.
    let err = places.checkin("1", 0.0, 0.0).unwrap_err();
    assert!(matches!(err, GraphError::Api { status: 400, .. }), "{err:?}");
}

#[test]
fn rejected_token_is_not_authorized() {
    let base_url = start_server();
    let client = GraphClient::new(
        GraphConfig::new("expiredToken").with_base_url(&base_url),
        UreqTransport::new(),
    );
    let places = client.places();

    assert!(places.get_checkins().unwrap_err().is_not_authorized());
    assert!(places.get_checkin("10150431253050580").unwrap_err().is_not_authorized());
    assert!(places
        .checkin("117723491586638", 33.0, -96.7)
        .unwrap_err()
        .is_not_authorized());
    assert!(places.search("coffee", 33.0, -96.7, 1000).unwrap_err().is_not_authorized());
}

#[test]
fn unreachable_host_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GraphClient::new(
        GraphConfig::new(TOKEN).with_base_url(&format!("http://{addr}")),
        UreqTransport::new(),
    );
    let err = client.places().get_checkins().unwrap_err();
    assert!(matches!(err, GraphError::Transport(_)), "{err:?}");
}
