use std::collections::HashSet;

use chat_hub::{ChatHub, ConnectionId, Identity, IdentityPool, ServerEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn names(list: &[&str]) -> Vec<Identity> {
    list.iter().map(|name| Identity::new(*name)).collect()
}

#[tokio::test]
async fn test_two_participants_chat_and_leave() {
    let hub = ChatHub::default();
    let c1 = ConnectionId::new();
    let c2 = ConnectionId::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();

    // C1 joins
    let bilal = hub.connect(c1, tx1).await;
    assert_eq!(bilal, "Bilal");
    assert_eq!(
        drain(&mut rx1),
        vec![
            ServerEvent::AssignedUsername { username: bilal.clone() },
            ServerEvent::OnlineUsers { users: names(&["Bilal"]) },
            ServerEvent::UserJoined {
                username: bilal.clone(),
                message: "Bilal has joined the chat".to_string(),
            },
        ]
    );

    // C2 joins, both see the new roster
    let noman = hub.connect(c2, tx2).await;
    assert_eq!(noman, "Noman");
    assert_eq!(
        drain(&mut rx2),
        vec![
            ServerEvent::AssignedUsername { username: noman.clone() },
            ServerEvent::OnlineUsers { users: names(&["Bilal", "Noman"]) },
            ServerEvent::user_joined(&noman),
        ]
    );
    assert_eq!(
        drain(&mut rx1),
        vec![
            ServerEvent::OnlineUsers { users: names(&["Bilal", "Noman"]) },
            ServerEvent::user_joined(&noman),
        ]
    );

    // C1 talks, everyone including C1 hears it
    hub.message(c1, "hi".to_string()).await;
    let expected = ServerEvent::Message {
        username: Some(bilal.clone()),
        message: "hi".to_string(),
        sender_id: c1,
    };
    assert_eq!(drain(&mut rx1), vec![expected.clone()]);
    assert_eq!(drain(&mut rx2), vec![expected]);

    // C1 leaves
    assert_eq!(hub.disconnect(c1).await, Some(bilal.clone()));
    assert_eq!(
        drain(&mut rx2),
        vec![
            ServerEvent::OnlineUsers { users: names(&["Noman"]) },
            ServerEvent::UserLeft {
                username: bilal.clone(),
                message: "Bilal has left the chat".to_string(),
            },
        ]
    );
    assert!(drain(&mut rx1).is_empty());

    // The released name goes to the next arrival
    let (tx3, _rx3) = mpsc::unbounded_channel();
    assert_eq!(hub.connect(ConnectionId::new(), tx3).await, bilal);
}

#[tokio::test]
async fn test_roster_matches_assigned_identities() {
    let hub = ChatHub::default();
    let mut assigned = HashSet::new();
    let mut last_rx = None;

    for _ in 0..3 {
        let (tx, rx) = mpsc::unbounded_channel();
        assigned.insert(hub.connect(ConnectionId::new(), tx).await);
        last_rx = Some(rx);
    }

    let mut rx = last_rx.unwrap();
    let roster = drain(&mut rx)
        .into_iter()
        .find_map(|event| match event {
            ServerEvent::OnlineUsers { users } => Some(users),
            _ => None,
        })
        .expect("no roster broadcast");

    assert_eq!(roster.len(), 3);
    assert_eq!(roster.into_iter().collect::<HashSet<_>>(), assigned);
}

#[tokio::test]
async fn test_registry_lookup_matches_assigned_identity() {
    let hub = ChatHub::default();
    let id = ConnectionId::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    hub.connect(id, tx).await;
    let sent = match drain(&mut rx).into_iter().next() {
        Some(ServerEvent::AssignedUsername { username }) => username,
        other => panic!("expected assigned-username first, got {:?}", other),
    };
    assert_eq!(hub.identity_of(&id).await, Some(sent.clone()));

    hub.disconnect(id).await;
    assert!(hub.identity_of(&id).await.is_none());
    assert!(!hub.used_identities().await.contains(&sent));
}

#[tokio::test]
async fn test_twenty_first_participant_gets_generated_name() {
    let hub = ChatHub::new(IdentityPool::new());
    let mut receivers = Vec::new();
    let mut fixed = Vec::new();

    for _ in 0..20 {
        let (tx, rx) = mpsc::unbounded_channel();
        receivers.push(rx);
        fixed.push(hub.connect(ConnectionId::new(), tx).await);
    }

    let (tx, _rx) = mpsc::unbounded_channel();
    let generated = hub.connect(ConnectionId::new(), tx).await;

    assert!(!fixed.contains(&generated));
    let numbered = chat_hub::identity::DEFAULT_NAMES.iter().any(|name| {
        generated
            .as_str()
            .strip_prefix(*name)
            .and_then(|suffix| suffix.parse::<u64>().ok())
            .map_or(false, |n| n >= 1)
    });
    assert!(numbered, "unexpected generated identity {}", generated);
    assert_eq!(hub.online_users().await.len(), 21);
}

#[tokio::test]
async fn test_dropped_receiver_does_not_block_broadcast() {
    let hub = ChatHub::default();
    let quiet = ConnectionId::new();
    let (tx1, rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();

    hub.connect(quiet, tx1).await;
    let speaker = ConnectionId::new();
    hub.connect(speaker, tx2).await;
    drop(rx1);
    drain(&mut rx2);

    hub.message(speaker, "still here".to_string()).await;

    assert_eq!(drain(&mut rx2).len(), 1);
}
