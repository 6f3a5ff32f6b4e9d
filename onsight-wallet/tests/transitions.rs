use onsight_wallet::{
    events::{WalletTransition, WalletUpdate},
    sim::{SimWallet, WalletError},
    state::WalletSnapshot,
    watcher::{TransitionListener, TransitionWatcher, WatcherConfig},
};
use tokio::time::{timeout, Duration};

const ADDRESS: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";

async fn next(listener: &mut TransitionListener) -> WalletTransition {
    timeout(Duration::from_secs(2), listener.next_transition())
        .await
        .expect("timed out waiting for a transition")
        .expect("transition stream closed")
}

async fn assert_quiet(listener: &mut TransitionListener) {
    let result = timeout(Duration::from_millis(100), listener.next_transition()).await;
    assert!(result.is_err(), "expected no transition, got {:?}", result);
}

#[tokio::test]
async fn connect_fires_exactly_once() {
    let (watcher, handle) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher.run());
    let mut listener = handle.subscribe();

    let mut wallet = SimWallet::new("TestConnector", handle.clone());
    wallet.connect(ADDRESS, 1).await;

    match next(&mut listener).await {
        WalletTransition::Connected {
            address, chain_id, ..
        } => {
            assert_eq!(address, ADDRESS);
            assert_eq!(chain_id, Some(1));
        }
        other => panic!("expected Connected, got {:?}", other),
    }

    // A no-op reconnect to the same address must not re-fire.
    wallet.connect(ADDRESS, 1).await;
    assert_quiet(&mut listener).await;
}

#[tokio::test]
async fn disconnect_and_chain_change_in_order() {
    let (watcher, handle) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher.run());
    let mut listener = handle.subscribe();

    let mut wallet = SimWallet::new("TestConnector", handle.clone());
    wallet.connect(ADDRESS, 1).await;
    wallet.switch_chain(42161).await.unwrap();
    wallet.disconnect().await;

    assert!(matches!(
        next(&mut listener).await,
        WalletTransition::Connected { .. }
    ));
    match next(&mut listener).await {
        WalletTransition::ChainChanged { chain_id, previous } => {
            assert_eq!(chain_id, 42161);
            assert_eq!(previous, Some(1));
        }
        other => panic!("expected ChainChanged, got {:?}", other),
    }
    match next(&mut listener).await {
        WalletTransition::Disconnected { address } => assert_eq!(address, ADDRESS),
        other => panic!("expected Disconnected, got {:?}", other),
    }
}

#[tokio::test]
async fn address_replacement_rebalances() {
    let (watcher, handle) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher.run());
    let mut listener = handle.subscribe();

    handle
        .update(WalletUpdate::Snapshot(WalletSnapshot::connected(
            "0xaaa", 1, "A",
        )))
        .await;
    handle
        .update(WalletUpdate::Snapshot(WalletSnapshot::connected(
            "0xbbb", 1, "A",
        )))
        .await;

    assert!(matches!(
        next(&mut listener).await,
        WalletTransition::Connected { .. }
    ));
    assert!(matches!(
        next(&mut listener).await,
        WalletTransition::Disconnected { .. }
    ));
    match next(&mut listener).await {
        WalletTransition::Connected { address, .. } => assert_eq!(address, "0xbbb"),
        other => panic!("expected Connected, got {:?}", other),
    }
}

#[tokio::test]
async fn signature_and_transaction_results_pass_through() {
    let (watcher, handle) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher.run());
    let mut listener = handle.subscribe();

    let mut wallet = SimWallet::new("TestConnector", handle.clone());
    wallet.connect(ADDRESS, 1).await;
    let signature = wallet.sign_message("hello").await.unwrap();
    let hash = wallet.send_transaction(ADDRESS, 0).await.unwrap();

    assert!(matches!(
        next(&mut listener).await,
        WalletTransition::Connected { .. }
    ));
    match next(&mut listener).await {
        WalletTransition::SignatureCompleted {
            signature: observed,
            ..
        } => assert_eq!(observed, signature),
        other => panic!("expected SignatureCompleted, got {:?}", other),
    }
    match next(&mut listener).await {
        WalletTransition::TransactionSubmitted {
            hash: observed,
            chain_id,
            ..
        } => {
            assert_eq!(observed, hash);
            assert_eq!(chain_id, 1);
        }
        other => panic!("expected TransactionSubmitted, got {:?}", other),
    }
}

#[tokio::test]
async fn mutations_require_a_connection() {
    let (watcher, handle) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher.run());

    let mut wallet = SimWallet::new("TestConnector", handle.clone());
    assert_eq!(
        wallet.sign_message("hello").await,
        Err(WalletError::NotConnected)
    );
    assert_eq!(
        wallet.send_transaction(ADDRESS, 0).await,
        Err(WalletError::NotConnected)
    );
    assert_eq!(wallet.switch_chain(1).await, Err(WalletError::NotConnected));
}

#[tokio::test]
async fn each_subscriber_sees_every_transition() {
    let (watcher, handle) = TransitionWatcher::new(WatcherConfig::default());
    tokio::spawn(watcher.run());
    let mut first = handle.subscribe();
    let second = handle.subscribe();

    let mut wallet = SimWallet::new("TestConnector", handle.clone());
    wallet.connect(ADDRESS, 1).await;

    assert!(matches!(
        next(&mut first).await,
        WalletTransition::Connected { .. }
    ));

    // Dropping one subscriber must not disturb the others.
    drop(second);
    wallet.disconnect().await;
    assert!(matches!(
        next(&mut first).await,
        WalletTransition::Disconnected { .. }
    ));
}
