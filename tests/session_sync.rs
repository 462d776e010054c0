//! End-to-end session synchronization tests.

use std::time::Duration;
use tokio::sync::broadcast;

use alloy::primitives::U256;
use wallet_sync::chain::ChainRegistry;
use wallet_sync::config::{ChainChangePolicy, SessionConfig};
use wallet_sync::polling::PollingScheduler;
use wallet_sync::provider::{MockWalletProvider, ProviderError, ProviderEvent, ProviderGateway};
use wallet_sync::render::render;
use wallet_sync::session::{
    ConnectOutcome, RefreshOutcome, SessionDriver, SessionPhase, SessionStateMachine,
};

mod common;

const USER: &str = "0xAbCdEf0123456789aBcDeF0123456789AbCd1234";
const OTHER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

#[tokio::test]
async fn test_connect_end_to_end() {
    let mock = MockWalletProvider::new()
        .with_accounts(vec![USER.to_string()])
        .with_chain_id("11155111")
        .with_balance("5000000000000000000".parse().unwrap());
    let machine = common::machine(&mock);

    let outcome = machine.connect().await;
    assert_eq!(
        outcome,
        ConnectOutcome::Connected {
            address: USER.to_string(),
            refresh: RefreshOutcome::Applied
        }
    );

    let snap = machine.snapshot();
    assert_eq!(snap.session.address, USER);
    assert_eq!(snap.network.name, "Sepolia Testnet");
    assert_eq!(snap.network.symbol, "ETH");
    assert_eq!(snap.session.balance, "5.0000");
    assert!(!snap.session.connecting);

    let card = render(&snap);
    assert!(card.contains("5.0000 ETH"));
    assert!(card.contains("Sepolia Testnet"));
}

#[tokio::test]
async fn test_balance_formatting_exact() {
    let mock = MockWalletProvider::new().with_balance("1234500000000000000".parse().unwrap());
    let machine = common::machine(&mock);

    machine.refresh(USER).await;
    assert_eq!(machine.snapshot().session.balance, "1.2345");
}

#[tokio::test(start_paused = true)]
async fn test_newer_refresh_wins_regardless_of_completion_order() {
    let mock = MockWalletProvider::new();
    mock.push_chain_response(Duration::from_millis(300), Ok("1".to_string()));
    mock.push_chain_response(Duration::from_millis(10), Ok("80002".to_string()));
    mock.push_balance_response(Duration::ZERO, Ok(common::eth(2)));
    mock.push_balance_response(Duration::ZERO, Ok(common::eth(9)));
    let machine = common::machine(&mock);

    // Both tokens are taken here, A first.
    let a = machine.refresh(USER);
    let b = machine.refresh(USER);

    let a = tokio::spawn(a);
    common::settle().await;
    let b = tokio::spawn(b);

    let b = b.await.unwrap();
    let a = a.await.unwrap();

    assert_eq!(b, RefreshOutcome::Applied);
    assert_eq!(a, RefreshOutcome::Stale);

    let snap = machine.snapshot();
    assert_eq!(snap.network.name, "Polygon Amoy");
    assert_eq!(snap.session.balance, "2.0000");
}

#[tokio::test(start_paused = true)]
async fn test_second_connect_does_not_prompt_again() {
    let mock = MockWalletProvider::new()
        .with_accounts(vec![USER.to_string()])
        .with_accounts_delay(Duration::from_secs(3));
    let machine = common::machine(&mock);

    let first = tokio::spawn({
        let machine = machine.clone();
        async move { machine.connect().await }
    });
    common::settle().await;
    assert_eq!(machine.phase(), SessionPhase::Connecting);

    assert_eq!(machine.connect().await, ConnectOutcome::AlreadyConnecting);
    assert!(matches!(first.await.unwrap(), ConnectOutcome::Connected { .. }));
    assert_eq!(mock.request_accounts_calls(), 1);
}

#[tokio::test]
async fn test_empty_accounts_resets_to_default() {
    let mock = MockWalletProvider::new()
        .with_accounts(vec![USER.to_string()])
        .with_balance(common::eth(1));
    let machine = common::machine(&mock);
    machine.connect().await;

    assert_eq!(machine.on_accounts_changed(&[]).await, RefreshOutcome::Reset);

    let snap = machine.snapshot();
    assert_eq!(snap.session.address, "");
    assert_eq!(snap.session.balance, "0.00");
    assert_eq!(snap.phase(), SessionPhase::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_self_heals_on_next_tick() {
    let mock = MockWalletProvider::new().with_balance(common::eth(1));
    let machine = common::machine(&mock);
    machine.refresh(USER).await;

    let scheduler = PollingScheduler::new(Duration::from_secs(10));
    scheduler.start(machine.clone());

    mock.push_balance_response(Duration::ZERO, Err(ProviderError::QueryFailed("rpc down".into())));
    mock.set_balance(common::eth(3));

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(machine.snapshot().session.balance, "1.0000", "failure keeps last known");

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(machine.snapshot().session.balance, "3.0000");
    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out_without_blocking() {
    let mock = MockWalletProvider::new();
    mock.push_chain_response(Duration::from_secs(3600), Ok("1".to_string()));
    let machine = common::machine(&mock);

    let outcome = machine.refresh(USER).await;
    assert!(matches!(outcome, RefreshOutcome::Failed(ProviderError::QueryFailed(_))));
    assert_eq!(machine.snapshot().session.address, "");
}

#[tokio::test]
async fn test_driver_routes_provider_events() {
    let mock = MockWalletProvider::new()
        .with_accounts(vec![USER.to_string()])
        .with_chain_id("1")
        .with_balance(common::eth(1));
    let machine = common::machine(&mock);
    let driver = SessionDriver::with_scheduler(
        machine.clone(),
        PollingScheduler::new(Duration::from_secs(10)),
        ChainChangePolicy::Resync,
    );
    let scheduler = driver.scheduler();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(driver.run(shutdown_rx));
    let mut rx = machine.subscribe();

    machine.connect().await;
    wait_for_address(&mut rx, USER).await;

    // Account switch in the wallet
    mock.set_balance(common::eth(2));
    common::settle().await;
    mock.emit(ProviderEvent::AccountsChanged(vec![OTHER.to_string()]));
    let snap = wait_for_address(&mut rx, OTHER).await;
    assert_eq!(snap.session.balance, "2.0000");

    // Chain switch under the resync policy keeps the session
    mock.set_chain_id("0x38");
    mock.emit(ProviderEvent::ChainChanged("0x38".to_string()));
    let snap = common::wait_for(&mut rx, |s| s.network.chain_id == "56").await;
    assert_eq!(snap.network.name, "BSC Mainnet");
    assert_eq!(snap.session.address, OTHER);

    common::settle().await;
    assert!(scheduler.is_running());

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
    assert_eq!(mock.subscriber_count(), 0);
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_driver_poll_racing_account_switch_settles_on_new_account() {
    let mock = MockWalletProvider::new()
        .with_accounts(vec![USER.to_string()])
        .with_balance(common::eth(1));
    let machine = common::machine(&mock);
    let driver = SessionDriver::with_scheduler(
        machine.clone(),
        PollingScheduler::new(Duration::from_secs(10)),
        ChainChangePolicy::Reset,
    );
    let scheduler = driver.scheduler();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(driver.run(shutdown_rx));
    common::settle().await;

    machine.connect().await;
    common::settle().await;
    assert!(scheduler.is_running());

    // Switch one second before the first poll; its refresh outlives the tick.
    tokio::time::sleep(Duration::from_secs(9)).await;
    mock.push_chain_response(Duration::from_secs(3), Ok("1".to_string()));
    mock.emit(ProviderEvent::AccountsChanged(vec![OTHER.to_string()]));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(machine.snapshot().session.address, OTHER);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let snap = machine.snapshot();
    assert_eq!(snap.session.address, OTHER);
    assert_eq!(snap.phase(), SessionPhase::Connected);

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_driver_without_provider() {
    let gateway = ProviderGateway::with_timeouts(None, Duration::from_secs(1), Duration::from_secs(1));
    let machine = SessionStateMachine::new(gateway, ChainRegistry::new(), &SessionConfig::default());
    let driver = SessionDriver::with_scheduler(
        machine.clone(),
        PollingScheduler::new(Duration::from_secs(10)),
        ChainChangePolicy::Reset,
    );
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(driver.run(shutdown_rx));

    assert_eq!(machine.connect().await, ConnectOutcome::ProviderMissing);
    assert!(machine.snapshot().install_required);
    assert!(render(&machine.snapshot()).contains("Install"));

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_large_balance_round_trip_through_session() {
    let mock = MockWalletProvider::new()
        .with_chain_id("137")
        .with_balance(U256::from(123_456_789u64) * U256::from(common::WEI_PER_ETH) + U256::from(99_999_999_999_999u64));
    let machine = common::machine(&mock);

    machine.refresh(USER).await;
    let snap = machine.snapshot();
    assert_eq!(snap.session.balance, "123456789.0001");
    assert_eq!(snap.network.symbol, "MATIC");
}

async fn wait_for_address(
    rx: &mut tokio::sync::watch::Receiver<wallet_sync::SessionSnapshot>,
    address: &str,
) -> wallet_sync::SessionSnapshot {
    let address = address.to_string();
    common::wait_for(rx, move |s| s.session.address == address).await
}
