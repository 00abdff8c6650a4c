//! Integration tests for finalizing a withdrawal against a forked L1.
//!
//! Each test snapshots the node and reverts afterwards, so they share one
//! anvil instance. Run with:
//! `cargo test -p finalizer --test finalize -- --ignored --test-threads=1`

use crate::setup::{
    load_test_config, mine, node_account, op_mainnet_withdrawal, revert, setup_provider, snapshot,
};
use action::{
    finalize_withdrawal, wait_for_receipt, ActionError, ExecutionErrorKind, FinalizeWithdrawal,
    ReceiptStatus,
};
use alloy_provider::Provider;
use config::ChainConfig;
use finalizer::withdrawal_status;
use withdrawal::WithdrawalStatus;


fn params() -> FinalizeWithdrawal {
    FinalizeWithdrawal::new(node_account(), op_mainnet_withdrawal())
        .target_chain(ChainConfig::optimism())
}

/// Submit, mine, and check the receipt succeeded.
async fn finalize_and_confirm<P>(provider: &P, params: &FinalizeWithdrawal)
where
    P: Provider,
{
    let config = load_test_config();
    let tx_hash = finalize_withdrawal(provider, params)
        .await
        .expect("finalize_withdrawal failed");

    mine(provider).await;

    let confirmed = wait_for_receipt(provider, tx_hash, config.receipt_options())
        .await
        .expect("no receipt");
    assert_eq!(confirmed.tx_hash, tx_hash);
    assert_eq!(confirmed.status, ReceiptStatus::Success);
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_default() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    finalize_and_confirm(&provider, &params()).await;

    revert(&provider, id).await;
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_without_chain() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    finalize_and_confirm(&provider, &params().chain(None).gas(Some(420_000))).await;

    revert(&provider, id).await;
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_with_l1_chain() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    finalize_and_confirm(&provider, &params().chain(Some(1))).await;

    revert(&provider, id).await;
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_with_gas() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    finalize_and_confirm(&provider, &params().gas(Some(420_000))).await;

    revert(&provider, id).await;
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_with_estimated_gas() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    finalize_and_confirm(&provider, &params().gas(None)).await;

    revert(&provider, id).await;
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_with_portal_address() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    let portal = ChainConfig::optimism().portal(Some(1));
    let params = FinalizeWithdrawal::new(node_account(), op_mainnet_withdrawal())
        .gas(Some(420_000))
        .portal_address(portal);

    finalize_and_confirm(&provider, &params).await;

    revert(&provider, id).await;
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_small_gas() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;

    let err = finalize_withdrawal(&provider, &params().gas(Some(69)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ExecutionErrorKind::OutOfGas));
    let ActionError::Execution(execution) = &err else {
        panic!("expected execution error, got {err:?}");
    };
    assert_eq!(execution.method, "eth_estimateGas");
    assert_eq!(execution.request.gas, Some(69));

    let message = err.to_string();
    assert!(message.contains(r#""gas":"0x45""#));
    assert!(message.contains("gas:   69"));
}

#[tokio::test]
#[ignore = "requires anvil forked from mainnet with the withdrawal proven by the test account"]
async fn test_finalize_twice_reverts() {
    let config = load_test_config();
    let provider = setup_provider(&config.rpc_url).await;
    let id = snapshot(&provider).await;

    finalize_and_confirm(&provider, &params()).await;

    let err = finalize_withdrawal(&provider, &params()).await.unwrap_err();
    assert!(
        matches!(err.kind(), Some(ExecutionErrorKind::Reverted { .. })),
        "expected revert, got {err}"
    );

    let report = withdrawal_status(provider.clone(), &params()).await.unwrap();
    assert_eq!(report.status, WithdrawalStatus::Finalized);

    revert(&provider, id).await;
}
