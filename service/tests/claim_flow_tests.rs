//! End-to-end claim pipeline: attestation → eligibility → dispatch →
//! confirmation → record, over null ledger and metadata.

mod common;

use common::*;
use faucet_ledger::{ConfirmationOutcome, VerificationMethod};
use faucet_nullables::ledger::TRANSFER_FEE;
use faucet_nullables::{RpcCall, Visibility};
use faucet_service::{RejectReason, ServiceError, UnverifiedPolicy};
use faucet_store::{ClaimHistoryStore, IssuanceLog, LegacyTokenStore, PostUsageStore};
use faucet_types::{Clock, Timestamp, TxSignature, HOUR_MS};

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attest_claim_then_cooldown_then_replay() {
    let h = harness();
    let w1 = wallet(1);

    let before = h.service.check_eligibility(w1.as_str(), false).await.unwrap();
    assert!(before.eligible);
    assert_eq!(before.last_claim_time, None);

    let token = h.attest(POST_URL, &w1).await;
    let receipt = h
        .service
        .claim(w1.as_str(), Some(&token))
        .await
        .unwrap();
    assert_eq!(receipt.recipient, w1);
    assert_eq!(receipt.amount.raw(), CLAIM);
    assert_eq!(receipt.post_id, post_id(POST_URL));
    assert!(!receipt.provisional);
    assert_eq!(receipt.confirmation.outcome(), ConfirmationOutcome::Confirmed);
    assert_eq!(receipt.confirmation.method, Some(VerificationMethod::DirectLookup));
    assert_eq!(
        receipt.explorer_url.as_deref(),
        Some(format!("https://explorer.test/tx/{}", receipt.signature).as_str())
    );
    assert_eq!(h.ledger.balance_of(&w1), CLAIM);
    assert_eq!(h.ledger.submitted(), vec![receipt.signature.clone()]);

    let after = h.service.check_eligibility(w1.as_str(), true).await.unwrap();
    assert!(!after.eligible);
    assert_eq!(after.remaining_hours, Some(24));
    assert_eq!(after.last_claim_time, Some(receipt.claimed_at));
    assert_eq!(
        after.message,
        "Wallet must wait 24 hours before claiming again"
    );

    let err = h
        .service
        .claim(w1.as_str(), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Replay {
            reason: RejectReason::PostAlreadyUsed,
            ..
        }
    ));
    assert_eq!(h.ledger.submitted().len(), 1);
}

#[tokio::test]
async fn claim_is_recorded_in_local_history_and_status() {
    let h = harness();
    let w1 = wallet(1);
    let token = h.attest(POST_URL, &w1).await;
    let receipt = h.service.claim(w1.as_str(), Some(&token)).await.unwrap();

    let usage = h.stores.posts.get_usage(&post_id(POST_URL)).unwrap().unwrap();
    assert_eq!(usage.used_by_wallet, w1);
    assert_eq!(usage.used_by_token, token);

    let history = h.service.history(w1.as_str()).await.unwrap();
    assert!(!history.partial);
    assert_eq!(history.records.len(), 1);
    assert_eq!(history.records[0].tx_signature, receipt.signature);

    let status = h.service.status().await;
    assert!(status.faucet_configured);
    assert_eq!(status.faucet_address, Some(h.funder.address()));
    assert_eq!(status.total_claims, 1);
    assert_eq!(
        status.balance.map(|b| b.raw()),
        Some(100 * CLAIM - CLAIM - TRANSFER_FEE)
    );
    assert_eq!(status.ledger_endpoint, "primary");
}

// ---------------------------------------------------------------------------
// Attestation issuance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_wallet_records_nothing() {
    let h = harness();
    let err = h
        .service
        .issue_attestation(POST_URL, "abc")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation {
            reason: RejectReason::InvalidWalletAddress,
            ..
        }
    ));
    assert!(h.stores.posts.get_usage(&post_id(POST_URL)).unwrap().is_none());
}

#[tokio::test]
async fn unrecognised_post_url_is_rejected() {
    let h = harness();
    let err = h
        .service
        .issue_attestation("https://example.com/alice/status/1", wallet(1).as_str())
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::InvalidPostUrl);
    assert!(h
        .stores
        .issuance
        .last_issuance(&wallet(1))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn wallet_is_verified_once_per_day() {
    let h = harness();
    let w1 = wallet(1);
    h.attest(POST_URL, &w1).await;

    h.clock.advance_ms(3 * HOUR_MS);
    let err = h
        .service
        .issue_attestation(OTHER_POST_URL, w1.as_str())
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::RecentlyVerified);
    assert_eq!(err.remaining_hours(), Some(21));

    h.clock.advance_ms(21 * HOUR_MS);
    assert!(h
        .service
        .issue_attestation(OTHER_POST_URL, w1.as_str())
        .await
        .is_ok());
}

#[tokio::test]
async fn used_post_cannot_be_attested_again() {
    let h = harness();
    let token = h.attest(POST_URL, &wallet(1)).await;
    h.service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap();

    let err = h
        .service
        .issue_attestation(POST_URL, wallet(2).as_str())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Replay {
            reason: RejectReason::PostAlreadyUsed,
            ..
        }
    ));
}

#[tokio::test]
async fn stale_post_is_rejected_when_its_age_is_known() {
    let h = harness();
    h.metadata
        .set_published(POST_URL, Timestamp::from_millis(T0.as_millis() - 25 * HOUR_MS));
    let err = h
        .service
        .issue_attestation(POST_URL, wallet(1).as_str())
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::PostTooOld);

    h.metadata
        .set_published(OTHER_POST_URL, Timestamp::from_millis(T0.as_millis() - 2 * HOUR_MS));
    assert!(h
        .service
        .issue_attestation(OTHER_POST_URL, wallet(1).as_str())
        .await
        .is_ok());
}

#[tokio::test]
async fn unknown_post_age_is_accepted() {
    let h = harness();
    h.metadata.set_failing(true);
    let issued = h
        .service
        .issue_attestation(POST_URL, wallet(1).as_str())
        .await
        .unwrap();
    assert!(!issued.legacy);
    assert_eq!(issued.verified_at, T0);
    let payload = codec().verify(&issued.token, T0).unwrap();
    assert_eq!(payload.wallet_address, wallet(1));
}

// ---------------------------------------------------------------------------
// Token checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn claim_requires_a_token() {
    let h = harness();
    for token in [None, Some(""), Some("   ")] {
        let err = h
            .service
            .claim(wallet(1).as_str(), token)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), RejectReason::MissingToken);
    }
    assert!(h.ledger.submitted().is_empty());
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let h = harness();
    let err = h
        .service
        .claim(wallet(1).as_str(), Some("garbage.token"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation {
            reason: RejectReason::InvalidToken,
            ..
        }
    ));

    let forged = faucet_attestation::AttestationCodec::new("another-secret").issue(
        &wallet(1),
        &post_id(POST_URL),
        T0,
    );
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&forged))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::InvalidToken);
}

#[tokio::test]
async fn token_for_another_wallet_is_rejected() {
    let h = harness();
    let token = h.attest(POST_URL, &wallet(1)).await;
    let err = h
        .service
        .claim(wallet(2).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::WalletMismatch);
    assert_post_free(&h, POST_URL);
}

#[tokio::test]
async fn fresh_token_for_used_post_is_a_replay() {
    let h = harness();
    let token = h.attest(POST_URL, &wallet(1)).await;
    h.service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap();

    let fresh = codec().issue(&wallet(2), &post_id(POST_URL), h.clock.now());
    let err = h
        .service
        .claim(wallet(2).as_str(), Some(&fresh))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::PostAlreadyUsed);
    assert_eq!(h.ledger.submitted().len(), 1);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let h = harness_with(|c| c.attestation_max_age_secs = 3600);
    let token = h.attest(POST_URL, &wallet(1)).await;
    h.clock.advance_ms(2 * HOUR_MS);
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::InvalidToken);
}

// ---------------------------------------------------------------------------
// Legacy tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn legacy_token_is_single_use() {
    let h = harness_with(|c| c.issue_legacy_tokens = true);
    let issued = h
        .service
        .issue_attestation(POST_URL, wallet(1).as_str())
        .await
        .unwrap();
    assert!(issued.legacy);
    assert!(!issued.token.contains('.'));

    h.service
        .claim(wallet(1).as_str(), Some(&issued.token))
        .await
        .unwrap();
    let record = h.stores.legacy.lookup_token(&issued.token).unwrap().unwrap();
    assert!(record.used);

    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&issued.token))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::TokenAlreadyUsed);
}

#[tokio::test]
async fn missing_attestation_secret_disables_signed_tokens() {
    let h = harness_with(|c| c.attestation_secret = String::new());
    let err = h
        .service
        .issue_attestation(POST_URL, wallet(1).as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Configuration(_)));

    let token = codec().issue(&wallet(1), &post_id(POST_URL), T0);
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Configuration(_)));
}

// ---------------------------------------------------------------------------
// Dispatch failures release the post
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insufficient_funds_releases_the_post() {
    let h = harness();
    let funder = h.funder.address();
    h.ledger.set_balance(&funder, CLAIM / 2);
    let token = h.attest(POST_URL, &wallet(1)).await;

    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientFunds { .. }));
    assert_eq!(err.reason(), RejectReason::InsufficientFunds);
    assert_eq!(h.ledger.call_count(RpcCall::SendTransaction), 0);

    h.ledger.set_balance(&funder, 10 * CLAIM);
    assert!(h.service.claim(wallet(1).as_str(), Some(&token)).await.is_ok());
}

#[tokio::test]
async fn missing_funding_key_is_a_configuration_error() {
    let h = harness_with(|c| c.funding_secret = None);
    let token = h.attest(POST_URL, &wallet(1)).await;
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Configuration(_)));
    assert_eq!(err.reason(), RejectReason::NotConfigured);

    let status = h.service.status().await;
    assert!(!status.faucet_configured);
    assert_eq!(status.faucet_address, None);
    assert_eq!(status.balance, None);
}

#[tokio::test]
async fn rejected_submission_releases_the_post() {
    let h = harness();
    h.ledger.set_reject_submissions(true);
    let token = h.attest(POST_URL, &wallet(1)).await;
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transport { .. }));
    assert_post_free(&h, POST_URL);
    assert_eq!(h.stores.claims.claim_count().unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Confirmation outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_check_confirms_when_lookups_cannot_see_the_transfer() {
    let h = harness();
    h.ledger.set_visibility(Visibility::StatusOnly);
    let token = h.attest(POST_URL, &wallet(1)).await;
    let receipt = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap();
    assert!(!receipt.provisional);
    assert_eq!(receipt.confirmation.method, Some(VerificationMethod::StatusCheck));
}

#[tokio::test]
async fn failed_transfer_fails_the_claim() {
    let h = harness();
    h.ledger.set_visibility(Visibility::Failed);
    let token = h.attest(POST_URL, &wallet(1)).await;
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Transport {
            reason: RejectReason::ConfirmationFailed,
            ..
        }
    ));
    assert_post_free(&h, POST_URL);
    assert_eq!(h.stores.claims.claim_count().unwrap(), 0);
}

#[tokio::test]
async fn unverified_transfer_is_accepted_provisionally() {
    let h = harness();
    h.ledger.set_visibility(Visibility::Hidden);
    let token = h.attest(POST_URL, &wallet(1)).await;
    let receipt = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap();
    assert!(receipt.provisional);
    assert_eq!(receipt.confirmation.method, None);
    assert_eq!(receipt.confirmation.attempts, 9);
    assert!(h.stores.posts.is_used(&post_id(POST_URL)).unwrap());
    assert_eq!(h.stores.claims.claim_count().unwrap(), 1);
}

#[tokio::test]
async fn unverified_transfer_is_rejected_under_strict_policy() {
    let h = harness_with(|c| c.unverified_confirmation_policy = UnverifiedPolicy::Reject);
    h.ledger.set_visibility(Visibility::Hidden);
    let token = h.attest(POST_URL, &wallet(1)).await;
    let err = h
        .service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::ConfirmationFailed);
    assert_post_free(&h, POST_URL);
}

#[tokio::test]
async fn verify_transaction_reports_the_deciding_method() {
    let h = harness();
    let sig = TxSignature::parse("4".repeat(87)).unwrap();
    h.ledger
        .seed_transfer(&sig, &h.funder.address(), &wallet(1), CLAIM, Some(T0));

    let report = h
        .service
        .verify_transaction(sig.as_str(), wallet(1).as_str())
        .await
        .unwrap();
    assert!(report.found && report.success);
    assert_eq!(report.method, Some(VerificationMethod::DirectLookup));

    let report = h
        .service
        .verify_transaction(sig.as_str(), wallet(2).as_str())
        .await
        .unwrap();
    assert_eq!(report.outcome(), ConfirmationOutcome::Failed);

    let err = h
        .service
        .verify_transaction("not-a-signature", wallet(1).as_str())
        .await
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::InvalidSignature);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_with_one_token_dispatch_once() {
    let h = harness();
    let token = h.attest(POST_URL, &wallet(1)).await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let service = h.service.clone();
            let token = token.clone();
            tokio::spawn(async move { service.claim(wallet(1).as_str(), Some(&token)).await })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert_eq!(e.reason(), RejectReason::PostAlreadyUsed),
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(h.ledger.submitted().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_on_one_post_from_two_wallets_dispatch_once() {
    let h = harness();
    let post = post_id(POST_URL);
    let tokens = [
        (wallet(1), codec().issue(&wallet(1), &post, T0)),
        (wallet(2), codec().issue(&wallet(2), &post, T0)),
    ];

    let tasks: Vec<_> = tokens
        .into_iter()
        .map(|(w, token)| {
            let service = h.service.clone();
            tokio::spawn(async move { service.claim(w.as_str(), Some(&token)).await })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(matches!(
                e.reason(),
                RejectReason::PostAlreadyUsed | RejectReason::ClaimInProgress
            )),
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(h.ledger.submitted().len(), 1);
    assert_eq!(h.stores.claims.claim_count().unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reset_post_makes_it_claimable_again() {
    let h = harness();
    let post = post_id(POST_URL);
    let token = h.attest(POST_URL, &wallet(1)).await;
    h.service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap();

    assert!(h.service.reset_post(post.as_str()).unwrap());
    assert_post_free(&h, POST_URL);
    assert!(!h.service.reset_post(post.as_str()).unwrap());

    let err = h.service.reset_post("not a post").unwrap_err();
    assert_eq!(err.reason(), RejectReason::InvalidPostUrl);
}

#[tokio::test]
async fn admin_token_is_checked_exactly() {
    let h = harness();
    assert!(h.service.admin_enabled());
    assert!(h.service.is_admin("let-me-in"));
    assert!(!h.service.is_admin("let-me-in-please"));
    assert!(!h.service.is_admin(""));

    let h = harness_with(|c| c.admin_token = None);
    assert!(!h.service.admin_enabled());
    assert!(!h.service.is_admin(""));
}

#[tokio::test]
async fn metrics_count_claim_outcomes() {
    let h = harness();
    let token = h.attest(POST_URL, &wallet(1)).await;
    h.service
        .claim(wallet(1).as_str(), Some(&token))
        .await
        .unwrap();
    let _ = h.service.claim(wallet(1).as_str(), Some(&token)).await;

    let text = h.service.metrics().encode().unwrap();
    assert!(text.contains("faucet_claims_succeeded_total 1"));
    assert!(text.contains("reason=\"post_already_used\""));
}

/// Neither used nor reserved.
fn assert_post_free(h: &Harness, url: &str) {
    let post = post_id(url);
    assert!(!h.stores.posts.is_used(&post).unwrap());
    assert!(h.stores.posts.try_reserve(&post).unwrap());
    h.stores.posts.release(&post).unwrap();
}
