//! Named spans for the claim pipeline, so traces of one request can be
//! filtered and correlated by stage.

use tracing::{info_span, Span};

pub fn claim_span(wallet: &str) -> Span {
    info_span!("claim", wallet = %wallet)
}

pub fn issue_attestation_span(wallet: &str) -> Span {
    info_span!("issue_attestation", wallet = %wallet)
}

pub fn eligibility_span(wallet: &str, force_refresh: bool) -> Span {
    info_span!("eligibility", wallet = %wallet, force_refresh)
}

pub fn dispatch_span(recipient: &str, amount: u64) -> Span {
    info_span!("dispatch", recipient = %recipient, amount)
}

pub fn confirm_span(signature: &str) -> Span {
    info_span!("confirm", signature = %signature)
}
