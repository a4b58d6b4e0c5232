//! Dialogue metrics

use intake_bot_core::DialogueState;
use metrics::{counter, describe_counter};

pub const TRANSITIONS_TOTAL: &str = "intake_transitions_total";
pub const LEADS_FINALIZED_TOTAL: &str = "intake_leads_finalized_total";
pub const FINALIZE_FAILURES_TOTAL: &str = "intake_finalize_failures_total";
pub const NOTIFICATION_FAILURES_TOTAL: &str = "intake_notification_failures_total";

/// Register descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(TRANSITIONS_TOTAL, "Dialogue state transitions");
    describe_counter!(LEADS_FINALIZED_TOTAL, "Leads written to a lead table");
    describe_counter!(FINALIZE_FAILURES_TOTAL, "Leads that could not be persisted");
    describe_counter!(
        NOTIFICATION_FAILURES_TOTAL,
        "Operator notifications that could not be delivered"
    );
}

pub(crate) fn record_transition(from: DialogueState, to: DialogueState) {
    counter!(TRANSITIONS_TOTAL, "from" => from.as_str(), "to" => to.as_str()).increment(1);
}

pub(crate) fn record_lead_finalized(category: &'static str) {
    counter!(LEADS_FINALIZED_TOTAL, "category" => category).increment(1);
}

pub(crate) fn record_finalize_failure() {
    counter!(FINALIZE_FAILURES_TOTAL).increment(1);
}

pub(crate) fn record_notification_failure() {
    counter!(NOTIFICATION_FAILURES_TOTAL).increment(1);
}
