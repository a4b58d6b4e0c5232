//! Dialogue state machine
//!
//! `DialogueEngine::handle` processes one inbound event for one user:
//! load the session, run the transition for the current state on a
//! working copy, save it, then deliver the replies. A failing capability
//! call aborts the event before anything is saved, so the stored session
//! stays exactly as it was. The contact step is the exception: it saves
//! the closed session itself before the lead is written.
//!
//! ```text
//! Start ─/start─▶ AwaitingName ─text─▶ AwaitingCategory
//!   AwaitingCategory ─wholesale─▶ AwaitingWholesaleSubtype ─▶ AwaitingWholesaleDetails
//!   AwaitingCategory ─retail────▶ AwaitingRetailSubtype
//!       ─monuments──▶ AwaitingCemetery ─text─▶ AwaitingMonumentDetails
//!       ─other_items─▶ AwaitingItemDetails
//!   *Details ─(aggregator advances)─▶ AwaitingContact ─phone─▶ Idle
//! ```

use intake_bot_config::ContactMode;
use intake_bot_core::{
    normalize_phone, Category, Command, DialogueState, EventKind, Field, InboundEvent, LeadId,
    Reply, RetailSubtype, Session, UserChoice, WholesaleSubtype,
};

use crate::aggregator::InputAggregator;
use crate::capabilities::Capabilities;
use crate::engine_config::EngineConfig;
use crate::finalizer::LeadFinalizer;
use crate::locale::resolve_locale;
use crate::metrics;
use crate::prompts::{Prompt, PromptRenderer};
use crate::AgentError;

/// What happened to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event was handled; `from == to` when the state was kept
    Transitioned {
        from: DialogueState,
        to: DialogueState,
    },
    /// The contact step completed; `lead` is `None` when saving failed
    Finalized { lead: Option<LeadId> },
    /// Unknown or out-of-state button; nothing changed, nothing sent
    Ignored,
    /// A capability failed; the session was left untouched
    Failed,
    /// Handled by the operator desk
    Operator,
}

/// Result of one transition on the working copy
struct Step {
    replies: Vec<Reply>,
    outcome: Outcome,
    persist: bool,
}

impl Step {
    fn to(from: DialogueState, session: &Session, replies: Vec<Reply>) -> Self {
        Self {
            replies,
            outcome: Outcome::Transitioned {
                from,
                to: session.state,
            },
            persist: true,
        }
    }

    /// Reply without changing anything
    fn reply(state: DialogueState, reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            outcome: Outcome::Transitioned {
                from: state,
                to: state,
            },
            persist: false,
        }
    }

    fn ignored() -> Self {
        Self {
            replies: Vec::new(),
            outcome: Outcome::Ignored,
            persist: false,
        }
    }
}

fn category_choices() -> [UserChoice; 2] {
    [
        UserChoice::Category(Category::Wholesale),
        UserChoice::Category(Category::Retail),
    ]
}

fn wholesale_choices() -> [UserChoice; 2] {
    [
        UserChoice::Wholesale(WholesaleSubtype::StoneProcessor),
        UserChoice::Wholesale(WholesaleSubtype::RelatedField),
    ]
}

fn retail_choices() -> [UserChoice; 2] {
    [
        UserChoice::Retail(RetailSubtype::Monuments),
        UserChoice::Retail(RetailSubtype::OtherItems),
    ]
}

pub struct DialogueEngine {
    caps: Capabilities,
    config: EngineConfig,
    aggregator: InputAggregator,
    finalizer: LeadFinalizer,
}

impl DialogueEngine {
    pub fn new(caps: Capabilities, config: EngineConfig) -> Self {
        let aggregator = InputAggregator::new(
            caps.transport.clone(),
            caps.blobs.clone(),
            config.min_comment_turns,
        );
        let finalizer = LeadFinalizer::new(
            caps.blobs.clone(),
            caps.tables.clone(),
            caps.transport.clone(),
            caps.localizer.clone(),
            config.table_names.clone(),
            config.operator_chat.clone(),
            config.finalize_settle,
        );
        Self {
            caps,
            config,
            aggregator,
            finalizer,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one event. Never fails: faults are logged and answered with
    /// a generic error message.
    pub async fn handle(&self, event: &InboundEvent) -> Outcome {
        let user_id = &event.user_id;
        let stored = match self.caps.sessions.load(user_id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load session");
                self.send_error(event, None).await;
                return Outcome::Failed;
            }
        };
        let mut session = stored.unwrap_or_else(|| Session::new(user_id.clone()));
        let from = session.state;

        let step = match self.step(&mut session, event).await {
            Ok(step) => step,
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    state = from.as_str(),
                    event = event.kind_label(),
                    error = %e,
                    "Event handling failed"
                );
                self.send_error(event, session.field(Field::Locale)).await;
                return Outcome::Failed;
            }
        };

        if step.persist {
            if let Err(e) = self.caps.sessions.save(&session).await {
                tracing::error!(user_id = %user_id, error = %e, "Failed to save session");
                self.send_error(event, session.field(Field::Locale)).await;
                return Outcome::Failed;
            }
        }

        for reply in step.replies {
            if let Err(e) = self.caps.transport.send(user_id, reply).await {
                tracing::warn!(user_id = %user_id, error = %e, "Reply not delivered");
            }
        }

        if let Outcome::Transitioned { from, to } = &step.outcome {
            if from != to {
                tracing::info!(
                    user_id = %user_id,
                    from = from.as_str(),
                    to = to.as_str(),
                    "State transition"
                );
            }
            metrics::record_transition(*from, *to);
        }
        step.outcome
    }

    async fn send_error(&self, event: &InboundEvent, locale: Option<&str>) {
        let locale = resolve_locale(
            locale,
            event.locale_hint.as_deref(),
            None,
            self.caps.localizer.as_ref(),
        )
        .locale;
        let reply = PromptRenderer::new(self.caps.localizer.as_ref(), &locale)
            .reply(Prompt::ErrorOccurred);
        if let Err(e) = self.caps.transport.send(&event.user_id, reply).await {
            tracing::warn!(user_id = %event.user_id, error = %e, "Error message not delivered");
        }
    }

    async fn dialogue_locale(&self, session: &Session, event: &InboundEvent) -> String {
        let stored = self.stored_locale(event).await;
        resolve_locale(
            session.field(Field::Locale),
            event.locale_hint.as_deref(),
            stored.as_deref(),
            self.caps.localizer.as_ref(),
        )
        .locale
    }

    async fn stored_locale(&self, event: &InboundEvent) -> Option<String> {
        match self.caps.locale_prefs.load(&event.user_id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(user_id = %event.user_id, error = %e, "Failed to load locale preference");
                None
            }
        }
    }

    async fn step(&self, session: &mut Session, event: &InboundEvent) -> Result<Step, AgentError> {
        match &event.kind {
            EventKind::Command {
                command: Command::Start,
            } => return self.start(session, event).await,
            EventKind::Command {
                command: Command::Cancel,
            } => {
                let locale = self.dialogue_locale(session, event).await;
                let from = session.state;
                session.reset(DialogueState::Idle);
                tracing::info!(user_id = %session.user_id, from = from.as_str(), "Dialogue cancelled");
                let reply = self.renderer(&locale).removing_keyboard(Prompt::Cancelled);
                return Ok(Step::to(from, session, vec![reply]));
            }
            _ => {}
        }

        let locale = self.dialogue_locale(session, event).await;
        let state = session.state;

        // button presses only count in the state that offered them
        if let EventKind::Choice { payload } = &event.kind {
            return match UserChoice::parse(payload) {
                Some(choice) => self.choose(session, choice, &locale),
                None => {
                    tracing::debug!(user_id = %session.user_id, payload = %payload, "Unknown payload ignored");
                    Ok(Step::ignored())
                }
            };
        }

        if state.is_dormant() {
            return Ok(Step::reply(state, self.renderer(&locale).reply(Prompt::PressStart)));
        }
        if matches!(event.kind, EventKind::Command { .. }) || state.is_selection() {
            return Ok(Step::reply(state, self.current_prompt(session, &locale)));
        }

        session.record(Field::Locale, locale.as_str())?;

        match state {
            DialogueState::AwaitingName => {
                let EventKind::Text { text } = &event.kind else {
                    return Ok(Step::reply(state, self.current_prompt(session, &locale)));
                };
                let name = text.trim();
                if name.is_empty() {
                    return Ok(Step::reply(state, self.current_prompt(session, &locale)));
                }
                session.record(Field::Name, name)?;
                session.enter(DialogueState::AwaitingCategory);
                Ok(Step::to(state, session, vec![self.current_prompt(session, &locale)]))
            }
            DialogueState::AwaitingCemetery => {
                let EventKind::Text { text } = &event.kind else {
                    return Ok(Step::reply(state, self.current_prompt(session, &locale)));
                };
                let cemetery = text.trim();
                if cemetery.is_empty() {
                    return Ok(Step::reply(state, self.current_prompt(session, &locale)));
                }
                session.record(Field::Cemetery, cemetery)?;
                session.enter(DialogueState::AwaitingMonumentDetails);
                Ok(Step::to(state, session, vec![self.current_prompt(session, &locale)]))
            }
            DialogueState::AwaitingWholesaleDetails
            | DialogueState::AwaitingMonumentDetails
            | DialogueState::AwaitingItemDetails => {
                let aggregation = self.aggregator.aggregate(session, &event.kind).await?;
                let renderer = self.renderer(&locale);
                if aggregation.advance {
                    session.enter(DialogueState::AwaitingContact);
                    Ok(Step::to(state, session, vec![renderer.contact_request(aggregation.prompt)]))
                } else {
                    Ok(Step::to(state, session, vec![renderer.reply(aggregation.prompt)]))
                }
            }
            DialogueState::AwaitingContact => self.contact(session, event, &locale).await,
            _ => Ok(Step::reply(state, self.current_prompt(session, &locale))),
        }
    }

    /// `/start` from any state
    async fn start(&self, session: &mut Session, event: &InboundEvent) -> Result<Step, AgentError> {
        let from = session.state;
        let stored = self.stored_locale(event).await;
        let resolved = resolve_locale(
            None,
            event.locale_hint.as_deref(),
            stored.as_deref(),
            self.caps.localizer.as_ref(),
        );

        if let Err(e) = self
            .caps
            .locale_prefs
            .save(&event.user_id, &resolved.locale)
            .await
        {
            tracing::warn!(user_id = %event.user_id, error = %e, "Failed to save locale preference");
        }

        session.reset(DialogueState::AwaitingName);
        session.record(Field::Locale, resolved.locale.as_str())?;
        tracing::info!(
            user_id = %session.user_id,
            locale = %resolved.locale,
            hint = event.locale_hint.as_deref().unwrap_or(""),
            "Dialogue started"
        );

        let renderer = self.renderer(&resolved.locale);
        let mut replies = Vec::with_capacity(2);
        if resolved.fell_back {
            replies.push(renderer.reply(Prompt::UnsupportedLocale));
        }
        replies.push(renderer.removing_keyboard(Prompt::Greeting));
        Ok(Step::to(from, session, replies))
    }

    fn choose(
        &self,
        session: &mut Session,
        choice: UserChoice,
        locale: &str,
    ) -> Result<Step, AgentError> {
        let from = session.state;
        let next = match (from, choice) {
            (DialogueState::AwaitingCategory, UserChoice::Category(category)) => {
                session.record(Field::Category, category.as_str())?;
                match category {
                    Category::Wholesale => DialogueState::AwaitingWholesaleSubtype,
                    Category::Retail => DialogueState::AwaitingRetailSubtype,
                }
            }
            (DialogueState::AwaitingWholesaleSubtype, UserChoice::Wholesale(subtype)) => {
                session.record(Field::SubCategory, subtype.as_str())?;
                DialogueState::AwaitingWholesaleDetails
            }
            (DialogueState::AwaitingRetailSubtype, UserChoice::Retail(subtype)) => {
                session.record(Field::SubCategory, subtype.as_str())?;
                match subtype {
                    RetailSubtype::Monuments => DialogueState::AwaitingCemetery,
                    RetailSubtype::OtherItems => DialogueState::AwaitingItemDetails,
                }
            }
            _ => {
                tracing::debug!(
                    user_id = %session.user_id,
                    state = from.as_str(),
                    payload = %choice.payload(),
                    "Out-of-state choice ignored"
                );
                return Ok(Step::ignored());
            }
        };

        session.record(Field::Locale, locale)?;
        session.enter(next);
        Ok(Step::to(from, session, vec![self.current_prompt(session, locale)]))
    }

    /// Terminal step: accept a phone number, then finalize
    async fn contact(
        &self,
        session: &mut Session,
        event: &InboundEvent,
        locale: &str,
    ) -> Result<Step, AgentError> {
        let state = session.state;
        let renderer = self.renderer(locale);

        let phone = match (&event.kind, self.config.contact_mode) {
            (EventKind::Contact { phone }, _) => {
                normalize_phone(phone).unwrap_or_else(|| phone.trim().to_string())
            }
            (EventKind::Text { text }, ContactMode::Validated) => match normalize_phone(text) {
                Some(phone) => phone,
                None => {
                    tracing::info!(user_id = %session.user_id, "Invalid phone number, asking again");
                    return Ok(Step::reply(state, renderer.contact_request(Prompt::InvalidPhone)));
                }
            },
            _ => {
                return Ok(Step::reply(
                    state,
                    renderer.contact_request(Prompt::ContactButtonOnly),
                ))
            }
        };

        session.record(Field::Phone, phone)?;

        // closed in storage before the lead is written: at most one
        // finalize per dialogue
        let mut closed = session.clone();
        closed.reset(DialogueState::Idle);
        self.caps.sessions.save(&closed).await?;

        let result = self.finalizer.finalize(session).await;
        *session = closed;
        metrics::record_transition(state, DialogueState::Idle);

        let (reply, lead) = match result {
            Ok(lead) => (renderer.removing_keyboard(Prompt::ThankYou), Some(lead)),
            Err(e) => {
                tracing::error!(user_id = %session.user_id, error = %e, "Lead finalization failed");
                (renderer.removing_keyboard(Prompt::ErrorSavingData), None)
            }
        };

        Ok(Step {
            replies: vec![reply],
            outcome: Outcome::Finalized { lead },
            persist: false,
        })
    }

    fn renderer<'a>(&'a self, locale: &'a str) -> PromptRenderer<'a> {
        PromptRenderer::new(self.caps.localizer.as_ref(), locale)
    }

    /// The prompt that belongs to the session's current state
    pub fn current_prompt(&self, session: &Session, locale: &str) -> Reply {
        let renderer = self.renderer(locale);
        match session.state {
            DialogueState::Start | DialogueState::Idle => renderer.reply(Prompt::PressStart),
            DialogueState::AwaitingName => renderer.reply(Prompt::Greeting),
            DialogueState::AwaitingCategory => {
                let name = session.field(Field::Name).unwrap_or_default();
                let text = renderer.text_with(Prompt::AskCategory, &[("name", name)]);
                renderer.with_choices(text, &category_choices())
            }
            DialogueState::AwaitingWholesaleSubtype => renderer.with_choices(
                renderer.text(Prompt::AskWholesaleSubtype),
                &wholesale_choices(),
            ),
            DialogueState::AwaitingRetailSubtype => renderer.with_choices(
                renderer.text(Prompt::AskRetailSubtype),
                &retail_choices(),
            ),
            DialogueState::AwaitingWholesaleDetails => renderer.reply(Prompt::DescribeProject),
            DialogueState::AwaitingCemetery => renderer.reply(Prompt::CemeteryQuestion),
            DialogueState::AwaitingMonumentDetails => renderer.reply(Prompt::DescribeMonument),
            DialogueState::AwaitingItemDetails => renderer.reply(Prompt::DescribeItem),
            DialogueState::AwaitingContact => renderer.contact_request(Prompt::ContactButtonOnly),
        }
    }
}
