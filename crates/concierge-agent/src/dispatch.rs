// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executes decoded tool calls against the session context.
//!
//! Calls in a batch run one after another in the order received and their
//! responses keep that order. Argument and state errors become failed
//! tool-results for the remote model; only a superseded epoch aborts the
//! batch.

use chrono::Utc;
use concierge_core::ConciergeError;
use concierge_core::types::{
    EmailDispatch, ManagerMessage, ReservationSummary, ServiceRequest, Ticket, ToolInvocation,
    ToolResponse,
};
use concierge_desk::{DraftPatch, generate_confirmation_code};
use concierge_tools::{
    EmailArgs, ManagerCallArgs, ManagerMessageArgs, ReservationArgs, ServiceArgs, ToolCall,
    payload, prompt,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::{EpochGuard, SessionContext};

/// Runs the six concierge tools for one controller.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    ctx: SessionContext,
    hotel_name: String,
}

impl ToolDispatcher {
    pub fn new(ctx: SessionContext, hotel_name: impl Into<String>) -> Self {
        Self {
            ctx,
            hotel_name: hotel_name.into(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Answers every invocation of one batch, in order.
    ///
    /// Fails only with [`ConciergeError::StaleSession`] when the guard's
    /// epoch ends mid-batch; the remaining calls are not run.
    pub async fn dispatch_batch(
        &self,
        guard: &EpochGuard,
        calls: &[ToolInvocation],
    ) -> Result<Vec<ToolResponse>, ConciergeError> {
        let mut responses = Vec::with_capacity(calls.len());
        for invocation in calls {
            let result = match ToolCall::decode(invocation) {
                Ok(call) => {
                    debug!(epoch = %guard.epoch(), tool = call.name(), "dispatching tool call");
                    self.run(guard, call).await
                }
                Err(err) => Err(err),
            };
            let payload = match result {
                Ok(payload) => payload,
                Err(err @ ConciergeError::StaleSession { .. }) => return Err(err),
                Err(err) => {
                    warn!(tool = %invocation.name, error = %err, "tool call failed");
                    payload::from_error(&err)
                }
            };
            responses.push(payload::respond(invocation, payload));
        }
        Ok(responses)
    }

    async fn run(&self, guard: &EpochGuard, call: ToolCall) -> Result<Value, ConciergeError> {
        match call {
            ToolCall::UpdateBookingDraft(patch) => self.update_draft(guard, patch),
            ToolCall::SaveReservation(args) => self.save_reservation(guard, args),
            ToolCall::SendEmailConfirmation(args) => self.send_email(guard, args).await,
            ToolCall::SaveServiceRequest(args) => self.save_service_request(guard, args),
            ToolCall::AttemptManagerCall(args) => self.attempt_manager_call(guard, args).await,
            ToolCall::CreateManagerMessage(args) => self.create_manager_message(guard, args).await,
            ToolCall::Unknown { name } => {
                warn!(tool = %name, "model invoked an undeclared tool");
                Ok(payload::unknown_tool(&name))
            }
        }
    }

    fn update_draft(&self, guard: &EpochGuard, patch: DraftPatch) -> Result<Value, ConciergeError> {
        let booking_id = self.ctx.with_state(guard.epoch(), |desk| {
            desk.draft
                .apply_partial_update(patch)
                .map(|draft| draft.booking_id.clone())
        })??;
        debug!(booking_id = %booking_id, "booking draft updated");
        Ok(payload::success())
    }

    fn save_reservation(
        &self,
        guard: &EpochGuard,
        args: ReservationArgs,
    ) -> Result<Value, ConciergeError> {
        let confirmation_code = generate_confirmation_code();
        let code = confirmation_code.clone();
        let booking_id = self.ctx.with_state(guard.epoch(), move |desk| {
            let booking_id = desk.draft.confirm().ok().map(|d| d.booking_id.clone());
            desk.record(Ticket::Reservation(ReservationSummary {
                guest_name: args.guest_name,
                email: args.email,
                check_in: args.check_in,
                check_out: args.check_out,
                guests: args.guests,
                room_type: args.room_type,
                special_requests: args.special_requests,
                confirmation_code: code,
                booking_id: booking_id.clone(),
            }));
            booking_id
        })?;

        match booking_id {
            Some(id) => {
                info!(booking_id = %id, confirmation_code = %confirmation_code, "reservation saved");
                let shown = id.clone();
                self.ctx.spawn_after(guard, self.ctx.timing().confirmation_display(), move |desk| {
                    if desk
                        .draft
                        .current()
                        .is_some_and(|d| d.booking_id == shown && d.is_confirmed())
                    {
                        desk.draft.clear();
                        debug!(booking_id = %shown, "confirmed draft cleared");
                    }
                });
            }
            None => {
                warn!(confirmation_code = %confirmation_code, "reservation saved without a booking draft");
            }
        }
        Ok(payload::reservation_confirmed(&confirmation_code))
    }

    async fn send_email(&self, guard: &EpochGuard, args: EmailArgs) -> Result<Value, ConciergeError> {
        let epoch = guard.epoch();
        let tracked = self
            .ctx
            .with_state(epoch, |desk| desk.draft.mark_email_sending().is_ok())?;
        if !tracked {
            warn!(email = %args.email, "sending confirmation email without a booking draft");
        }

        self.ctx
            .pause(guard, self.ctx.timing().email_dispatch_delay())
            .await?;

        let (subject, body) = prompt::confirmation_letter(
            &self.hotel_name,
            &args.guest_name,
            args.booking_details.as_deref(),
        );
        self.ctx.with_state(epoch, |desk| {
            desk.record(Ticket::EmailDispatch(EmailDispatch {
                email: args.email,
                guest_name: args.guest_name,
                booking_details: args.booking_details,
                subject,
                body,
                sent_at: Utc::now(),
                is_read: false,
            }));
            let _ = desk.draft.mark_email_sent();
        })?;
        info!(%epoch, "confirmation email delivered");
        Ok(payload::success())
    }

    fn save_service_request(
        &self,
        guard: &EpochGuard,
        args: ServiceArgs,
    ) -> Result<Value, ConciergeError> {
        info!(request_type = %args.request_type, "service request saved");
        self.ctx.record_ticket(
            guard.epoch(),
            Ticket::Service(ServiceRequest {
                guest_name: args.guest_name,
                request_type: args.request_type,
                details: args.details,
                room_number: args.room_number,
                notes: args.notes,
                timestamp: Utc::now(),
            }),
        )?;
        Ok(payload::success())
    }

    async fn attempt_manager_call(
        &self,
        guard: &EpochGuard,
        args: ManagerCallArgs,
    ) -> Result<Value, ConciergeError> {
        let epoch = guard.epoch();
        if let Err(err) = self.ctx.with_state(epoch, |desk| desk.manager.begin_call())? {
            return Ok(payload::failure(err.to_string()));
        }
        info!(guest = %args.guest_name, reason = %args.reason, "calling duty manager");

        self.ctx
            .pause(guard, self.ctx.timing().manager_call_delay())
            .await?;

        if let Err(err) = self.ctx.with_state(epoch, |desk| desk.manager.call_busy())? {
            return Ok(payload::failure(err.to_string()));
        }
        info!("duty manager line busy");
        Ok(payload::busy())
    }

    async fn create_manager_message(
        &self,
        guard: &EpochGuard,
        args: ManagerMessageArgs,
    ) -> Result<Value, ConciergeError> {
        let epoch = guard.epoch();
        if let Err(err) = self.ctx.with_state(epoch, |desk| desk.manager.begin_message())? {
            return Ok(payload::failure(err.to_string()));
        }

        self.ctx
            .pause(guard, self.ctx.timing().manager_message_delay())
            .await?;

        let urgency = args.urgency;
        self.ctx.with_state(epoch, |desk| {
            desk.record(Ticket::Manager(ManagerMessage {
                guest_name: args.guest_name,
                contact_details: args.contact_details,
                issue: args.issue,
                urgency,
                timestamp: Utc::now(),
            }));
            desk.manager.message_sent()
        })?
        .map_err(|e| ConciergeError::Internal(e.to_string()))?;
        info!(%urgency, "message forwarded to duty manager");

        self.ctx
            .spawn_after(guard, self.ctx.timing().manager_status_reset(), |desk| {
                desk.manager.reset_to_idle();
            });
        Ok(payload::success())
    }
}
