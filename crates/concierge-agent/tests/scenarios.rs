// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end guest journeys: booking, housekeeping and escalation.

use concierge_core::types::{
    LiveEvent, ManagerCallStatus, PostConfirmPolicy, Ticket, ToolInvocation, Urgency,
};
use concierge_desk::DraftStatus;
use concierge_test_utils::{TestHarness, eventually, text_reply, tool_reply};
use serde_json::json;

fn booking_turns() -> Vec<concierge_core::types::ChatResponse> {
    vec![
        tool_reply(vec![("updateBookingDraft", json!({"guestName": "J. Smith"}))]),
        text_reply("Thank you, J. Smith. What is your email?"),
        tool_reply(vec![("updateBookingDraft", json!({"email": "j@x.com"}))]),
        text_reply("Which dates?"),
        tool_reply(vec![(
            "updateBookingDraft",
            json!({
                "checkIn": "2026-11-01",
                "checkOut": "2026-11-03",
                "roomType": "Deluxe Room",
                "guests": 2,
                "subtotal": 700,
                "tax": 84,
                "total": 784
            }),
        )]),
        text_reply("That comes to $784. Shall I confirm?"),
        tool_reply(vec![(
            "saveReservation",
            json!({
                "guestName": "J. Smith",
                "email": "j@x.com",
                "checkIn": "2026-11-01",
                "checkOut": "2026-11-03",
                "guests": 2,
                "roomType": "Deluxe Room"
            }),
        )]),
        text_reply("Your booking is confirmed."),
    ]
}

#[tokio::test]
async fn booking_journey_records_one_reservation() {
    let harness = TestHarness::builder()
        .with_timing(concierge_config::model::TimingConfig {
            confirmation_display_ms: 60_000,
            ..concierge_config::model::TimingConfig::immediate()
        })
        .with_chat_responses(booking_turns())
        .build();
    let text = harness.text_controller();

    for line in ["I'm J. Smith", "j@x.com", "Nov 1 to Nov 3, deluxe, two of us", "Yes, confirm"] {
        text.send_turn(line).await.unwrap();
    }

    let snapshot = harness.ctx.snapshot();
    let reservations: Vec<_> = snapshot
        .tickets
        .iter()
        .filter_map(|entry| match &entry.ticket {
            Ticket::Reservation(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(reservations.len(), 1);

    let reservation = reservations[0];
    assert_eq!(reservation.guest_name, "J. Smith");
    assert_eq!(reservation.email, "j@x.com");
    assert_eq!(reservation.check_in, "2026-11-01");
    assert_eq!(reservation.check_out, "2026-11-03");
    assert!(!reservation.confirmation_code.is_empty());

    let draft = snapshot.draft.unwrap();
    assert_eq!(draft.status, DraftStatus::Confirmed);
    assert_eq!(draft.total, Some(784.0));
    assert_ne!(reservation.confirmation_code, draft.booking_id);
    assert_eq!(reservation.booking_id.as_deref(), Some(draft.booking_id.as_str()));
    assert_eq!(
        snapshot.notification.as_deref(),
        None,
        "banner expires immediately with zero ttl"
    );
}

#[tokio::test]
async fn towels_without_room_number() {
    let harness = TestHarness::builder()
        .with_chat_responses(vec![
            tool_reply(vec![(
                "saveServiceRequest",
                json!({"guestName": "J. Smith", "requestType": "housekeeping", "details": "towels"}),
            )]),
            text_reply("Fresh towels are on their way."),
        ])
        .build();
    let text = harness.text_controller();

    let reply = text.send_turn("Could I get towels?").await.unwrap().unwrap();
    assert_eq!(reply.text, "Fresh towels are on their way.");

    let result = &harness.chat.requests()[1].history[2];
    assert_eq!(
        serde_json::to_value(&result.parts[0]).unwrap()["response"]["result"]["status"],
        "success"
    );

    let snapshot = harness.ctx.snapshot();
    assert_eq!(snapshot.tickets.len(), 1);
    let Ticket::Service(service) = &snapshot.tickets[0].ticket else {
        panic!("expected a service ticket");
    };
    assert_eq!(service.details, "towels");
    assert!(service.room_number.is_none());
}

#[tokio::test]
async fn manager_escalation_passes_through_busy() {
    let harness = TestHarness::builder()
        .with_chat_responses(vec![
            tool_reply(vec![(
                "attemptManagerCall",
                json!({"guestName": "J. Smith", "reason": "loud neighbours"}),
            )]),
            text_reply("The manager is on another call. Shall I leave a message?"),
            tool_reply(vec![(
                "createManagerMessage",
                json!({
                    "guestName": "J. Smith",
                    "contactDetails": "room 412",
                    "issue": "loud neighbours",
                    "urgency": "high"
                }),
            )]),
            text_reply("Your message has been forwarded."),
        ])
        .build();
    let text = harness.text_controller();

    text.send_turn("I want the manager now").await.unwrap();
    let busy = &harness.chat.requests()[1].history[2];
    assert_eq!(
        serde_json::to_value(&busy.parts[0]).unwrap()["response"]["result"]["status"],
        "busy"
    );
    assert_eq!(harness.ctx.snapshot().manager_status, ManagerCallStatus::Busy);

    text.send_turn("Yes, leave a message").await.unwrap();
    eventually(|| harness.ctx.snapshot().manager_status == ManagerCallStatus::Idle).await;

    let history = harness
        .ctx
        .with_state(harness.ctx.current_epoch(), |desk| {
            desk.manager.history().to_vec()
        })
        .unwrap();
    assert_eq!(
        history,
        vec![
            ManagerCallStatus::Calling,
            ManagerCallStatus::Busy,
            ManagerCallStatus::SendingMessage,
            ManagerCallStatus::Completed,
            ManagerCallStatus::Idle,
        ]
    );

    let snapshot = harness.ctx.snapshot();
    let managers: Vec<_> = snapshot
        .tickets
        .iter()
        .filter_map(|entry| match &entry.ticket {
            Ticket::Manager(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(managers.len(), 1);
    assert_eq!(managers[0].urgency, Urgency::High);
    assert_eq!(managers[0].contact_details.as_deref(), Some("room 412"));
}

#[tokio::test]
async fn updates_after_confirmation_follow_the_policy() {
    for (policy, expect_error) in [
        (PostConfirmPolicy::Reject, true),
        (PostConfirmPolicy::Ignore, false),
    ] {
        let mut turns = booking_turns();
        turns.push(tool_reply(vec![("updateBookingDraft", json!({"guests": 3}))]));
        turns.push(text_reply("Noted."));
        let harness = TestHarness::builder()
            .with_timing(concierge_config::model::TimingConfig {
                confirmation_display_ms: 60_000,
                ..concierge_config::model::TimingConfig::immediate()
            })
            .with_post_confirm_policy(policy)
            .with_chat_responses(turns)
            .build();
        let text = harness.text_controller();
        for line in ["name", "email", "dates", "confirm", "actually three guests"] {
            text.send_turn(line).await.unwrap();
        }

        let requests = harness.chat.requests();
        let last = requests.last().unwrap();
        let result = serde_json::to_value(&last.history.last().unwrap().parts[0]).unwrap();
        assert_eq!(
            result["response"].get("error").is_some(),
            expect_error,
            "policy {policy}: {result}"
        );
        let draft = harness.ctx.snapshot().draft.unwrap();
        assert_eq!(draft.guests, Some(2), "policy {policy} must not change the draft");
        assert_eq!(draft.status, DraftStatus::Confirmed);
    }
}

#[tokio::test]
async fn voice_booking_and_email_journey() {
    let harness = TestHarness::builder().build();
    let voice = harness.voice_controller();
    voice.connect().await.unwrap();

    let batch = vec![
        ToolInvocation {
            id: Some("fc-1".into()),
            name: "updateBookingDraft".into(),
            args: json!({"guestName": "J. Smith", "email": "j@x.com"}),
        },
        ToolInvocation {
            id: Some("fc-2".into()),
            name: "sendEmailConfirmation".into(),
            args: json!({"email": "j@x.com", "guestName": "J. Smith"}),
        },
    ];
    harness.live.emit(LiveEvent::ToolCall(batch)).await;
    let batches = harness.live.wait_for_tool_responses(1).await;

    let ids: Vec<_> = batches[0].iter().map(|r| r.id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["fc-1", "fc-2"]);
    assert!(batches[0].iter().all(|r| !r.is_error()));

    let snapshot = harness.ctx.snapshot();
    assert_eq!(snapshot.tickets[0].ticket.kind(), "EMAIL_DISPATCH");
    assert_eq!(
        snapshot.draft.unwrap().email_status,
        Some(concierge_desk::EmailStatus::Sent)
    );

    voice.disconnect().await;
}
