// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking draft assembled turn by turn from partial tool-call arguments.
//!
//! A draft is created by the first partial update of a session, merged
//! non-destructively by later updates, frozen by `confirm()`, and finally
//! cleared. Pricing fields are stored exactly as the remote agent sent them.

use concierge_core::ConciergeError;
use concierge_core::types::PostConfirmPolicy;
use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;

/// Closed set of bookable room categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum RoomType {
    #[serde(rename = "Standard Room")]
    #[strum(serialize = "Standard Room")]
    Standard,
    #[serde(rename = "Deluxe Room")]
    #[strum(serialize = "Deluxe Room")]
    Deluxe,
    #[serde(rename = "Suite")]
    #[strum(serialize = "Suite")]
    Suite,
}

impl RoomType {
    /// Nightly rate in whole dollars, as quoted to the guest.
    pub fn nightly_rate(self) -> u32 {
        match self {
            Self::Standard => 200,
            Self::Deluxe => 350,
            Self::Suite => 600,
        }
    }

    pub const ALL: [RoomType; 3] = [Self::Standard, Self::Deluxe, Self::Suite];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Active,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmailStatus {
    Sending,
    Sent,
}

/// The in-progress reservation shown to the guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub booking_id: String,
    pub guest_name: Option<String>,
    pub email: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub room_type: Option<RoomType>,
    pub guests: Option<u32>,
    pub special_requests: Option<String>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub total: Option<f64>,
    pub email_status: Option<EmailStatus>,
    pub status: DraftStatus,
}

impl BookingDraft {
    fn new(booking_id: String) -> Self {
        Self {
            booking_id,
            guest_name: None,
            email: None,
            check_in: None,
            check_out: None,
            room_type: None,
            guests: None,
            special_requests: None,
            subtotal: None,
            tax: None,
            total: None,
            email_status: None,
            status: DraftStatus::Active,
        }
    }

    /// Overwrites only the fields present in `patch`.
    fn merge(&mut self, patch: DraftPatch) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        set(&mut self.guest_name, patch.guest_name);
        set(&mut self.email, patch.email);
        set(&mut self.check_in, patch.check_in);
        set(&mut self.check_out, patch.check_out);
        set(&mut self.room_type, patch.room_type);
        set(&mut self.guests, patch.guests);
        set(&mut self.special_requests, patch.special_requests);
        set(&mut self.subtotal, patch.subtotal);
        set(&mut self.tax, patch.tax);
        set(&mut self.total, patch.total);
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == DraftStatus::Confirmed
    }
}

/// Partial update carried by `updateBookingDraft`; absent and null fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatch {
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub room_type: Option<RoomType>,
    #[serde(default, deserialize_with = "deserialize_guest_count")]
    pub guests: Option<u32>,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub tax: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Accepts `2`, `2.0` or `"2"`; rejects zero, negatives and fractions.
pub fn parse_guest_count(value: &Value) -> Result<u32, String> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("guests must be a number, got {value}"))?;

    if number.fract() != 0.0 || number < 1.0 || number > f64::from(u32::MAX) {
        return Err(format!("guests must be a positive whole number, got {number}"));
    }
    Ok(number as u32)
}

fn deserialize_guest_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_guest_count(&value).map(Some).map_err(D::Error::custom),
    }
}

/// Generates a draft identifier of the form `BK-12345`.
pub fn generate_booking_id() -> String {
    format!("BK-{}", rand::thread_rng().gen_range(10_000..100_000))
}

/// Owns at most one draft for a controller session.
#[derive(Debug, Default)]
pub struct DraftMachine {
    draft: Option<BookingDraft>,
    policy: PostConfirmPolicy,
}

impl DraftMachine {
    pub fn new(policy: PostConfirmPolicy) -> Self {
        Self {
            draft: None,
            policy,
        }
    }

    pub fn current(&self) -> Option<&BookingDraft> {
        self.draft.as_ref()
    }

    pub fn policy(&self) -> PostConfirmPolicy {
        self.policy
    }

    /// Merges `patch` into the draft, creating one with a fresh id if needed.
    ///
    /// A confirmed draft is left untouched: the update is rejected under
    /// [`PostConfirmPolicy::Reject`] and silently dropped under
    /// [`PostConfirmPolicy::Ignore`].
    pub fn apply_partial_update(&mut self, patch: DraftPatch) -> Result<&BookingDraft, ConciergeError> {
        let draft = self
            .draft
            .get_or_insert_with(|| BookingDraft::new(generate_booking_id()));

        if draft.is_confirmed() {
            return match self.policy {
                PostConfirmPolicy::Reject => Err(ConciergeError::DraftAlreadyConfirmed {
                    booking_id: draft.booking_id.clone(),
                }),
                PostConfirmPolicy::Ignore => {
                    debug!(booking_id = %draft.booking_id, "ignoring update to confirmed draft");
                    Ok(draft)
                }
            };
        }

        draft.merge(patch);
        draft.status = DraftStatus::Active;
        Ok(draft)
    }

    pub fn mark_email_sending(&mut self) -> Result<(), ConciergeError> {
        self.set_email_status(EmailStatus::Sending)
    }

    pub fn mark_email_sent(&mut self) -> Result<(), ConciergeError> {
        self.set_email_status(EmailStatus::Sent)
    }

    fn set_email_status(&mut self, status: EmailStatus) -> Result<(), ConciergeError> {
        let draft = self.draft.as_mut().ok_or(ConciergeError::NoActiveDraft)?;
        draft.email_status = Some(status);
        Ok(())
    }

    /// Freezes the draft. Confirming twice is harmless.
    pub fn confirm(&mut self) -> Result<&BookingDraft, ConciergeError> {
        let draft = self.draft.as_mut().ok_or(ConciergeError::NoActiveDraft)?;
        draft.status = DraftStatus::Confirmed;
        Ok(draft)
    }

    /// Discards the draft. Idempotent.
    pub fn clear(&mut self) -> Option<BookingDraft> {
        self.draft.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn patch(value: Value) -> DraftPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn first_update_creates_draft_with_id() {
        let mut machine = DraftMachine::default();
        let draft = machine
            .apply_partial_update(patch(json!({"guestName": "J. Smith"})))
            .unwrap();
        assert!(draft.booking_id.starts_with("BK-"));
        assert_eq!(draft.booking_id.len(), 8);
        assert_eq!(draft.guest_name.as_deref(), Some("J. Smith"));
        assert_eq!(draft.status, DraftStatus::Active);
    }

    #[test]
    fn absent_and_null_fields_keep_prior_values() {
        let mut machine = DraftMachine::default();
        machine
            .apply_partial_update(patch(json!({"guestName": "J. Smith", "guests": 2})))
            .unwrap();
        let id = machine.current().unwrap().booking_id.clone();
        let draft = machine
            .apply_partial_update(patch(json!({"email": "j@x.com", "guestName": null})))
            .unwrap();
        assert_eq!(draft.booking_id, id);
        assert_eq!(draft.guest_name.as_deref(), Some("J. Smith"));
        assert_eq!(draft.email.as_deref(), Some("j@x.com"));
        assert_eq!(draft.guests, Some(2));
    }

    #[test]
    fn pricing_is_stored_verbatim() {
        let mut machine = DraftMachine::default();
        let draft = machine
            .apply_partial_update(patch(json!({
                "roomType": "Deluxe Room",
                "subtotal": 700,
                "tax": 84.0,
                "total": 1.5
            })))
            .unwrap();
        assert_eq!(draft.room_type, Some(RoomType::Deluxe));
        assert_eq!(draft.subtotal, Some(700.0));
        assert_eq!(draft.tax, Some(84.0));
        assert_eq!(draft.total, Some(1.5));
    }

    #[test]
    fn guest_count_accepts_integral_forms_only() {
        assert_eq!(patch(json!({"guests": 2.0})).guests, Some(2));
        assert_eq!(patch(json!({"guests": "3"})).guests, Some(3));
        assert!(serde_json::from_value::<DraftPatch>(json!({"guests": 0})).is_err());
        assert!(serde_json::from_value::<DraftPatch>(json!({"guests": 2.5})).is_err());
        assert!(serde_json::from_value::<DraftPatch>(json!({"guests": "many"})).is_err());
    }

    #[test]
    fn unknown_room_type_is_rejected() {
        assert!(serde_json::from_value::<DraftPatch>(json!({"roomType": "Penthouse"})).is_err());
    }

    #[test]
    fn confirmed_draft_rejects_updates_by_default() {
        let mut machine = DraftMachine::new(PostConfirmPolicy::Reject);
        machine
            .apply_partial_update(patch(json!({"guestName": "J. Smith"})))
            .unwrap();
        machine.confirm().unwrap();

        let err = machine
            .apply_partial_update(patch(json!({"guestName": "Jane Smith"})))
            .unwrap_err();
        assert!(matches!(err, ConciergeError::DraftAlreadyConfirmed { .. }));
        let draft = machine.current().unwrap();
        assert_eq!(draft.guest_name.as_deref(), Some("J. Smith"));
        assert!(draft.is_confirmed());
    }

    #[test]
    fn confirmed_draft_ignores_updates_under_ignore_policy() {
        let mut machine = DraftMachine::new(PostConfirmPolicy::Ignore);
        machine
            .apply_partial_update(patch(json!({"guestName": "J. Smith"})))
            .unwrap();
        machine.confirm().unwrap();

        let draft = machine
            .apply_partial_update(patch(json!({"guestName": "Jane Smith"})))
            .unwrap();
        assert_eq!(draft.guest_name.as_deref(), Some("J. Smith"));
        assert_eq!(draft.status, DraftStatus::Confirmed);
    }

    #[test]
    fn email_status_needs_a_draft() {
        let mut machine = DraftMachine::default();
        assert!(matches!(
            machine.mark_email_sending(),
            Err(ConciergeError::NoActiveDraft)
        ));
        assert!(matches!(machine.confirm(), Err(ConciergeError::NoActiveDraft)));
    }

    #[test]
    fn email_status_moves_on_confirmed_draft() {
        let mut machine = DraftMachine::default();
        machine
            .apply_partial_update(patch(json!({"email": "j@x.com"})))
            .unwrap();
        machine.confirm().unwrap();
        machine.mark_email_sending().unwrap();
        assert_eq!(machine.current().unwrap().email_status, Some(EmailStatus::Sending));
        machine.mark_email_sent().unwrap();
        let draft = machine.current().unwrap();
        assert_eq!(draft.email_status, Some(EmailStatus::Sent));
        assert_eq!(draft.email.as_deref(), Some("j@x.com"));
    }

    #[test]
    fn clear_is_idempotent_and_next_draft_gets_new_id() {
        let mut machine = DraftMachine::default();
        let first = machine
            .apply_partial_update(patch(json!({"guestName": "A"})))
            .unwrap()
            .booking_id
            .clone();
        assert!(machine.clear().is_some());
        assert!(machine.clear().is_none());

        // Ids are random; retry until they differ to avoid a 1-in-90000 flake.
        let mut second = first.clone();
        for _ in 0..5 {
            machine.clear();
            second = machine
                .apply_partial_update(DraftPatch::default())
                .unwrap()
                .booking_id
                .clone();
            if second != first {
                break;
            }
        }
        assert_ne!(first, second);
    }

    #[test]
    fn room_type_display_matches_wire_names() {
        assert_eq!(RoomType::Standard.to_string(), "Standard Room");
        assert_eq!("Suite".parse::<RoomType>().unwrap(), RoomType::Suite);
        assert_eq!(RoomType::Deluxe.nightly_rate(), 350);
    }

    #[derive(Debug, Clone)]
    enum FieldUpdate {
        GuestName(String),
        Email(String),
        CheckIn(String),
        Guests(u32),
        Total(u32),
    }

    impl FieldUpdate {
        fn field(&self) -> u8 {
            match self {
                Self::GuestName(_) => 0,
                Self::Email(_) => 1,
                Self::CheckIn(_) => 2,
                Self::Guests(_) => 3,
                Self::Total(_) => 4,
            }
        }

        fn into_patch(self) -> DraftPatch {
            let mut p = DraftPatch::default();
            match self {
                Self::GuestName(v) => p.guest_name = Some(v),
                Self::Email(v) => p.email = Some(v),
                Self::CheckIn(v) => p.check_in = Some(v),
                Self::Guests(v) => p.guests = Some(v),
                Self::Total(v) => p.total = Some(f64::from(v)),
            }
            p
        }
    }

    fn field_update() -> impl Strategy<Value = FieldUpdate> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(FieldUpdate::GuestName),
            "[a-z]{1,8}@x\\.com".prop_map(FieldUpdate::Email),
            "2026-0[1-9]-1[0-9]".prop_map(FieldUpdate::CheckIn),
            (1u32..10).prop_map(FieldUpdate::Guests),
            (0u32..5000).prop_map(FieldUpdate::Total),
        ]
    }

    fn apply_all(updates: &[FieldUpdate]) -> BookingDraft {
        let mut machine = DraftMachine::default();
        machine.apply_partial_update(DraftPatch::default()).unwrap();
        for update in updates {
            machine
                .apply_partial_update(update.clone().into_patch())
                .unwrap();
        }
        let mut draft = machine.current().unwrap().clone();
        draft.booking_id = String::new();
        draft
    }

    proptest! {
        #[test]
        fn merge_keeps_last_value_per_field(updates in prop::collection::vec(field_update(), 0..24)) {
            let draft = apply_all(&updates);

            let last_name = updates.iter().rev().find_map(|u| match u {
                FieldUpdate::GuestName(v) => Some(v.clone()),
                _ => None,
            });
            let last_guests = updates.iter().rev().find_map(|u| match u {
                FieldUpdate::Guests(v) => Some(*v),
                _ => None,
            });
            prop_assert_eq!(draft.guest_name, last_name);
            prop_assert_eq!(draft.guests, last_guests);
        }

        #[test]
        fn disjoint_field_interleaving_commutes(updates in prop::collection::vec(field_update(), 0..24)) {
            // A stable sort by field reorders unrelated fields while keeping
            // the relative order of updates to the same field.
            let mut regrouped = updates.clone();
            regrouped.sort_by_key(FieldUpdate::field);
            prop_assert_eq!(apply_all(&updates), apply_all(&regrouped));
        }
    }
}
