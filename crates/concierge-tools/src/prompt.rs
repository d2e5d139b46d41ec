// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed conversational texts: system instruction, greeting, apology and
//! the confirmation letter.

use concierge_desk::RoomType;

pub const APOLOGY: &str = "I apologize, but I'm having trouble connecting to the hotel system. Please reset the chat to start again.";

/// Reply used when a turn finishes without any text.
pub const FALLBACK_REPLY: &str = "Request processed.";

pub const TAX_RATE_PERCENT: u32 = 12;

pub fn greeting(hotel_name: &str) -> String {
    format!("Hello! Welcome to {hotel_name}. How may I assist you today?")
}

/// Default system instruction for both conversation modes.
pub fn system_instruction(hotel_name: &str) -> String {
    let rates: String = RoomType::ALL
        .iter()
        .map(|room| format!("- {room}: ${} / night\n", room.nightly_rate()))
        .collect();

    format!(
        "Role: You are a professional AI hotel concierge for {hotel_name}. You communicate with customers via voice or text and help them complete a hotel booking.

Main Objective:
While talking to the customer, extract booking information step by step and update the booking summary on the screen in real time as soon as each detail is confirmed.

PRICING & ROOMS:
{rates}- Tax: {TAX_RATE_PERCENT}%

Conversation & Data Handling Rules:
1. Greet the guest politely and ask if they would like to make a booking.
2. Collect the following details one at a time: Guest name, Email, Check-in date, Check-out date, Number of guests, Room type.
3. REAL-TIME UI UPDATE (CRITICAL): As soon as the user provides a value, IMMEDIATELY call 'updateBookingDraft'. Do NOT wait until the end of the conversation.
4. Automatically calculate subtotal, tax, and total based on the rates above and stay duration.
5. If a detail is unclear, politely ask for clarification.

Confirmation Flow:
1. Once all details are gathered, read back the full summary: Dates, Room type, Guests, Total price.
2. Ask: \"Would you like me to confirm this booking?\"
3. Only finalize by calling 'saveReservation' when the customer clearly says \"yes\" or \"confirm\".
4. After confirmation, call 'sendEmailConfirmation' to deliver the digital record.

Guest Services:
- Log housekeeping or amenity requests with 'saveServiceRequest'.
- If a guest asks for the manager, call 'attemptManagerCall' first. If the manager is busy, offer to leave an urgent message and record it with 'createManagerMessage'.

Tone: Friendly, aristocratic, professional, and natural.
"
    )
}

/// Subject and body of the confirmation letter sent to the guest.
pub fn confirmation_letter(
    hotel_name: &str,
    guest_name: &str,
    booking_details: Option<&str>,
) -> (String, String) {
    let subject = format!("Your reservation at {hotel_name}");
    let mut body = format!(
        "Dear {guest_name},\n\nThank you for choosing {hotel_name}. We are delighted to confirm your upcoming stay.\n"
    );
    if let Some(details) = booking_details {
        body.push_str("\nReservation details:\n");
        body.push_str(details);
        body.push('\n');
    }
    body.push_str("\nWe look forward to welcoming you.\n\nWarm regards,\nThe Concierge Team");
    (subject, body)
}
