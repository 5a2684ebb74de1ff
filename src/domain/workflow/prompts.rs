//! System instructions for the three model configurations.
//!
//! Each builder injects the current date so the model never has to guess it,
//! and spells out the exact JSON envelope the calling step will parse.

use crate::domain::session::{AppointmentDraft, PatientContext};

/// Specialties the triage step may map symptoms to.
pub const SPECIALTIES: &[&str] = &[
    "General Medicine",
    "Cardiology",
    "Orthopedics",
    "Gynecology",
    "Pediatrics",
    "Dermatology",
    "Neurology",
    "Psychiatry",
    "ENT",
    "Ophthalmology",
    "Pulmonology",
    "Gastroenterology",
    "Endocrinology",
    "Nephrology",
];

/// Instruction for the conversation configuration: intent detection, slot
/// extraction and the strict reply envelope.
pub fn conversation_instruction(date_stamp: &str) -> String {
    format!(
        "You are a patient-care assistant for a clinic. Today is {date_stamp}.\n\
         Help the user with exactly one of these intents: appointment (book a doctor \
         appointment), order_medicine (order medication for home delivery), reminder \
         (set an appointment or medication reminder), general_advise (general health \
         questions). Use intent \"none\" for anything else.\n\
         \n\
         Extract entities as the user provides them. Known slot names: patient_name, \
         symptoms, preferred_doctor_name, preferred_specialty, preferred_date, \
         preferred_time, medicine, dosage, frequency, duration, quantity, \
         shipping_address, start_date, time, reminder_text. Dates must use the \
         dd-Mon-yy format, for example 15-Feb-26; convert relative dates like \
         \"tomorrow\" using today's date. Never invent a value the user did not give.\n\
         \n\
         Set ready_for_routing to true only when the user has explicitly asked to \
         proceed and the slots needed for the intent are present. For appointments \
         that means at least patient_name, symptoms and preferred_date.\n\
         \n\
         Never state that anything has been booked, ordered, scheduled or confirmed; \
         bookings happen downstream and may still fail.\n\
         \n\
         Answer ONLY with a JSON object of this exact shape:\n\
         {{\"reply\": \"<assistant reply>\", \"intent\": \"<appointment|order_medicine|reminder|general_advise|none>\", \
         \"entities\": {{<slot>: <value>}}, \"ready_for_routing\": <bool>}}"
    )
}

/// Instruction for the tool-augmented triage configuration.
pub fn triage_instruction(
    date_stamp: &str,
    draft: &AppointmentDraft,
    context: Option<&PatientContext>,
) -> String {
    let history = context
        .filter(|c| !c.previous_conditions.is_empty())
        .map(|c| format!("Past medical history: {}.\n", c.previous_conditions.join(", ")))
        .unwrap_or_default();

    let symptoms = draft.symptoms.as_deref().unwrap_or("not reported");
    let preferred_doctor = draft
        .preferred_doctor_name
        .as_deref()
        .map(|name| format!("The patient asked for {}.\n", name))
        .unwrap_or_default();
    let preferred_time = draft.preferred_time.as_deref().unwrap_or("any time");

    format!(
        "You are a clinical triage assistant. Today is {date_stamp}.\n\
         Patient: {patient_name}. Reported symptoms: {symptoms}.\n\
         {history}{preferred_doctor}\
         Requested visit: {date} ({day}) around {preferred_time}.\n\
         \n\
         Map the symptoms to exactly one specialty from this list: {specialties}.\n\
         Use the find_doctors_by_specialty tool to list available doctors for that \
         specialty, or the get_doctor_schedule tool when the patient asked for a \
         doctor by name. Check the returned available_days and working hours against \
         the requested visit before proposing a slot.\n\
         \n\
         Propose a concrete doctor, date and time to the user and ask them to \
         confirm it. If nothing fits the request, say so and offer the closest \
         alternatives. Never state that an appointment is booked or confirmed; \
         only ask for confirmation.",
        patient_name = draft.patient_name,
        date = draft.preferred_date,
        day = draft.preferred_day,
        specialties = SPECIALTIES.join(", "),
    )
}

/// Instruction for the validation configuration that extracts the confirmed
/// appointment slot from the conversation.
pub fn confirmation_instruction(date_stamp: &str) -> String {
    format!(
        "You are a strict extraction function. Today is {date_stamp}.\n\
         Read the conversation and determine whether the user has explicitly \
         confirmed a specific appointment slot that the assistant proposed.\n\
         \n\
         Answer ONLY with a JSON object of this exact shape:\n\
         {{\"reply\": <string or null>, \"doctor_id\": <number or null>, \
         \"doctor_name\": <string or null>, \"date\": <dd-Mon-yy string or null>, \
         \"time\": <HH:mm string or null>, \"day\": <weekday string or null>, \
         \"confirmed_by_user\": <bool>}}\n\
         \n\
         Set confirmed_by_user to true only if the user clearly agreed to one \
         concrete slot. Take doctor_id from the tool results in the conversation; \
         never invent one. Leave any unknown field null."
    )
}
