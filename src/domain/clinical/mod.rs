//! Domain tool contracts: directory lookups, booking persistence, outbound
//! notifications and calendar helpers.

pub mod calendar;
mod booking;
mod directory;
mod notify;
mod tool_call;

pub use booking::{AppointmentRecord, BookingReceipt, BookingStore, OrderReceipt, OrderRequest};
pub use directory::{ClinicalDirectory, DoctorAvailability, PatientRef};
pub use notify::Notifier;
pub use tool_call::{dispatch_tool_call, ToolCallRequest, ToolName};

#[cfg(test)]
pub use booking::mock as booking_mock;
#[cfg(test)]
pub use directory::mock;
#[cfg(test)]
pub use notify::mock as notify_mock;
