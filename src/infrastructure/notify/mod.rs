mod webhook;

pub use webhook::{LogNotifier, WebhookNotifier};
