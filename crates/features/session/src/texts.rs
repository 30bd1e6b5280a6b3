//! User-facing texts of the command protocol.

use keeper_domain::record::RecordKind;
use std::fmt::Write;

pub const MAIN_MENU: &str = "\nChoose an action:\n1) GET\n2) CREATE";
pub const CREATE_MENU: &str = "\nWhat do you want to create:\n1) login/password\n2) text\n3) bank card\n4) binary data";
pub const UNKNOWN_ACTION: &str = "\nUnknown action!";
pub const UNKNOWN_KIND: &str = "\nUnknown record type!";
pub const NO_DATA: &str = "\nYou have no saved data.";
pub const NO_SUCH_RECORD: &str = "\nNo record with that number!";
pub const DATA_SAVED: &str = "\nData saved!";
pub const INVALID_FORMAT: &str = "\nInvalid data format.";
pub const DUPLICATE_TITLE: &str = "\nA record with this title already exists.";
pub const LOAD_FAILED: &str = "\nCould not load the record.";
pub const SAVE_FAILED: &str = "\nCould not save the data.";
pub const EMPTY_USERNAME: &str = "\nA username is required to start a session.";
pub const INVALID_MESSAGE: &str = "\nInvalid message.";

/// Field template prompt for a record kind.
#[must_use]
pub const fn template(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Password => {
            "\nEnter data using the template: [title]::[login]::[password]::[meta]"
        }
        RecordKind::Text => "\nEnter data using the template: [title]::[text]::[meta]",
        RecordKind::Card => {
            "\nEnter data using the template: \
             [title]::[card number]::[expiration date]::[card owner]::[cvv]::[meta]"
        }
        RecordKind::Binary => "\nEnter data using the template: [title]::[bytes]::[meta]",
    }
}

/// Numbered title list, 1-based.
#[must_use]
pub fn title_list(titles: &[String]) -> String {
    let mut out = String::from("\nWhat do you want to get:\n");
    for (index, title) in titles.iter().enumerate() {
        let _ = writeln!(out, "{}) {title}", index + 1);
    }
    out
}

/// Notice pushed to the owner's other sessions.
#[must_use]
pub fn record_created(title: &str) -> String {
    format!("UPDATE! New record: {title}")
}
