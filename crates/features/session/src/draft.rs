use crate::error::SessionError;
use keeper_domain::constants::FIELD_DELIMITER;
use keeper_domain::record::RecordKind;

/// A parsed create payload: `title::field::...::meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub kind: RecordKind,
    pub title: String,
    /// Field values in [`RecordKind::field_names`] order.
    pub values: Vec<String>,
}

impl RecordDraft {
    /// Splits `payload` on `::` and checks it against `kind`.
    ///
    /// # Errors
    /// [`SessionError::Format`] if the part count is not [`RecordKind::arity`] or the title is
    /// blank.
    pub fn parse(kind: RecordKind, payload: &str) -> Result<Self, SessionError> {
        let mut parts = payload.split(FIELD_DELIMITER).map(str::to_owned).collect::<Vec<_>>();
        if parts.len() != kind.arity() {
            return Err(SessionError::Format {
                message: format!("expected {} parts, got {}", kind.arity(), parts.len()).into(),
                context: Some(format!("kind={kind}").into()),
            });
        }

        let title = parts.remove(0).trim().to_owned();
        if title.is_empty() {
            return Err(SessionError::Format {
                message: "title cannot be empty".into(),
                context: Some(format!("kind={kind}").into()),
            });
        }

        Ok(Self { kind, title, values: parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_kind_at_full_arity() {
        let cases = [
            (RecordKind::Password, "mail::alice::s3cret::work"),
            (RecordKind::Text, "poem::roses are red::"),
            (RecordKind::Binary, "key::deadbeef::ssh"),
            (RecordKind::Card, "visa::4111111111111111::12/29::ALICE::123::"),
        ];

        for (kind, payload) in cases {
            let draft = RecordDraft::parse(kind, payload).unwrap();
            assert_eq!(draft.values.len(), kind.field_names().len(), "{kind}");
        }

        let draft = RecordDraft::parse(RecordKind::Password, " mail ::alice::pw::").unwrap();
        assert_eq!(draft.title, "mail");
        assert_eq!(draft.values, vec!["alice", "pw", ""]);
    }

    #[test]
    fn rejects_wrong_arity() {
        for kind in RecordKind::ALL {
            let short = vec!["x"; kind.arity() - 1].join(FIELD_DELIMITER);
            let long = vec!["x"; kind.arity() + 1].join(FIELD_DELIMITER);
            assert!(RecordDraft::parse(kind, &short).unwrap_err().is_format(), "{kind}");
            assert!(RecordDraft::parse(kind, &long).unwrap_err().is_format(), "{kind}");
        }
    }

    #[test]
    fn rejects_blank_title() {
        let err = RecordDraft::parse(RecordKind::Text, "  ::body::meta").unwrap_err();
        assert!(err.is_format());
    }
}
