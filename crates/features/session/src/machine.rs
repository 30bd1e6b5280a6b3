//! Pure protocol state machine.
//!
//! [`Machine::feed`] consumes one trimmed payload and either answers directly or asks the
//! caller to perform a [`Request`]. The caller reports the result through
//! [`Machine::resume`], which finishes the transition. No I/O happens here.

use crate::draft::RecordDraft;
use crate::error::SessionError;
use crate::texts;
use keeper_domain::record::RecordKind;
use keeper_domain::session::SessionState;
use keeper_vault::FieldMap;

/// I/O the caller must perform before the transition can complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListTitles,
    Fetch { title: String },
    Store { draft: RecordDraft },
}

/// Result of a [`Request`].
#[derive(Debug)]
pub enum Outcome {
    Titles(Vec<String>),
    Record(FieldMap),
    Stored,
    Failed(SessionError),
}

/// Result of feeding one payload.
#[derive(Debug, Default)]
pub struct Step {
    pub replies: Vec<String>,
    pub request: Option<Request>,
}

impl Step {
    fn reply(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { replies: replies.into_iter().map(Into::into).collect(), request: None }
    }

    const fn request(request: Request) -> Self {
        Self { replies: Vec::new(), request: Some(request) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    ListTitles,
    Fetch,
    Store,
}

#[derive(Debug, Default)]
pub struct Machine {
    state: SessionState,
    kind: Option<RecordKind>,
    titles: Vec<String>,
    pending: Option<Pending>,
}

impl Machine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Kind chosen in the create submenu, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<RecordKind> {
        self.kind
    }

    /// Titles currently offered for selection.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Completes the handshake and shows the main menu.
    pub fn greet(&mut self) -> Vec<String> {
        self.state = SessionState::SelectAction;
        vec![texts::MAIN_MENU.to_owned()]
    }

    /// Consumes one payload.
    ///
    /// A payload fed while a request is outstanding is answered with the current prompt.
    pub fn feed(&mut self, input: &str) -> Step {
        let input = input.trim();
        if self.pending.is_some() {
            return Step::reply([self.prompt()]);
        }

        match self.state {
            SessionState::Handshake => Step::reply(self.greet()),
            SessionState::Connected | SessionState::SelectAction => match input {
                "1" => self.ask(Pending::ListTitles, Request::ListTitles),
                "2" => {
                    self.state = SessionState::ChoseCreateData;
                    Step::reply([texts::CREATE_MENU])
                }
                _ => {
                    self.state = SessionState::SelectAction;
                    Step::reply([texts::UNKNOWN_ACTION, texts::MAIN_MENU])
                }
            },
            SessionState::GetData => {
                let picked = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| self.titles.get(index))
                    .cloned();
                match picked {
                    Some(title) => self.ask(Pending::Fetch, Request::Fetch { title }),
                    None => Step::reply([
                        texts::NO_SUCH_RECORD.to_owned(),
                        texts::title_list(&self.titles),
                    ]),
                }
            }
            SessionState::ChoseCreateData => match RecordKind::from_menu_choice(input) {
                Some(kind) => {
                    self.kind = Some(kind);
                    self.state = SessionState::CreateData;
                    Step::reply([texts::template(kind)])
                }
                None => Step::reply([texts::UNKNOWN_KIND, texts::CREATE_MENU]),
            },
            SessionState::CreateData => {
                let Some(kind) = self.kind else {
                    return Step::reply(self.idle([texts::SAVE_FAILED]));
                };
                match RecordDraft::parse(kind, input) {
                    Ok(draft) => self.ask(Pending::Store, Request::Store { draft }),
                    Err(_) => Step::reply([texts::INVALID_FORMAT]),
                }
            }
        }
    }

    /// Finishes the transition started by the last [`Request`].
    pub fn resume(&mut self, outcome: Outcome) -> Vec<String> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };

        match (pending, outcome) {
            (Pending::ListTitles, Outcome::Titles(titles)) if titles.is_empty() => {
                self.idle([texts::NO_DATA])
            }
            (Pending::ListTitles, Outcome::Titles(titles)) => {
                self.titles = titles;
                self.state = SessionState::GetData;
                vec![texts::title_list(&self.titles)]
            }
            (Pending::Fetch, Outcome::Record(fields)) => self.idle([fields.render()]),
            (Pending::Store, Outcome::Stored) => self.idle([texts::DATA_SAVED]),
            (Pending::Store, Outcome::Failed(err)) if err.is_conflict() => {
                vec![texts::DUPLICATE_TITLE.to_owned()]
            }
            (Pending::Store, Outcome::Failed(err)) if err.is_format() => {
                vec![texts::INVALID_FORMAT.to_owned()]
            }
            (Pending::Store, _) => self.idle([texts::SAVE_FAILED]),
            (Pending::ListTitles | Pending::Fetch, _) => self.idle([texts::LOAD_FAILED]),
        }
    }

    fn ask(&mut self, pending: Pending, request: Request) -> Step {
        self.pending = Some(pending);
        Step::request(request)
    }

    /// Returns to `CONNECTED`, forgetting the offered titles and chosen kind, and appends the
    /// main menu.
    fn idle(&mut self, replies: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
        self.state = SessionState::Connected;
        self.titles.clear();
        self.kind = None;
        let mut out: Vec<String> = replies.into_iter().map(Into::into).collect();
        out.push(texts::MAIN_MENU.to_owned());
        out
    }

    fn prompt(&self) -> String {
        match self.state {
            SessionState::GetData => texts::title_list(&self.titles),
            SessionState::ChoseCreateData => texts::CREATE_MENU.to_owned(),
            SessionState::CreateData => {
                self.kind.map_or(texts::MAIN_MENU, texts::template).to_owned()
            }
            _ => texts::MAIN_MENU.to_owned(),
        }
    }
}
