//! Notices a tab asks the presentation layer to show.
//!
//! A tab holds at most one notice at a time. The presentation layer
//! answers with a single `NoticeResponse`; each notice accepts a small
//! fixed set of responses and the tab rejects anything else.

use crate::{Encoding, IoErrorKind, Location, SaveErrorClass};

/// Operation a progress notice reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Loading,
    Reverting,
    Saving,
    Printing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Long-running operation. `fraction` is `None` while the total is unknown.
    Progress {
        kind: ProgressKind,
        text: String,
        fraction: Option<f64>,
        cancellable: bool,
    },
    /// Loading failed, or succeeded by falling back to a lossy conversion.
    LoadingError {
        location: Location,
        kind: IoErrorKind,
        message: String,
        fallback: bool,
    },
    /// Reverting failed. Only dismissal is possible.
    RevertingError {
        location: Location,
        kind: IoErrorKind,
        message: String,
    },
    SavingError {
        location: Location,
        kind: IoErrorKind,
        class: SaveErrorClass,
        message: String,
    },
    /// The file changed on disk. `document_modified` tells whether
    /// reloading would also discard unsaved edits.
    ExternallyModified {
        location: Location,
        document_modified: bool,
    },
    /// Another tab already shows this location.
    FileAlreadyOpen { location: Location },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeResponse {
    /// Retry the failed operation with another encoding.
    Retry { encoding: Encoding },
    EditAnyway,
    DontEdit,
    SaveAnyway,
    Reload,
    Cancel,
    Close,
    Dismiss,
}

impl Notice {
    /// Whether `response` is one of the answers this notice offers.
    pub fn accepts(&self, response: NoticeResponse) -> bool {
        use NoticeResponse as R;

        match self {
            Notice::Progress { cancellable, .. } => *cancellable && response == R::Cancel,
            // Without recovered content there is nothing safe to edit
            Notice::LoadingError { fallback: true, .. } => matches!(
                response,
                R::Retry { .. } | R::EditAnyway | R::DontEdit | R::Close
            ),
            Notice::LoadingError { fallback: false, .. } => {
                matches!(response, R::Retry { .. } | R::Close)
            }
            Notice::RevertingError { .. } => response == R::Dismiss,
            Notice::SavingError { class, .. } => match class {
                SaveErrorClass::ExternallyModified | SaveErrorClass::NoBackup => {
                    matches!(response, R::SaveAnyway | R::Cancel)
                }
                SaveErrorClass::Encoding => matches!(response, R::Retry { .. } | R::Cancel),
                SaveErrorClass::Unrecoverable => response == R::Dismiss,
            },
            Notice::ExternallyModified { .. } => matches!(response, R::Reload | R::Dismiss),
            Notice::FileAlreadyOpen { .. } => matches!(response, R::EditAnyway | R::DontEdit),
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, Notice::Progress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> Location {
        Location::parse("/tmp/notice.txt").unwrap()
    }

    #[test]
    fn test_saving_error_responses_follow_class() {
        let notice = Notice::SavingError {
            location: location(),
            kind: IoErrorKind::CantCreateBackup,
            class: SaveErrorClass::NoBackup,
            message: String::new(),
        };
        assert!(notice.accepts(NoticeResponse::SaveAnyway));
        assert!(notice.accepts(NoticeResponse::Cancel));
        assert!(!notice.accepts(NoticeResponse::Dismiss));

        let notice = Notice::SavingError {
            location: location(),
            kind: IoErrorKind::PermissionDenied,
            class: SaveErrorClass::Unrecoverable,
            message: String::new(),
        };
        assert!(notice.accepts(NoticeResponse::Dismiss));
        assert!(!notice.accepts(NoticeResponse::SaveAnyway));
    }

    #[test]
    fn test_hard_loading_error_offers_retry_and_close_only() {
        let hard = Notice::LoadingError {
            location: location(),
            kind: IoErrorKind::PermissionDenied,
            message: String::new(),
            fallback: false,
        };
        let retry = NoticeResponse::Retry {
            encoding: Encoding::Latin1,
        };
        assert!(hard.accepts(retry));
        assert!(hard.accepts(NoticeResponse::Close));
        assert!(!hard.accepts(NoticeResponse::EditAnyway));
        assert!(!hard.accepts(NoticeResponse::DontEdit));

        let fallback = Notice::LoadingError {
            location: location(),
            kind: IoErrorKind::ConversionFallback,
            message: String::new(),
            fallback: true,
        };
        assert!(fallback.accepts(NoticeResponse::EditAnyway));
        assert!(fallback.accepts(NoticeResponse::DontEdit));
    }

    #[test]
    fn test_progress_cancel_only_when_cancellable() {
        let mut notice = Notice::Progress {
            kind: ProgressKind::Saving,
            text: String::new(),
            fraction: None,
            cancellable: false,
        };
        assert!(!notice.accepts(NoticeResponse::Cancel));
        if let Notice::Progress { cancellable, .. } = &mut notice {
            *cancellable = true;
        }
        assert!(notice.accepts(NoticeResponse::Cancel));
    }
}
