//! In-memory backend.
//!
//! Files live in a map keyed by location and modification times come from
//! a logical clock. Requests are recorded, and failures can be scripted,
//! which makes this backend the workhorse of state machine tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use quire_core::{IoErrorKind, IoFailure, Location, SaveFlags, TabId};

use crate::codec;
use crate::{
    DiskStatus, DocumentIo, IoMessage, LoadOutcome, LoadRequest, LoadedContent, SaveRequest,
    SavedInfo,
};

/// A request as received by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoRequest {
    Load(LoadRequest),
    Save(SaveRequest),
    SaveAs(SaveRequest),
    Cancel(TabId),
}

#[derive(Debug, Clone)]
struct MemoryFile {
    text: String,
    mtime: SystemTime,
    readonly: bool,
}

#[derive(Debug, Default)]
pub struct MemoryDocumentIo {
    files: HashMap<Location, MemoryFile>,
    history: Vec<IoRequest>,
    queue: VecDeque<IoRequest>,
    messages: VecDeque<IoMessage>,
    cancelled: HashSet<TabId>,
    load_failures: VecDeque<IoFailure>,
    save_failures: VecDeque<IoFailure>,
    clock: u64,
    manual: bool,
}

impl MemoryDocumentIo {
    /// Backend completing every request on the next poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that only completes requests through [`complete_pending`](Self::complete_pending)
    /// or injected messages.
    pub fn manual() -> Self {
        Self {
            manual: true,
            ..Self::default()
        }
    }

    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        UNIX_EPOCH + Duration::from_secs(self.clock)
    }

    /// Create or replace a file, as another program would.
    pub fn write_file(&mut self, location: &Location, text: &str) {
        let mtime = self.tick();
        self.files.insert(
            location.clone(),
            MemoryFile {
                text: text.to_string(),
                mtime,
                readonly: false,
            },
        );
    }

    pub fn set_readonly(&mut self, location: &Location, readonly: bool) {
        if let Some(file) = self.files.get_mut(location) {
            file.readonly = readonly;
        }
    }

    pub fn remove_file(&mut self, location: &Location) {
        self.files.remove(location);
    }

    pub fn file_text(&self, location: &Location) -> Option<&str> {
        self.files.get(location).map(|f| f.text.as_str())
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> &[IoRequest] {
        &self.history
    }

    pub fn last_request(&self) -> Option<&IoRequest> {
        self.history.last()
    }

    /// Requests not yet completed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Make the next load fail with `failure`.
    pub fn fail_next_load(&mut self, failure: IoFailure) {
        self.load_failures.push_back(failure);
    }

    /// Make the next save fail with `failure`.
    pub fn fail_next_save(&mut self, failure: IoFailure) {
        self.save_failures.push_back(failure);
    }

    /// Deliver `message` on the next poll.
    pub fn push_message(&mut self, message: IoMessage) {
        self.messages.push_back(message);
    }

    /// Complete every queued request.
    pub fn complete_pending(&mut self) {
        while let Some(request) = self.queue.pop_front() {
            let message = match request {
                IoRequest::Load(request) => IoMessage::Loaded {
                    tab: request.tab,
                    outcome: self.run_load(&request),
                },
                IoRequest::Save(request) | IoRequest::SaveAs(request) => IoMessage::Saved {
                    tab: request.tab,
                    result: self.run_save(&request),
                },
                IoRequest::Cancel(_) => continue,
            };
            self.messages.push_back(message);
        }
    }

    fn run_load(&mut self, request: &LoadRequest) -> LoadOutcome {
        if self.cancelled.remove(&request.tab) {
            return LoadOutcome::Failed(IoFailure::cancelled());
        }

        let scripted = self.load_failures.pop_front();
        let content = match self.files.get(&request.location) {
            Some(file) => {
                let line_count = file.text.lines().count();
                LoadedContent {
                    text: file.text.clone(),
                    encoding: request.encoding.unwrap_or_default(),
                    newline: Default::default(),
                    mtime: Some(file.mtime),
                    readonly: file.readonly,
                    line: request.line.min(line_count.saturating_sub(1)),
                }
            }
            None if request.create_if_missing => LoadedContent {
                text: String::new(),
                encoding: request.encoding.unwrap_or_default(),
                newline: Default::default(),
                mtime: None,
                readonly: false,
                line: 0,
            },
            None => {
                return LoadOutcome::Failed(scripted.unwrap_or_else(|| {
                    IoFailure::new(
                        IoErrorKind::NotFound,
                        format!("{} does not exist", request.location),
                    )
                }))
            }
        };

        match scripted {
            Some(failure) if failure.kind == IoErrorKind::ConversionFallback => {
                LoadOutcome::Degraded(content, failure)
            }
            Some(failure) => LoadOutcome::Failed(failure),
            None => LoadOutcome::Loaded(content),
        }
    }

    fn run_save(&mut self, request: &SaveRequest) -> Result<SavedInfo, IoFailure> {
        if let Some(failure) = self.save_failures.pop_front() {
            return Err(failure);
        }

        if let (Some(file), Some(known)) = (self.files.get(&request.location), request.known_mtime) {
            if !request.flags.contains(SaveFlags::IGNORE_MTIME) && file.mtime > known {
                return Err(IoFailure::new(
                    IoErrorKind::ExternallyModified,
                    format!("{} has been modified since it was read", request.location),
                ));
            }
        }

        codec::encode(&request.text, request.encoding, request.newline)?;

        let mtime = self.tick();
        self.files.insert(
            request.location.clone(),
            MemoryFile {
                text: request.text.clone(),
                mtime,
                readonly: false,
            },
        );
        Ok(SavedInfo { mtime: Some(mtime) })
    }
}

impl DocumentIo for MemoryDocumentIo {
    fn load(&mut self, request: LoadRequest) {
        self.history.push(IoRequest::Load(request.clone()));
        self.queue.push_back(IoRequest::Load(request));
    }

    fn save(&mut self, request: SaveRequest) {
        self.history.push(IoRequest::Save(request.clone()));
        self.queue.push_back(IoRequest::Save(request));
    }

    fn save_as(&mut self, mut request: SaveRequest) {
        request.known_mtime = None;
        self.history.push(IoRequest::SaveAs(request.clone()));
        self.queue.push_back(IoRequest::SaveAs(request));
    }

    fn load_cancel(&mut self, tab: TabId) {
        self.history.push(IoRequest::Cancel(tab));
        let in_flight = self
            .queue
            .iter()
            .any(|r| matches!(r, IoRequest::Load(l) if l.tab == tab));
        if in_flight {
            self.cancelled.insert(tab);
        }
    }

    fn disk_status(&self, location: &Location, known_mtime: Option<SystemTime>) -> DiskStatus {
        match (self.files.get(location), known_mtime) {
            (None, _) => DiskStatus::Deleted,
            (Some(file), Some(known)) if file.mtime > known => DiskStatus::Modified,
            _ => DiskStatus::Unchanged,
        }
    }

    fn poll_messages(&mut self) -> Vec<IoMessage> {
        if !self.manual {
            self.complete_pending();
        }
        self.messages.drain(..).collect()
    }
}
