//! Local filesystem backend running each request on a worker thread.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::SystemTime;

use quire_core::{IoErrorKind, IoFailure, Location, SaveFlags, TabId};

use crate::codec;
use crate::file_io;
use crate::{
    DiskStatus, DocumentIo, IoMessage, LoadOutcome, LoadRequest, LoadedContent, SaveRequest,
    SavedInfo,
};

/// Reads and writes local files.
///
/// Workers report through a channel drained by [`DocumentIo::poll_messages`].
pub struct FsDocumentIo {
    sender: Sender<IoMessage>,
    receiver: Receiver<IoMessage>,
    cancel_flags: HashMap<TabId, Arc<AtomicBool>>,
    create_backup: bool,
}

impl FsDocumentIo {
    /// `create_backup` enables `name~` copies of the previous content.
    pub fn new(create_backup: bool) -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            cancel_flags: HashMap::new(),
            create_backup,
        }
    }

    /// Run `job` on a named worker, reporting `on_fail` if no thread starts.
    fn spawn(
        &self,
        name: String,
        tab: TabId,
        job: impl FnOnce(Sender<IoMessage>) + Send + 'static,
        on_fail: IoMessage,
    ) {
        let sender = self.sender.clone();
        if let Err(e) = thread::Builder::new().name(name).spawn(move || job(sender)) {
            log::error!("Failed to start I/O worker for {}: {}", tab, e);
            let _ = self.sender.send(on_fail);
        }
    }
}

impl DocumentIo for FsDocumentIo {
    fn load(&mut self, request: LoadRequest) {
        let tab = request.tab;
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel_flags.insert(tab, Arc::clone(&cancel));
        log::debug!("Loading {} for {}", request.location, tab);

        self.spawn(
            format!("quire-load-{}", tab.as_u64()),
            tab,
            move |sender| {
                let outcome = load_file(&request, &cancel, |done, total| {
                    let _ = sender.send(IoMessage::LoadProgress { tab, done, total });
                });
                let _ = sender.send(IoMessage::Loaded { tab, outcome });
            },
            IoMessage::Loaded {
                tab,
                outcome: LoadOutcome::Failed(IoFailure::new(
                    IoErrorKind::Other,
                    "Could not start loading",
                )),
            },
        );
    }

    fn save(&mut self, request: SaveRequest) {
        let tab = request.tab;
        let create_backup = self.create_backup;
        log::debug!(
            "Saving {} for {} ({:?}, {})",
            request.location,
            tab,
            request.flags,
            request.encoding
        );

        self.spawn(
            format!("quire-save-{}", tab.as_u64()),
            tab,
            move |sender| {
                let result = save_file(&request, create_backup, |done, total| {
                    let _ = sender.send(IoMessage::SaveProgress { tab, done, total });
                });
                let _ = sender.send(IoMessage::Saved { tab, result });
            },
            IoMessage::Saved {
                tab,
                result: Err(IoFailure::new(IoErrorKind::Other, "Could not start saving")),
            },
        );
    }

    fn load_cancel(&mut self, tab: TabId) {
        if let Some(flag) = self.cancel_flags.get(&tab) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    fn disk_status(&self, location: &Location, known_mtime: Option<SystemTime>) -> DiskStatus {
        let Some(path) = location.to_file_path() else {
            return DiskStatus::Unchanged;
        };
        if !path.exists() {
            DiskStatus::Deleted
        } else if file_io::was_modified_externally(&path, known_mtime) {
            DiskStatus::Modified
        } else {
            DiskStatus::Unchanged
        }
    }

    fn poll_messages(&mut self) -> Vec<IoMessage> {
        let messages: Vec<IoMessage> = self.receiver.try_iter().collect();
        for message in &messages {
            if let IoMessage::Loaded { tab, .. } = message {
                self.cancel_flags.remove(tab);
            }
        }
        messages
    }
}

fn local_path(location: &Location) -> Result<PathBuf, IoFailure> {
    location.to_file_path().ok_or_else(|| {
        IoFailure::new(
            IoErrorKind::NotLocal,
            format!("{} is not a local file", location),
        )
    })
}

fn load_file(
    request: &LoadRequest,
    cancel: &AtomicBool,
    progress: impl FnMut(u64, u64),
) -> LoadOutcome {
    let path = match local_path(&request.location) {
        Ok(path) => path,
        Err(failure) => return LoadOutcome::Failed(failure),
    };

    let file = match file_io::read_file(&path, cancel, progress) {
        Ok(file) => file,
        Err(failure) if failure.kind == IoErrorKind::NotFound && request.create_if_missing => {
            return LoadOutcome::Loaded(LoadedContent {
                text: String::new(),
                encoding: request.encoding.unwrap_or_default(),
                newline: Default::default(),
                mtime: None,
                readonly: false,
                line: 0,
            });
        }
        Err(failure) => return LoadOutcome::Failed(failure),
    };

    let decoded = codec::decode(&file.bytes, request.encoding);
    let line_count = decoded.text.lines().count();
    let content = LoadedContent {
        line: request.line.min(line_count.saturating_sub(1)),
        text: decoded.text,
        encoding: decoded.encoding,
        newline: decoded.newline,
        mtime: file.mtime,
        readonly: file.readonly,
    };

    if decoded.lossy {
        let failure = IoFailure::new(
            IoErrorKind::ConversionFallback,
            format!(
                "Some characters of {} could not be decoded as {}",
                request.location, content.encoding
            ),
        );
        LoadOutcome::Degraded(content, failure)
    } else {
        LoadOutcome::Loaded(content)
    }
}

fn save_file(
    request: &SaveRequest,
    create_backup: bool,
    progress: impl FnMut(u64, u64),
) -> Result<SavedInfo, IoFailure> {
    let path = local_path(&request.location)?;
    let bytes = codec::encode(&request.text, request.encoding, request.newline)?;

    if path.is_dir() {
        return Err(IoFailure::new(
            IoErrorKind::IsDirectory,
            format!("{} is a directory", path.display()),
        ));
    }

    if path.exists() {
        if !request.flags.contains(SaveFlags::IGNORE_MTIME)
            && file_io::was_modified_externally(&path, request.known_mtime)
        {
            return Err(IoFailure::new(
                IoErrorKind::ExternallyModified,
                format!("{} has been modified since it was read", path.display()),
            ));
        }
        if create_backup && !request.flags.contains(SaveFlags::IGNORE_BACKUP) {
            file_io::create_backup(&path, request.flags.contains(SaveFlags::PRESERVE_BACKUP))?;
        }
    }

    file_io::write_file(&path, &bytes, progress)?;
    Ok(SavedInfo {
        mtime: file_io::get_file_mtime(&path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{Encoding, NewlineType};
    use std::time::{Duration, Instant, UNIX_EPOCH};
    use tempfile::tempdir;

    fn wait_for_terminal(io: &mut FsDocumentIo) -> Vec<IoMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut messages = Vec::new();
        while Instant::now() < deadline {
            messages.extend(io.poll_messages());
            if messages
                .iter()
                .any(|m| matches!(m, IoMessage::Loaded { .. } | IoMessage::Saved { .. }))
            {
                return messages;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("I/O worker did not finish");
    }

    fn save_request(tab: TabId, location: Location, text: &str) -> SaveRequest {
        SaveRequest {
            tab,
            location,
            encoding: Encoding::Utf8,
            newline: NewlineType::Lf,
            text: text.to_string(),
            flags: SaveFlags::empty(),
            known_mtime: None,
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let location = Location::from_path(&dir.path().join("round.txt")).unwrap();
        let tab = TabId::next();
        let mut io = FsDocumentIo::new(true);

        io.save(save_request(tab, location.clone(), "alpha\nbeta\n"));
        let saved = wait_for_terminal(&mut io);
        assert!(matches!(
            saved.last(),
            Some(IoMessage::Saved { result: Ok(_), .. })
        ));

        io.load(LoadRequest {
            tab,
            location,
            encoding: None,
            line: 10,
            create_if_missing: false,
        });
        let messages = wait_for_terminal(&mut io);
        match messages.last() {
            Some(IoMessage::Loaded {
                outcome: LoadOutcome::Loaded(content),
                ..
            }) => {
                assert_eq!(content.text, "alpha\nbeta\n");
                assert_eq!(content.line, 1);
                assert!(content.mtime.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let location = Location::from_path(&dir.path().join("missing.txt")).unwrap();
        let mut io = FsDocumentIo::new(false);

        io.load(LoadRequest {
            tab: TabId::next(),
            location: location.clone(),
            encoding: None,
            line: 0,
            create_if_missing: false,
        });
        let messages = wait_for_terminal(&mut io);
        assert!(matches!(
            messages.last(),
            Some(IoMessage::Loaded { outcome: LoadOutcome::Failed(f), .. }) if f.kind == IoErrorKind::NotFound
        ));

        io.load(LoadRequest {
            tab: TabId::next(),
            location,
            encoding: None,
            line: 0,
            create_if_missing: true,
        });
        let messages = wait_for_terminal(&mut io);
        assert!(matches!(
            messages.last(),
            Some(IoMessage::Loaded { outcome: LoadOutcome::Loaded(c), .. }) if c.text.is_empty()
        ));
    }

    #[test]
    fn test_load_invalid_utf8_is_degraded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [b'o', b'k', 0xFF]).unwrap();
        let mut io = FsDocumentIo::new(false);

        io.load(LoadRequest {
            tab: TabId::next(),
            location: Location::from_path(&path).unwrap(),
            encoding: Some(Encoding::Utf8),
            line: 0,
            create_if_missing: false,
        });
        let messages = wait_for_terminal(&mut io);
        assert!(matches!(
            messages.last(),
            Some(IoMessage::Loaded { outcome: LoadOutcome::Degraded(_, f), .. })
                if f.kind == IoErrorKind::ConversionFallback
        ));
    }

    #[test]
    fn test_save_detects_external_modification() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.txt");
        std::fs::write(&path, "theirs").unwrap();
        let location = Location::from_path(&path).unwrap();
        let tab = TabId::next();
        let mut io = FsDocumentIo::new(false);

        let mut request = save_request(tab, location, "ours");
        request.known_mtime = Some(UNIX_EPOCH + Duration::from_secs(1));
        io.save(request.clone());
        let messages = wait_for_terminal(&mut io);
        assert!(matches!(
            messages.last(),
            Some(IoMessage::Saved { result: Err(f), .. }) if f.kind == IoErrorKind::ExternallyModified
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "theirs");

        request.flags |= SaveFlags::IGNORE_MTIME;
        io.save(request);
        wait_for_terminal(&mut io);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ours");
    }

    #[test]
    fn test_save_writes_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kept.txt");
        std::fs::write(&path, "old").unwrap();
        let mut io = FsDocumentIo::new(true);

        io.save(save_request(
            TabId::next(),
            Location::from_path(&path).unwrap(),
            "new",
        ));
        wait_for_terminal(&mut io);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("kept.txt~")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_disk_status() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.txt");
        std::fs::write(&path, "x").unwrap();
        let location = Location::from_path(&path).unwrap();
        let io = FsDocumentIo::new(false);

        let mtime = file_io::get_file_mtime(&path);
        assert_eq!(io.disk_status(&location, mtime), DiskStatus::Unchanged);
        assert_eq!(
            io.disk_status(&location, Some(UNIX_EPOCH)),
            DiskStatus::Modified
        );

        std::fs::remove_file(&path).unwrap();
        assert_eq!(io.disk_status(&location, mtime), DiskStatus::Deleted);
    }
}
