//! Scripted in-memory [`ContentStore`] for unit tests.
//!
//! Each capability pops its next scripted answer; an empty script falls back
//! to `NotFound`, `Written { v<n> }`, and `Ok(())` respectively.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use reposync_core::{
    BypassPlaceholder, BypassReason, ContentStore, ExistingFileHandle, FileWriteRequest, Lookup,
    PlaceholderId, PutOutcome, RepoPath, RepoRef, StoreError, VersionToken,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Get { path: String },
    Put { path: String, expected: Option<String> },
    Bypass { placeholder: String, reason: BypassReason },
}

#[derive(Default)]
struct Script {
    lookups: VecDeque<Result<Lookup, StoreError>>,
    puts: VecDeque<Result<PutOutcome, StoreError>>,
    bypasses: VecDeque<Result<(), StoreError>>,
    calls: Vec<Call>,
    writes: usize,
}

#[derive(Default)]
pub(crate) struct ScriptedStore {
    script: Mutex<Script>,
}

impl ScriptedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn found(self, version: &str) -> Self {
        let path = RepoPath::parse("placeholder").expect("valid path");
        self.lookup(Ok(Lookup::Found(ExistingFileHandle {
            path,
            version: VersionToken::from(version),
        })))
    }

    pub(crate) fn lookup(self, answer: Result<Lookup, StoreError>) -> Self {
        self.script.lock().unwrap().lookups.push_back(answer);
        self
    }

    pub(crate) fn put(self, answer: Result<PutOutcome, StoreError>) -> Self {
        self.script.lock().unwrap().puts.push_back(answer);
        self
    }

    pub(crate) fn rejected(self, ids: &[&str]) -> Self {
        let placeholders = ids.iter().map(|id| BypassPlaceholder::new(*id)).collect();
        self.put(Ok(PutOutcome::PolicyRejected { placeholders }))
    }

    pub(crate) fn bypass(self, answer: Result<(), StoreError>) -> Self {
        self.script.lock().unwrap().bypasses.push_back(answer);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub(crate) fn put_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Put { .. }))
            .collect()
    }

    pub(crate) fn bypass_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Bypass { .. }))
            .collect()
    }
}

pub(crate) fn status(code: u16, message: &str) -> StoreError {
    StoreError::Status {
        status: code,
        message: message.to_string(),
    }
}

#[async_trait]
impl ContentStore for ScriptedStore {
    async fn get_file(
        &self,
        _repo: &RepoRef,
        path: &RepoPath,
        _branch: Option<&str>,
    ) -> Result<Lookup, StoreError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Get {
            path: path.to_string(),
        });
        script.lookups.pop_front().unwrap_or(Ok(Lookup::NotFound))
    }

    async fn put_file(
        &self,
        request: &FileWriteRequest,
        expected: Option<&VersionToken>,
    ) -> Result<PutOutcome, StoreError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Put {
            path: request.path.to_string(),
            expected: expected.map(|t| t.0.clone()),
        });
        script.writes += 1;
        let n = script.writes;
        script.puts.pop_front().unwrap_or_else(|| {
            Ok(PutOutcome::Written {
                version: VersionToken(format!("v{n}")),
            })
        })
    }

    async fn authorize_bypass(
        &self,
        _repo: &RepoRef,
        placeholder: &PlaceholderId,
        reason: BypassReason,
    ) -> Result<(), StoreError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Bypass {
            placeholder: placeholder.0.clone(),
            reason,
        });
        script.bypasses.pop_front().unwrap_or(Ok(()))
    }
}
