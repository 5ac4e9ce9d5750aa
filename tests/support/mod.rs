//! Scripted in-memory transport shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rechat::transport::Batch;
use rechat::{ChatEvent, ChatSession, ChatTransport, FetchError, VideoId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Get,
    Terminate,
}

/// What every session opened by a [`ScriptedTransport`] yields.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// `open` fails with `InvalidVideoId`
    pub invalid: bool,
    pub is_replay: bool,
    pub batches: Vec<Batch>,
    /// `get` number (0-based) that fails with a transport error
    pub fail_at: Option<usize>,
    /// `get` number (0-based) that never completes
    pub stall_at: Option<usize>,
}

impl Script {
    pub fn replay(batches: Vec<Batch>) -> Self {
        Self {
            is_replay: true,
            batches,
            ..Self::default()
        }
    }

    pub fn live(batches: Vec<Batch>) -> Self {
        Self {
            is_replay: false,
            batches,
            ..Self::default()
        }
    }

    pub fn invalid() -> Self {
        Self {
            invalid: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Script,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn opens(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Open(_)))
            .count()
    }
}

pub struct ScriptedSession {
    script: Script,
    remaining: VecDeque<Batch>,
    pulls: usize,
    terminated: bool,
    calls: Arc<Mutex<Vec<Call>>>,
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    type Session = ScriptedSession;

    async fn open(&self, video_id: &VideoId) -> Result<ScriptedSession, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Open(video_id.to_string()));
        if self.script.invalid {
            return Err(FetchError::InvalidVideoId(video_id.to_string()));
        }
        Ok(ScriptedSession {
            script: self.script.clone(),
            remaining: self.script.batches.clone().into(),
            pulls: 0,
            terminated: false,
            calls: Arc::clone(&self.calls),
        })
    }
}

#[async_trait]
impl ChatSession for ScriptedSession {
    fn is_alive(&self) -> bool {
        !self.terminated && !self.remaining.is_empty()
    }

    fn is_replay(&self) -> bool {
        self.script.is_replay
    }

    async fn get(&mut self) -> Result<Batch, FetchError> {
        self.calls.lock().unwrap().push(Call::Get);
        let pull = self.pulls;
        self.pulls += 1;

        if self.script.stall_at == Some(pull) {
            std::future::pending::<()>().await;
        }
        if self.script.fail_at == Some(pull) {
            return Err(FetchError::MissingField("continuation"));
        }
        Ok(self.remaining.pop_front().unwrap_or_default())
    }

    fn terminate(&mut self) {
        self.calls.lock().unwrap().push(Call::Terminate);
        self.terminated = true;
        self.remaining.clear();
    }
}

pub fn event(author: &str, message: &str) -> ChatEvent {
    ChatEvent {
        datetime: "2024-05-01 21:00:00".to_string(),
        elapsed_time: "0:00".to_string(),
        author_name: author.to_string(),
        message: message.to_string(),
        event_type: "textMessage".to_string(),
        currency: String::new(),
        amount: 0.0,
        author_channel_url: format!("http://www.youtube.com/channel/UC{}", author),
    }
}

pub fn super_chat(author: &str, currency: &str, amount: f64) -> ChatEvent {
    ChatEvent {
        event_type: "superChat".to_string(),
        currency: currency.to_string(),
        amount,
        ..event(author, "")
    }
}

/// `sizes.len()` batches holding `sizes[i]` events each, numbered in order.
pub fn batches(sizes: &[usize]) -> Vec<Batch> {
    let mut n = 0;
    sizes
        .iter()
        .map(|&size| {
            (0..size)
                .map(|_| {
                    n += 1;
                    event(&format!("user{}", n), &format!("message {}", n))
                })
                .collect()
        })
        .collect()
}
