// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

/// One unit of work. It runs synchronously on whichever worker picks it up.
pub trait Job: Send + 'static {
    /// Free-form description, used for logging or debugging
    fn desc(&self) -> &str;

    /// An empty job carries no work. The pool accepts it without queueing it.
    fn is_empty(&self) -> bool {
        false
    }

    /// Consumes the job and runs it to completion.
    fn run(self: Box<Self>);
}

impl std::fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("desc", &self.desc())
            .field("empty", &self.is_empty())
            .finish()
    }
}

pub struct ClosureJob {
    desc: String,
    body: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl ClosureJob {
    pub fn new<F>(desc: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            desc: desc.into(),
            body: Some(Box::new(f)),
        }
    }

    /// A job without a body. Submitting it is a no-op.
    pub fn empty(desc: impl Into<String>) -> Self {
        Self {
            desc: desc.into(),
            body: None,
        }
    }

    pub fn from_option<F>(desc: impl Into<String>, f: Option<F>) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        match f {
            Some(f) => Self::new(desc, f),
            None => Self::empty(desc),
        }
    }
}

impl Job for ClosureJob {
    fn desc(&self) -> &str {
        &self.desc
    }

    fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    fn run(self: Box<Self>) {
        if let Some(body) = self.body {
            body();
        }
    }
}
