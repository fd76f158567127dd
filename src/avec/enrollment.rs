//! Enrollment sessions.
//!
//! A session collects views of one finger until enough have been gathered,
//! then hands them to a [`Fuser`] to produce the stored template. Sessions
//! are ordinary values: independent sessions may run side by side, each
//! owned by its caller.
//!
//! ```text
//! NotStarted --start--> InProgress --add (enough views)--> Ready
//!      ^                                                     |
//!      +----------------------- finish ----------------------+
//! ```

use std::vec::Vec;

use log::debug;
use thiserror::Error;

use crate::sans::{
    fmd::{FmdError, FmdRecord},
    format::FmdDialect,
};

use super::engine::{EngineError, FmdRef, Fuser};

/// Errors occurring during enrollment.
#[derive(Debug, Error)]
pub enum Error {
    /// A session is already under way.
    #[error("Enrollment is already in progress.")]
    InProgress,
    /// No session has been started.
    #[error("Enrollment is not started.")]
    NotStarted,
    /// More views are needed before a template can be created.
    #[error("Enrollment is not ready.")]
    NotReady,
    /// The view is not of the dialect the session was started with.
    #[error("Expected a {expected:?} view, found {found:?}.")]
    DialectMismatch {
        expected: FmdDialect,
        found: FmdDialect,
    },
    /// The supplied view is not well formed.
    #[error("Invalid view for enrollment: {0}")]
    Fmd(#[from] FmdError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    NotStarted,
    InProgress,
    Ready,
}

/// Session configuration.
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentConfig {
    /// Views needed before the session becomes ready.
    pub views_required: usize,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self { views_required: 4 }
    }
}

/// A view accepted into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledView {
    pub dialect: FmdDialect,
    /// Header of the record the view was taken from.
    pub record: FmdRecord,
    /// The exact bytes of the view.
    pub view: Vec<u8>,
}

/// An enrollment session.
#[derive(Debug)]
pub struct Enrollment {
    config: EnrollmentConfig,
    state: State,
    target: FmdDialect,
    views: Vec<EnrolledView>,
}

impl Enrollment {
    pub fn new(config: EnrollmentConfig) -> Self {
        Self {
            config,
            state: State::NotStarted,
            target: FmdDialect::Ansi378,
            views: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Views accepted so far.
    pub fn views(&self) -> &[EnrolledView] {
        &self.views
    }

    /// Begin a session producing a template of `dialect`.
    pub fn start(&mut self, dialect: FmdDialect) -> Result<(), Error> {
        if self.state != State::NotStarted {
            Err(Error::InProgress)?;
        }

        debug!("Starting enrollment for a {dialect:?} template");

        self.target = dialect;
        self.state = State::InProgress;

        Ok(())
    }

    /// Add a view of a minutiae record to the session.
    ///
    /// The record must be of the session's dialect, its header must decode
    /// and the view must lie wholly inside the record. Returns the state
    /// after adding.
    pub fn add(&mut self, fmd: FmdRef<'_>, view_idx: usize) -> Result<State, Error> {
        if self.state == State::NotStarted {
            Err(Error::NotStarted)?;
        }
        if fmd.dialect != self.target {
            Err(Error::DialectMismatch {
                expected: self.target,
                found: fmd.dialect,
            })?;
        }

        let view = fmd.view(view_idx)?;

        self.views.push(EnrolledView {
            dialect: view.dialect,
            record: view.record,
            view: view.bytes.to_vec(),
        });

        if self.views.len() >= self.config.views_required {
            self.state = State::Ready;
        }

        debug!(
            "Enrollment holds {} of {} views",
            self.views.len(),
            self.config.views_required
        );

        Ok(self.state)
    }

    /// Fuse the accepted views into a template.
    pub fn create_fmd(&self, fuser: &mut impl Fuser) -> Result<Vec<u8>, Error> {
        match self.state {
            State::NotStarted => Err(Error::NotStarted),
            State::InProgress => Err(Error::NotReady),
            State::Ready => Ok(fuser.fuse(self.target, &self.views)?),
        }
    }

    /// End the session, discarding accepted views.
    pub fn finish(&mut self) {
        debug!("Finishing enrollment after {} views", self.views.len());

        self.views.clear();
        self.state = State::NotStarted;
    }
}

impl Default for Enrollment {
    fn default() -> Self {
        Self::new(EnrollmentConfig::default())
    }
}
