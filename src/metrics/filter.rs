use crate::facts::IssueRecord;
use std::collections::HashSet;
use strum::Display;

/// Logins treated as project maintainers.
///
/// An author whose login is not listed here is external.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Maintainers(HashSet<String>);

impl Maintainers {
    #[must_use]
    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Maintainers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Whether a record is a plain issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    Issue,
    PullRequest,
}

/// Restriction on who authored a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorOrigin<'a> {
    Any,

    /// Authored by someone outside the maintainer list.
    External(&'a Maintainers),

    Internal(&'a Maintainers),
}

/// Selects the records a metric builder aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter<'a> {
    pub kind: RecordKind,
    pub origin: AuthorOrigin<'a>,
}

impl<'a> RecordFilter<'a> {
    #[must_use]
    pub const fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            origin: AuthorOrigin::Any,
        }
    }

    #[must_use]
    pub const fn issues() -> Self {
        Self::new(RecordKind::Issue)
    }

    #[must_use]
    pub const fn pull_requests() -> Self {
        Self::new(RecordKind::PullRequest)
    }

    /// Narrows the filter to records by authors outside `maintainers`.
    #[must_use]
    pub const fn external(self, maintainers: &'a Maintainers) -> Self {
        Self {
            kind: self.kind,
            origin: AuthorOrigin::External(maintainers),
        }
    }

    /// Narrows the filter to records by `maintainers`.
    #[must_use]
    pub const fn internal(self, maintainers: &'a Maintainers) -> Self {
        Self {
            kind: self.kind,
            origin: AuthorOrigin::Internal(maintainers),
        }
    }

    #[must_use]
    pub fn matches(&self, record: &IssueRecord) -> bool {
        let kind_matches = match self.kind {
            RecordKind::Issue => !record.is_pull_request,
            RecordKind::PullRequest => record.is_pull_request,
        };

        kind_matches
            && match self.origin {
                AuthorOrigin::Any => true,
                AuthorOrigin::External(maintainers) => !maintainers.contains(&record.author_login),
                AuthorOrigin::Internal(maintainers) => maintainers.contains(&record.author_login),
            }
    }
}
