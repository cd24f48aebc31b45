//! The three-way decision table.
//!
//! [`decide`] is a pure function of the local ("mine") and incoming
//! ("theirs") versions of one identity. It never mutates; the
//! [`MergeDriver`](crate::MergeDriver) applies the returned [`Outcome`].
//!
//! Rules are evaluated top to bottom and the first match wins:
//!
//! | # | Condition                                           | Outcome                          |
//! |---|-----------------------------------------------------|----------------------------------|
//! | 1 | no local version                                    | `InsertAsNew`                    |
//! | 2 | mine incomplete, theirs complete                    | `CompleteFromTheirs`             |
//! | 3 | theirs incomplete, mine complete                    | `KeepMine`                       |
//! | 3a| both incomplete                                     | `KeepMine`                       |
//! | 3b| same content, version and `modified` flag           | `KeepMine`                       |
//! | 4 | both modified                                       | `Conflict(BothModified)`         |
//! | 5 | mine modified, theirs deleted                       | `Conflict(DeletedRemotely)`      |
//! | 6 | mine modified, content equal                        | `AdoptTheirs`, clear `modified`  |
//! |   | mine modified, theirs strictly newer                | `Conflict(ChangedRemotely)`      |
//! |   | mine modified, otherwise                            | `KeepMine`                       |
//! | 6a| theirs modified, mine not                           | `AdoptTheirs`, keep `modified`   |
//! | 7 | theirs deleted                                      | `AdoptTheirs`                    |
//! | 8 | content differs                                     | `AdoptTheirs`                    |
//! | 9 | content equal                                       | `KeepMine`                       |

use serde::{Deserialize, Serialize};

use carto_diff::{content_equal, Equivalence};
use carto_graph::Primitive;
use carto_types::VersionStamp;

/// Why two versions could not be reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictReason {
    /// Both sides carry local edits.
    BothModified,
    /// A local edit against an incoming deletion.
    DeletedRemotely,
    /// The incoming version changed after the local edit was made.
    ChangedRemotely,
}

/// What the merge driver should do with one incoming primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No local counterpart: insert the incoming primitive.
    InsertAsNew,
    /// Overwrite the local primitive with the incoming content.
    AdoptTheirs {
        /// Clear `modified` instead of copying the incoming flag.
        clear_modified: bool,
    },
    /// Leave the local primitive as it is.
    KeepMine,
    /// Record a conflict; leave the local primitive as it is.
    Conflict(ConflictReason),
    /// Fill an incomplete local placeholder with the incoming content.
    CompleteFromTheirs,
}

/// The rule that produced an outcome, for logging and reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    /// No local version exists.
    Absent,
    /// An incomplete local placeholder meets complete incoming content.
    CompletesPlaceholder,
    /// The incoming version is an incomplete placeholder.
    IncomingIncomplete,
    /// Both versions are incomplete placeholders.
    BothIncomplete,
    /// The local version already is the incoming version.
    AlreadyMerged,
    /// Both versions carry local edits.
    BothModified,
    /// A local edit meets an incoming deletion.
    EditAgainstDeletion,
    /// A local edit already matches the incoming content.
    EditMatchesIncoming,
    /// The incoming version is newer than a differing local edit.
    IncomingNewerThanEdit,
    /// A local edit is at least as new as the incoming version.
    EditWins,
    /// An incoming edit lands on an untouched local version.
    IncomingEdit,
    /// An incoming deletion lands on an untouched local version.
    Deletion,
    /// Incoming content differs from an untouched local version.
    Update,
    /// Incoming content equals an untouched local version.
    Unchanged,
}

/// An outcome together with the rule that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub rule: Rule,
}

impl Decision {
    fn new(outcome: Outcome, rule: Rule) -> Self {
        Self { outcome, rule }
    }
}

/// Decide how to reconcile `theirs` with `mine`.
///
/// `theirs` must already have its child references canonicalized so that
/// content comparison against `mine` is meaningful. `equivalence` is the
/// equality applied by rules 6, 8 and 9.
pub fn decide(mine: Option<&Primitive>, theirs: &Primitive, equivalence: Equivalence) -> Decision {
    let Some(mine) = mine else {
        return Decision::new(Outcome::InsertAsNew, Rule::Absent);
    };

    match (mine.incomplete, theirs.incomplete) {
        (true, false) => {
            return Decision::new(Outcome::CompleteFromTheirs, Rule::CompletesPlaceholder)
        }
        (false, true) => return Decision::new(Outcome::KeepMine, Rule::IncomingIncomplete),
        (true, true) => return Decision::new(Outcome::KeepMine, Rule::BothIncomplete),
        (false, false) => {}
    }

    if mine.modified == theirs.modified
        && mine.version == theirs.version
        && content_equal(mine, theirs, Equivalence::Full)
    {
        return Decision::new(Outcome::KeepMine, Rule::AlreadyMerged);
    }

    if mine.modified {
        if theirs.modified {
            return Decision::new(
                Outcome::Conflict(ConflictReason::BothModified),
                Rule::BothModified,
            );
        }
        if theirs.deleted {
            return Decision::new(
                Outcome::Conflict(ConflictReason::DeletedRemotely),
                Rule::EditAgainstDeletion,
            );
        }
        if content_equal(mine, theirs, equivalence) {
            return Decision::new(
                Outcome::AdoptTheirs {
                    clear_modified: true,
                },
                Rule::EditMatchesIncoming,
            );
        }
        if VersionStamp::is_newer(theirs.version.as_ref(), mine.version.as_ref()) {
            return Decision::new(
                Outcome::Conflict(ConflictReason::ChangedRemotely),
                Rule::IncomingNewerThanEdit,
            );
        }
        return Decision::new(Outcome::KeepMine, Rule::EditWins);
    }

    if theirs.modified {
        return Decision::new(
            Outcome::AdoptTheirs {
                clear_modified: false,
            },
            Rule::IncomingEdit,
        );
    }

    if theirs.deleted {
        return Decision::new(
            Outcome::AdoptTheirs {
                clear_modified: false,
            },
            Rule::Deletion,
        );
    }

    if content_equal(mine, theirs, equivalence) {
        Decision::new(Outcome::KeepMine, Rule::Unchanged)
    } else {
        Decision::new(
            Outcome::AdoptTheirs {
                clear_modified: false,
            },
            Rule::Update,
        )
    }
}
