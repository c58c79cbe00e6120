//! Stage definitions for the Oxford debate format.
//!
//! The six speech slots, the dependency graph between them, and the two
//! orderings derived from it: the order speeches are generated in (causal)
//! and the order they are presented in (display).

use serde::{Deserialize, Serialize};

/// Which side of the motion a speaker argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Proposition,
    Opposition,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Proposition => "proposition",
            Side::Opposition => "opposition",
        }
    }
}

/// Phase of the debate a speech belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Opening,
    Rebuttal,
    Closing,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Rebuttal => "rebuttal",
            Phase::Closing => "closing",
        }
    }
}

/// One of the six fixed speech slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stage {
    pub side: Side,
    pub phase: Phase,
}

impl Stage {
    pub const fn new(side: Side, phase: Phase) -> Self {
        Self { side, phase }
    }

    /// Stable identifier used as the prompt-template key and context key.
    pub fn key(self) -> &'static str {
        match (self.side, self.phase) {
            (Side::Proposition, Phase::Opening) => "proposition_opening",
            (Side::Opposition, Phase::Opening) => "opposition_opening",
            (Side::Proposition, Phase::Rebuttal) => "proposition_rebuttal",
            (Side::Opposition, Phase::Rebuttal) => "opposition_rebuttal",
            (Side::Proposition, Phase::Closing) => "proposition_closing",
            (Side::Opposition, Phase::Closing) => "opposition_closing",
        }
    }

    pub fn from_key(key: &str) -> Option<Stage> {
        DESCRIPTORS
            .iter()
            .map(|d| d.stage)
            .find(|s| s.key() == key)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

const PROP_OPENING: Stage = Stage::new(Side::Proposition, Phase::Opening);
const OPP_OPENING: Stage = Stage::new(Side::Opposition, Phase::Opening);
const PROP_REBUTTAL: Stage = Stage::new(Side::Proposition, Phase::Rebuttal);
const OPP_REBUTTAL: Stage = Stage::new(Side::Opposition, Phase::Rebuttal);
const PROP_CLOSING: Stage = Stage::new(Side::Proposition, Phase::Closing);
const OPP_CLOSING: Stage = Stage::new(Side::Opposition, Phase::Closing);

const ALL_PRIOR: [Stage; 4] = [PROP_OPENING, OPP_OPENING, PROP_REBUTTAL, OPP_REBUTTAL];

/// A stage together with the stages whose text must exist before its prompt
/// can be formatted.
#[derive(Debug, Clone, Copy)]
pub struct StageDescriptor {
    pub stage: Stage,
    pub dependencies: &'static [Stage],
}

/// The fixed stage graph. Openings stand alone, each rebuttal answers the
/// opposite side's opening, and each closing draws on all four prior
/// speeches. Declaration order breaks ties when computing the generation
/// order, so proposition precedes opposition within a phase.
pub const DESCRIPTORS: [StageDescriptor; 6] = [
    StageDescriptor {
        stage: PROP_OPENING,
        dependencies: &[],
    },
    StageDescriptor {
        stage: OPP_OPENING,
        dependencies: &[],
    },
    StageDescriptor {
        stage: PROP_REBUTTAL,
        dependencies: &[OPP_OPENING],
    },
    StageDescriptor {
        stage: OPP_REBUTTAL,
        dependencies: &[PROP_OPENING],
    },
    StageDescriptor {
        stage: PROP_CLOSING,
        dependencies: &ALL_PRIOR,
    },
    StageDescriptor {
        stage: OPP_CLOSING,
        dependencies: &ALL_PRIOR,
    },
];

pub fn descriptor(stage: Stage) -> &'static StageDescriptor {
    DESCRIPTORS
        .iter()
        .find(|d| d.stage == stage)
        .unwrap_or_else(|| unreachable!("every stage has a descriptor"))
}

/// Topological order over [`DESCRIPTORS`], computed with Kahn's algorithm.
/// Among stages whose dependencies are all satisfied, the lowest declaration
/// index goes first, which keeps the order deterministic.
pub fn generation_order() -> Vec<Stage> {
    let mut done: Vec<Stage> = Vec::with_capacity(DESCRIPTORS.len());

    while done.len() < DESCRIPTORS.len() {
        let next = DESCRIPTORS
            .iter()
            .find(|d| {
                !done.contains(&d.stage) && d.dependencies.iter().all(|dep| done.contains(dep))
            })
            .unwrap_or_else(|| unreachable!("stage graph is acyclic"));
        done.push(next.stage);
    }

    done
}

/// A slot in the presentation ordering of the finished debate.
#[derive(Debug, Clone, Copy)]
pub struct SpeechOrderEntry {
    pub stage: Stage,
    /// 1-based sequence number, used in output filenames.
    pub order: usize,
}

/// Display order for audio output: both openings, both rebuttals, both
/// closings, proposition first each time. Deliberately independent of
/// [`generation_order`], which follows the dependency graph instead.
pub fn speech_order() -> [SpeechOrderEntry; 6] {
    [
        SpeechOrderEntry { stage: PROP_OPENING, order: 1 },
        SpeechOrderEntry { stage: OPP_OPENING, order: 2 },
        SpeechOrderEntry { stage: PROP_REBUTTAL, order: 3 },
        SpeechOrderEntry { stage: OPP_REBUTTAL, order: 4 },
        SpeechOrderEntry { stage: PROP_CLOSING, order: 5 },
        SpeechOrderEntry { stage: OPP_CLOSING, order: 6 },
    ]
}

/// Accumulated stage -> speech text mapping. Insertion order matches
/// generation order; entries are written once and never overwritten.
#[derive(Debug, Clone, Default)]
pub struct DebateContent {
    entries: Vec<(Stage, String)>,
}

impl DebateContent {
    pub fn insert(&mut self, stage: Stage, text: String) {
        debug_assert!(self.get(stage).is_none(), "stage written twice");
        self.entries.push((stage, text));
    }

    pub fn get(&self, stage: Stage) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, t)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &str)> {
        self.entries.iter().map(|(s, t)| (*s, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
