use std::fmt;

/// Phase of a blind-box reveal. `Idle` is both the initial and the resting state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    #[default]
    Idle,
    Entering,
    Calibrating,
    Open,
    RevealedWin,
    RevealedLose,
    Exiting,
}

/// Result of the reveal draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn from_win(win: bool) -> Self {
        if win { Outcome::Win } else { Outcome::Lose }
    }

    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

/// Inputs that move a reveal between phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Start,
    Calibrate,
    Open,
    Reveal(Outcome),
    Close,
    Settle,
}

impl RevealPhase {
    /// Next phase for `transition`. Transitions that do not apply leave the phase unchanged.
    pub fn step(self, transition: Transition) -> RevealPhase {
        use RevealPhase::*;
        match (self, transition) {
            (Idle, Transition::Start) => Entering,
            (Entering, Transition::Calibrate) => Calibrating,
            (Calibrating, Transition::Open) => Open,
            (Open, Transition::Reveal(Outcome::Win)) => RevealedWin,
            (Open, Transition::Reveal(Outcome::Lose)) => RevealedLose,
            (Idle, Transition::Close) => Idle,
            (_, Transition::Close) => Exiting,
            (Exiting, Transition::Settle) => Idle,
            (phase, _) => phase,
        }
    }

    /// Anything but `Idle`.
    pub fn is_active(self) -> bool {
        self != RevealPhase::Idle
    }

    /// Phases that show the opened box on their own.
    pub fn shows_open_box(self) -> bool {
        matches!(
            self,
            RevealPhase::Open | RevealPhase::RevealedWin | RevealPhase::RevealedLose
        )
    }

    /// Banner text for the overlay.
    pub fn headline(self) -> &'static str {
        match self {
            RevealPhase::Entering | RevealPhase::Calibrating | RevealPhase::Open => {
                "OPENING TODAY'S BLIND BOX..."
            }
            RevealPhase::RevealedWin => "YOU GOT IT!",
            RevealPhase::RevealedLose => "BETTER LUCK NEXT TIME!",
            RevealPhase::Idle | RevealPhase::Exiting => "",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RevealPhase::Idle => "idle",
            RevealPhase::Entering => "entering",
            RevealPhase::Calibrating => "calibrating",
            RevealPhase::Open => "open",
            RevealPhase::RevealedWin => "revealed_win",
            RevealPhase::RevealedLose => "revealed_lose",
            RevealPhase::Exiting => "exiting",
        }
    }
}

impl fmt::Display for RevealPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
