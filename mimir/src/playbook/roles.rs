use strum::{Display, EnumIter};

/// A team wide plan, picked from the match phase and the number of active teammates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Strategy {
    #[default]
    Init,
    Penalized,
    Ready,
    Goalie,
    Kickoff,
    Spread,
    OneDown,
    NoFieldPlayers,
    TestDefender,
    TestOffender,
    TestChaser,
}

/// The pattern the team plays in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Formation {
    #[default]
    Init,
    Penalty,
    NoFieldPlayers,
    OneDown,
    Spread,
    DubD,
    Finder,
    Kickoff,
    OneKickoff,
    Ready,
    Goalie,
    TestDefend,
    TestOffend,
    TestChase,
}

/// The job of a single robot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Role {
    #[default]
    Init,
    Chaser,
    Offender,
    Defender,
    Searcher,
    Goalie,
    Penalty,
}

/// A variant of a [`Role`], which decides where exactly the robot positions itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SubRole {
    #[default]
    Init,
    LeftWing,
    RightWing,
    DubDOffender,
    ReadyOffender,
    Stopper,
    DeepStopper,
    Sweeper,
    LeftDeepBack,
    RightDeepBack,
    KickoffSweeper,
    ReadyDefender,
    ChaseNormal,
    ChaseAroundBox,
    KickoffStriker,
    ReadyChaser,
    FrontFinder,
    LeftFinder,
    RightFinder,
    OtherFinder,
    GoalieNormal,
    GoalieChaser,
    Penalty,
}

impl SubRole {
    /// The role this sub-role belongs to.
    #[must_use]
    pub fn role(self) -> Role {
        use SubRole as S;

        match self {
            S::Init => Role::Init,
            S::LeftWing | S::RightWing | S::DubDOffender | S::ReadyOffender => Role::Offender,
            S::Stopper
            | S::DeepStopper
            | S::Sweeper
            | S::LeftDeepBack
            | S::RightDeepBack
            | S::KickoffSweeper
            | S::ReadyDefender => Role::Defender,
            S::ChaseNormal | S::ChaseAroundBox | S::KickoffStriker | S::ReadyChaser => Role::Chaser,
            S::FrontFinder | S::LeftFinder | S::RightFinder | S::OtherFinder => Role::Searcher,
            S::GoalieNormal | S::GoalieChaser => Role::Goalie,
            S::Penalty => Role::Penalty,
        }
    }
}

/// A formation, role and sub-role proposed by a strategy for this robot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub formation: Formation,
    pub sub_role: SubRole,
}

impl Assignment {
    #[must_use]
    pub fn new(formation: Formation, sub_role: SubRole) -> Self {
        Self {
            formation,
            sub_role,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.sub_role.role()
    }
}
