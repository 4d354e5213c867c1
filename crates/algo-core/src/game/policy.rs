use crate::belief::enumerator::{BeliefState, enumerate_worlds};
use crate::error::GameError;
use crate::game::action::Action;
use crate::game::history::History;
use crate::game::view::PublicView;
use crate::model::content::Content;
use crate::model::hand::{Hand, HandView};
use crate::model::player::PlayerId;
use crate::model::rules::Rules;

/// Everything the attacker may look at while choosing an action.
///
/// Opponents are exposed only through [`HandView`], so a policy cannot read a
/// closed rank it does not own.
pub struct DecisionContext<'a> {
    pub rules: &'a Rules,
    pub public: PublicView<'a>,
    pub me: PlayerId,
    pub hand: &'a Hand,
    /// Every other player still in the game, in seat order.
    pub opponents: &'a [HandView],
    /// The card drawn this turn, if the deck was not exhausted.
    pub drawn: Option<Content>,
    pub history: &'a History,
    /// Whether at least one attack already succeeded this turn.
    pub has_succeeded: bool,
}

impl DecisionContext<'_> {
    pub fn own_contents(&self) -> Result<Vec<Content>, GameError> {
        self.hand.contents(self.me)
    }

    pub fn own_view(&self) -> HandView {
        HandView::of(self.me, self.hand)
    }

    /// Fresh belief over every opponent's closed slots.
    pub fn belief(&self) -> Result<BeliefState, GameError> {
        let own = self.own_contents()?;
        enumerate_worlds(
            self.rules,
            self.me,
            &own,
            self.opponents,
            self.public.opened,
            self.drawn,
            self.history,
        )
    }

    pub fn can_skip(&self) -> bool {
        self.has_succeeded
    }

    pub fn opponent(&self, player: PlayerId) -> Option<&HandView> {
        self.opponents.iter().find(|view| view.player == player)
    }
}

/// Decides the attacker's next action. Called once per attack decision.
pub trait Policy: Send {
    fn name(&self) -> &str;

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, GameError>;

    /// Estimated success probability of the most recent attack, when the policy
    /// computed one. Used for calibration reports.
    fn last_estimate(&self) -> Option<f64> {
        None
    }
}
