use super::{DecisionContext, Policy};
use algo_core::error::GameError;
use algo_core::game::action::Action;
use algo_core::game::input::parse_human_input;
use algo_core::model::hand::HandView;
use algo_core::model::player::PlayerId;
use std::io::{self, BufRead, Write};

/// Reads commands line by line, re-prompting on malformed or illegal input.
pub struct HumanPolicy<R, W> {
    name: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanPolicy<R, W> {
    pub fn new(name: impl Into<String>, input: R, output: W) -> Self {
        Self {
            name: name.into(),
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn render(&mut self, ctx: &DecisionContext<'_>) -> io::Result<()> {
        writeln!(self.output, "-- turn {} --", ctx.public.turn)?;
        for view in ctx.opponents {
            writeln!(self.output, "{}: {}", view.player, render_view(view))?;
        }
        if let Some(drawn) = ctx.drawn {
            writeln!(self.output, "Draw: {drawn}")?;
        }
        writeln!(self.output, "Your cards: {}", ctx.hand.reveal_all())?;
        Ok(())
    }

    fn prompt(&mut self, line: &mut String) -> io::Result<usize> {
        write!(self.output, "Enter '<slot> <card> [<player>]' or blank to stop > ")?;
        self.output.flush()?;
        line.clear();
        self.input.read_line(line)
    }
}

impl<R, W> Policy for HumanPolicy<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
        self.render(ctx).map_err(|err| interrupted(ctx.me, &err))?;
        let mut line = String::new();
        loop {
            let read = self
                .prompt(&mut line)
                .map_err(|err| interrupted(ctx.me, &err))?;
            if read == 0 {
                return Err(GameError::Interrupted {
                    player: ctx.me,
                    reason: "input closed".into(),
                });
            }
            match parse_human_input(&line, ctx.rules).and_then(|command| command.into_action(ctx)) {
                Ok(action) => return Ok(action),
                Err(err) => {
                    writeln!(self.output, "{err}").map_err(|err| interrupted(ctx.me, &err))?;
                }
            }
        }
    }
}

fn interrupted(player: PlayerId, err: &io::Error) -> GameError {
    GameError::Interrupted {
        player,
        reason: err.to_string(),
    }
}

/// Public rendering of a hand: opened contents, `B??` for closed slots.
pub fn render_view(view: &HandView) -> String {
    (0..view.len)
        .map(|slot| {
            if let Some(closed) = view.closed_slot(slot) {
                format!("{}??", closed.color)
            } else {
                view.opened
                    .iter()
                    .find(|opened| opened.slot == slot)
                    .map(|opened| opened.content.to_string())
                    .unwrap_or_else(|| "--".to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
