//! Interactive console loop.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, warn};

use crate::agent::ChatAgent;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    History,
    Help,
}

impl Command {
    /// Reserved slash commands, matched case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "/exit" => Some(Command::Exit),
            "/clear" => Some(Command::Clear),
            "/history" => Some(Command::History),
            "/help" => Some(Command::Help),
            _ => None,
        }
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn interrupted<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "\n\n⚠️  Interrupted. Type '/exit' to quit properly.\n")
}

fn goodbye<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "\nExiting chatbot. Goodbye! 👋\n")
}

pub struct Repl<R, W> {
    agent: ChatAgent,
    lines: Lines<R>,
    out: W,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(agent: ChatAgent, input: R, out: W) -> Self {
        Self {
            agent,
            lines: input.lines(),
            out,
        }
    }

    pub fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.out, "\n👋 Welcome! I'm your local AI assistant.")?;
        writeln!(self.out, "\n💡 Features:")?;
        writeln!(self.out, "   • Powered by {}", self.agent.provider_name())?;
        writeln!(self.out, "   • Conversation memory with context awareness")?;
        writeln!(self.out, "   • Mathematical calculations")?;
        writeln!(self.out, "   • Runs locally once the model is downloaded")?;
        self.print_commands()?;
        writeln!(self.out, "\n{}\n", rule())?;
        Ok(())
    }

    fn print_commands(&mut self) -> Result<()> {
        writeln!(self.out, "\n💡 Commands:")?;
        writeln!(self.out, "   • Type '/exit' to quit")?;
        writeln!(self.out, "   • Type '/clear' to reset conversation")?;
        writeln!(self.out, "   • Type '/history' to view conversation history")?;
        writeln!(self.out, "   • Type '/help' to show these commands again")?;
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        let memory = self.agent.memory();
        if memory.is_empty() {
            writeln!(self.out, "\nNo conversation history yet.\n")?;
            return Ok(());
        }

        writeln!(self.out, "\n{}", rule())?;
        writeln!(self.out, "CONVERSATION HISTORY")?;
        writeln!(self.out, "{}", rule())?;
        for turn in memory.all_turns() {
            writeln!(self.out, "{}", turn)?;
        }
        writeln!(self.out, "{}\n", rule())?;
        Ok(())
    }

    /// Runs a slash command. Returns `false` when the loop should stop.
    fn execute(&mut self, command: Command) -> Result<bool> {
        debug!("Command: {:?}", command);
        match command {
            Command::Exit => {
                goodbye(&mut self.out)?;
                return Ok(false);
            }
            Command::Clear => {
                self.agent.clear_memory();
                writeln!(self.out, "✓ Conversation history cleared.\n")?;
            }
            Command::History => self.print_history()?,
            Command::Help => {
                self.print_commands()?;
                writeln!(self.out)?;
            }
        }
        Ok(true)
    }

    /// Reads and answers lines until `/exit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            write!(self.out, "User: ")?;
            self.out.flush()?;

            let line = tokio::select! {
                line = self.lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    interrupted(&mut self.out)?;
                    continue;
                }
            };

            let Some(line) = line else {
                goodbye(&mut self.out)?;
                return Ok(());
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if let Some(command) = Command::parse(input) {
                if !self.execute(command)? {
                    return Ok(());
                }
                continue;
            }

            let outcome = tokio::select! {
                outcome = self.agent.handle_turn(input) => outcome,
                _ = tokio::signal::ctrl_c() => {
                    interrupted(&mut self.out)?;
                    continue;
                }
            };

            match outcome {
                Ok(Some(reply)) => {
                    writeln!(self.out, "Bot: {}", reply.text)?;
                    writeln!(self.out)?;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Turn failed: {:#}", e);
                    writeln!(self.out, "❌ Error: {}", e)?;
                }
            }
        }
    }

    pub fn agent(&self) -> &ChatAgent {
        &self.agent
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
