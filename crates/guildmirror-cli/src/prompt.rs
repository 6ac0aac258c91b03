//! Interactive prompts for the guild ids, the icon option and the final
//! confirmation.

use guildmirror_engine::GuildId;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Prompt errors.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Standard input closed before an answer was given.
    #[error("input closed")]
    Eof,

    /// Reading or writing the console failed.
    #[error("console error: {0}")]
    Io(#[from] io::Error),
}

/// Why a guild id was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Not 17 to 19 digits.
    #[error("invalid Discord ID (must be 17-19 digits)")]
    Format,
    /// Same as the source.
    #[error("the source and target servers cannot be the same")]
    SameAsSource,
}

/// Parse a guild id: 17 to 19 ASCII digits.
pub fn validate_guild_id(input: &str) -> Result<GuildId, IdError> {
    let input = input.trim();
    if !(17..=19).contains(&input.len()) || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdError::Format);
    }
    input.parse().map_err(|_| IdError::Format)
}

/// Parse a target id that must differ from the source.
pub fn validate_target_id(input: &str, source: GuildId) -> Result<GuildId, IdError> {
    let target = validate_guild_id(input)?;
    if target == source {
        return Err(IdError::SameAsSource);
    }
    Ok(target)
}

/// `yes`, `y`, `oui` or `o`, in any case.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "yes" | "y" | "oui" | "o"
    )
}

/// Asks questions on a writer and reads answers line by line.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process console.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Wrap a reader and a writer.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Print a line.
    pub fn say(&mut self, line: &str) -> Result<(), PromptError> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    /// Ask one question and return the trimmed answer.
    pub fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::Eof);
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the answer passes `validate`.
    pub fn ask_until<T, E: std::fmt::Display>(
        &mut self,
        question: &str,
        validate: impl Fn(&str) -> Result<T, E>,
    ) -> Result<T, PromptError> {
        loop {
            let answer = self.ask(question)?;
            match validate(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => self.say(&format!("[-] {err}."))?,
            }
        }
    }

    /// The source guild id.
    pub fn source_id(&mut self) -> Result<GuildId, PromptError> {
        self.ask_until("[>] ID of the server to clone (source): ", validate_guild_id)
    }

    /// The target guild id, distinct from `source`.
    pub fn target_id(&mut self, source: GuildId) -> Result<GuildId, PromptError> {
        self.ask_until("[<] ID of the destination server (target): ", |s| {
            validate_target_id(s, source)
        })
    }

    /// Whether to copy the icon.
    pub fn clone_icon(&mut self) -> Result<bool, PromptError> {
        let answer = self.ask("[?] Do you want to clone the server icon/picture? (yes/no): ")?;
        Ok(is_affirmative(&answer))
    }

    /// Show the plan and ask for confirmation.
    pub fn confirm(
        &mut self,
        source: GuildId,
        target: GuildId,
        clone_icon: bool,
    ) -> Result<bool, PromptError> {
        self.say("Operation summary")?;
        self.say(&format!("[>] Source server: {source}"))?;
        self.say(&format!("[<] Target server: {target}"))?;
        self.say(&format!(
            "[?] Clone icon: {}",
            if clone_icon { "Yes" } else { "No" }
        ))?;
        self.say("[!] Every role, channel and emoji of the target will be deleted.")?;
        let answer = self.ask("[!] Are you sure you want to continue? (yes/no): ")?;
        Ok(is_affirmative(&answer))
    }
}
