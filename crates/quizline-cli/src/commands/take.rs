//! The `quizline take` command: an interactive quiz session.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use quizline_core::controller::{QuizController, SubmitOutcome};
use quizline_core::model::{Contact, Locale, QuizResult};
use quizline_core::session::{Phase, QuizSnapshot};

use super::{connect, BackendArgs};

const HELP: &str = "\
Commands:
  <number>     select that option
  n            next question
  p            previous question
  c            clear the answer for this question
  l <language> switch language (english, hindi)
  r            retry loading questions
  s            submit (on the last question)
  h            show this help
  q            quit";

/// Contact details given on the command line. Missing fields are prompted
/// for at submit time.
#[derive(Debug, Clone, Default)]
pub struct ContactArgs {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn execute(
    locale: Option<Locale>,
    contact: ContactArgs,
    args: BackendArgs,
) -> Result<()> {
    let backend = connect(&args)?;
    let locale = locale.unwrap_or(backend.config.default_locale);
    let mut controller = QuizController::new(
        backend.provider,
        backend.scoring,
        locale,
        backend.config.controller_config(),
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_session(&mut controller, &contact, &mut stdin.lock(), &mut stdout.lock()).await
}

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Select(usize),
    Next,
    Previous,
    Clear,
    Locale(Locale),
    Retry,
    Submit,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn locale_choices() -> String {
    Locale::ALL
        .iter()
        .map(Locale::as_query)
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if let Ok(n) = line.parse::<usize>() {
        return Command::Select(n);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match (word.to_lowercase().as_str(), rest) {
        ("n" | "next", "") => Command::Next,
        ("p" | "prev" | "previous", "") => Command::Previous,
        ("c" | "clear", "") => Command::Clear,
        ("r" | "retry", "") => Command::Retry,
        ("s" | "submit", "") => Command::Submit,
        ("h" | "help" | "?", "") => Command::Help,
        ("q" | "quit" | "exit", "") => Command::Quit,
        ("l" | "lang" | "language", "") => {
            Command::Invalid(format!("usage: l <language> ({})", locale_choices()))
        }
        ("l" | "lang" | "language", name) => match name.parse() {
            Ok(locale) => Command::Locale(locale),
            Err(e) => Command::Invalid(e),
        },
        _ => Command::Invalid(format!("unknown command '{line}', type h for help")),
    }
}

/// Drive `controller` from `input` until the quiz is reported, the user
/// quits, or input ends.
async fn run_session<R: BufRead, W: Write>(
    controller: &mut QuizController,
    contact: &ContactArgs,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Loading {} questions...", controller.locale())?;
    controller.select_locale(controller.locale()).await;
    render(&controller.snapshot(), out)?;

    loop {
        if controller.phase() == Phase::Reported {
            return Ok(());
        }

        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            writeln!(out)?;
            return Ok(());
        };

        let rerender = match parse_command(&line) {
            Command::Empty => false,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                false
            }
            Command::Quit => {
                writeln!(out, "Goodbye.")?;
                return Ok(());
            }
            Command::Invalid(message) => {
                writeln!(out, "{message}")?;
                false
            }
            Command::Select(n) => {
                let snapshot = controller.snapshot();
                let option = snapshot
                    .question
                    .as_ref()
                    .and_then(|q| q.options.get(n.wrapping_sub(1)));
                match option {
                    Some(option) => report(controller.select_option(option), out)?,
                    None if snapshot.question.is_some() => {
                        writeln!(out, "There is no option {n}.")?;
                        false
                    }
                    None => {
                        writeln!(out, "No question is being shown.")?;
                        false
                    }
                }
            }
            Command::Clear => report(controller.clear_answer(), out)?,
            Command::Next => match controller.advance() {
                Ok(true) => true,
                Ok(false) => {
                    writeln!(out, "Already at the last question. Type s to submit.")?;
                    false
                }
                Err(e) => report::<()>(Err(e), out)?,
            },
            Command::Previous => match controller.retreat() {
                Ok(true) => true,
                Ok(false) => {
                    writeln!(out, "Already at the first question.")?;
                    false
                }
                Err(e) => report::<()>(Err(e), out)?,
            },
            Command::Locale(locale) => {
                writeln!(out, "Loading {locale} questions...")?;
                controller.select_locale(locale).await;
                true
            }
            Command::Retry => {
                writeln!(out, "Loading {} questions...", controller.locale())?;
                controller.retry_load().await;
                true
            }
            Command::Submit => {
                submit(controller, contact, input, out).await?;
                true
            }
        };

        if rerender {
            render(&controller.snapshot(), out)?;
        }
    }
}

/// Print a session error, if any. Returns whether the view changed.
fn report<T>(
    result: Result<T, quizline_core::error::SessionError>,
    out: &mut impl Write,
) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) => {
            writeln!(out, "{e}")?;
            Ok(false)
        }
    }
}

async fn submit<R: BufRead, W: Write>(
    controller: &mut QuizController,
    contact: &ContactArgs,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let snapshot = controller.snapshot();
    if snapshot.phase != Phase::Presenting || !snapshot.is_last {
        writeln!(out, "You can submit from the last question.")?;
        return Ok(());
    }

    // A failed submission keeps the contact it was sent with.
    let previous = controller.session().contact().clone();
    let contact = Contact {
        name: field(&contact.name, &previous.name, "Name", input, out)?,
        email: field(&contact.email, &previous.email, "Email", input, out)?,
        phone: field(&contact.phone, &previous.phone, "Phone", input, out)?,
    };

    writeln!(out, "Submitting...")?;
    match controller.submit(contact).await {
        Ok(SubmitOutcome::Reported(_)) => {}
        Ok(SubmitOutcome::Failed(message)) => {
            writeln!(out, "Submission failed: {message}")?;
            writeln!(out, "Your answers are kept. Type s to try again.")?;
        }
        Err(e) => writeln!(out, "{e}")?,
    }
    Ok(())
}

/// Use the command-line value, then the previously submitted one, or prompt.
fn field<R: BufRead, W: Write>(
    given: &Option<String>,
    previous: &str,
    label: &str,
    input: &mut R,
    out: &mut W,
) -> Result<String> {
    if let Some(value) = given {
        return Ok(value.clone());
    }
    if !previous.is_empty() {
        return Ok(previous.to_string());
    }
    write!(out, "{label}: ")?;
    out.flush()?;
    read_line(input)?.with_context(|| format!("input closed while reading {label}"))
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn render(snapshot: &QuizSnapshot, out: &mut impl Write) -> Result<()> {
    writeln!(out)?;
    match snapshot.phase {
        Phase::Loading => writeln!(out, "Loading questions...")?,
        Phase::LoadFailed => {
            writeln!(
                out,
                "Could not load questions: {}",
                snapshot.load_error.as_deref().unwrap_or("unknown error")
            )?;
            writeln!(out, "Type r to retry or l <language> to switch language.")?;
        }
        Phase::NoQuizAvailable => {
            writeln!(out, "No quiz is available in {}.", snapshot.locale)?;
            writeln!(
                out,
                "Type l <language> ({}) to switch language or q to quit.",
                locale_choices()
            )?;
        }
        Phase::Presenting | Phase::Submitting => render_question(snapshot, out)?,
        Phase::Reported => {
            if let Some(result) = &snapshot.result {
                render_result(result, out)?;
            }
        }
    }
    Ok(())
}

fn render_question(snapshot: &QuizSnapshot, out: &mut impl Write) -> Result<()> {
    let Some(question) = &snapshot.question else {
        return Ok(());
    };

    writeln!(
        out,
        "[{}] Question {} of {} ({} answered)",
        snapshot.locale,
        snapshot.index + 1,
        snapshot.total,
        snapshot.answered
    )?;
    writeln!(out, "{}", question.question)?;
    for (i, option) in question.options.iter().enumerate() {
        let mark = if snapshot.selected.as_deref() == Some(option.as_str()) {
            "x"
        } else {
            " "
        };
        writeln!(out, "  {}) [{mark}] {option}", i + 1)?;
    }

    if let Some(error) = &snapshot.submit_error {
        writeln!(out, "Last submission failed: {error}")?;
    }
    if snapshot.is_last {
        writeln!(out, "This is the last question. Type s to submit.")?;
    }
    Ok(())
}

fn render_result(result: &QuizResult, out: &mut impl Write) -> Result<()> {
    use comfy_table::{Cell, Table};

    writeln!(out, "Quiz submitted successfully!")?;
    writeln!(
        out,
        "Percentage of Correct Answers: {:.1}%",
        result.percentage_correct
    )?;
    writeln!(
        out,
        "Percentage of Wrong Answers: {:.1}%",
        result.percentage_wrong
    )?;

    let mut table = Table::new();
    table.set_header(vec!["", "Answers", "Share"]);
    table.add_row(vec![
        Cell::new("Correct"),
        Cell::new(result.correct),
        Cell::new(format!("{:.1}%", result.percentage_correct)),
    ]);
    table.add_row(vec![
        Cell::new("Wrong"),
        Cell::new(result.wrong()),
        Cell::new(format!("{:.1}%", result.percentage_wrong)),
    ]);
    writeln!(out, "\n{table}")?;
    Ok(())
}
