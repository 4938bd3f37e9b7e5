//! The `quizline questions` command.

use anyhow::{Context, Result};

use quizline_core::model::{Locale, Question};

use super::{connect, BackendArgs};

pub async fn execute(locale: Option<Locale>, json: bool, args: BackendArgs) -> Result<()> {
    let backend = connect(&args)?;
    let locale = locale.unwrap_or(backend.config.default_locale);

    let questions = backend
        .provider
        .fetch_questions(locale)
        .await
        .with_context(|| format!("failed to fetch {locale} questions"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("No questions available in {locale}.");
        return Ok(());
    }

    println!("{locale} quiz ({} questions)\n", questions.len());
    println!("{}", question_table(&questions));
    Ok(())
}

fn question_table(questions: &[Question]) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Question", "Options"]);

    for (i, q) in questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.id),
            Cell::new(&q.question),
            Cell::new(q.options.join(" / ")),
        ]);
    }

    table
}
