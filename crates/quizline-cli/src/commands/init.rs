//! The `quizline init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizline.toml").exists() {
        println!("quizline.toml already exists, skipping.");
    } else {
        std::fs::write("quizline.toml", SAMPLE_CONFIG)?;
        println!("Created quizline.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point base_url in quizline.toml at your quiz service");
    println!("  2. Run: quizline questions --locale english");
    println!("  3. Run: quizline take");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizline configuration

# Quiz service serving GET /quiz?language=... and POST /submit.
# ${VAR} references are resolved from the environment.
base_url = "https://bjp-quiz-backend-lzy3caj3ca-el.a.run.app"

# english or hindi
default_locale = "english"

request_timeout_secs = 30
max_load_retries = 2
retry_delay_ms = 500
"#;
