use habitos::analytics::insights::InsightReport;
use habitos::client::AppContext;
use habitos::config::ClientConfig;
use habitos::domain::checkin::{definition_for, Advance, Answer, CheckInError, CheckInStep};
use habitos::domain::models::{Metric, Prediction};
use habitos::services::coach;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Commands: start | insights | retry | signout | exit. Use #n to pick a quick option.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env()?;
    let mut ctx = AppContext::init(&config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("HabitOS terminal check-in ({})", ctx.client().base_url());
    match ctx.identity() {
        Some(identity) => println!("Welcome back, {}.", identity.username),
        None => sign_in(&mut ctx, &mut lines).await?,
    }
    println!("{HELP}\n");

    begin(&mut ctx).await;

    while let Some(line) = read_line(&mut lines, "> ").await? {
        let input = line.trim();
        match input.to_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" | "q" => break,
            "help" => println!("{HELP}"),
            "start" | "new" => begin(&mut ctx).await,
            "insights" => show_insights(&ctx).await,
            "signout" => {
                ctx.sign_out();
                println!("Signed out. Check-ins will not be saved.");
            }
            "retry" => {
                let result = ctx.engine().retry().await;
                report(&mut ctx, result);
            }
            _ => {
                if ctx.engine().is_showing_results() {
                    println!("Session complete. Say 'start' for a new analysis.");
                    continue;
                }
                let Some(answer) = parse_answer(ctx.engine().step(), input) else {
                    println!("{}", quick_options_hint(ctx.engine().step()));
                    continue;
                };
                let result = ctx.engine().advance(answer).await;
                report(&mut ctx, result);
            }
        }
    }

    ctx.shutdown();
    println!("Goodbye.");
    Ok(())
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?)
}

async fn sign_in(ctx: &mut AppContext, lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<()> {
    loop {
        let Some(line) = read_line(lines, "Username (blank to continue anonymously): ").await? else {
            return Ok(());
        };
        let username = line.trim();
        if username.is_empty() {
            println!("Continuing without an account. Check-ins will not be saved.");
            return Ok(());
        }
        match ctx.sign_in(username).await {
            Ok(identity) => {
                println!("Signed in as {} (#{}).", identity.username, identity.user_id);
                return Ok(());
            }
            Err(e) => println!("Could not sign in: {e}"),
        }
    }
}

/// Reset the engine and move past the greeting to the first question.
async fn begin(ctx: &mut AppContext) {
    ctx.engine().start_new();
    println!("{}", coach::WELCOME_MESSAGE);
    let result = ctx.engine().advance(Answer::text("")).await;
    report(ctx, result);
}

fn parse_answer(step: CheckInStep, input: &str) -> Option<Answer> {
    let Some(index) = input.strip_prefix('#') else {
        return Some(Answer::text(input));
    };
    let options = step.definition()?.quick_options;
    let index: usize = index.trim().parse().ok()?;
    index
        .checked_sub(1)
        .and_then(|i| options.get(i))
        .map(|value| Answer::QuickSelect(*value))
}

fn quick_options_hint(step: CheckInStep) -> String {
    match step.definition() {
        Some(def) => format!(
            "Pick one of {} options with #1..#{}, or type a number.",
            def.quick_options.len(),
            def.quick_options.len()
        ),
        None => "There is no question to answer right now.".to_string(),
    }
}

fn ask(step: CheckInStep) {
    let Some(def) = step.definition() else {
        return;
    };
    let sep = if def.unit.starts_with('/') { "" } else { " " };
    let options = def
        .quick_options
        .iter()
        .enumerate()
        .map(|(i, v)| format!("#{} {}{}{}", i + 1, v, sep, def.unit))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}\n  {}", coach::prompt_for(def.step), options);
}

fn report(ctx: &mut AppContext, result: Result<Advance, CheckInError>) {
    match result {
        Ok(advance) => {
            if let Some(prediction) = &advance.prediction {
                print_prediction(prediction);
                return;
            }
            // The answer just stored belongs to the step before the new one.
            let answered = advance
                .next_step
                .value()
                .checked_sub(1)
                .and_then(CheckInStep::new)
                .and_then(|s| s.definition());
            if let Some(def) = answered {
                if let Some(value) = advance.updated_partial.get(def.metric) {
                    println!("{}", coach::acknowledgment(def.metric, value));
                }
            }
            ask(advance.next_step);
        }
        Err(CheckInError::Validation(metric)) => println!("{}", reprompt(metric)),
        Err(CheckInError::ServiceUnavailable(reason)) => {
            println!("Couldn't reach HabitOS ({reason}). Your answers are kept; type 'retry' to resend.");
        }
        Err(CheckInError::InvalidStep(_)) => {
            if ctx.engine().is_showing_results() {
                println!("Session complete. Say 'start' for a new analysis.");
            } else {
                ask(ctx.engine().step());
            }
        }
        Err(e) => println!("{e}"),
    }
}

fn reprompt(metric: Metric) -> &'static str {
    definition_for(metric).reprompt
}

fn print_prediction(prediction: &Prediction) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 PERFORMANCE INDEX: {:.1}/100", prediction.daily_score);
    println!("⚡ {}", prediction.day_classification);
    println!("🧬 {}", prediction.persona);
    println!("📋 Recommendations:");
    for rec in &prediction.recommendations {
        println!("  • {rec}");
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Say 'start' for a new analysis or 'insights' for your trends.\n");
}

async fn show_insights(ctx: &AppContext) {
    match ctx.insights().await {
        Ok(Some(report)) => print_insights(&report),
        Ok(None) => println!("Sign in to see insights."),
        Err(e) => println!("Insights unavailable: {e}"),
    }
}

fn print_insights(report: &InsightReport) {
    if report.insights.is_empty() {
        println!(
            "Only {} check-ins so far. Insights appear after a few more.",
            report.total_sessions
        );
        return;
    }
    for insight in &report.insights {
        println!("{} {}\n   {}\n   → {}", insight.icon, insight.title, insight.description, insight.suggested_action);
    }
}
