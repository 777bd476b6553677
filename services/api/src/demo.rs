use crate::infra::{load_answers, Narrator};
use chrono::Utc;
use clap::Args;
use healthspan::assessment::{
    render_text_summary, score, share, AssessmentService, AssessmentSubmission, NarrativeReport,
    Polarity, QuestionCatalog, RawAnswers, ResultSession, ResultView, ShareToken, SystemTag,
    UserInfo, ViewState,
};
use healthspan::config::{AppConfig, ShareConfig};
use healthspan::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Participant name
    #[arg(long)]
    pub(crate) name: String,
    /// Participant age
    #[arg(long)]
    pub(crate) age: String,
    /// Participant gender
    #[arg(long)]
    pub(crate) gender: String,
    /// JSON object mapping question ids to answers (1-5)
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Score even if some questions are unanswered (they count as 3)
    #[arg(long)]
    pub(crate) partial: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DecodeArgs {
    /// Share token, or a full link carrying a `share` query parameter
    pub(crate) token: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Base URL used for the printed share link (defaults to SHARE_BASE_URL)
    #[arg(long)]
    pub(crate) base_url: Option<Url>,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        name,
        age,
        gender,
        answers,
        partial,
    } = args;

    let config = AppConfig::load()?;
    let answers = load_answers(&answers)?;
    let narrator = Narrator::from_config(&config.narrative);

    let service = AssessmentService::new(
        Arc::new(QuestionCatalog::standard()?),
        Arc::new(narrator),
        config.share.base_url,
    );
    let outcome = service.submit(AssessmentSubmission {
        user: UserInfo { name, age, gender },
        answers,
        allow_partial: partial,
        include_narrative: true,
    })?;

    let text_summary = match outcome.narrative {
        NarrativeReport::Pending => service.narrate(&outcome.result).await.text_summary,
        _ => outcome.text_summary,
    };

    println!("{text_summary}");
    println!();
    println!("Share link: {}", outcome.share_url);
    Ok(())
}

pub(crate) fn run_decode(args: DecodeArgs) -> Result<(), AppError> {
    let token = token_argument(&args.token);
    let result = share::decode(token.as_str())?;
    println!("{}", render_text_summary(&result, None));
    Ok(())
}

pub(crate) fn run_questions() -> Result<(), AppError> {
    let catalog = QuestionCatalog::standard()?;
    for system in SystemTag::ordered() {
        let config = system.config();
        println!(
            "{} (max {} points, {} questions)",
            system.label(),
            config.max_score,
            config.expected_question_count
        );
        for question in catalog.questions_for(system) {
            let marker = match question.polarity {
                Polarity::Positive => "+",
                Polarity::Negative => "-",
            };
            println!("  [{marker}] {:<4} {}", question.id, question.text);
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let base_url = match args.base_url {
        Some(url) => url,
        None => AppConfig::load()
            .map(|config| config.share.base_url)
            .unwrap_or_else(|_| ShareConfig::default().base_url),
    };

    let catalog = QuestionCatalog::standard()?;
    let participant = UserInfo {
        name: "Jordan Rivera".to_string(),
        age: "46".to_string(),
        gender: "Non-binary".to_string(),
    };
    let answers = demo_answers(&catalog);

    println!("Healthspan assessment demo");
    println!(
        "- {} questions across {} systems, {} answered",
        catalog.len(),
        SystemTag::ordered().len(),
        answers.len()
    );

    let result = score(&answers, participant, &catalog, Utc::now())?;
    let view = ResultView::from_result(&result, false);
    println!(
        "- Overall {}/{} ({}%) -> {}",
        view.total_score, view.total_max, view.overall_percentage, view.grade_label
    );
    for entry in &view.systems {
        println!(
            "  - {:<30} {:>2}/{:<2} {:>3}% {}",
            entry.system_label,
            entry.score,
            entry.max_score,
            entry.percentage,
            entry.band.label()
        );
    }
    if let Some(focus) = view.focus_system {
        println!("- Focus system: {focus}");
    }

    let token = share::encode(&result);
    let link = share::share_link(&base_url, &token);
    println!("\nShare link (no name, age, gender or answers): {link}");

    let session = ResultSession::open(share::token_from_url(&link).as_ref().map(ShareToken::as_str));
    match session.view() {
        ViewState::Results { result, shared } => {
            println!(
                "Reopened shared view for '{}' (shared: {shared})\n",
                result.identity.name
            );
            println!("{}", render_text_summary(result, None));
        }
        ViewState::Assessment => println!("Share link did not resolve; showing questionnaire"),
    }

    Ok(())
}

fn token_argument(raw: &str) -> ShareToken {
    let raw = raw.trim();
    Url::parse(raw)
        .ok()
        .and_then(|url| share::token_from_url(&url))
        .unwrap_or_else(|| ShareToken::from(raw))
}

/// A participant with strong energy and structure but weaker digestion and detox.
fn demo_answers(catalog: &QuestionCatalog) -> RawAnswers {
    catalog
        .questions()
        .iter()
        .map(|question| {
            let leaning = match question.system {
                SystemTag::Energy | SystemTag::Structural => 5,
                SystemTag::Assimilation | SystemTag::Detox => 2,
                _ => 4,
            };
            let answer = match question.polarity {
                Polarity::Positive => leaning,
                Polarity::Negative => 6 - leaning,
            };
            (question.id.to_string(), answer)
        })
        .collect()
}
