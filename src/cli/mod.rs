use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use console::style;
use tracing_subscriber::EnvFilter;

use crate::core::config::Settings;
use crate::core::content::{EditorialProfile, LlmContentGenerator};
use crate::core::keywords::FileKeywordSource;
use crate::core::llm::openai::OpenAiProvider;
use crate::core::pipeline::Pipeline;
use crate::core::scheduler::CronRunner;
use crate::core::terminal::{self, GuideSection, print_error};
use crate::core::wordpress::WordPressClient;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Usage")
        .command("inkpress", "Pick a keyword from the file and publish one post")
        .command("inkpress --keyword <kw>", "Publish one post for an explicit keyword")
        .command("inkpress --schedule", "Keep running and publish on the cron schedule")
        .print();

    GuideSection::new("Options")
        .text("--keyword, -k <kw>     Primary keyword (skips the keyword file)")
        .text("--secondary, -s <kw>   Secondary keyword hints for the outline")
        .text("--image, -i <path>     Featured image, absolute or relative to IMAGES_DIR")
        .text("--schedule             Run under the cron scheduler (SCHEDULE_CRON)")
        .text("--help, -h             Show this help message")
        .print();

    GuideSection::new("Environment")
        .status("Required", "OPENAI_API_KEY, WP_BASE_URL, WP_USER, WP_APP_PASSWORD")
        .status("Keywords", "KEYWORDS_FILE (.xlsx/.xls/.csv/.tsv), KEYWORD_SELECTION")
        .status("Publishing", "POST_STATUS, REQUIRE_FEATURED_IMAGE, IMAGES_DIR")
        .status("Scheduling", "SCHEDULER_ENABLED, SCHEDULE_CRON")
        .print();

    println!(
        "\n {} {} [options]\n",
        style("Usage:").bold(),
        style("inkpress").green()
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct CliArgs {
    pub keyword: Option<String>,
    pub secondary: Option<String>,
    pub image: Option<String>,
    pub schedule: bool,
    pub help: bool,
    pub unknown: Vec<String>,
}

pub(crate) fn parse_cli_args(args: &[String], start: usize) -> CliArgs {
    let mut parsed = CliArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--keyword" | "-k" => {
                if i + 1 < args.len() {
                    parsed.keyword = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--secondary" | "-s" => {
                if i + 1 < args.len() {
                    parsed.secondary = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--image" | "-i" => {
                if i + 1 < args.len() {
                    parsed.image = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--schedule" => {
                parsed.schedule = true;
                i += 1;
            }
            "--help" | "-h" => {
                parsed.help = true;
                i += 1;
            }
            other => {
                if other.starts_with('-') {
                    parsed.unknown.push(other.to_string());
                }
                i += 1;
            }
        }
    }
    parsed
}

/// Relative image names are tried against IMAGES_DIR before being used as-is.
fn resolve_image_path(raw: &str, images_dir: &Path) -> PathBuf {
    let direct = PathBuf::from(raw);
    if direct.is_absolute() || direct.exists() {
        return direct;
    }
    let nested = images_dir.join(raw);
    if nested.exists() {
        return nested;
    }
    direct
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("inkpress=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let parsed = parse_cli_args(&args, 1);

    if parsed.help {
        print_help();
        return Ok(());
    }
    if !parsed.unknown.is_empty() {
        print_error(&format!("Unknown options: {}", parsed.unknown.join(", ")));
        print_help();
        return Ok(());
    }

    dotenvy::dotenv().ok();
    init_tracing();
    let settings = Settings::from_env()?;

    let keywords = Arc::new(FileKeywordSource::new(
        settings.keywords_file.clone(),
        settings.keyword_selection,
    ));
    let provider = Arc::new(OpenAiProvider::new(
        settings.openai_api_key.clone(),
        settings.openai_model.clone(),
        settings.openai_base_url.clone(),
    )?);
    let generator = Arc::new(LlmContentGenerator::new(
        provider,
        EditorialProfile::from(&settings),
    ));
    let wordpress = Arc::new(WordPressClient::from_settings(&settings)?);

    let pipeline = Arc::new(Pipeline::new(
        keywords,
        generator,
        wordpress.clone(),
        wordpress,
        settings.require_featured_image,
    ));

    if parsed.schedule || settings.scheduler_enabled {
        if parsed.keyword.is_some() || parsed.image.is_some() {
            terminal::print_warn(
                "Scheduled runs always pick from the keyword file; --keyword/--image are ignored.",
            );
        }

        terminal::print_banner();
        GuideSection::new("Scheduler")
            .status("Cron", &settings.schedule_cron)
            .status("Keywords", &settings.keywords_file.display().to_string())
            .status("Publishing to", &settings.wp_base_url)
            .blank()
            .status(
                "Stop",
                &format!("{}", style("Ctrl+C").bold().yellow()),
            )
            .print();
        println!();
        println!(
            "{} {}",
            terminal::ROCKET,
            style("Scheduler running. Waiting for the next fire...").bold()
        );

        return CronRunner::new(pipeline)
            .run_forever(&settings.schedule_cron)
            .await;
    }

    let image = parsed
        .image
        .as_deref()
        .map(|raw| resolve_image_path(raw, &settings.images_dir));

    terminal::print_banner();
    if let Some(keyword) = parsed.keyword.as_deref() {
        terminal::print_status("Keyword", keyword);
    }
    if let Some(path) = image.as_deref() {
        terminal::print_status("Image", &path.display().to_string());
    }
    terminal::print_step("Running the publish pipeline...");

    let result = pipeline
        .run_once(
            parsed.keyword.as_deref(),
            parsed.secondary.as_deref(),
            image.as_deref(),
        )
        .await?;

    terminal::print_success(&format!("Done. Post ID: {}", result.post_id));
    if let Some(link) = result.link.as_deref() {
        terminal::print_link("Post", link);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_cli_args, CliArgs};

    #[test]
    fn parse_cli_args_reads_all_flags() {
        let args = vec![
            "inkpress".to_string(),
            "--keyword".to_string(),
            "global payroll".to_string(),
            "-s".to_string(),
            "outsourcing".to_string(),
            "--image".to_string(),
            "cover.png".to_string(),
            "--schedule".to_string(),
        ];
        let parsed = parse_cli_args(&args, 1);
        assert_eq!(
            parsed,
            CliArgs {
                keyword: Some("global payroll".to_string()),
                secondary: Some("outsourcing".to_string()),
                image: Some("cover.png".to_string()),
                schedule: true,
                help: false,
                unknown: vec![],
            }
        );
    }

    #[test]
    fn parse_cli_args_ignores_a_trailing_value_flag() {
        let args = vec!["inkpress".to_string(), "--keyword".to_string()];
        let parsed = parse_cli_args(&args, 1);
        assert_eq!(parsed.keyword, None);
    }

    #[test]
    fn parse_cli_args_collects_unknown_flags() {
        let args = vec![
            "inkpress".to_string(),
            "--verbose".to_string(),
            "-h".to_string(),
        ];
        let parsed = parse_cli_args(&args, 1);
        assert_eq!(parsed.unknown, vec!["--verbose".to_string()]);
        assert!(parsed.help);
    }
}
