//! Command-line front end for the filing pipeline.
//!
//! Researches a jurisdiction, optionally logs in, navigates to the filing
//! form, fills it from the flags, and writes a screenshot for human review.
//! Nothing is submitted unless `--submit` is passed.

use anyhow::{Context, bail};
use clap::Parser;
use state_filing::{BusinessFilingData, FilingSession, Settings, jurisdiction};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "state-filing", version, about = "AI-discovered LLC filing automation")]
struct Args {
    /// Two-letter jurisdiction code (e.g. TX)
    #[arg(short, long)]
    jurisdiction: Option<String>,

    /// List supported jurisdictions and exit
    #[arg(long)]
    list: bool,

    /// Business name to file
    #[arg(long)]
    business_name: Option<String>,

    /// Registered agent name
    #[arg(long)]
    agent_name: Option<String>,

    /// Registered agent address
    #[arg(long)]
    agent_address: Option<String>,

    /// Business purpose
    #[arg(long, default_value = "All lawful purposes")]
    purpose: String,

    /// Portal username (enables the login stage)
    #[arg(long)]
    username: Option<String>,

    /// Portal password
    #[arg(long)]
    password: Option<String>,

    /// Launch the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Actually submit the form after filling it
    #[arg(long)]
    submit: bool,

    /// Where to write the review screenshot
    #[arg(long)]
    screenshot: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        for code in jurisdiction::list_supported() {
            println!("{}  {}", code, jurisdiction::display_name(code).unwrap_or("?"));
        }
        return Ok(());
    }

    let Some(code) = args.jurisdiction.as_deref() else {
        bail!("--jurisdiction is required (or use --list)");
    };

    let settings = Settings::from_env().headless(!args.headed);
    let mut session = FilingSession::open(code, &settings)
        .await
        .context("failed to open filing session")?;

    let config = session.config().clone();
    println!("Jurisdiction: {}", config.name);
    println!("Online filing available: {}", config.online_filing_available);
    if let Some(url) = &config.filing_form_url {
        println!("Filing form: {}", url);
    }
    if let Some(cost) = &config.estimated_cost {
        println!("Estimated cost: {}", cost);
    }
    if !config.typical_requirements.is_empty() {
        println!("Typical requirements:");
        for requirement in &config.typical_requirements {
            println!("  - {}", requirement);
        }
    }
    if let Some(notes) = &config.notes {
        println!("Notes: {}", notes);
    }

    // Research-only invocation: no filing data, nothing to drive
    if args.business_name.is_none() {
        session.close().await?;
        return Ok(());
    }

    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        let result = session.login(username, password).await;
        println!("login: {:?}", result);
        if !result.is_success() {
            session.close().await?;
            bail!("login failed: {}", result.reason().unwrap_or("unknown"));
        }
    }

    let result = session.navigate().await;
    println!("navigate: {:?}", result);
    if !result.is_success() {
        session.close().await?;
        bail!("navigate failed: {}", result.reason().unwrap_or("unknown"));
    }

    let mut data = BusinessFilingData::new().purpose(args.purpose.clone());
    if let Some(name) = &args.business_name {
        data = data.business_name(name);
    }
    if let Some(name) = &args.agent_name {
        data = data.registered_agent_name(name);
    }
    if let Some(address) = &args.agent_address {
        data = data.registered_agent_address(address);
    }

    let result = session.fill(&data).await;
    println!("fill: {:?}", result);
    if !result.is_success() {
        session.screenshot(args.screenshot.clone()).await.ok();
        session.close().await?;
        bail!("fill failed: {}", result.reason().unwrap_or("unknown"));
    }

    let shot = session.screenshot(args.screenshot.clone()).await?;
    println!("Review screenshot: {}", shot.display());

    if args.submit {
        let outcome = session.submit().await;
        if outcome.success {
            println!("Submitted to {}.", outcome.jurisdiction);
            if let Some(url) = &outcome.url {
                println!("Final URL: {}", url);
            }
            if let Some(confirmation) = &outcome.confirmation {
                println!("Confirmation:\n{}", confirmation);
            }
        } else {
            println!("Submission failed: {}", outcome.error.as_deref().unwrap_or("unknown"));
        }
    } else {
        println!("Dry run: pass --submit to actually file.");
    }

    session.close().await?;
    Ok(())
}
